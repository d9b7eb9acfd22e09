//! Error types for gridclash

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClashError {
    #[error("Invalid content: {0}")]
    InvalidContent(String),

    #[error("Invalid board: {0}")]
    InvalidBoard(String),

    #[error("Unknown hero: {0}")]
    UnknownHero(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Task join error: {0}")]
    JoinError(#[from] tokio::task::JoinError),
}

impl From<serde_json::Error> for ClashError {
    fn from(err: serde_json::Error) -> Self {
        ClashError::SerializationError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClashError>;
