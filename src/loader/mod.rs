//! Content and board setup loading

pub mod content;
pub mod setup;

pub use content::{ContentDatabase, ContentFile, ContentSource};
pub use setup::{BoardSetup, Placement, Scenario};
