//! Gridclash - deterministic round resolution for a 3x3 tactical auto-battler
//!
//! Two sides each field a 3x3 main board and a 3x3 reserve. A round runs a
//! fixed phase machine over the four boards: start-of-round pulses, energy
//! gain, auto-casting, then a priority-ordered cast loop that resolves spells,
//! reactions, passives and deaths until no cast is left. Every visible state
//! change is emitted as an owned snapshot for a renderer.

pub mod board;
pub mod core;
pub mod error;
pub mod game;
pub mod loader;
pub mod simulate;

pub use error::{ClashError, Result};
