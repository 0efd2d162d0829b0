//! Input validation failures.
//!
//! Validation runs before any store write, so a `ValidationError` always means
//! the board is unchanged.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid color: {color}. Must be one of: {}", allowed.join(", "))]
    InvalidColor { color: String, allowed: Vec<String> },

    #[error("invalid coordinates: {x}, {y}. x and y must be between 0 and {max}")]
    InvalidCoordinate { x: String, y: String, max: u32 },
}
