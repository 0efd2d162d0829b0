//! Board coordinates and range validation.

use std::fmt;

use serde::Serialize;

use super::validation::ValidationError;

/// A cell position, both axes in `[0, board_size)`.
///
/// Only constructed through [`Coordinate::new`] or [`Coordinate::parse`], so
/// holding one means the range check already passed for the board it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Coordinate {
    x: u32,
    y: u32,
}

impl Coordinate {
    pub fn new(x: i64, y: i64, board_size: u32) -> Result<Self, ValidationError> {
        match (in_range(x, board_size), in_range(y, board_size)) {
            (Some(x), Some(y)) => Ok(Self { x, y }),
            _ => Err(invalid(x.to_string(), y.to_string(), board_size)),
        }
    }

    /// Parse decimal query/CLI input. Surrounding whitespace is ignored;
    /// anything else that is not an integer is rejected.
    pub fn parse(x: &str, y: &str, board_size: u32) -> Result<Self, ValidationError> {
        match (x.trim().parse::<i64>(), y.trim().parse::<i64>()) {
            (Ok(px), Ok(py)) => Self::new(px, py, board_size)
                .map_err(|_| invalid(x.to_string(), y.to_string(), board_size)),
            _ => Err(invalid(x.to_string(), y.to_string(), board_size)),
        }
    }

    pub fn x(&self) -> u32 {
        self.x
    }

    pub fn y(&self) -> u32 {
        self.y
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Every coordinate on the board in row-major order (y outer, x inner).
pub fn all_coordinates(board_size: u32) -> impl Iterator<Item = Coordinate> {
    (0..board_size).flat_map(move |y| (0..board_size).map(move |x| Coordinate { x, y }))
}

fn in_range(value: i64, board_size: u32) -> Option<u32> {
    if value >= 0 && value < i64::from(board_size) {
        u32::try_from(value).ok()
    } else {
        None
    }
}

fn invalid(x: String, y: String, board_size: u32) -> ValidationError {
    ValidationError::InvalidCoordinate {
        x,
        y,
        max: board_size.saturating_sub(1),
    }
}
