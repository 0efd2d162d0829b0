//! Persisted key shapes.
//!
//! Pixel keys zero-pad both coordinates to the digit width of the largest
//! coordinate, so a prefix scan returns pixels in numeric order for any board
//! size. Boards up to 10x10 keep the historical unpadded shape
//! (`pixel:3:0`).

use super::coord::Coordinate;

pub const SELECTED_COLOR_KEY: &str = "state:selected-color";
pub const PIXEL_PREFIX: &str = "pixel:";

/// Store key for the pixel at `coord`.
pub fn pixel_key(coord: Coordinate, board_size: u32) -> String {
    let width = coordinate_width(board_size);
    format!(
        "{PIXEL_PREFIX}{:0width$}:{:0width$}",
        coord.x(),
        coord.y(),
        width = width
    )
}

/// Inverse of [`pixel_key`]; `None` for keys that are not pixel keys.
///
/// Accepts padded and unpadded spellings so entries written before a board
/// resize still map to a coordinate.
pub fn parse_pixel_key(key: &str) -> Option<(u32, u32)> {
    let rest = key.strip_prefix(PIXEL_PREFIX)?;
    let (x, y) = rest.split_once(':')?;
    if x.is_empty() || y.is_empty() || !x.bytes().chain(y.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((x.parse().ok()?, y.parse().ok()?))
}

fn coordinate_width(board_size: u32) -> usize {
    board_size.saturating_sub(1).max(1).to_string().len()
}
