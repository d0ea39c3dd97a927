//! Content sanitizer
//!
//! The single chokepoint for externally generated road text. Total: every
//! input yields a valid [`TrackLine`], malformed input is repaired or replaced,
//! never rejected.

use rand::Rng;

use super::line::{Cell, ObstacleKind, TrackLine};
use super::procedural::fallback_line;
use crate::consts::{ROAD_WIDTH, WALL_GLYPH};

/// Validate or repair one raw line.
///
/// - Missing walls or wrong interior width: replaced by a fallback line
/// - Unknown interior glyphs: replaced by a random obstacle
pub fn sanitize<R: Rng + ?Sized>(raw: &str, rng: &mut R) -> TrackLine {
    let Some(interior) = raw
        .strip_prefix(WALL_GLYPH)
        .and_then(|rest| rest.strip_suffix(WALL_GLYPH))
    else {
        return fallback_line(rng);
    };

    if interior.chars().count() != ROAD_WIDTH {
        return fallback_line(rng);
    }

    let mut cells = [Cell::Empty; ROAD_WIDTH];
    for (cell, glyph) in cells.iter_mut().zip(interior.chars()) {
        *cell = Cell::from_glyph(glyph)
            .unwrap_or_else(|| Cell::Obstacle(ObstacleKind::random(&mut *rng)));
    }
    TrackLine::from_cells(cells)
}
