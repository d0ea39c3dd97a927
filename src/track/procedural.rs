//! Procedural road generation
//!
//! Used to pad short generator replies and as the whole-chunk fallback when
//! the service fails. Everything here is pure given the RNG.

use rand::Rng;

use super::line::TrackLine;
use crate::consts::ROAD_WIDTH;

/// Obstacle layout strategies for padded lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Two 5-cell clusters near each edge, open lane in the middle
    EdgeWalls,
    /// Evenly spaced obstacles around a jittered centre
    Slalom,
    /// Independent random points
    Scatter,
}

/// Width of each edge-wall cluster
const WALL_CLUSTER: i32 = 5;
/// Spacing between slalom obstacles
const SLALOM_SPACING: i32 = 3;
/// Maximum lateral jitter of the slalom centre
const SLALOM_JITTER: i32 = 10;
/// Obstacles per line on the whole-chunk fallback
const FALLBACK_MAX_OBSTACLES: usize = 2;

impl Layout {
    /// 30% edge walls, then 30% of the remainder slalom, else scatter
    pub fn pick<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.random_bool(0.3) {
            Layout::EdgeWalls
        } else if rng.random_bool(0.3) {
            Layout::Slalom
        } else {
            Layout::Scatter
        }
    }

    /// Obstacle positions for `count` obstacles (may fall outside the road)
    pub fn positions<R: Rng + ?Sized>(self, count: usize, rng: &mut R) -> Vec<i32> {
        let width = ROAD_WIDTH as i32;
        match self {
            Layout::EdgeWalls => {
                let left = rng.random_range(0..=width / 3);
                let right = rng.random_range(2 * width / 3..=width - 1);
                (left..left + WALL_CLUSTER)
                    .chain(right..(right + WALL_CLUSTER).min(width))
                    .collect()
            }
            Layout::Slalom => {
                let center = width / 2 + rng.random_range(-SLALOM_JITTER..=SLALOM_JITTER);
                let n = count as i32;
                (0..n)
                    .map(|i| center + (i - n / 2) * SLALOM_SPACING)
                    .filter(|pos| (0..width).contains(pos))
                    .collect()
            }
            Layout::Scatter => scatter(count, rng),
        }
    }
}

/// Up to `count` distinct random columns
fn scatter<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<i32> {
    let mut positions = Vec::with_capacity(count);
    for _ in 0..count {
        let pos = rng.random_range(0..ROAD_WIDTH as i32);
        if !positions.contains(&pos) {
            positions.push(pos);
        }
    }
    positions
}

/// One padded line at the given difficulty (0..=min(3, difficulty) obstacles)
pub fn procedural_line<R: Rng + ?Sized>(difficulty: u8, rng: &mut R) -> TrackLine {
    let max = difficulty.min(3) as usize;
    let count = rng.random_range(0..=max);
    if count == 0 {
        return TrackLine::empty();
    }
    let layout = Layout::pick(rng);
    let positions = layout.positions(count, rng);
    TrackLine::with_obstacles(positions, rng)
}

/// One fallback line: 0-2 random point obstacles
pub fn fallback_line<R: Rng + ?Sized>(rng: &mut R) -> TrackLine {
    let count = rng.random_range(0..=FALLBACK_MAX_OBSTACLES);
    let positions = scatter(count, rng);
    TrackLine::with_obstacles(positions, rng)
}

/// A whole chunk built from fallback lines
pub fn fallback_chunk<R: Rng + ?Sized>(size: usize, rng: &mut R) -> Vec<TrackLine> {
    (0..size).map(|_| fallback_line(&mut *rng)).collect()
}
