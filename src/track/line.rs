//! Track line types
//!
//! A line is `ROAD_WIDTH` interior cells between two walls. The interior is a
//! fixed-size array, so width and walls cannot drift; the only ways to build a
//! line are the sanitizer and the procedural generator.

use std::fmt;

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::consts::{EMPTY_GLYPH, ROAD_WIDTH, WALL_GLYPH};

/// Obstacle types, one per glyph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObstacleKind {
    Barrier,
    Debris,
    OilSlick,
    Boulder,
}

impl ObstacleKind {
    pub const ALL: [ObstacleKind; 4] = [
        ObstacleKind::Barrier,
        ObstacleKind::Debris,
        ObstacleKind::OilSlick,
        ObstacleKind::Boulder,
    ];

    pub fn glyph(self) -> char {
        match self {
            ObstacleKind::Barrier => '#',
            ObstacleKind::Debris => '*',
            ObstacleKind::OilSlick => '~',
            ObstacleKind::Boulder => '@',
        }
    }

    pub fn from_glyph(glyph: char) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.glyph() == glyph)
    }

    /// Uniformly random obstacle
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        *Self::ALL.choose(rng).unwrap_or(&ObstacleKind::Barrier)
    }
}

/// One road cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Obstacle(ObstacleKind),
}

impl Cell {
    pub fn glyph(self) -> char {
        match self {
            Cell::Empty => EMPTY_GLYPH,
            Cell::Obstacle(kind) => kind.glyph(),
        }
    }

    /// Parse a glyph from the closed alphabet (empty or obstacle)
    pub fn from_glyph(glyph: char) -> Option<Self> {
        if glyph == EMPTY_GLYPH {
            Some(Cell::Empty)
        } else {
            ObstacleKind::from_glyph(glyph).map(Cell::Obstacle)
        }
    }

    pub fn is_obstacle(self) -> bool {
        matches!(self, Cell::Obstacle(_))
    }
}

/// A validated, immutable road line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackLine {
    cells: [Cell; ROAD_WIDTH],
}

impl TrackLine {
    pub(crate) fn from_cells(cells: [Cell; ROAD_WIDTH]) -> Self {
        Self { cells }
    }

    /// Line with no obstacles
    pub fn empty() -> Self {
        Self::from_cells([Cell::Empty; ROAD_WIDTH])
    }

    /// Line with a random obstacle at every in-range position.
    /// Out-of-range positions are ignored.
    pub fn with_obstacles<R, I>(positions: I, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
        I: IntoIterator<Item = i32>,
    {
        let mut cells = [Cell::Empty; ROAD_WIDTH];
        for pos in positions {
            if (0..ROAD_WIDTH as i32).contains(&pos) {
                cells[pos as usize] = Cell::Obstacle(ObstacleKind::random(rng));
            }
        }
        Self::from_cells(cells)
    }

    pub fn cells(&self) -> &[Cell; ROAD_WIDTH] {
        &self.cells
    }

    /// Cell at an interior column (None if out of range)
    pub fn cell(&self, column: usize) -> Option<Cell> {
        self.cells.get(column).copied()
    }

    pub fn is_obstacle_at(&self, column: usize) -> bool {
        self.cell(column).is_some_and(Cell::is_obstacle)
    }

    pub fn obstacle_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_obstacle()).count()
    }

    /// Wire format: `|` + interior + `|`
    pub fn to_wire(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TrackLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use fmt::Write;
        f.write_char(WALL_GLYPH)?;
        for cell in &self.cells {
            f.write_char(cell.glyph())?;
        }
        f.write_char(WALL_GLYPH)
    }
}

/// Whether a string is already a well-formed wire line
pub fn is_valid_wire(line: &str) -> bool {
    let chars: Vec<char> = line.chars().collect();
    chars.len() == ROAD_WIDTH + 2
        && chars[0] == WALL_GLYPH
        && chars[chars.len() - 1] == WALL_GLYPH
        && chars[1..chars.len() - 1]
            .iter()
            .all(|&c| Cell::from_glyph(c).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_empty_line_wire() {
        let wire = TrackLine::empty().to_wire();
        assert_eq!(wire.chars().count(), ROAD_WIDTH + 2);
        assert!(wire.starts_with('|') && wire.ends_with('|'));
        assert!(is_valid_wire(&wire));
    }

    #[test]
    fn test_with_obstacles_ignores_out_of_range() {
        let mut rng = Pcg32::seed_from_u64(7);
        let line = TrackLine::with_obstacles([-3, 0, 5, ROAD_WIDTH as i32, 99], &mut rng);
        assert_eq!(line.obstacle_count(), 2);
        assert!(line.is_obstacle_at(0));
        assert!(line.is_obstacle_at(5));
        assert!(!line.is_obstacle_at(1));
        assert!(!line.is_obstacle_at(ROAD_WIDTH));
    }

    #[test]
    fn test_glyph_alphabet() {
        for kind in ObstacleKind::ALL {
            assert_eq!(ObstacleKind::from_glyph(kind.glyph()), Some(kind));
        }
        assert_eq!(Cell::from_glyph(' '), Some(Cell::Empty));
        assert_eq!(Cell::from_glyph('x'), None);
        assert_eq!(Cell::from_glyph('|'), None);
    }

    #[test]
    fn test_is_valid_wire_rejects() {
        assert!(!is_valid_wire(""));
        assert!(!is_valid_wire("||"));
        let mut wide = String::from("|");
        wide.push_str(&" ".repeat(ROAD_WIDTH + 1));
        wide.push('|');
        assert!(!is_valid_wire(&wide));
        let mut bad = String::from("|");
        bad.push_str(&"x".repeat(ROAD_WIDTH));
        bad.push('|');
        assert!(!is_valid_wire(&bad));
    }
}
