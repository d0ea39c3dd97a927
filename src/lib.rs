//! Token Racer - an endless terminal racer on a generated road
//!
//! Core modules:
//! - `track`: Track lines, sanitizer, generator adapter, scrolling buffer
//! - `sim`: Gear table, game state, simulation step
//! - `input`: Keyboard thread and intent queue
//! - `clock`: Monotonic clock abstraction for the game loop
//! - `session`: Shared handles passed to every thread
//! - `game`: Main loop wiring everything together

pub mod clock;
pub mod error;
pub mod game;
pub mod highscores;
pub mod input;
pub mod render;
pub mod session;
pub mod settings;
pub mod sim;
pub mod track;

pub use error::{ConfigError, GenerationError, RacerError};
pub use highscores::HighScores;
pub use settings::{Settings, SettingsSource};

/// Game configuration constants
pub mod consts {
    use std::time::Duration;

    /// Interior cells per track line (walls excluded)
    pub const ROAD_WIDTH: usize = 25;
    /// Visible rows of road
    pub const DISPLAY_HEIGHT: usize = 25;

    /// Frame advances per second in a 1.0x gear
    pub const BASE_FPS: f32 = 12.0;
    pub const MAX_GEAR: u8 = 10;

    /// Lines requested per generation call
    pub const ROAD_CHUNK_SIZE: usize = 30;
    /// Chunks generated before the race starts
    pub const INITIAL_CHUNKS: usize = 3;
    /// Newest lines handed to the generator for continuity
    pub const CONTEXT_LINES: usize = 5;
    /// Extra rows kept beyond the display; also the safety-net refill margin
    pub const SAFETY_MARGIN: usize = 10;

    /// Score needed per difficulty step
    pub const DIFFICULTY_SCORE_STEP: u64 = 150;
    pub const MAX_DIFFICULTY: u8 = 5;

    pub const WALL_GLYPH: char = '|';
    pub const EMPTY_GLYPH: char = ' ';
    pub const PLAYER_GLYPH: char = 'A';

    /// Player spawn position
    pub const PLAYER_START_X: usize = ROAD_WIDTH / 2;
    pub const PLAYER_START_Y: usize = DISPLAY_HEIGHT - 3;

    /// Default render/poll interval of the main loop
    pub const RENDER_INTERVAL: Duration = Duration::from_millis(20);
    /// Default period of the background refill check
    pub const REFILL_INTERVAL: Duration = Duration::from_millis(200);
    /// Input thread poll timeout (bounds game-over latency)
    pub const INPUT_POLL: Duration = Duration::from_millis(50);
}

/// Track difficulty (1..=5) for a given score
#[inline]
pub fn difficulty_for_score(score: u64) -> u8 {
    use consts::{DIFFICULTY_SCORE_STEP, MAX_DIFFICULTY};
    let level = score / DIFFICULTY_SCORE_STEP + 1;
    level.min(MAX_DIFFICULTY as u64) as u8
}
