//! Game state and core simulation types
//!
//! Everything the simulation owns lives here. The track buffer is shared with
//! the refill worker and so lives in the [`Session`](crate::session::Session).

use std::time::Duration;

use rand_pcg::Pcg32;

use super::gear::GearProfile;
use crate::consts::*;
use crate::input::Intent;

/// RNG stream reserved for the simulation thread
const SIM_STREAM: u64 = 0x5EED_0001;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    Running,
    /// Hit an obstacle; terminal
    Crashed,
}

/// The player's car and run totals
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    /// Column, 0..ROAD_WIDTH
    pub x: usize,
    /// Screen row, 0..DISPLAY_HEIGHT
    pub y: usize,
    /// 1..=MAX_GEAR, only ever rises
    pub gear: u8,
    pub score: u64,
    /// Generator token usage, mirrored for the HUD
    pub tokens_generated: u64,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            x: PLAYER_START_X,
            y: PLAYER_START_Y,
            gear: 1,
            score: 0,
            tokens_generated: 0,
        }
    }
}

impl PlayerState {
    /// Apply one intent. Moves clamp to the road; ShiftUp stops at MAX_GEAR.
    pub fn apply(&mut self, intent: Intent) {
        match intent {
            Intent::MoveLeft => self.x = self.x.saturating_sub(1),
            Intent::MoveRight => self.x = (self.x + 1).min(ROAD_WIDTH - 1),
            Intent::MoveUp => self.y = self.y.saturating_sub(1),
            Intent::MoveDown => self.y = (self.y + 1).min(DISPLAY_HEIGHT - 1),
            Intent::ShiftUp => {
                if self.gear < MAX_GEAR {
                    self.gear += 1;
                    log::info!("Shifted up to {} gear", self.profile().name);
                }
            }
        }
    }

    pub fn profile(&self) -> &'static GearProfile {
        GearProfile::for_gear(self.gear)
    }
}

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct GameState {
    pub player: PlayerState,
    pub phase: GamePhase,
    /// Road advances so far
    pub frames: u64,
    /// Clock time of the last road advance
    pub last_advance: Duration,
    /// Run seed for reproducibility
    pub seed: u64,
    /// Drives the safety-net refill
    pub rng: Pcg32,
}

impl GameState {
    /// Create a new game state with the given seed, starting at clock time `now`
    pub fn new(seed: u64, now: Duration) -> Self {
        Self {
            player: PlayerState::default(),
            phase: GamePhase::Running,
            frames: 0,
            last_advance: now,
            seed,
            rng: Pcg32::new(seed, SIM_STREAM),
        }
    }

    pub fn is_running(&self) -> bool {
        self.phase == GamePhase::Running
    }

    /// Top speed multiplier reached; gears never drop, so it is the current one
    pub fn top_speed(&self) -> f32 {
        self.player.profile().speed_multiplier
    }
}
