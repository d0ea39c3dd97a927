//! Gear table
//!
//! Higher gears advance the road faster and let more queued intents through
//! per tick.

use std::time::Duration;

use crate::consts::{BASE_FPS, MAX_GEAR};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GearProfile {
    pub speed_multiplier: f32,
    pub intents_per_tick: usize,
    pub name: &'static str,
}

const fn gear(speed_multiplier: f32, intents_per_tick: usize, name: &'static str) -> GearProfile {
    GearProfile {
        speed_multiplier,
        intents_per_tick,
        name,
    }
}

/// Profiles for gears 1..=MAX_GEAR
pub const GEARS: [GearProfile; MAX_GEAR as usize] = [
    gear(0.5, 1, "1st"),
    gear(0.7, 1, "2nd"),
    gear(1.0, 2, "3rd"),
    gear(1.3, 2, "4th"),
    gear(1.8, 3, "5th"),
    gear(2.0, 4, "6th"),
    gear(2.2, 5, "7th"),
    gear(2.6, 6, "8th"),
    gear(2.8, 7, "9th"),
    gear(3.0, 8, "10th"),
];

impl GearProfile {
    /// Profile for a gear, clamped into 1..=MAX_GEAR
    pub fn for_gear(gear: u8) -> &'static GearProfile {
        let index = gear.clamp(1, MAX_GEAR) as usize - 1;
        &GEARS[index]
    }

    /// Time between road advances
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f32(1.0 / (BASE_FPS * self.speed_multiplier))
    }
}
