//! Simulation module
//!
//! Gameplay rules live here and nowhere else:
//! - Time comes in as a clock reading, never read directly
//! - Seeded RNG only
//! - No terminal or rendering dependencies

pub mod gear;
pub mod state;
pub mod tick;

pub use gear::{GEARS, GearProfile};
pub use state::{GamePhase, GameState, PlayerState};
pub use tick::{TickReport, check_collision, tick};
