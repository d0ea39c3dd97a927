//! Simulation step
//!
//! One call per main-loop pass. Intents are applied every pass; the road only
//! advances when the current gear's frame interval has elapsed on the clock.

use std::time::Duration;

use super::state::{GamePhase, GameState};
use crate::consts::*;
use crate::difficulty_for_score;
use crate::session::Session;
use crate::track::{TrackBuffer, refill_below};

/// What a single tick did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub intents_applied: usize,
    /// The safety net had to generate a chunk
    pub refilled: bool,
    /// The road scrolled one line
    pub advanced: bool,
    pub crashed: bool,
}

/// Whether the player at screen position (`x`, `y`) sits on an obstacle.
/// Row `y` of the screen is buffer index `len - DISPLAY_HEIGHT + y`; anything
/// outside the buffer is open road.
pub fn check_collision(track: &TrackBuffer, x: usize, y: usize) -> bool {
    (track.len() + y)
        .checked_sub(DISPLAY_HEIGHT)
        .and_then(|index| track.line_at(index))
        .is_some_and(|line| line.is_obstacle_at(x))
}

/// Advance the game state by one step at clock time `now`
pub fn tick(state: &mut GameState, session: &Session, now: Duration) -> TickReport {
    let mut report = TickReport::default();
    if !state.is_running() {
        return report;
    }

    // Throughput is set by the gear held when the tick starts
    let allowance = state.player.profile().intents_per_tick;
    for intent in session.intents.drain_up_to(allowance) {
        state.player.apply(intent);
        report.intents_applied += 1;
    }

    report.refilled = refill_below(
        &session.track,
        &session.generator,
        DISPLAY_HEIGHT + SAFETY_MARGIN,
        session.chunk_size,
        difficulty_for_score(state.player.score),
        &mut state.rng,
    )
    .is_some();

    {
        let mut track = session.track.lock();

        if check_collision(&track, state.player.x, state.player.y) {
            state.phase = GamePhase::Crashed;
            report.crashed = true;
            log::info!(
                "Crashed at column {} row {} with score {}",
                state.player.x,
                state.player.y,
                state.player.score
            );
        } else {
            let interval = state.player.profile().frame_interval();
            if now.saturating_sub(state.last_advance) >= interval {
                state.player.score += u64::from(state.player.gear);
                state.frames += 1;
                state.last_advance = now;
                if track.len() > DISPLAY_HEIGHT + SAFETY_MARGIN {
                    track.pop_tail();
                }
                report.advanced = true;
            }
        }
    }

    state.player.tokens_generated = session.generator.tokens_generated();
    session.publish_score(state.player.score);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Intent;
    use crate::session::offline_session;
    use crate::sim::gear::{GEARS, GearProfile};
    use crate::track::TrackLine;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn obstacle_at(column: usize) -> TrackLine {
        let mut rng = Pcg32::seed_from_u64(column as u64);
        TrackLine::with_obstacles([column as i32], &mut rng)
    }

    fn empty_session(lines: usize) -> Session {
        let session = offline_session(ROAD_CHUNK_SIZE);
        session.track.lock().prepend(vec![TrackLine::empty(); lines]);
        session
    }

    #[test]
    fn test_collision_hits_obstacle_only() {
        let mut track = TrackBuffer::new();
        let mut lines = vec![TrackLine::empty(); 30];
        lines[27] = obstacle_at(5);
        track.prepend(lines);

        // 30 - 25 + 22 = 27
        assert!(check_collision(&track, 5, 22));
        assert!(!check_collision(&track, 6, 22));
        assert!(!check_collision(&track, 5, 21));
    }

    #[test]
    fn test_collision_out_of_range_is_open_road() {
        let mut track = TrackBuffer::new();
        track.prepend(vec![obstacle_at(0); 3]);
        // 3 + 0 < 25: row 0 is above the buffer
        assert!(!check_collision(&track, 0, 0));
        // 3 + 22 - 25 = 0
        assert!(check_collision(&track, 0, 22));
        assert!(!check_collision(&track, ROAD_WIDTH, 22));
        assert!(!check_collision(&TrackBuffer::new(), 0, DISPLAY_HEIGHT - 1));
    }

    #[test]
    fn test_crash_on_obstacle_under_player() {
        let session = offline_session(ROAD_CHUNK_SIZE);
        let mut lines = vec![TrackLine::empty(); 90];
        lines[87] = obstacle_at(5);
        session.track.lock().prepend(lines);

        let mut state = GameState::new(7, Duration::ZERO);
        state.player.x = 5;
        state.player.y = 22;

        let report = tick(&mut state, &session, Duration::from_secs(1));
        assert!(report.crashed);
        assert!(!report.advanced);
        assert_eq!(state.phase, GamePhase::Crashed);
        assert_eq!(state.player.score, 0);

        // Crashed is terminal
        session.intents.push(Intent::MoveLeft);
        let report = tick(&mut state, &session, Duration::from_secs(2));
        assert_eq!(report, TickReport::default());
        assert_eq!(state.player.x, 5);
    }

    #[test]
    fn test_safety_net_keeps_buffer_from_shrinking() {
        let session = empty_session(DISPLAY_HEIGHT + 5);
        let before = session.track.lock().len();
        let mut state = GameState::new(3, Duration::ZERO);

        let now = state.player.profile().frame_interval();
        let report = tick(&mut state, &session, now);

        assert!(report.refilled);
        assert!(report.advanced);
        assert!(session.track.lock().len() >= before);
    }

    #[test]
    fn test_frame_gating_and_scoring() {
        let session = empty_session(100);
        let mut state = GameState::new(3, Duration::ZERO);
        let interval = state.player.profile().frame_interval();

        let report = tick(&mut state, &session, interval / 2);
        assert!(!report.advanced);
        assert_eq!(state.player.score, 0);

        let report = tick(&mut state, &session, interval);
        assert!(report.advanced);
        assert_eq!(state.player.score, 1);
        assert_eq!(state.frames, 1);
        assert_eq!(session.track.lock().len(), 99);
        assert_eq!(session.published_score(), 1);

        // Next frame is measured from the last advance
        assert!(!tick(&mut state, &session, interval + interval / 2).advanced);

        state.player.gear = 4;
        let now = interval + GearProfile::for_gear(4).frame_interval();
        assert!(tick(&mut state, &session, now).advanced);
        assert_eq!(state.player.score, 5);
    }

    #[test]
    fn test_tail_kept_at_high_water_mark() {
        let session = empty_session(DISPLAY_HEIGHT + SAFETY_MARGIN);
        let mut state = GameState::new(3, Duration::ZERO);
        let report = tick(&mut state, &session, Duration::from_secs(1));
        assert!(report.advanced);
        assert!(!report.refilled);
        assert_eq!(session.track.lock().len(), DISPLAY_HEIGHT + SAFETY_MARGIN);
    }

    #[test]
    fn test_intents_capped_per_tick_and_kept_in_order() {
        let session = empty_session(100);
        let mut state = GameState::new(3, Duration::ZERO);
        for _ in 0..5 {
            session.intents.push(Intent::MoveLeft);
        }

        let report = tick(&mut state, &session, Duration::ZERO);
        assert_eq!(report.intents_applied, 1);
        assert_eq!(state.player.x, PLAYER_START_X - 1);
        assert_eq!(session.intents.len(), 4);

        state.player.gear = 3;
        let report = tick(&mut state, &session, Duration::ZERO);
        assert_eq!(report.intents_applied, 2);
        assert_eq!(state.player.x, PLAYER_START_X - 3);
        assert_eq!(session.intents.len(), 2);
    }

    #[test]
    fn test_every_gear_respects_intent_allowance() {
        let queued = 10;
        for gear in 1..=MAX_GEAR {
            let session = empty_session(100);
            let mut state = GameState::new(3, Duration::ZERO);
            state.player.gear = gear;
            for _ in 0..queued {
                session.intents.push(Intent::MoveDown);
            }

            let allowance = GEARS[gear as usize - 1].intents_per_tick;
            let report = tick(&mut state, &session, Duration::ZERO);
            assert_eq!(report.intents_applied, queued.min(allowance), "gear {gear}");
            assert_eq!(session.intents.len(), queued - report.intents_applied);
            assert_eq!(state.phase, GamePhase::Running);
        }
    }

    #[test]
    fn test_shifting_through_every_gear_speeds_up() {
        let session = empty_session(100);
        let mut state = GameState::new(3, Duration::ZERO);
        let mut interval = state.player.profile().frame_interval();

        for expected in 2..=MAX_GEAR {
            session.intents.push(Intent::ShiftUp);
            tick(&mut state, &session, Duration::ZERO);
            assert_eq!(state.player.gear, expected);
            let next = state.player.profile().frame_interval();
            assert!(next < interval);
            interval = next;
        }

        session.intents.push(Intent::ShiftUp);
        tick(&mut state, &session, Duration::ZERO);
        assert_eq!(state.player.gear, MAX_GEAR);
        assert!(session.intents.is_empty());
    }
}
