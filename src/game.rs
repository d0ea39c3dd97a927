//! Main loop
//!
//! Owns the simulation state and wires the input and refill threads to it.
//! The loop ticks and renders once per render interval until the player
//! crashes or the session ends.

use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rand_pcg::Pcg32;

use crate::clock::{Clock, MonotonicClock, Pacer};
use crate::error::RacerError;
use crate::highscores::{HighScoreEntry, HighScores, unix_now};
use crate::input::{InputChannel, KeySource, TerminalKeys};
use crate::render::{Renderer, Screen, TerminalGuard, compose_frame};
use crate::session::Session;
use crate::settings::Settings;
use crate::sim::{GamePhase, GameState, TickReport, tick};
use crate::track::{ChunkSource, RefillWorker, TrackGenerator, TrackService, seed_track};

/// RNG stream for the initial fill
const SEED_STREAM: u64 = 0x5EED_0000;

/// How long shutdown waits for an in-flight refill before detaching it
const REFILL_GRACE: Duration = Duration::from_millis(500);

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Crashed,
    Quit,
}

/// End-of-run report
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub outcome: Outcome,
    pub score: u64,
    pub gear: u8,
    pub gear_name: &'static str,
    pub top_speed: f32,
    pub tokens: u64,
    pub frames: u64,
    pub seed: u64,
    /// Leaderboard placement, once recorded
    pub rank: Option<usize>,
    /// Best score on the board before this run was recorded
    pub previous_best: Option<u64>,
}

impl RunSummary {
    fn from_state(state: &GameState) -> Self {
        let outcome = match state.phase {
            GamePhase::Crashed => Outcome::Crashed,
            GamePhase::Running => Outcome::Quit,
        };
        Self {
            outcome,
            score: state.player.score,
            gear: state.player.gear,
            gear_name: state.player.profile().name,
            top_speed: state.top_speed(),
            tokens: state.player.tokens_generated,
            frames: state.frames,
            seed: state.seed,
            rank: None,
            previous_best: None,
        }
    }

    /// Enter the run on the leaderboard and remember the rank
    pub fn record(&mut self, scores: &mut HighScores) -> Option<usize> {
        self.previous_best = scores.top_score();
        self.rank = scores.add_score(HighScoreEntry {
            score: self.score,
            gear: self.gear,
            tokens: self.tokens,
            timestamp: unix_now(),
        });
        self.rank
    }

    pub fn verdict(&self) -> &'static str {
        match self.score {
            s if s > 500 => "Outstanding! You're a racing legend!",
            s if s > 200 => "Excellent driving! You've mastered the gears!",
            s if s > 100 => "Good run! Keep practicing those gear shifts!",
            _ => "Not bad for a beginner! Try using higher gears for more points!",
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.outcome {
            Outcome::Crashed => writeln!(f, "CRASH! GAME OVER")?,
            Outcome::Quit => writeln!(f, "RACE ABANDONED")?,
        }
        writeln!(f)?;
        writeln!(f, "Final Score: {}", self.score)?;
        writeln!(f, "Highest Gear Reached: {}", self.gear_name)?;
        writeln!(f, "Top Speed: {:.1}x", self.top_speed)?;
        writeln!(f, "Total Tokens Generated: {}", self.tokens)?;
        if let Some(best) = self.previous_best {
            writeln!(f, "Previous best: {best}")?;
        }
        if let Some(rank) = self.rank {
            writeln!(f, "New high score! Rank #{rank}")?;
        }
        write!(f, "{}", self.verdict())
    }
}

/// A run in progress
pub struct Game {
    settings: Settings,
    session: Session,
    state: GameState,
}

impl Game {
    /// Set up shared state and lay down the initial road. Blocks on the
    /// generator for the first chunks.
    pub fn new(settings: Settings, service: Arc<dyn TrackService>) -> Self {
        let seed = settings.effective_seed();
        log::info!("Starting run with seed {seed}");

        let generator = TrackGenerator::new(service, &settings.service);
        let session = Session::new(generator, settings.track.chunk_size);
        let mut rng = Pcg32::new(seed, SEED_STREAM);
        if seed_track(&session, settings.track.initial_chunks, &mut rng) == ChunkSource::Fallback {
            log::warn!("Initial road is procedural");
        }

        Self {
            settings,
            session,
            state: GameState::new(seed, Duration::ZERO),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// One simulation step at clock time `now`
    pub fn step(&mut self, now: Duration) -> TickReport {
        tick(&mut self.state, &self.session, now)
    }

    /// Take over the terminal and race until crash or quit
    pub fn play(self) -> Result<RunSummary, RacerError> {
        let _guard = TerminalGuard::acquire()?;
        let mut screen = Renderer::new();
        self.drive(TerminalKeys, &MonotonicClock::start(), &mut screen)
    }

    /// Run the threads and main loop against any key source and screen
    pub fn drive<K, C, S>(
        mut self,
        keys: K,
        clock: &C,
        screen: &mut S,
    ) -> Result<RunSummary, RacerError>
    where
        K: KeySource + 'static,
        C: Clock,
        S: Screen,
    {
        self.state.last_advance = clock.now();

        let input = InputChannel::new(keys, self.session.clone())
            .spawn()
            .map_err(|source| RacerError::Spawn {
                name: "input",
                source,
            })?;
        let refill = match RefillWorker::new(
            self.session.clone(),
            &self.settings.track,
            self.state.seed,
        )
        .spawn()
        {
            Ok(handle) => handle,
            Err(source) => {
                self.session.end();
                let _ = input.join();
                return Err(RacerError::Spawn {
                    name: "track-refill",
                    source,
                });
            }
        };

        let result = self.race(clock, screen);

        self.session.end();
        let input_joined = input.join();
        join_with_grace(refill, "track-refill");
        result?;
        if input_joined.is_err() {
            return Err(RacerError::Thread("input"));
        }

        let summary = RunSummary::from_state(&self.state);
        log::info!(
            "Run over ({:?}): score {}, gear {}, {} tokens",
            summary.outcome,
            summary.score,
            summary.gear_name,
            summary.tokens
        );
        Ok(summary)
    }

    fn race<C: Clock, S: Screen>(&mut self, clock: &C, screen: &mut S) -> Result<(), RacerError> {
        let mut pacer = Pacer::new(self.settings.render_interval(), clock.now());
        loop {
            let report = self.step(clock.now());

            let frame = {
                let track = self.session.track.lock();
                compose_frame(&self.state, &track, screen.width())
            };
            screen.draw(&frame)?;

            if report.crashed || self.session.is_over() {
                return Ok(());
            }
            let wait = pacer.wait_time(clock.now());
            if !wait.is_zero() {
                thread::sleep(wait);
            }
        }
    }
}

/// Join a worker, detaching it if it is still busy after the grace period
fn join_with_grace(handle: JoinHandle<()>, name: &'static str) {
    let deadline = Instant::now() + REFILL_GRACE;
    while !handle.is_finished() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }
    if !handle.is_finished() {
        log::warn!("{name} thread still busy at shutdown, detaching");
        return;
    }
    if handle.join().is_err() {
        log::error!("{name} thread panicked");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::consts::*;
    use crate::track::service::ScriptedService;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use std::collections::VecDeque;
    use std::io;

    /// Presses scripted keys, then idles until the run ends
    struct ScriptedKeys(VecDeque<KeyEvent>);

    impl KeySource for ScriptedKeys {
        fn next_key(&mut self, timeout: Duration) -> io::Result<Option<KeyEvent>> {
            match self.0.pop_front() {
                Some(key) => Ok(Some(key)),
                None => {
                    thread::sleep(timeout.min(Duration::from_millis(5)));
                    Ok(None)
                }
            }
        }
    }

    #[derive(Default)]
    struct RecordingScreen {
        frames: Vec<Vec<String>>,
    }

    impl Screen for RecordingScreen {
        fn width(&self) -> usize {
            80
        }

        fn draw(&mut self, frame: &[String]) -> io::Result<()> {
            self.frames.push(frame.to_vec());
            Ok(())
        }
    }

    fn uniform_road(interior: char) -> Arc<dyn TrackService> {
        let line = format!("|{}|", interior.to_string().repeat(ROAD_WIDTH));
        let lines = vec![line; ROAD_CHUNK_SIZE * INITIAL_CHUNKS];
        Arc::new(ScriptedService::text(&lines.join("\n"), Some(321)))
    }

    fn test_settings() -> Settings {
        Settings {
            seed: Some(11),
            render_interval_ms: 1,
            ..Settings::default()
        }
    }

    #[test]
    fn test_new_seeds_initial_chunks() {
        let game = Game::new(test_settings(), uniform_road(' '));
        assert_eq!(
            game.session().track.lock().len(),
            ROAD_CHUNK_SIZE * INITIAL_CHUNKS
        );
        assert_eq!(game.session().generator.tokens_generated(), 321);
        assert_eq!(game.state().seed, 11);
    }

    #[test]
    fn test_run_ends_in_crash_on_solid_road() {
        let game = Game::new(test_settings(), uniform_road('#'));
        let mut screen = RecordingScreen::default();
        let summary = game
            .drive(ScriptedKeys(VecDeque::new()), &ManualClock::new(), &mut screen)
            .unwrap();

        assert_eq!(summary.outcome, Outcome::Crashed);
        assert_eq!(summary.score, 0);
        assert_eq!(summary.tokens, 321);
        assert_eq!(screen.frames.len(), 1);
        assert!(screen.frames[0][0].contains("CRASHED"));
    }

    #[test]
    fn test_quit_key_ends_run() {
        let game = Game::new(test_settings(), uniform_road(' '));
        let keys = ScriptedKeys(VecDeque::from([
            KeyEvent::new(KeyCode::Char(' '), KeyModifiers::NONE),
            KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE),
        ]));
        let mut screen = RecordingScreen::default();
        let summary = game
            .drive(keys, &MonotonicClock::start(), &mut screen)
            .unwrap();

        assert_eq!(summary.outcome, Outcome::Quit);
        assert!(summary.gear <= 2);
        assert!(!screen.frames.is_empty());
    }

    #[test]
    fn test_summary_records_rank() {
        let mut state = GameState::new(5, Duration::ZERO);
        state.player.score = 250;
        state.player.gear = 4;
        state.phase = GamePhase::Crashed;

        let mut summary = RunSummary::from_state(&state);
        let mut scores = HighScores::new();
        assert_eq!(summary.record(&mut scores), Some(1));
        assert_eq!(scores.entries[0].gear, 4);

        let text = summary.to_string();
        assert!(text.contains("Final Score: 250"));
        assert!(text.contains("Highest Gear Reached: 4th"));
        assert!(text.contains("Top Speed: 1.3x"));
        assert!(text.contains("Rank #1"));
        assert!(!text.contains("Previous best"));
        assert!(text.ends_with("You've mastered the gears!"));
    }

    #[test]
    fn test_summary_shows_previous_best() {
        let mut state = GameState::new(5, Duration::ZERO);
        state.player.score = 120;
        let mut scores = HighScores::new();
        scores.add_score(HighScoreEntry {
            score: 300,
            gear: 6,
            tokens: 900,
            timestamp: 0,
        });

        let mut summary = RunSummary::from_state(&state);
        assert_eq!(summary.record(&mut scores), Some(2));
        assert_eq!(summary.previous_best, Some(300));
        let text = summary.to_string();
        assert!(text.contains("Previous best: 300"));
        assert!(text.contains("Rank #2"));
    }
}
