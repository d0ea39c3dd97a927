//! Shared run handles
//!
//! Everything more than one thread touches lives here; each thread gets a
//! clone. Mutation rights:
//! - `track`: prepend by the refill worker and the simulation, pop by the
//!   simulation, always under the buffer's lock
//! - `intents`: push by the input thread, drain by the simulation
//! - `score`: written by the simulation, read by the refill worker
//! - `game_over`: set by anyone, the single cancellation signal

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::difficulty_for_score;
use crate::input::IntentQueue;
use crate::track::{SharedTrack, TrackBuffer, TrackGenerator};

#[derive(Clone)]
pub struct Session {
    pub track: SharedTrack,
    pub intents: Arc<IntentQueue>,
    pub generator: Arc<TrackGenerator>,
    /// Lines per generation call
    pub chunk_size: usize,
    game_over: Arc<AtomicBool>,
    score: Arc<AtomicU64>,
}

impl Session {
    pub fn new(generator: TrackGenerator, chunk_size: usize) -> Self {
        Self {
            track: TrackBuffer::new().shared(),
            intents: Arc::new(IntentQueue::new()),
            generator: Arc::new(generator),
            chunk_size: chunk_size.max(1),
            game_over: Arc::new(AtomicBool::new(false)),
            score: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn is_over(&self) -> bool {
        self.game_over.load(Ordering::Acquire)
    }

    /// Signal every thread to stop
    pub fn end(&self) {
        self.game_over.store(true, Ordering::Release);
    }

    pub fn publish_score(&self, score: u64) {
        self.score.store(score, Ordering::Relaxed);
    }

    pub fn published_score(&self) -> u64 {
        self.score.load(Ordering::Relaxed)
    }

    /// Difficulty for new chunks, from the latest published score
    pub fn difficulty(&self) -> u8 {
        difficulty_for_score(self.published_score())
    }
}

/// Session whose generator always falls back to the procedural road
#[cfg(test)]
pub(crate) fn offline_session(chunk_size: usize) -> Session {
    let generator = TrackGenerator::new(
        Arc::new(crate::track::OfflineService::new("test")),
        &crate::settings::ServiceSettings::default(),
    );
    Session::new(generator, chunk_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_is_visible_to_clones() {
        let session = offline_session(0);
        let other = session.clone();
        assert_eq!(session.chunk_size, 1);
        assert!(!other.is_over());
        session.end();
        assert!(other.is_over());

        other.publish_score(450);
        assert_eq!(session.difficulty(), 4);
    }
}
