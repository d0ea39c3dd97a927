//! Buffer refill
//!
//! Both the background worker and the simulation's safety net go through
//! [`refill_below`]. The slow generator call runs outside the buffer lock;
//! only the length check, context snapshot and prepend hold it.

use std::io;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rand::Rng;
use rand_pcg::Pcg32;

use super::buffer::TrackBuffer;
use super::generator::{ChunkSource, TrackGenerator};
use crate::consts::CONTEXT_LINES;
use crate::session::Session;
use crate::settings::TrackSettings;

/// RNG stream reserved for the refill worker
const REFILL_STREAM: u64 = 0x5EED_0002;

/// Generate and prepend one chunk if the buffer holds fewer than `threshold`
/// lines. Returns where the chunk came from, or None if no refill was due.
pub fn refill_below<R: Rng + ?Sized>(
    track: &Mutex<TrackBuffer>,
    generator: &TrackGenerator,
    threshold: usize,
    chunk_size: usize,
    difficulty: u8,
    rng: &mut R,
) -> Option<ChunkSource> {
    let context = {
        let buffer = track.lock();
        if buffer.len() >= threshold {
            return None;
        }
        buffer.head(CONTEXT_LINES)
    };

    let chunk = generator.generate_chunk(&context, chunk_size, difficulty, rng);
    let source = chunk.source;
    let added = chunk.lines.len();

    let mut buffer = track.lock();
    buffer.prepend(chunk.lines);
    log::info!(
        "Refilled {added} lines ({source:?}, difficulty {difficulty}), buffer now {}",
        buffer.len()
    );
    Some(source)
}

/// Initial fill: `chunks × chunk_size` lines at difficulty 1
pub fn seed_track<R: Rng + ?Sized>(session: &Session, chunks: usize, rng: &mut R) -> ChunkSource {
    let size = chunks.max(1) * session.chunk_size;
    let chunk = session.generator.generate_chunk(&[], size, 1, rng);
    log::info!("Seeded track with {} lines ({:?})", chunk.lines.len(), chunk.source);
    session.track.lock().prepend(chunk.lines);
    chunk.source
}

/// Background low-water refill loop
pub struct RefillWorker {
    session: Session,
    low_water: usize,
    interval: Duration,
    rng: Pcg32,
}

impl RefillWorker {
    pub fn new(session: Session, settings: &TrackSettings, seed: u64) -> Self {
        Self {
            low_water: session.chunk_size * 2,
            interval: settings.refill_interval(),
            rng: Pcg32::new(seed, REFILL_STREAM),
            session,
        }
    }

    /// One check-and-refill pass
    pub fn run_once(&mut self) -> Option<ChunkSource> {
        let difficulty = self.session.difficulty();
        refill_below(
            &self.session.track,
            &self.session.generator,
            self.low_water,
            self.session.chunk_size,
            difficulty,
            &mut self.rng,
        )
    }

    /// Loop until game over, one pass per interval
    pub fn run(mut self) {
        log::debug!("Refill worker started (low water {})", self.low_water);
        while !self.session.is_over() {
            let deadline = Instant::now() + self.interval;
            self.run_once();
            let wait = deadline.saturating_duration_since(Instant::now());
            if !wait.is_zero() {
                thread::sleep(wait);
            }
        }
        log::debug!("Refill worker stopped");
    }

    pub fn spawn(self) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("track-refill".into())
            .spawn(move || self.run())
    }
}
