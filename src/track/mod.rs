//! Road content pipeline
//!
//! Service → generator → sanitizer → scrolling buffer. No line reaches the
//! buffer without passing through [`sanitize`] or the procedural generator.

pub mod buffer;
pub mod generator;
pub mod line;
pub mod procedural;
pub mod refill;
pub mod sanitize;
pub mod service;

pub use buffer::{SharedTrack, TrackBuffer};
pub use generator::{Chunk, ChunkSource, TrackGenerator, build_prompt};
pub use line::{Cell, ObstacleKind, TrackLine, is_valid_wire};
pub use procedural::{Layout, fallback_chunk, fallback_line, procedural_line};
pub use refill::{RefillWorker, refill_below, seed_track};
pub use sanitize::sanitize;
pub use service::{
    GenerationReply, GenerationRequest, HttpTrackService, OfflineService, TrackService,
};
