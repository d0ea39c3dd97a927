//! Track generator adapter
//!
//! Turns one service call into exactly `chunk_size` validated lines:
//! prompt → service → split/trim → sanitize → procedural padding → truncate.
//! [`TrackGenerator::request_chunk`] reports service failures as a `Result`;
//! [`TrackGenerator::generate_chunk`] is the caller that branches to the
//! procedural fallback, so no failure escapes to the game.

use std::fmt::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;

use super::line::{ObstacleKind, TrackLine};
use super::procedural::{fallback_chunk, procedural_line};
use super::sanitize::sanitize;
use super::service::{GenerationRequest, TrackService};
use crate::consts::{CONTEXT_LINES, MAX_DIFFICULTY, ROAD_WIDTH};
use crate::error::GenerationError;
use crate::settings::ServiceSettings;

const SYSTEM_INSTRUCTION: &str = "You draw ASCII race tracks. Use only the allowed characters \
    and make every line exactly the requested length.";

/// Road theme per difficulty (the last one repeats for higher levels)
const ROAD_THEMES: [&str; 4] = [
    "open highway with the odd obstacle",
    "city street with construction zones",
    "racing circuit with chicanes and barriers",
    "desert highway with rockfall",
];

/// Where a chunk's lines came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkSource {
    Service,
    Fallback,
}

/// A generated chunk
#[derive(Debug, Clone)]
pub struct Chunk {
    pub lines: Vec<TrackLine>,
    pub source: ChunkSource,
}

/// Adapter between the game and a [`TrackService`]
pub struct TrackGenerator {
    service: Arc<dyn TrackService>,
    model: String,
    temperature: f32,
    tokens_per_line: u32,
    tokens_generated: AtomicU64,
}

impl TrackGenerator {
    pub fn new(service: Arc<dyn TrackService>, settings: &ServiceSettings) -> Self {
        Self {
            service,
            model: settings.model.clone(),
            temperature: settings.temperature,
            tokens_per_line: settings.tokens_per_line,
            tokens_generated: AtomicU64::new(0),
        }
    }

    /// Cumulative service tokens (reported or estimated)
    pub fn tokens_generated(&self) -> u64 {
        self.tokens_generated.load(Ordering::Relaxed)
    }

    /// Exactly `chunk_size` valid lines, from the service or the fallback
    pub fn generate_chunk<R: Rng + ?Sized>(
        &self,
        context: &[TrackLine],
        chunk_size: usize,
        difficulty: u8,
        rng: &mut R,
    ) -> Chunk {
        match self.request_chunk(context, chunk_size, difficulty, rng) {
            Ok(lines) => Chunk {
                lines,
                source: ChunkSource::Service,
            },
            Err(err) => {
                log::warn!(
                    "Track generation failed ({}), using procedural road: {}",
                    err.kind(),
                    err
                );
                Chunk {
                    lines: fallback_chunk(chunk_size, rng),
                    source: ChunkSource::Fallback,
                }
            }
        }
    }

    /// One service round-trip turned into exactly `chunk_size` lines
    pub fn request_chunk<R: Rng + ?Sized>(
        &self,
        context: &[TrackLine],
        chunk_size: usize,
        difficulty: u8,
        rng: &mut R,
    ) -> Result<Vec<TrackLine>, GenerationError> {
        let difficulty = difficulty.clamp(1, MAX_DIFFICULTY);
        let request = GenerationRequest {
            model: self.model.clone(),
            max_tokens: (chunk_size as u32).saturating_mul(self.tokens_per_line),
            temperature: self.temperature,
            prompt: build_prompt(context, chunk_size, difficulty),
            system: SYSTEM_INSTRUCTION.to_string(),
        };

        let reply = self.service.complete(&request)?;
        let used = reply
            .total_tokens
            .unwrap_or_else(|| estimate_tokens(&reply.content));
        self.tokens_generated.fetch_add(used, Ordering::Relaxed);

        let mut lines: Vec<TrackLine> = reply
            .content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| sanitize(line, &mut *rng))
            .collect();

        let padded = chunk_size.saturating_sub(lines.len());
        if padded > 0 {
            log::debug!("Service reply short by {padded} lines, padding procedurally");
        }
        while lines.len() < chunk_size {
            lines.push(procedural_line(difficulty, rng));
        }
        lines.truncate(chunk_size);
        Ok(lines)
    }
}

/// Rough token count for replies without usage data (words × 1.3, rounded up)
pub fn estimate_tokens(content: &str) -> u64 {
    let words = content.split_whitespace().count() as u64;
    (words * 13).div_ceil(10)
}

/// Prompt for one chunk
pub fn build_prompt(context: &[TrackLine], chunk_size: usize, difficulty: u8) -> String {
    let theme = ROAD_THEMES[(difficulty.max(1) as usize - 1).min(ROAD_THEMES.len() - 1)];
    let glyphs = ObstacleKind::ALL
        .iter()
        .map(|kind| kind.glyph().to_string())
        .collect::<Vec<_>>()
        .join(", ");
    let blank = TrackLine::empty().to_wire();

    let mut prompt = String::new();
    let _ = writeln!(prompt, "Generate the next stretch of an ASCII racing track.");
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "FORMAT:");
    let _ = writeln!(
        prompt,
        "- Every line is exactly {} characters: '|' + {} road cells + '|'",
        ROAD_WIDTH + 2,
        ROAD_WIDTH
    );
    let _ = writeln!(prompt, "- Road cells are a space (open road) or one of: {glyphs}");
    let _ = writeln!(prompt, "- No other characters, no emoji");
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "THEME: {theme}");
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "DIFFICULTY: {difficulty}/{MAX_DIFFICULTY}");
    let _ = writeln!(prompt, "- Levels 1-2: sparse obstacles, wide passages");
    let _ = writeln!(prompt, "- Levels 3-4: moderate obstacles, tighter passages");
    let _ = writeln!(prompt, "- Level 5: dense obstacle courses, narrow gaps");
    let _ = writeln!(prompt, "- Always leave a drivable path; use clusters, gaps and slaloms");
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "PREVIOUS LINES:");
    if context.is_empty() {
        let _ = writeln!(prompt, "(new road, no previous lines)");
    } else {
        for line in context.iter().take(CONTEXT_LINES) {
            let _ = writeln!(prompt, "{line}");
        }
    }
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "Write {chunk_size} lines shaped like: {blank}");
    let _ = write!(prompt, "Output only the track lines.");
    prompt
}
