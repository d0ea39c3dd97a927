//! Scrolling track buffer
//!
//! Newest lines live at the head (index 0, top of the screen); the tail is the
//! line under the player's bottom row. Only sanitized [`TrackLine`]s can be
//! stored, so every element is valid by construction.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use super::line::TrackLine;

/// Buffer shared between the simulation and the refill worker
pub type SharedTrack = Arc<Mutex<TrackBuffer>>;

#[derive(Debug, Clone, Default)]
pub struct TrackBuffer {
    lines: VecDeque<TrackLine>,
}

impl TrackBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(self) -> SharedTrack {
        Arc::new(Mutex::new(self))
    }

    /// Insert a chunk at the head, keeping its order (`chunk[0]` becomes index 0)
    pub fn prepend(&mut self, chunk: Vec<TrackLine>) {
        self.lines.reserve(chunk.len());
        for line in chunk.into_iter().rev() {
            self.lines.push_front(line);
        }
    }

    /// Remove the oldest line
    pub fn pop_tail(&mut self) -> Option<TrackLine> {
        self.lines.pop_back()
    }

    /// Line by index from the head
    pub fn line_at(&self, index: usize) -> Option<&TrackLine> {
        self.lines.get(index)
    }

    /// Line by offset from the tail (0 = oldest)
    pub fn line_from_tail(&self, offset: usize) -> Option<&TrackLine> {
        let index = self.lines.len().checked_sub(offset + 1)?;
        self.lines.get(index)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Copies of the `n` newest lines, head first (generator context)
    pub fn head(&self, n: usize) -> Vec<TrackLine> {
        self.lines.iter().take(n).cloned().collect()
    }

    /// The bottom `height` lines in screen order, or None if too short to fill
    /// the screen
    pub fn visible(&self, height: usize) -> Option<impl Iterator<Item = &TrackLine>> {
        let start = self.lines.len().checked_sub(height)?;
        Some(self.lines.range(start..))
    }
}
