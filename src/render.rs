//! Terminal rendering
//!
//! Frames are composed as plain strings so layout can be tested without a
//! terminal, then written with batched crossterm commands.

use std::io::{self, BufWriter, Stdout, Write};

use crossterm::{
    cursor::{self, MoveTo, MoveToNextLine},
    execute, queue,
    style::{Print, ResetColor},
    terminal::{self, Clear, ClearType},
};

use crate::consts::*;
use crate::sim::{GamePhase, GameState};
use crate::track::TrackBuffer;

/// Cells in the HUD speed bar
const SPEED_BAR_CELLS: usize = 10;

/// Width assumed when the terminal size is unavailable
const FALLBACK_WIDTH: u16 = 80;

/// Raw mode plus alternate screen for as long as the guard lives
pub struct TerminalGuard {
    _private: (),
}

impl TerminalGuard {
    pub fn acquire() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        if let Err(err) = execute!(
            io::stdout(),
            terminal::EnterAlternateScreen,
            cursor::Hide,
            Clear(ClearType::All)
        ) {
            let _ = terminal::disable_raw_mode();
            return Err(err);
        }
        Ok(Self { _private: () })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(
            io::stdout(),
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        );
        if let Err(err) = terminal::disable_raw_mode() {
            log::error!("Failed to restore terminal: {err}");
        }
    }
}

/// Gear selector with the active gear bracketed
pub fn gear_strip(gear: u8) -> String {
    let strip: String = (1..=MAX_GEAR)
        .map(|g| {
            if g == gear {
                format!("[{g}] ")
            } else {
                format!(" {g}  ")
            }
        })
        .collect();
    strip.trim_end().to_string()
}

/// Filled cells for a speed multiplier: five per 1.0x, capped at the bar length
pub fn speed_cells(speed: f32) -> usize {
    ((speed.max(0.0) * 5.0).floor() as usize).min(SPEED_BAR_CELLS)
}

pub fn speed_bar(speed: f32) -> String {
    let filled = speed_cells(speed);
    format!(
        "[{}{}]",
        "█".repeat(filled),
        "░".repeat(SPEED_BAR_CELLS - filled)
    )
}

/// Lay out one full frame: HUD, road centred on `term_width`, controls
pub fn compose_frame(state: &GameState, track: &TrackBuffer, term_width: usize) -> Vec<String> {
    let player = &state.player;
    let profile = player.profile();
    let mut frame = Vec::with_capacity(DISPLAY_HEIGHT + 8);

    let status = match state.phase {
        GamePhase::Running => "",
        GamePhase::Crashed => "   CRASHED",
    };
    frame.push(format!(
        "TOKEN RACER   Score: {}   Gear: {}   Speed: {:.1}x{status}",
        player.score, profile.name, profile.speed_multiplier
    ));
    frame.push(format!("Tokens generated: {}", player.tokens_generated));
    frame.push(String::new());

    let pad = " ".repeat(term_width.saturating_sub(ROAD_WIDTH + 2) / 2);
    match track.visible(DISPLAY_HEIGHT) {
        Some(rows) => {
            for (row, line) in rows.enumerate() {
                let mut text = String::with_capacity(pad.len() + ROAD_WIDTH + 2);
                text.push_str(&pad);
                text.push(WALL_GLYPH);
                for (col, cell) in line.cells().iter().enumerate() {
                    if row == player.y && col == player.x {
                        text.push(PLAYER_GLYPH);
                    } else {
                        text.push(cell.glyph());
                    }
                }
                text.push(WALL_GLYPH);
                frame.push(text);
            }
        }
        None => frame.push(format!("{pad}(building road...)")),
    }

    frame.push(String::new());
    frame.push("Controls: WASD or arrow keys move  |  SPACE shifts up  |  Q quits".to_string());
    frame.push(format!("Gears: {}", gear_strip(player.gear)));
    frame.push(format!("Speed: {}", speed_bar(profile.speed_multiplier)));
    frame
}

/// Where composed frames go
pub trait Screen {
    fn width(&self) -> usize;
    fn draw(&mut self, frame: &[String]) -> io::Result<()>;
}

/// Buffered writer for the alternate screen
pub struct Renderer {
    out: BufWriter<Stdout>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    pub fn new() -> Self {
        Self {
            out: BufWriter::with_capacity(16384, io::stdout()),
        }
    }
}

impl Screen for Renderer {
    fn width(&self) -> usize {
        terminal::size().map(|(w, _)| w).unwrap_or(FALLBACK_WIDTH) as usize
    }

    /// Repaint from the top-left, clearing leftovers from longer frames
    fn draw(&mut self, frame: &[String]) -> io::Result<()> {
        queue!(self.out, MoveTo(0, 0))?;
        for line in frame {
            queue!(
                self.out,
                Print(line),
                Clear(ClearType::UntilNewLine),
                MoveToNextLine(1)
            )?;
        }
        queue!(self.out, Clear(ClearType::FromCursorDown))?;
        self.out.flush()
    }
}
