//! Input channel
//!
//! A dedicated thread turns key events into [`Intent`]s on a shared queue.
//! The simulation drains at most its gear's `intents_per_tick` per tick;
//! anything left over stays queued in order for later ticks. The queue is
//! capped so held-down keys can't build an unbounded backlog: once full,
//! new intents are dropped.

use std::collections::VecDeque;
use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use parking_lot::Mutex;

use crate::consts::INPUT_POLL;
use crate::session::Session;

/// Pending intents kept before new ones are dropped
pub const MAX_PENDING_INTENTS: usize = 32;

/// A discrete player command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,
    ShiftUp,
}

/// What a key press means
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Intent(Intent),
    Quit,
    Ignore,
}

/// Map a key event. Letters are case-insensitive; arrow keys arrive already
/// decoded from their `ESC [ A..D` sequences.
pub fn map_key(key: &KeyEvent) -> KeyAction {
    if key.kind == KeyEventKind::Release {
        return KeyAction::Ignore;
    }
    match key.code {
        KeyCode::Char('c') | KeyCode::Char('C') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            KeyAction::Quit
        }
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            'w' => KeyAction::Intent(Intent::MoveUp),
            'a' => KeyAction::Intent(Intent::MoveLeft),
            's' => KeyAction::Intent(Intent::MoveDown),
            'd' => KeyAction::Intent(Intent::MoveRight),
            ' ' => KeyAction::Intent(Intent::ShiftUp),
            'q' => KeyAction::Quit,
            _ => KeyAction::Ignore,
        },
        KeyCode::Up => KeyAction::Intent(Intent::MoveUp),
        KeyCode::Down => KeyAction::Intent(Intent::MoveDown),
        KeyCode::Left => KeyAction::Intent(Intent::MoveLeft),
        KeyCode::Right => KeyAction::Intent(Intent::MoveRight),
        _ => KeyAction::Ignore,
    }
}

/// FIFO of intents shared by the input thread and the simulation
#[derive(Debug)]
pub struct IntentQueue {
    pending: Mutex<VecDeque<Intent>>,
    capacity: usize,
}

impl Default for IntentQueue {
    fn default() -> Self {
        Self::with_capacity(MAX_PENDING_INTENTS)
    }
}

impl IntentQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pending: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Queue an intent; false if the queue was full and it was dropped
    pub fn push(&self, intent: Intent) -> bool {
        let mut pending = self.pending.lock();
        if pending.len() >= self.capacity {
            log::debug!("Intent queue full, dropping {intent:?}");
            return false;
        }
        pending.push_back(intent);
        true
    }

    /// Take up to `max` intents, oldest first
    pub fn drain_up_to(&self, max: usize) -> Vec<Intent> {
        let mut pending = self.pending.lock();
        let n = max.min(pending.len());
        pending.drain(..n).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }
}

/// Where key events come from
pub trait KeySource: Send {
    /// Wait up to `timeout` for the next key press
    fn next_key(&mut self, timeout: Duration) -> io::Result<Option<KeyEvent>>;
}

/// Key events from the raw-mode terminal
#[derive(Debug, Default)]
pub struct TerminalKeys;

impl KeySource for TerminalKeys {
    fn next_key(&mut self, timeout: Duration) -> io::Result<Option<KeyEvent>> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        match event::read()? {
            Event::Key(key) => Ok(Some(key)),
            _ => Ok(None),
        }
    }
}

/// Input thread body: read keys until game over
pub struct InputChannel<S: KeySource> {
    source: S,
    session: Session,
}

impl<S: KeySource + 'static> InputChannel<S> {
    pub fn new(source: S, session: Session) -> Self {
        Self { source, session }
    }

    pub fn run(mut self) {
        while !self.session.is_over() {
            let key = match self.source.next_key(INPUT_POLL) {
                Ok(Some(key)) => key,
                Ok(None) => continue,
                Err(err) => {
                    // Without input the run can be neither steered nor quit
                    log::error!("Input device error, ending run: {err}");
                    self.session.end();
                    break;
                }
            };
            match map_key(&key) {
                KeyAction::Intent(intent) => {
                    self.session.intents.push(intent);
                }
                KeyAction::Quit => {
                    log::info!("Quit requested");
                    self.session.end();
                }
                KeyAction::Ignore => {}
            }
        }
        log::debug!("Input channel stopped");
    }

    pub fn spawn(self) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("input".into())
            .spawn(move || self.run())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::offline_session;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    /// Replays events, then reports a device error
    struct ScriptedKeys(VecDeque<KeyEvent>);

    impl KeySource for ScriptedKeys {
        fn next_key(&mut self, _timeout: Duration) -> io::Result<Option<KeyEvent>> {
            match self.0.pop_front() {
                Some(key) => Ok(Some(key)),
                None => Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed")),
            }
        }
    }

    #[test]
    fn test_map_key_letters_case_insensitive() {
        for (c, intent) in [
            ('w', Intent::MoveUp),
            ('A', Intent::MoveLeft),
            ('s', Intent::MoveDown),
            ('D', Intent::MoveRight),
            (' ', Intent::ShiftUp),
        ] {
            assert_eq!(map_key(&press(KeyCode::Char(c))), KeyAction::Intent(intent));
        }
        assert_eq!(map_key(&press(KeyCode::Char('Q'))), KeyAction::Quit);
        assert_eq!(map_key(&press(KeyCode::Char('x'))), KeyAction::Ignore);
    }

    #[test]
    fn test_map_key_arrows_and_interrupt() {
        assert_eq!(map_key(&press(KeyCode::Up)), KeyAction::Intent(Intent::MoveUp));
        assert_eq!(map_key(&press(KeyCode::Left)), KeyAction::Intent(Intent::MoveLeft));
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(map_key(&ctrl_c), KeyAction::Quit);
        assert_eq!(map_key(&press(KeyCode::Char('c'))), KeyAction::Ignore);
    }

    #[test]
    fn test_queue_is_fifo_and_capped() {
        let queue = IntentQueue::with_capacity(3);
        assert!(queue.push(Intent::MoveLeft));
        assert!(queue.push(Intent::ShiftUp));
        assert!(queue.push(Intent::MoveRight));
        assert!(!queue.push(Intent::MoveUp));

        assert_eq!(queue.drain_up_to(2), vec![Intent::MoveLeft, Intent::ShiftUp]);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.drain_up_to(8), vec![Intent::MoveRight]);
        assert!(queue.is_empty());
        assert!(queue.drain_up_to(1).is_empty());
    }

    #[test]
    fn test_channel_queues_intents_and_quits() {
        let session = offline_session(10);
        let keys = ScriptedKeys(VecDeque::from([
            press(KeyCode::Char('a')),
            press(KeyCode::Right),
            press(KeyCode::Char('q')),
            press(KeyCode::Char('w')),
        ]));
        InputChannel::new(keys, session.clone()).run();

        assert!(session.is_over());
        assert_eq!(
            session.intents.drain_up_to(10),
            vec![Intent::MoveLeft, Intent::MoveRight]
        );
    }

    #[test]
    fn test_device_error_ends_run() {
        let session = offline_session(10);
        let keys = ScriptedKeys(VecDeque::from([press(KeyCode::Char(' '))]));
        InputChannel::new(keys, session.clone()).spawn().unwrap().join().unwrap();
        assert!(session.is_over());
        assert_eq!(session.intents.drain_up_to(10), vec![Intent::ShiftUp]);
    }
}
