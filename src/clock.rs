//! Game clock
//!
//! The simulation reads time as a monotonic `Duration` since the run began,
//! so tests can drive it with [`ManualClock`] instead of sleeping.

use std::time::{Duration, Instant};

use parking_lot::Mutex;

pub trait Clock: Send + Sync {
    /// Monotonic time since the clock's origin
    fn now(&self) -> Duration;
}

/// Wall-clock time backed by `Instant`
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn start() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Hand-advanced clock for deterministic tests
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, dt: Duration) {
        let mut now = self.now.lock();
        *now = now.saturating_add(dt);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock()
    }
}

/// Fixed-rate pacing: yields the time left until the next deadline
#[derive(Debug, Clone, Copy)]
pub struct Pacer {
    period: Duration,
    next: Duration,
}

impl Pacer {
    pub fn new(period: Duration, now: Duration) -> Self {
        Self {
            period,
            next: now + period,
        }
    }

    /// Time to sleep before the next pass. Deadlines missed by more than a
    /// whole period are skipped rather than replayed.
    pub fn wait_time(&mut self, now: Duration) -> Duration {
        let wait = self.next.saturating_sub(now);
        self.next += self.period;
        if self.next < now {
            self.next = now + self.period;
        }
        wait
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new();
        assert_eq!(clock.now(), Duration::ZERO);
        clock.advance(Duration::from_millis(30));
        clock.advance(Duration::from_millis(20));
        assert_eq!(clock.now(), Duration::from_millis(50));
    }

    #[test]
    fn test_monotonic_clock_never_goes_back() {
        let clock = MonotonicClock::start();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }

    #[test]
    fn test_pacer_targets_fixed_rate() {
        let period = Duration::from_millis(20);
        let mut pacer = Pacer::new(period, Duration::ZERO);
        // Pass took 5ms: sleep the remaining 15ms
        assert_eq!(pacer.wait_time(Duration::from_millis(5)), Duration::from_millis(15));
        // Next deadline is 40ms
        assert_eq!(pacer.wait_time(Duration::from_millis(25)), Duration::from_millis(15));
    }

    #[test]
    fn test_pacer_skips_missed_deadlines() {
        let period = Duration::from_millis(20);
        let mut pacer = Pacer::new(period, Duration::ZERO);
        assert_eq!(pacer.wait_time(Duration::from_millis(500)), Duration::ZERO);
        assert_eq!(pacer.wait_time(Duration::from_millis(505)), Duration::from_millis(15));
    }
}
