//! Wall-clock abstraction.
//!
//! All persisted timers are absolute epoch-millisecond deadlines, so the one
//! thing engines need from the environment is "what time is it". Routing
//! that through a trait lets tests and the headless harness pin time
//! exactly.

use std::cell::Cell;

/// Source of the current wall-clock time.
pub trait Clock {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64;
}

/// Real wall clock.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }
}

/// Manually advanced clock for tests and the simtest harness.
#[derive(Default)]
pub struct FixedClock {
    ms: Cell<i64>,
}

impl FixedClock {
    pub fn new(start_ms: i64) -> Self {
        Self {
            ms: Cell::new(start_ms),
        }
    }

    pub fn set(&self, ms: i64) {
        self.ms.set(ms);
    }

    pub fn advance_ms(&self, delta_ms: i64) {
        self.ms.set(self.ms.get() + delta_ms);
    }

    pub fn advance_sec(&self, delta_sec: f64) {
        self.advance_ms((delta_sec * 1000.0) as i64);
    }
}

impl Clock for FixedClock {
    fn now_ms(&self) -> i64 {
        self.ms.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_advances() {
        let clock = FixedClock::new(1_000);
        assert_eq!(clock.now_ms(), 1_000);
        clock.advance_ms(500);
        assert_eq!(clock.now_ms(), 1_500);
        clock.advance_sec(2.5);
        assert_eq!(clock.now_ms(), 4_000);
    }

    #[test]
    fn test_system_clock_is_past_2020() {
        // 2020-01-01 in epoch ms
        assert!(SystemClock.now_ms() > 1_577_836_800_000);
    }
}
