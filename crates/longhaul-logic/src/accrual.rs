//! Fractional accumulator converting a continuous rate into discrete units.
//!
//! The accumulator gains `Δt · rate` per tick and is consumed in whole-unit
//! steps. It never goes negative and never drops fractional progress, so the
//! long-run grant count matches the integral of the rate with no drift.

use serde::{Deserialize, Serialize};

/// Fractional progress toward the next whole drop.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Accumulator {
    fraction: f64,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current fractional value (for inspection and persistence).
    pub fn fraction(&self) -> f64 {
        self.fraction
    }

    /// Advance by `dt_sec` at `rate_per_sec`. Non-positive inputs are
    /// ignored rather than clamped, so a bad rate can never drain progress.
    pub fn advance(&mut self, dt_sec: f64, rate_per_sec: f64) {
        if dt_sec > 0.0 && rate_per_sec > 0.0 {
            self.fraction += dt_sec * rate_per_sec;
        }
    }

    /// Whether a whole unit is available to consume.
    pub fn has_unit(&self) -> bool {
        self.fraction >= 1.0
    }

    /// Consume one whole unit. Returns false (and leaves the value alone)
    /// when less than one unit has accumulated.
    pub fn consume_unit(&mut self) -> bool {
        if self.fraction >= 1.0 {
            self.fraction -= 1.0;
            true
        } else {
            false
        }
    }

    /// Restore a persisted fraction, rejecting negatives.
    pub fn restore(fraction: f64) -> Self {
        Self {
            fraction: fraction.max(0.0),
        }
    }
}
