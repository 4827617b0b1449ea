//! Timed speed-boost record and the pure math around it.
//!
//! A boost is persisted entirely as absolute epoch-millisecond deadlines, so
//! it stays valid across process restarts without any elapsed-time counter.
//! The record also snapshots the shared value at activation time; the owning
//! engine restores that baseline only if the live value still matches the
//! boosted value (an external actor may have changed it mid-window).

use serde::{Deserialize, Serialize};

use crate::constants::{BOOST_DURATION_MAX_SEC, BOOST_DURATION_MIN_SEC, VALUE_EPSILON};

/// Persisted state of one boost slot.
///
/// `active_until_ms == 0` means inactive; `cooldown_until_ms == 0` means no
/// cooldown. At most one of the two windows is open at any instant —
/// cooldown starts only when the active window closes. `base_value` is
/// meaningful only while the active window is open (or when recovery finds
/// a restore that never ran).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoostRecord {
    /// Epoch ms at which the active window closes. 0 = inactive.
    pub active_until_ms: i64,
    /// Epoch ms at which the cooldown window closes. 0 = no cooldown.
    pub cooldown_until_ms: i64,
    /// Shared value snapshotted at activation, to restore afterwards.
    pub base_value: f64,
    /// Boost strength: 50.0 means +50%.
    pub multiplier_percent: f64,
    /// Active-window length, seconds. Clamped before use.
    pub duration_sec: f64,
    /// Cooldown length after the active window, seconds.
    pub cooldown_sec: f64,
}

/// Phase of a boost slot at a given instant, derived from its deadlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoostPhase {
    Idle,
    Active,
    Cooldown,
}

impl BoostRecord {
    /// Derive the phase at `now_ms` from the persisted deadlines alone.
    pub fn phase(&self, now_ms: i64) -> BoostPhase {
        if self.active_until_ms > now_ms {
            BoostPhase::Active
        } else if self.cooldown_until_ms > now_ms {
            BoostPhase::Cooldown
        } else {
            BoostPhase::Idle
        }
    }

    /// Seconds left in the active window, 0 when not active.
    pub fn remaining_active_sec(&self, now_ms: i64) -> f64 {
        remaining_sec(self.active_until_ms, now_ms)
    }

    /// Seconds left in the cooldown window, 0 when not cooling down.
    pub fn remaining_cooldown_sec(&self, now_ms: i64) -> f64 {
        remaining_sec(self.cooldown_until_ms, now_ms)
    }

    /// Zero the active window and its baseline snapshot.
    pub fn clear_active(&mut self) {
        self.active_until_ms = 0;
        self.base_value = 0.0;
    }
}

fn remaining_sec(until_ms: i64, now_ms: i64) -> f64 {
    if until_ms > now_ms {
        (until_ms - now_ms) as f64 / 1000.0
    } else {
        0.0
    }
}

/// Clamp a configured duration to the accepted activation range.
pub fn clamp_duration(duration_sec: f64) -> f64 {
    duration_sec.clamp(BOOST_DURATION_MIN_SEC, BOOST_DURATION_MAX_SEC)
}

/// Value of `base` with a percentage boost applied.
pub fn boosted_value(base: f64, multiplier_percent: f64) -> f64 {
    base * (1.0 + multiplier_percent / 100.0)
}

/// Absolute-tolerance comparison for shared float values.
pub fn values_match(a: f64, b: f64) -> bool {
    (a - b).abs() <= VALUE_EPSILON
}
