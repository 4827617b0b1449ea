//! Tuning constants shared by the logic and core crates.
//!
//! Values here are policy, not mechanism: engines read them but never
//! redefine them. Keep units in the names.

/// Shortest boost duration accepted at activation, seconds.
pub const BOOST_DURATION_MIN_SEC: f64 = 1.0;

/// Longest boost duration accepted at activation, seconds.
pub const BOOST_DURATION_MAX_SEC: f64 = 45.0;

/// Absolute tolerance for comparing shared float values.
/// A restore only runs when the live value still matches the boosted value
/// within this bound.
pub const VALUE_EPSILON: f64 = 1e-4;

/// Exponent for drop-candidate weights: weight = 1 / (id + 1)^power.
/// Higher values bias harder toward early-unlocked (low-id) drops.
pub const DROP_WEIGHT_POWER: f64 = 1.5;

/// Maximum drops granted in a single tick. Excess accumulation carries to
/// the next tick instead of bursting downstream systems after a long pause.
pub const DROPS_PER_TICK_CAP: u32 = 8;

/// Maximum visual effects spawned in a single tick.
pub const EFFECTS_PER_TICK_CAP: u32 = 3;

/// A visual effect is attempted only on every Nth grant.
pub const EFFECT_EVERY_NTH_GRANT: u64 = 4;

/// Minimum interval between throttled goal-state flushes, milliseconds.
pub const GOAL_FLUSH_INTERVAL_MS: i64 = 5_000;

/// Growth factor applied to the boost upgrade price per purchased level.
pub const BOOST_PRICE_GROWTH: f64 = 1.6;
