//! Drop candidates and weighted selection.
//!
//! Each resource drop has an integer id and a distance threshold at which it
//! unlocks. Selection among unlocked candidates is weighted by
//! `1 / (id + 1)^power`, biasing toward early-unlocked drops. The pick is a
//! pure function of the candidate list and a uniform roll in `[0, 1)`, so a
//! deterministic roll source makes it fully testable.

use serde::{Deserialize, Serialize};

/// One selectable resource drop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DropCandidate {
    /// Resource id, also the index into the persisted resource counts.
    pub id: i32,
    /// Distance (km) the player must have reached for this drop to appear.
    pub unlock_threshold: f64,
}

/// Selection weight for a candidate id.
pub fn weight(id: i32, power: f64) -> f64 {
    let base = (id.max(0) + 1) as f64;
    1.0 / base.powf(power)
}

/// Number of leading candidates unlocked at `distance_km`, assuming the
/// slice is sorted ascending by `unlock_threshold`.
pub fn unlocked_prefix_len(candidates: &[DropCandidate], distance_km: f64) -> usize {
    candidates
        .iter()
        .take_while(|c| c.unlock_threshold <= distance_km)
        .count()
}

/// Weighted pick over `candidates` using a uniform `roll` in `[0, 1)`.
///
/// Walks the list subtracting each weight from the scaled roll; the last
/// candidate is the fallback for floating-point edge cases, and also for a
/// degenerate (non-positive) total weight. Returns `None` only for an empty
/// list.
pub fn pick_weighted(candidates: &[DropCandidate], roll: f64, power: f64) -> Option<i32> {
    let last = candidates.last()?;

    let total: f64 = candidates.iter().map(|c| weight(c.id, power)).sum();
    if total <= 0.0 {
        return Some(last.id);
    }

    let mut r = roll.clamp(0.0, 1.0) * total;
    for c in candidates {
        r -= weight(c.id, power);
        if r <= 0.0 {
            return Some(c.id);
        }
    }
    Some(last.id)
}
