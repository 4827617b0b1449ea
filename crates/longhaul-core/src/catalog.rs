//! Reward-catalog collaborator.
//!
//! The drop engine asks "which drops are unlocked at this distance" every
//! time it grants, so the provider contract is non-allocating: a borrowed
//! slice, not a fresh vector.

use longhaul_logic::drops::{unlocked_prefix_len, DropCandidate};

/// Provider of the currently-unlocked drop candidates.
pub trait RewardCatalog {
    /// Candidates unlocked at `distance_km`, ordered by unlock threshold.
    fn unlocked(&self, distance_km: f64) -> &[DropCandidate];

    /// Total number of candidates, locked ones included.
    fn candidate_count(&self) -> usize;
}

/// Fixed catalog over a sorted candidate list. The unlocked set at any
/// distance is a prefix of the sorted list, so the view is a slice.
pub struct StaticCatalog {
    candidates: Vec<DropCandidate>,
}

impl StaticCatalog {
    pub fn new(mut candidates: Vec<DropCandidate>) -> Self {
        candidates.sort_by(|a, b| {
            a.unlock_threshold
                .partial_cmp(&b.unlock_threshold)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Self { candidates }
    }

    /// Simple linear catalog: ids `0..count`, one unlock every
    /// `km_per_unlock` kilometres, id 0 unlocked from the start.
    pub fn linear(count: i32, km_per_unlock: f64) -> Self {
        let candidates = (0..count.max(0))
            .map(|id| DropCandidate {
                id,
                unlock_threshold: id as f64 * km_per_unlock,
            })
            .collect();
        Self::new(candidates)
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

impl RewardCatalog for StaticCatalog {
    fn unlocked(&self, distance_km: f64) -> &[DropCandidate] {
        let n = unlocked_prefix_len(&self.candidates, distance_km);
        &self.candidates[..n]
    }

    fn candidate_count(&self) -> usize {
        self.candidates.len()
    }
}
