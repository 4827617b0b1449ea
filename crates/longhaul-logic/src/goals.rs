//! Mission goals — kinds, tiers, mutation rules, and the claim path.
//!
//! Goals are loaded from a static catalog at startup, mutated in place by
//! progress events, and never deleted at runtime. Completion is monotonic
//! while the reward is unclaimed; once claimed, a goal is immutable.

use serde::{Deserialize, Serialize};

/// How a goal's progress is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoalKind {
    /// Running total of event deltas (e.g., gold spent).
    Accumulate,
    /// Running count of discrete events (e.g., boosts activated).
    Count,
    /// Absolute live value must reach the target (e.g., top speed).
    ReachValue,
    /// One-shot flag; completes the first time it is set.
    Unlock,
    /// Every element of a value set must reach a shared threshold.
    MultiReachEachAtLeast,
}

/// Difficulty band for a goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    Easy,
    Normal,
    Hard,
}

/// Claim-path refusals. None of these are fatal; the action is refused and
/// nothing changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimError {
    /// No goal in the catalog matches the key.
    UnknownGoal,
    /// The goal has not reached its target yet.
    NotCompleted,
    /// The reward was already granted.
    AlreadyClaimed,
}

impl std::fmt::Display for ClaimError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClaimError::UnknownGoal => write!(f, "no goal with that key"),
            ClaimError::NotCompleted => write!(f, "goal not completed"),
            ClaimError::AlreadyClaimed => write!(f, "reward already claimed"),
        }
    }
}

impl std::error::Error for ClaimError {}

/// One tracked goal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionGoal {
    /// Progress-event key this goal listens to.
    pub key: String,
    pub kind: GoalKind,
    pub tier: Tier,
    /// Display grouping, opaque to the logic.
    pub category: String,
    pub current_value: f64,
    pub target_value: f64,
    pub is_completed: bool,
    pub reward_claimed: bool,
    /// Gold granted on claim.
    pub reward_amount: i64,
}

impl MissionGoal {
    /// A goal still accepting progress mutations.
    fn mutable(&self) -> bool {
        !self.reward_claimed
    }

    fn complete_if_reached(&mut self) -> bool {
        if !self.is_completed && self.current_value >= self.target_value {
            self.is_completed = true;
            true
        } else {
            false
        }
    }

    /// Apply a delta (Accumulate/Count). Progress floors at zero. Returns
    /// true when the goal's value or completion changed.
    pub fn add(&mut self, delta: f64) -> bool {
        if !self.mutable() || !matches!(self.kind, GoalKind::Accumulate | GoalKind::Count) {
            return false;
        }
        let next = (self.current_value + delta).max(0.0);
        let changed = next != self.current_value;
        self.current_value = next;
        self.complete_if_reached() || changed
    }

    /// Set an absolute value (ReachValue). Completion never reverts even if
    /// the live value later falls below the target.
    pub fn set_value(&mut self, value: f64) -> bool {
        if !self.mutable() || self.kind != GoalKind::ReachValue {
            return false;
        }
        let changed = value != self.current_value;
        self.current_value = value;
        self.complete_if_reached() || changed
    }

    /// One-shot unlock. Idempotent; never reverts.
    pub fn unlock(&mut self) -> bool {
        if !self.mutable() || self.kind != GoalKind::Unlock || self.is_completed {
            return false;
        }
        self.current_value = 1.0;
        self.is_completed = true;
        true
    }

    /// Completed iff every element of `values` is at least `threshold`.
    /// Recorded as a single aggregate value: the count of passing elements.
    pub fn check_each_at_least(&mut self, values: &[i64], threshold: i64) -> bool {
        if !self.mutable() || self.kind != GoalKind::MultiReachEachAtLeast {
            return false;
        }
        let passing = values.iter().filter(|v| **v >= threshold).count() as f64;
        let changed = passing != self.current_value;
        self.current_value = passing;
        if !values.is_empty() && passing as usize == values.len() {
            return self.complete_if_reached_multi() || changed;
        }
        changed
    }

    fn complete_if_reached_multi(&mut self) -> bool {
        if !self.is_completed {
            self.is_completed = true;
            true
        } else {
            false
        }
    }

    /// Claim the reward. On success returns the reward amount and marks the
    /// goal immutable.
    pub fn claim(&mut self) -> Result<i64, ClaimError> {
        if self.reward_claimed {
            return Err(ClaimError::AlreadyClaimed);
        }
        if !self.is_completed {
            return Err(ClaimError::NotCompleted);
        }
        self.reward_claimed = true;
        Ok(self.reward_amount)
    }
}
