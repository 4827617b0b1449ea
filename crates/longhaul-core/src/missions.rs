//! Mission tracker.
//!
//! Holds the goal catalog, applies progress events, re-derives the ambient
//! goals from live save state once per tick, and persists on a dirty-flag /
//! interval throttle. Observers get a single payload-less notification per
//! tick in which anything changed.
//!
//! `claim` is the one path that flushes synchronously: it also mutates the
//! currency balance and must not be lost to the throttle.

use std::rc::Rc;
use std::sync::mpsc::Receiver;

use log::{debug, info};

use longhaul_logic::constants::GOAL_FLUSH_INTERVAL_MS;
use longhaul_logic::goals::{ClaimError, GoalKind, MissionGoal};

use crate::clock::Clock;
use crate::signal::ChangeSignal;
use crate::store::SaveStore;

/// Progress-event keys the core itself raises. Ambient keys are re-derived
/// from the save store every tick; event keys are pushed by gameplay code.
pub mod keys {
    /// Ambient: current gold balance.
    pub const GOLD_BALANCE: &str = "gold_balance";
    /// Ambient: current speed value.
    pub const TOP_SPEED: &str = "top_speed";
    /// Ambient: total distance traveled.
    pub const DISTANCE_KM: &str = "distance_km";
    /// Ambient: accumulated play time in seconds.
    pub const PLAY_TIME_SEC: &str = "play_time_sec";
    /// Ambient sentinel: every resource count at least the goal's target.
    pub const RESOURCE_SET: &str = "resource_set";

    /// Event: gold spent on boost purchases.
    pub const GOLD_SPENT: &str = "gold_spent";
    /// Event: boosts activated.
    pub const BOOSTS_USED: &str = "boosts_used";
}

/// Parse a goal catalog from its JSON form.
pub fn goals_from_json(json: &str) -> Result<Vec<MissionGoal>, serde_json::Error> {
    serde_json::from_str(json)
}

/// The goal-tracking aggregator.
pub struct MissionTracker {
    store: Rc<dyn SaveStore>,
    clock: Rc<dyn Clock>,
    goals: Vec<MissionGoal>,
    signal: ChangeSignal,
    dirty: bool,
    next_flush_ms: i64,
    changed_this_tick: bool,
    /// Minimum length the resource-counts array is padded to before the
    /// resource-set check, so ids never granted still count as zero.
    resource_set_size: usize,
}

impl MissionTracker {
    pub fn new(store: Rc<dyn SaveStore>, clock: Rc<dyn Clock>, goals: Vec<MissionGoal>) -> Self {
        Self {
            store,
            clock,
            goals,
            signal: ChangeSignal::new(),
            dirty: false,
            next_flush_ms: 0,
            changed_this_tick: false,
            resource_set_size: 0,
        }
    }

    /// Declare how many resource ids exist, so the resource-set goal judges
    /// the full set rather than only the ids granted so far.
    pub fn set_resource_set_size(&mut self, size: usize) {
        self.resource_set_size = size;
    }

    /// Register a change listener. One message per tick with changes.
    pub fn subscribe(&self) -> Receiver<()> {
        self.signal.subscribe()
    }

    /// Add `delta` to every unclaimed Accumulate/Count goal under `key`.
    pub fn add(&mut self, key: &str, delta: f64) {
        let mut changed = false;
        for goal in self.goals.iter_mut().filter(|g| g.key == key) {
            changed |= goal.add(delta);
        }
        if changed {
            self.mark_changed();
        }
    }

    /// Set the absolute value of every unclaimed ReachValue goal under `key`.
    pub fn set_value(&mut self, key: &str, value: f64) {
        let mut changed = false;
        for goal in self.goals.iter_mut().filter(|g| g.key == key) {
            changed |= goal.set_value(value);
        }
        if changed {
            self.mark_changed();
        }
    }

    /// One-shot unlock of every Unlock goal under `key`. Never reverts.
    pub fn set_unlocked(&mut self, key: &str) {
        let mut changed = false;
        for goal in self.goals.iter_mut().filter(|g| g.key == key) {
            changed |= goal.unlock();
        }
        if changed {
            self.mark_changed();
        }
    }

    /// Apply the all-of-N rule to every MultiReachEachAtLeast goal under
    /// `key`, using each goal's own target as the per-element threshold.
    pub fn check_each_at_least(&mut self, key: &str, values: &[i64]) {
        let mut changed = false;
        for goal in self.goals.iter_mut().filter(|g| g.key == key) {
            let threshold = goal.target_value as i64;
            changed |= goal.check_each_at_least(values, threshold);
        }
        if changed {
            self.mark_changed();
        }
    }

    /// Claim the reward of the first completed, unclaimed goal under `key`.
    /// Tiers share keys, so the walk skips entries already paid out.
    ///
    /// Grants the reward gold (saturating), flushes synchronously, and
    /// raises the change notification with this tick's batch. Returns the
    /// amount granted.
    pub fn claim(&mut self, key: &str) -> Result<i64, ClaimError> {
        let mut saw_any = false;
        let mut saw_unclaimed = false;
        let mut found = None;
        for (i, goal) in self.goals.iter().enumerate().filter(|(_, g)| g.key == key) {
            saw_any = true;
            if goal.is_completed && !goal.reward_claimed {
                found = Some(i);
                break;
            }
            if !goal.reward_claimed {
                saw_unclaimed = true;
            }
        }
        let Some(i) = found else {
            return Err(if !saw_any {
                ClaimError::UnknownGoal
            } else if saw_unclaimed {
                ClaimError::NotCompleted
            } else {
                ClaimError::AlreadyClaimed
            });
        };
        let amount = self.goals[i].claim()?;

        self.store.add_gold_saturating(amount);
        self.store.flush_now();
        self.dirty = false;
        self.changed_this_tick = true;
        info!("goal '{}' claimed for {} gold", key, amount);
        Ok(amount)
    }

    /// Re-derive the ambient goals from live save state. Once per tick,
    /// before `end_tick`; all changes batch into the one notification.
    pub fn auto_track(&mut self) {
        let gold = self.store.gold() as f64;
        let speed = self.store.speed();
        let distance = self.store.distance_km();
        let play_time = self.store.play_time_sec();
        let mut counts = self.store.resource_counts();
        if counts.len() < self.resource_set_size {
            counts.resize(self.resource_set_size, 0);
        }

        self.set_value(keys::GOLD_BALANCE, gold);
        self.set_value(keys::TOP_SPEED, speed);
        self.set_value(keys::DISTANCE_KM, distance);
        self.set_value(keys::PLAY_TIME_SEC, play_time);
        self.check_each_at_least(keys::RESOURCE_SET, &counts);
    }

    /// Close out the tick: raise at most one notification, and flush if the
    /// throttle window has expired.
    pub fn end_tick(&mut self) {
        if self.changed_this_tick {
            self.signal.raise();
            self.changed_this_tick = false;
        }

        let now = self.clock.now_ms();
        if self.dirty && now >= self.next_flush_ms {
            self.store.flush_now();
            self.dirty = false;
            debug!("goal state flushed");
        }
    }

    fn mark_changed(&mut self) {
        self.changed_this_tick = true;
        // The first mutation of a burst opens the flush window; later
        // mutations in the window collapse into the same write.
        if !self.dirty {
            self.dirty = true;
            self.next_flush_ms = self.clock.now_ms() + GOAL_FLUSH_INTERVAL_MS;
        }
    }

    pub fn goals(&self) -> &[MissionGoal] {
        &self.goals
    }

    pub fn goal(&self, key: &str) -> Option<&MissionGoal> {
        self.goals.iter().find(|g| g.key == key)
    }

    /// Replace the goal list, for snapshot restore.
    pub fn restore_goals(&mut self, goals: Vec<MissionGoal>) {
        self.goals = goals;
        self.dirty = false;
        self.changed_this_tick = false;
    }

    /// Goals of a kind, completed, claimed - small helpers for UI queries.
    pub fn completed_count(&self) -> usize {
        self.goals.iter().filter(|g| g.is_completed).count()
    }

    pub fn claimable_count(&self) -> usize {
        self.goals
            .iter()
            .filter(|g| g.is_completed && !g.reward_claimed)
            .count()
    }

    /// Whether any goal of `kind` exists under `key` (catalog sanity).
    pub fn has_goal(&self, key: &str, kind: GoalKind) -> bool {
        self.goals.iter().any(|g| g.key == key && g.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::store::MemoryStore;
    use longhaul_logic::goals::Tier;
    use longhaul_logic::constants::GOAL_FLUSH_INTERVAL_MS;

    fn goal(key: &str, kind: GoalKind, target: f64, reward: i64) -> MissionGoal {
        MissionGoal {
            key: key.into(),
            kind,
            tier: Tier::Normal,
            category: "test".into(),
            current_value: 0.0,
            target_value: target,
            is_completed: false,
            reward_claimed: false,
            reward_amount: reward,
        }
    }

    fn setup(goals: Vec<MissionGoal>) -> (Rc<MemoryStore>, Rc<FixedClock>, MissionTracker) {
        let store = Rc::new(MemoryStore::new());
        let clock = Rc::new(FixedClock::new(0));
        let tracker = MissionTracker::new(store.clone(), clock.clone(), goals);
        (store, clock, tracker)
    }

    #[test]
    fn test_one_notification_per_tick() {
        let (_store, _clock, mut tracker) =
            setup(vec![goal("gold_spent", GoalKind::Accumulate, 100.0, 10)]);
        let rx = tracker.subscribe();

        tracker.add("gold_spent", 10.0);
        tracker.add("gold_spent", 20.0);
        tracker.end_tick();
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err(), "many mutations, one message");

        tracker.end_tick();
        assert!(rx.try_recv().is_err(), "no change, no message");
    }

    #[test]
    fn test_flush_throttle_collapses_bursts() {
        let (store, clock, mut tracker) =
            setup(vec![goal("gold_spent", GoalKind::Accumulate, 1e9, 10)]);

        for _ in 0..10 {
            tracker.add("gold_spent", 1.0);
            tracker.end_tick();
        }
        assert_eq!(store.flush_count(), 0, "throttle window still open");

        clock.advance_ms(GOAL_FLUSH_INTERVAL_MS);
        tracker.add("gold_spent", 1.0);
        tracker.end_tick();
        assert_eq!(store.flush_count(), 1, "one write for the whole burst");

        tracker.end_tick();
        assert_eq!(store.flush_count(), 1, "clean state does not flush");
    }

    #[test]
    fn test_claim_flushes_immediately_and_pays() {
        let (store, _clock, mut tracker) =
            setup(vec![goal("first_drive", GoalKind::Unlock, 1.0, 250)]);
        let rx = tracker.subscribe();

        assert_eq!(tracker.claim("first_drive"), Err(ClaimError::NotCompleted));
        assert_eq!(tracker.claim("missing"), Err(ClaimError::UnknownGoal));

        tracker.set_unlocked("first_drive");
        let amount = tracker.claim("first_drive").unwrap();
        assert_eq!(amount, 250);
        assert_eq!(store.gold(), 250);
        assert_eq!(store.flush_count(), 1, "claim bypasses the throttle");

        tracker.end_tick();
        assert!(rx.try_recv().is_ok());

        assert_eq!(
            tracker.claim("first_drive"),
            Err(ClaimError::AlreadyClaimed)
        );
    }

    #[test]
    fn test_claim_reward_saturates_gold() {
        let (store, _clock, mut tracker) =
            setup(vec![goal("big", GoalKind::Unlock, 1.0, i64::MAX)]);
        store.set_gold(10);
        tracker.set_unlocked("big");
        tracker.claim("big").unwrap();
        assert_eq!(store.gold(), i64::MAX);
    }

    #[test]
    fn test_auto_track_ambient_goals() {
        let (store, _clock, mut tracker) = setup(vec![
            goal(keys::TOP_SPEED, GoalKind::ReachValue, 100.0, 10),
            goal(keys::DISTANCE_KM, GoalKind::ReachValue, 50.0, 10),
            goal(keys::RESOURCE_SET, GoalKind::MultiReachEachAtLeast, 2.0, 10),
        ]);

        store.set_speed(120.0);
        store.set_distance_km(10.0);
        store.add_resource(0, 2);
        store.add_resource(1, 1);

        tracker.auto_track();
        assert!(tracker.goal(keys::TOP_SPEED).unwrap().is_completed);
        assert!(!tracker.goal(keys::DISTANCE_KM).unwrap().is_completed);
        assert!(!tracker.goal(keys::RESOURCE_SET).unwrap().is_completed);

        store.add_resource(1, 1);
        tracker.auto_track();
        assert!(tracker.goal(keys::RESOURCE_SET).unwrap().is_completed);
    }

    #[test]
    fn test_completion_sticks_when_value_falls() {
        let (store, _clock, mut tracker) =
            setup(vec![goal(keys::TOP_SPEED, GoalKind::ReachValue, 100.0, 10)]);

        store.set_speed(120.0);
        tracker.auto_track();
        store.set_speed(30.0);
        tracker.auto_track();

        let g = tracker.goal(keys::TOP_SPEED).unwrap();
        assert!(g.is_completed);
        assert_eq!(g.current_value, 30.0);
    }

    #[test]
    fn test_multiple_goals_share_a_key() {
        let (_store, _clock, mut tracker) = setup(vec![
            goal("gold_spent", GoalKind::Accumulate, 10.0, 5),
            goal("gold_spent", GoalKind::Accumulate, 100.0, 50),
        ]);

        tracker.add("gold_spent", 20.0);
        assert_eq!(tracker.completed_count(), 1);
        assert_eq!(tracker.claimable_count(), 1);

        tracker.add("gold_spent", 80.0);
        assert_eq!(tracker.completed_count(), 2);
    }

    #[test]
    fn test_claim_walks_tiers_under_shared_key() {
        let (store, _clock, mut tracker) = setup(vec![
            goal(keys::DISTANCE_KM, GoalKind::ReachValue, 10.0, 100),
            goal(keys::DISTANCE_KM, GoalKind::ReachValue, 100.0, 750),
        ]);

        store.set_distance_km(150.0);
        tracker.auto_track();
        assert_eq!(tracker.claimable_count(), 2);

        // Each claim pays the next unclaimed tier, not the first match.
        assert_eq!(tracker.claim(keys::DISTANCE_KM), Ok(100));
        assert_eq!(tracker.claim(keys::DISTANCE_KM), Ok(750));
        assert_eq!(store.gold(), 850);
        assert_eq!(
            tracker.claim(keys::DISTANCE_KM),
            Err(ClaimError::AlreadyClaimed)
        );
    }

    #[test]
    fn test_claim_reports_incomplete_tier_after_lower_tier_paid() {
        let (store, _clock, mut tracker) = setup(vec![
            goal(keys::DISTANCE_KM, GoalKind::ReachValue, 10.0, 100),
            goal(keys::DISTANCE_KM, GoalKind::ReachValue, 100.0, 750),
        ]);

        store.set_distance_km(20.0);
        tracker.auto_track();
        assert_eq!(tracker.claim(keys::DISTANCE_KM), Ok(100));
        assert_eq!(
            tracker.claim(keys::DISTANCE_KM),
            Err(ClaimError::NotCompleted),
            "unclaimed higher tier still pending"
        );
    }

    #[test]
    fn test_goals_from_json() {
        let json = r#"[{
            "key": "top_speed",
            "kind": "ReachValue",
            "tier": "Easy",
            "category": "driving",
            "current_value": 0.0,
            "target_value": 80.0,
            "is_completed": false,
            "reward_claimed": false,
            "reward_amount": 100
        }]"#;
        let goals = goals_from_json(json).unwrap();
        assert_eq!(goals.len(), 1);
        assert_eq!(goals[0].kind, GoalKind::ReachValue);
        assert_eq!(goals[0].tier, Tier::Easy);
    }
}
