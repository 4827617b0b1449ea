//! Speed-boost engine.
//!
//! One timed multiplier over the shared speed value, expressed entirely in
//! absolute epoch timestamps so it survives process restarts. The state
//! machine is `Idle -> Active -> Cooldown -> Idle`; cooldown starts only
//! when the active window closes.
//!
//! The engine does not exclusively own the speed value. Activation snapshots
//! a baseline; the restore after the window compares the live value against
//! the boosted value first, and leaves any external change untouched.
//! Restart recovery recomputes the boosted value from the *persisted*
//! baseline - the live value may be a fresh-boot default and cannot be
//! trusted.

use std::rc::Rc;

use log::{debug, info};

use longhaul_logic::boost::{boosted_value, clamp_duration, values_match, BoostPhase};

use crate::clock::Clock;
use crate::scheduler::DeadlineScheduler;
use crate::store::SaveStore;

/// Multiplier percent gained per purchased upgrade level.
const UPGRADE_MULTIPLIER_STEP: f64 = 10.0;

/// Activation refusals. The action is refused; nothing changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivateError {
    NotUnlocked,
    AlreadyActive,
    OnCooldown,
}

impl std::fmt::Display for ActivateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActivateError::NotUnlocked => write!(f, "boost not unlocked"),
            ActivateError::AlreadyActive => write!(f, "boost already active"),
            ActivateError::OnCooldown => write!(f, "boost on cooldown"),
        }
    }
}

impl std::error::Error for ActivateError {}

/// Upgrade-purchase refusals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpgradeError {
    NotEnoughGold,
}

impl std::fmt::Display for UpgradeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpgradeError::NotEnoughGold => write!(f, "not enough gold"),
        }
    }
}

impl std::error::Error for UpgradeError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BoostTimer {
    ActiveEnd,
    CooldownEnd,
}

/// The timed-multiplier engine. Leaf component; shares state with the rest
/// of the core only through the save store.
pub struct BoostEngine {
    store: Rc<dyn SaveStore>,
    clock: Rc<dyn Clock>,
    timers: DeadlineScheduler<BoostTimer>,
}

impl BoostEngine {
    pub fn new(store: Rc<dyn SaveStore>, clock: Rc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            timers: DeadlineScheduler::new(),
        }
    }

    /// Attempt to start the boost.
    ///
    /// On success: snapshots the live speed as the baseline, writes the
    /// boosted speed, and persists the absolute active deadline.
    pub fn try_activate(&mut self) -> Result<(), ActivateError> {
        if !self.store.boost_unlocked() {
            return Err(ActivateError::NotUnlocked);
        }

        let now = self.clock.now_ms();
        let mut record = self.store.boost_record();
        match record.phase(now) {
            BoostPhase::Active => return Err(ActivateError::AlreadyActive),
            BoostPhase::Cooldown => return Err(ActivateError::OnCooldown),
            BoostPhase::Idle => {}
        }

        let base = self.store.speed();
        let duration = clamp_duration(record.duration_sec);
        let boosted = boosted_value(base, record.multiplier_percent);

        record.base_value = base;
        record.active_until_ms = now + (duration * 1000.0) as i64;
        record.cooldown_until_ms = 0;

        self.store.set_speed(boosted);
        self.store.set_boost_record(record.clone());
        self.timers
            .schedule(BoostTimer::ActiveEnd, record.active_until_ms);

        info!(
            "boost activated: {} -> {} for {}s",
            base, boosted, duration
        );
        Ok(())
    }

    /// Run due transitions. Called once per tick.
    pub fn tick(&mut self) {
        let now = self.clock.now_ms();
        for timer in self.timers.drain_due(now) {
            match timer {
                BoostTimer::ActiveEnd => self.end_active(now),
                BoostTimer::CooldownEnd => self.end_cooldown(),
            }
        }
    }

    /// `Active -> Cooldown`: restore the baseline iff the live value still
    /// matches the boosted value, then open the cooldown window.
    fn end_active(&mut self, now_ms: i64) {
        let mut record = self.store.boost_record();
        let boosted = boosted_value(record.base_value, record.multiplier_percent);

        if values_match(self.store.speed(), boosted) {
            self.store.set_speed(record.base_value);
        } else {
            debug!("boost restore skipped: speed changed externally");
        }

        if record.cooldown_sec > 0.0 {
            record.cooldown_until_ms = now_ms + (record.cooldown_sec * 1000.0) as i64;
            self.timers
                .schedule(BoostTimer::CooldownEnd, record.cooldown_until_ms);
        } else {
            record.cooldown_until_ms = 0;
        }
        record.clear_active();
        self.store.set_boost_record(record);
    }

    /// `Cooldown -> Idle`: clear the deadline. No value mutation.
    fn end_cooldown(&mut self) {
        let mut record = self.store.boost_record();
        record.cooldown_until_ms = 0;
        self.store.set_boost_record(record);
    }

    /// Reconcile persisted deadlines with the current wall clock after a
    /// process (re)start.
    ///
    /// A still-open active window is reapplied from the persisted baseline
    /// and rescheduled at its original absolute deadline, so a restart
    /// neither double-applies the boost nor extends it. A window that
    /// expired while the process was down gets its pending restore run now.
    pub fn recover(&mut self) {
        let now = self.clock.now_ms();
        let mut record = self.store.boost_record();

        if record.active_until_ms != 0 {
            if record.active_until_ms > now {
                // Recompute from the persisted base, not the live value.
                let boosted = boosted_value(record.base_value, record.multiplier_percent);
                self.store.set_speed(boosted);
                self.timers
                    .schedule(BoostTimer::ActiveEnd, record.active_until_ms);
                info!(
                    "boost recovered: {:.1}s remaining",
                    record.remaining_active_sec(now)
                );
                return;
            }

            // Expired while not running; the restore never happened.
            if record.base_value > 0.0 {
                self.store.set_speed(record.base_value);
                info!("boost expired offline, baseline restored");
            }
            record.clear_active();
            self.store.set_boost_record(record.clone());
        }

        if record.cooldown_until_ms != 0 {
            if record.cooldown_until_ms > now {
                self.timers
                    .schedule(BoostTimer::CooldownEnd, record.cooldown_until_ms);
            } else {
                self.end_cooldown();
            }
        }
    }

    /// Drop all pending transitions without running their effects. Persisted
    /// state stays exactly as the last transition left it, so the next
    /// `recover` picks up where this left off.
    pub fn cancel_pending(&mut self) {
        self.timers.clear();
    }

    pub fn is_active(&self) -> bool {
        self.store.boost_record().phase(self.clock.now_ms()) == BoostPhase::Active
    }

    pub fn remaining_active_seconds(&self) -> f64 {
        self.store
            .boost_record()
            .remaining_active_sec(self.clock.now_ms())
    }

    pub fn remaining_cooldown_seconds(&self) -> f64 {
        self.store
            .boost_record()
            .remaining_cooldown_sec(self.clock.now_ms())
    }

    /// Current upgrade price.
    pub fn upgrade_price(&self) -> i64 {
        self.store.boost_price()
    }

    /// Buy one upgrade level: spends gold, raises the multiplier one step,
    /// grows the price geometrically (saturating). Returns the gold spent.
    pub fn try_buy_upgrade(&mut self) -> Result<i64, UpgradeError> {
        let price = self.store.boost_price();
        if !self.store.try_spend_gold(price) {
            return Err(UpgradeError::NotEnoughGold);
        }

        let mut record = self.store.boost_record();
        record.multiplier_percent += UPGRADE_MULTIPLIER_STEP;
        self.store.set_boost_record(record);
        self.store.set_boost_level(self.store.boost_level() + 1);

        let grown = price as f64 * longhaul_logic::constants::BOOST_PRICE_GROWTH;
        let next_price = if grown >= i64::MAX as f64 {
            i64::MAX
        } else {
            grown as i64
        };
        self.store.set_boost_price(next_price);

        info!("boost upgraded to level {}", self.store.boost_level());
        Ok(price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::store::{MemoryStore, SaveStore};
    use longhaul_logic::boost::BoostRecord;

    fn setup(speed: f64) -> (Rc<MemoryStore>, Rc<FixedClock>, BoostEngine) {
        let store = Rc::new(MemoryStore::new());
        store.set_speed(speed);
        store.set_boost_unlocked(true);
        store.set_boost_record(BoostRecord {
            multiplier_percent: 50.0,
            duration_sec: 10.0,
            cooldown_sec: 20.0,
            ..Default::default()
        });
        let clock = Rc::new(FixedClock::new(1_000_000));
        let engine = BoostEngine::new(store.clone(), clock.clone());
        (store, clock, engine)
    }

    #[test]
    fn test_activation_boosts_and_persists_deadline() {
        let (store, clock, mut engine) = setup(10.0);
        engine.try_activate().unwrap();

        assert!((store.speed() - 15.0).abs() < 1e-9);
        let record = store.boost_record();
        assert_eq!(record.active_until_ms, 1_000_000 + 10_000);
        assert_eq!(record.base_value, 10.0);
        assert!(engine.is_active());
        assert!((engine.remaining_active_seconds() - 10.0).abs() < 1e-9);

        clock.advance_sec(4.0);
        assert!((engine.remaining_active_seconds() - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_activation_refusals() {
        let (store, clock, mut engine) = setup(10.0);

        store.set_boost_unlocked(false);
        assert_eq!(engine.try_activate(), Err(ActivateError::NotUnlocked));

        store.set_boost_unlocked(true);
        engine.try_activate().unwrap();
        assert_eq!(engine.try_activate(), Err(ActivateError::AlreadyActive));

        clock.advance_sec(10.0);
        engine.tick();
        assert_eq!(engine.try_activate(), Err(ActivateError::OnCooldown));
    }

    #[test]
    fn test_duration_elapses_restores_and_cools_down() {
        let (store, clock, mut engine) = setup(10.0);
        engine.try_activate().unwrap();

        clock.advance_sec(10.0);
        engine.tick();

        assert!((store.speed() - 10.0).abs() < 1e-9);
        let record = store.boost_record();
        assert_eq!(record.active_until_ms, 0);
        assert_eq!(record.base_value, 0.0);
        assert!((engine.remaining_cooldown_seconds() - 20.0).abs() < 1e-9);

        clock.advance_sec(20.0);
        engine.tick();
        assert_eq!(store.boost_record().cooldown_until_ms, 0);
        engine.try_activate().unwrap();
    }

    #[test]
    fn test_external_change_is_not_clobbered() {
        let (store, clock, mut engine) = setup(10.0);
        engine.try_activate().unwrap();

        // Something else (an upgrade, say) rewrote the speed mid-window.
        store.set_speed(40.0);

        clock.advance_sec(10.0);
        engine.tick();
        assert_eq!(store.speed(), 40.0, "restore must not overwrite");
        assert_eq!(store.boost_record().active_until_ms, 0);
    }

    #[test]
    fn test_duration_clamped_at_activation() {
        let (store, _clock, mut engine) = setup(10.0);
        let mut record = store.boost_record();
        record.duration_sec = 300.0;
        store.set_boost_record(record);

        engine.try_activate().unwrap();
        assert_eq!(store.boost_record().active_until_ms, 1_000_000 + 45_000);
    }

    #[test]
    fn test_restart_recovery_mid_window() {
        let (store, clock, mut engine) = setup(10.0);
        engine.try_activate().unwrap();
        let deadline = store.boost_record().active_until_ms;

        clock.advance_sec(4.0);
        // Simulate restart: live speed resets to a default, timers are gone.
        store.set_speed(3.0);
        let mut fresh = BoostEngine::new(store.clone(), clock.clone());
        fresh.recover();

        // Same boosted value, same absolute deadline: no double-apply, no
        // duration extension.
        assert!((store.speed() - 15.0).abs() < 1e-9);
        assert_eq!(store.boost_record().active_until_ms, deadline);
        assert!((fresh.remaining_active_seconds() - 6.0).abs() < 1e-9);

        clock.advance_sec(6.0);
        fresh.tick();
        assert!((store.speed() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_restart_recovery_after_offline_expiry() {
        let (store, clock, mut engine) = setup(10.0);
        engine.try_activate().unwrap();

        clock.advance_sec(120.0);
        store.set_speed(3.0); // stale default after restart
        let mut fresh = BoostEngine::new(store.clone(), clock.clone());
        fresh.recover();

        assert!((store.speed() - 10.0).abs() < 1e-9, "pending restore ran");
        let record = store.boost_record();
        assert_eq!(record.active_until_ms, 0);
        assert_eq!(record.base_value, 0.0);
        // Expiry happened offline, so no cooldown was ever opened.
        assert_eq!(record.cooldown_until_ms, 0);
    }

    #[test]
    fn test_restart_recovery_resumes_cooldown() {
        let (store, clock, mut engine) = setup(10.0);
        engine.try_activate().unwrap();
        clock.advance_sec(10.0);
        engine.tick();

        clock.advance_sec(5.0);
        let mut fresh = BoostEngine::new(store.clone(), clock.clone());
        fresh.recover();
        assert_eq!(fresh.try_activate(), Err(ActivateError::OnCooldown));
        assert!((fresh.remaining_cooldown_seconds() - 15.0).abs() < 1e-9);

        clock.advance_sec(15.0);
        fresh.tick();
        fresh.try_activate().unwrap();
    }

    #[test]
    fn test_cancel_pending_leaves_state_recoverable() {
        let (store, clock, mut engine) = setup(10.0);
        engine.try_activate().unwrap();
        engine.cancel_pending();

        clock.advance_sec(4.0);
        engine.tick();
        // The transition never ran; persisted state is as if just activated.
        assert!((store.speed() - 15.0).abs() < 1e-9);
        assert!(store.boost_record().active_until_ms > 0);

        let mut fresh = BoostEngine::new(store.clone(), clock.clone());
        fresh.recover();
        clock.advance_sec(6.0);
        fresh.tick();
        assert!((store.speed() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_buy_upgrade_spends_and_grows_price() {
        let (store, _clock, mut engine) = setup(10.0);
        store.set_gold(150);
        store.set_boost_price(100);

        assert_eq!(engine.try_buy_upgrade(), Ok(100));
        assert_eq!(store.gold(), 50);
        assert_eq!(store.boost_level(), 1);
        assert_eq!(store.boost_record().multiplier_percent, 60.0);
        assert_eq!(store.boost_price(), 160);

        assert_eq!(engine.try_buy_upgrade(), Err(UpgradeError::NotEnoughGold));
        assert_eq!(store.gold(), 50);
    }

    #[test]
    fn test_upgrade_price_saturates() {
        let (store, _clock, mut engine) = setup(10.0);
        store.set_gold(i64::MAX);
        store.set_boost_price(i64::MAX);

        engine.try_buy_upgrade().unwrap();
        assert_eq!(store.boost_price(), i64::MAX, "price growth saturates");
        assert_eq!(store.gold(), 0);
    }
}
