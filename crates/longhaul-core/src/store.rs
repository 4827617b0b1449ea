//! Shared save-state collaborator.
//!
//! All three engines read and write the same persisted scalars through the
//! [`SaveStore`] trait; none owns the state exclusively. [`MemoryStore`] is
//! the provided default: an in-process store with interior mutability whose
//! whole state serializes for the binary snapshot in [`crate::persistence`].

use std::cell::{Cell, RefCell};

use serde::{Deserialize, Serialize};

use longhaul_logic::boost::BoostRecord;

/// Named-field access to the persisted game state.
///
/// Gold arithmetic saturates at the representable bounds; it never wraps.
/// `flush_now` is a synchronous durable write - the mission tracker calls it
/// on claim and on throttle expiry.
pub trait SaveStore {
    fn gold(&self) -> i64;
    fn set_gold(&self, gold: i64);
    /// Add (or with a negative delta, remove) gold, saturating.
    fn add_gold_saturating(&self, delta: i64);
    /// Spend `amount` gold if the balance covers it. Returns false and
    /// leaves the balance alone otherwise.
    fn try_spend_gold(&self, amount: i64) -> bool;

    /// The shared rate value the boost temporarily elevates (km/h).
    fn speed(&self) -> f64;
    fn set_speed(&self, speed: f64);

    fn distance_km(&self) -> f64;
    fn set_distance_km(&self, km: f64);
    fn add_distance_km(&self, km: f64);

    /// Drop-accrual rate, units per second.
    fn income_per_second(&self) -> f64;
    fn set_income_per_second(&self, rate: f64);

    fn play_time_sec(&self) -> f64;
    fn add_play_time_sec(&self, dt: f64);

    fn resource_count(&self, id: i32) -> i64;
    fn add_resource(&self, id: i32, n: i64);
    fn resource_counts(&self) -> Vec<i64>;
    fn resource_total(&self) -> i64;

    fn boost_record(&self) -> BoostRecord;
    fn set_boost_record(&self, record: BoostRecord);
    fn boost_unlocked(&self) -> bool;
    fn set_boost_unlocked(&self, unlocked: bool);
    fn boost_price(&self) -> i64;
    fn set_boost_price(&self, price: i64);
    fn boost_level(&self) -> u32;
    fn set_boost_level(&self, level: u32);

    /// Synchronous durable write of everything above.
    fn flush_now(&self);
}

/// Serializable state behind [`MemoryStore`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreState {
    pub gold: i64,
    pub speed: f64,
    pub distance_km: f64,
    pub income_per_second: f64,
    pub play_time_sec: f64,
    /// Indexed by drop id; grown on demand.
    pub resources: Vec<i64>,
    pub boost: BoostRecord,
    pub boost_unlocked: bool,
    pub boost_price: i64,
    pub boost_level: u32,
}

impl Default for StoreState {
    fn default() -> Self {
        Self {
            gold: 0,
            speed: 0.0,
            distance_km: 0.0,
            income_per_second: 0.0,
            play_time_sec: 0.0,
            resources: Vec::new(),
            boost: BoostRecord::default(),
            boost_unlocked: false,
            boost_price: 100,
            boost_level: 0,
        }
    }
}

/// In-process save store. Durability is delegated to whatever consumes the
/// snapshot; `flush_now` here just counts, which is what tests need to
/// verify the throttle.
#[derive(Default)]
pub struct MemoryStore {
    state: RefCell<StoreState>,
    flushes: Cell<u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: StoreState) -> Self {
        Self {
            state: RefCell::new(state),
            flushes: Cell::new(0),
        }
    }

    /// Copy of the full state, for snapshots.
    pub fn snapshot(&self) -> StoreState {
        self.state.borrow().clone()
    }

    /// Replace the full state, for snapshot restore.
    pub fn restore(&self, state: StoreState) {
        *self.state.borrow_mut() = state;
    }

    /// Number of `flush_now` calls observed.
    pub fn flush_count(&self) -> u64 {
        self.flushes.get()
    }
}

impl SaveStore for MemoryStore {
    fn gold(&self) -> i64 {
        self.state.borrow().gold
    }

    fn set_gold(&self, gold: i64) {
        self.state.borrow_mut().gold = gold;
    }

    fn add_gold_saturating(&self, delta: i64) {
        let mut s = self.state.borrow_mut();
        s.gold = s.gold.saturating_add(delta);
    }

    fn try_spend_gold(&self, amount: i64) -> bool {
        let mut s = self.state.borrow_mut();
        if amount < 0 || s.gold < amount {
            return false;
        }
        s.gold -= amount;
        true
    }

    fn speed(&self) -> f64 {
        self.state.borrow().speed
    }

    fn set_speed(&self, speed: f64) {
        self.state.borrow_mut().speed = speed;
    }

    fn distance_km(&self) -> f64 {
        self.state.borrow().distance_km
    }

    fn set_distance_km(&self, km: f64) {
        self.state.borrow_mut().distance_km = km;
    }

    fn add_distance_km(&self, km: f64) {
        self.state.borrow_mut().distance_km += km.max(0.0);
    }

    fn income_per_second(&self) -> f64 {
        self.state.borrow().income_per_second
    }

    fn set_income_per_second(&self, rate: f64) {
        self.state.borrow_mut().income_per_second = rate;
    }

    fn play_time_sec(&self) -> f64 {
        self.state.borrow().play_time_sec
    }

    fn add_play_time_sec(&self, dt: f64) {
        self.state.borrow_mut().play_time_sec += dt.max(0.0);
    }

    fn resource_count(&self, id: i32) -> i64 {
        if id < 0 {
            return 0;
        }
        self.state
            .borrow()
            .resources
            .get(id as usize)
            .copied()
            .unwrap_or(0)
    }

    fn add_resource(&self, id: i32, n: i64) {
        if id < 0 {
            return;
        }
        let mut s = self.state.borrow_mut();
        let idx = id as usize;
        if s.resources.len() <= idx {
            s.resources.resize(idx + 1, 0);
        }
        s.resources[idx] = s.resources[idx].saturating_add(n);
    }

    fn resource_counts(&self) -> Vec<i64> {
        self.state.borrow().resources.clone()
    }

    fn resource_total(&self) -> i64 {
        self.state
            .borrow()
            .resources
            .iter()
            .fold(0i64, |acc, n| acc.saturating_add(*n))
    }

    fn boost_record(&self) -> BoostRecord {
        self.state.borrow().boost.clone()
    }

    fn set_boost_record(&self, record: BoostRecord) {
        self.state.borrow_mut().boost = record;
    }

    fn boost_unlocked(&self) -> bool {
        self.state.borrow().boost_unlocked
    }

    fn set_boost_unlocked(&self, unlocked: bool) {
        self.state.borrow_mut().boost_unlocked = unlocked;
    }

    fn boost_price(&self) -> i64 {
        self.state.borrow().boost_price
    }

    fn set_boost_price(&self, price: i64) {
        self.state.borrow_mut().boost_price = price;
    }

    fn boost_level(&self) -> u32 {
        self.state.borrow().boost_level
    }

    fn set_boost_level(&self, level: u32) {
        self.state.borrow_mut().boost_level = level;
    }

    fn flush_now(&self) {
        self.flushes.set(self.flushes.get() + 1);
    }
}
