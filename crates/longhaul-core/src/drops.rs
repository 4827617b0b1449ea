//! Drop engine.
//!
//! Converts the continuous income rate into discrete resource grants through
//! a fractional accumulator, picks the reward by weighted random selection
//! among unlocked candidates, and budgets both the grants processed and the
//! visuals spawned per tick. A long pause catches up over several ticks
//! rather than bursting.
//!
//! Missing catalog data, an empty unlocked set, and exhausted capacity are
//! all silent no-ops: the engine idles until conditions change.

use std::rc::Rc;

use rand::Rng;

use longhaul_logic::accrual::Accumulator;
use longhaul_logic::constants::{
    DROPS_PER_TICK_CAP, DROP_WEIGHT_POWER, EFFECTS_PER_TICK_CAP, EFFECT_EVERY_NTH_GRANT,
};
use longhaul_logic::drops::pick_weighted;

use crate::catalog::RewardCatalog;
use crate::spawner::EffectSpawner;
use crate::store::SaveStore;

/// Per-engine tuning. Defaults come from the shared constants; capacity
/// defaults to unbounded.
#[derive(Debug, Clone)]
pub struct DropConfig {
    pub weight_power: f64,
    pub drops_per_tick: u32,
    pub effects_per_tick: u32,
    pub effect_every_nth: u64,
    /// Generation stops while the summed resource counts reach this.
    pub resource_capacity: i64,
}

impl Default for DropConfig {
    fn default() -> Self {
        Self {
            weight_power: DROP_WEIGHT_POWER,
            drops_per_tick: DROPS_PER_TICK_CAP,
            effects_per_tick: EFFECTS_PER_TICK_CAP,
            effect_every_nth: EFFECT_EVERY_NTH_GRANT,
            resource_capacity: i64::MAX,
        }
    }
}

/// The rate-to-drops engine.
pub struct DropEngine<R: Rng> {
    store: Rc<dyn SaveStore>,
    catalog: Rc<dyn RewardCatalog>,
    spawner: Rc<dyn EffectSpawner>,
    config: DropConfig,
    accumulator: Accumulator,
    rng: R,
    grants_total: u64,
}

impl<R: Rng> DropEngine<R> {
    pub fn new(
        store: Rc<dyn SaveStore>,
        catalog: Rc<dyn RewardCatalog>,
        spawner: Rc<dyn EffectSpawner>,
        config: DropConfig,
        rng: R,
    ) -> Self {
        Self {
            store,
            catalog,
            spawner,
            config,
            accumulator: Accumulator::new(),
            rng,
            grants_total: 0,
        }
    }

    /// Accrue `dt_sec` of income and grant up to the per-tick cap of drops.
    pub fn tick(&mut self, dt_sec: f64) {
        if self.capacity_exhausted() {
            return;
        }
        let rate = self.store.income_per_second();
        if rate <= 0.0 {
            return;
        }
        self.accumulator.advance(dt_sec, rate);

        let mut processed = 0u32;
        let mut effects_spawned = 0u32;
        while self.accumulator.has_unit() && processed < self.config.drops_per_tick {
            let distance = self.store.distance_km();
            let candidates = self.catalog.unlocked(distance);
            if candidates.is_empty() {
                // Leave the unit unconsumed; retry next tick.
                break;
            }

            let roll: f64 = self.rng.gen();
            let Some(id) = pick_weighted(candidates, roll, self.config.weight_power) else {
                break;
            };

            self.store.add_resource(id, 1);
            self.accumulator.consume_unit();
            processed += 1;
            self.grants_total += 1;

            if self.capacity_exhausted() {
                break;
            }

            if self.grants_total % self.config.effect_every_nth == 0
                && effects_spawned < self.config.effects_per_tick
            {
                // Spawn failure (pool exhausted) is a no-op by contract.
                let position = (distance as f32, 0.0);
                if self.spawner.spawn(position, id).is_some() {
                    effects_spawned += 1;
                }
            }
        }
    }

    fn capacity_exhausted(&self) -> bool {
        self.store.resource_total() >= self.config.resource_capacity
    }

    /// Fractional progress toward the next drop (for persistence).
    pub fn accumulator_fraction(&self) -> f64 {
        self.accumulator.fraction()
    }

    /// Restore a persisted accumulator fraction.
    pub fn restore_accumulator(&mut self, fraction: f64) {
        self.accumulator = Accumulator::restore(fraction);
    }

    /// Total drops granted over the engine's lifetime.
    pub fn grants_total(&self) -> u64 {
        self.grants_total
    }
}
