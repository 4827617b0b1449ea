//! Visual-effect spawner collaborator.
//!
//! Spawning is the expensive side of a drop grant, so the contract makes
//! failure cheap: a pool that is out of capacity returns `None` and the
//! caller moves on. Nothing downstream may rely on a spawn succeeding.

use std::cell::{Cell, RefCell};

/// Handle to a live spawned effect, for later release back to the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EffectHandle(pub u32);

/// Spawns a drop-collect visual at a world position.
pub trait EffectSpawner {
    /// `None` means the pool is exhausted; callers treat that as a no-op.
    fn spawn(&self, position: (f32, f32), drop_id: i32) -> Option<EffectHandle>;
    fn release(&self, handle: EffectHandle);
}

/// Spawner for headless runs: always "exhausted".
pub struct NullSpawner;

impl EffectSpawner for NullSpawner {
    fn spawn(&self, _position: (f32, f32), _drop_id: i32) -> Option<EffectHandle> {
        None
    }

    fn release(&self, _handle: EffectHandle) {}
}

/// Bounded pool of effect slots.
pub struct EffectPool {
    capacity: usize,
    live: RefCell<Vec<EffectHandle>>,
    next_id: Cell<u32>,
    spawned_total: Cell<u64>,
}

impl EffectPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            live: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
            spawned_total: Cell::new(0),
        }
    }

    pub fn live_count(&self) -> usize {
        self.live.borrow().len()
    }

    /// Total successful spawns over the pool's lifetime.
    pub fn spawned_total(&self) -> u64 {
        self.spawned_total.get()
    }
}

impl EffectSpawner for EffectPool {
    fn spawn(&self, _position: (f32, f32), _drop_id: i32) -> Option<EffectHandle> {
        let mut live = self.live.borrow_mut();
        if live.len() >= self.capacity {
            return None;
        }
        let handle = EffectHandle(self.next_id.get());
        self.next_id.set(self.next_id.get().wrapping_add(1));
        live.push(handle);
        self.spawned_total.set(self.spawned_total.get() + 1);
        Some(handle)
    }

    fn release(&self, handle: EffectHandle) {
        self.live.borrow_mut().retain(|h| *h != handle);
    }
}
