//! Longhaul Core - Idle Progression Engine
//!
//! The stateful half of the Longhaul progression core: a wall-clock-anchored
//! speed boost, a rate-to-drops generator, and a mission tracker, all sharing
//! one persisted save state and staying consistent across process restarts.
//!
//! # Architecture
//!
//! Everything is single-threaded and tick-driven. [`engine::GameCore`] owns
//! the three engines and runs them in a strict per-tick pipeline: boost
//! transitions first, then drop accrual, then mission auto-tracking and the
//! single change notification. Collaborators (save store, reward catalog,
//! effect spawner) are trait objects injected at construction - there are no
//! globals.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::rc::Rc;
//! use rand::SeedableRng;
//! use longhaul_core::prelude::*;
//! use longhaul_core::catalog::StaticCatalog;
//! use longhaul_core::spawner::NullSpawner;
//!
//! let store = Rc::new(MemoryStore::new());
//! let clock = Rc::new(SystemClock);
//! let catalog = Rc::new(StaticCatalog::new(vec![]));
//! let mut core = GameCore::new(
//!     store,
//!     clock,
//!     catalog,
//!     Rc::new(NullSpawner),
//!     vec![],
//!     rand::rngs::StdRng::seed_from_u64(7),
//! );
//!
//! core.recover();
//! loop {
//!     core.tick(1.0 / 30.0); // 30 Hz
//! }
//! ```

pub mod boost;
pub mod catalog;
pub mod clock;
pub mod drops;
pub mod engine;
pub mod missions;
pub mod persistence;
pub mod scheduler;
pub mod signal;
pub mod spawner;
pub mod store;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::boost::BoostEngine;
    pub use crate::clock::{Clock, FixedClock, SystemClock};
    pub use crate::drops::DropEngine;
    pub use crate::engine::GameCore;
    pub use crate::missions::MissionTracker;
    pub use crate::store::{MemoryStore, SaveStore};
}
