//! Snapshot save/load for the default store.
//!
//! Serializes the full store state, the goal list, and the drop
//! accumulator with bincode, behind a version check. The excluded save-file
//! collaborator can wrap this or replace it; the core only needs the bytes
//! to round-trip.

use std::io::{Read, Write};

use log::info;
use serde::{Deserialize, Serialize};

use longhaul_logic::goals::MissionGoal;

use crate::store::{MemoryStore, StoreState};

/// Version number for the snapshot format (increment when it changes).
const SAVE_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct SaveData {
    version: u32,
    state: StoreState,
    goals: Vec<MissionGoal>,
    accumulator: f64,
}

/// Contents of a loaded snapshot.
pub struct LoadedSnapshot {
    pub state: StoreState,
    pub goals: Vec<MissionGoal>,
    pub accumulator: f64,
}

/// Write a snapshot of the store, goals, and accumulator fraction.
pub fn save_snapshot<W: Write>(
    writer: W,
    store: &MemoryStore,
    goals: &[MissionGoal],
    accumulator: f64,
) -> Result<(), SaveError> {
    let data = SaveData {
        version: SAVE_VERSION,
        state: store.snapshot(),
        goals: goals.to_vec(),
        accumulator,
    };
    bincode::serialize_into(writer, &data)?;
    info!("snapshot saved ({} goals)", data.goals.len());
    Ok(())
}

/// Read a snapshot back. Fails on any version mismatch.
pub fn load_snapshot<R: Read>(reader: R) -> Result<LoadedSnapshot, SaveError> {
    let data: SaveData = bincode::deserialize_from(reader)?;
    if data.version != SAVE_VERSION {
        return Err(SaveError::VersionMismatch {
            expected: SAVE_VERSION,
            found: data.version,
        });
    }
    Ok(LoadedSnapshot {
        state: data.state,
        goals: data.goals,
        accumulator: data.accumulator,
    })
}

/// Errors that can occur during snapshot save/load
#[derive(Debug)]
pub enum SaveError {
    Io(std::io::Error),
    Bincode(Box<bincode::ErrorKind>),
    VersionMismatch { expected: u32, found: u32 },
}

impl From<std::io::Error> for SaveError {
    fn from(e: std::io::Error) -> Self {
        SaveError::Io(e)
    }
}

impl From<Box<bincode::ErrorKind>> for SaveError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        SaveError::Bincode(e)
    }
}

impl std::fmt::Display for SaveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveError::Io(e) => write!(f, "IO error: {}", e),
            SaveError::Bincode(e) => write!(f, "Serialization error: {}", e),
            SaveError::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "Snapshot version mismatch: expected {}, found {}",
                    expected, found
                )
            }
        }
    }
}

impl std::error::Error for SaveError {}
