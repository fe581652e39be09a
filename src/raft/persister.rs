use parking_lot::Mutex;
use serde_derive::{Deserialize, Serialize};

use crate::error::Result;
use crate::raft::log::Log;

/// The blob a [`Persister`] saves and restores: `(current_term,
/// voted_for, log)`, per spec.md §6. The wire format is this crate's
/// own choice (bincode); on-disk durability is out of scope, so only an
/// in-memory implementation is provided here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedState {
    pub current_term: u64,
    pub voted_for: Option<u64>,
    pub log: Log,
}

/// Persistence hook a `Node` is given at construction time. Implementers
/// decide durability and format; this crate only requires the blob to
/// round-trip (R1).
pub trait Persister: Send + Sync {
    fn save_raft_state(&self, state: &PersistedState) -> Result<()>;
    fn read_raft_state(&self) -> Result<Option<PersistedState>>;
}

/// An in-memory `Persister`, sufficient for tests and for callers that
/// don't need durability across restarts.
#[derive(Default)]
pub struct MemoryPersister {
    blob: Mutex<Option<Vec<u8>>>,
}

impl MemoryPersister {
    pub fn new() -> MemoryPersister {
        MemoryPersister::default()
    }
}

impl Persister for MemoryPersister {
    fn save_raft_state(&self, state: &PersistedState) -> Result<()> {
        let encoded = bincode::serialize(state)?;
        *self.blob.lock() = Some(encoded);
        Ok(())
    }

    fn read_raft_state(&self) -> Result<Option<PersistedState>> {
        match self.blob.lock().as_ref() {
            None => Ok(None),
            Some(bytes) => Ok(Some(bincode::deserialize(bytes)?)),
        }
    }
}
