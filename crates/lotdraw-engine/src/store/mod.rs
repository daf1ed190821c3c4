//! Result storage and record lookup
//!
//! The engine owns no persistence of its own. Results, participants and lots
//! are reached through the traits below; in-memory adapters are provided for
//! development, simulation and tests.

mod memory;
mod traits;

use std::sync::Arc;

pub use memory::{InMemoryDirectory, InMemoryResultStore};
pub use traits::{
    CommitFence, LotDirectory, ParticipantDirectory, ParticipantFilter, ResultFilter,
    ResultStore, SortOrder, StoreResult,
};

/// Handles to every collaborator the engine reads from.
#[derive(Clone)]
pub struct Registry {
    pub results: Arc<dyn ResultStore>,
    pub participants: Arc<dyn ParticipantDirectory>,
    pub lots: Arc<dyn LotDirectory>,
}

impl Registry {
    pub fn new(
        results: Arc<dyn ResultStore>,
        participants: Arc<dyn ParticipantDirectory>,
        lots: Arc<dyn LotDirectory>,
    ) -> Self {
        Self {
            results,
            participants,
            lots,
        }
    }

    /// Registry over a fresh in-memory result store and one shared directory.
    pub fn in_memory(directory: Arc<InMemoryDirectory>) -> Self {
        Self {
            results: Arc::new(InMemoryResultStore::new()),
            participants: directory.clone(),
            lots: directory,
        }
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry").finish_non_exhaustive()
    }
}
