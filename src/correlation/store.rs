use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use crate::models::{ProbeId, RequestHandle};

/// Snapshot taken by a drain, owned exclusively by the confirmation cycle.
pub type PendingBatch<H = RequestHandle> = HashMap<ProbeId, Vec<H>>;

/// Probes waiting for out-of-band confirmation, keyed by identifier.
///
/// Registrations share the outer lock and append through the map's shard
/// locks. A drain takes the outer lock exclusively and swaps in an empty
/// map, so a registration either lands in the snapshot being drained or in
/// the fresh map, never in between.
pub struct CorrelationStore<H = RequestHandle> {
    live: RwLock<DashMap<ProbeId, Vec<H>>>,
}

impl<H> CorrelationStore<H> {
    pub fn new() -> Self {
        Self {
            live: RwLock::new(DashMap::new()),
        }
    }

    pub fn register(&self, id: ProbeId, handle: H) {
        let live = self.live.read().unwrap_or_else(PoisonError::into_inner);
        live.entry(id).or_default().push(handle);
    }

    /// Take every pending entry, leaving the store empty.
    pub fn drain_all(&self) -> PendingBatch<H> {
        let taken = {
            let mut live = self.live.write().unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut *live)
        };
        taken.into_iter().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.live.read().unwrap_or_else(PoisonError::into_inner).is_empty()
    }

    pub fn pending_ids(&self) -> usize {
        self.live.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn pending_handles(&self) -> usize {
        self.live
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|entry| entry.value().len())
            .sum()
    }
}

impl<H> Default for CorrelationStore<H> {
    fn default() -> Self {
        Self::new()
    }
}
