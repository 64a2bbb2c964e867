use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use crate::models::{ConfirmedHit, RequestHandle};
use crate::oast::BackendAdapter;
use super::store::{CorrelationStore, PendingBatch};
use tracing::{debug, info};

/// Receives confirmed hits as the cycle dispatches them.
pub trait HitSink<H = RequestHandle>: Send + Sync {
    fn on_hit(&self, hit: ConfirmedHit<H>);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CyclePhase {
    Idle,
    Draining,
    Matching,
    Dispatching,
}

impl CyclePhase {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => CyclePhase::Draining,
            2 => CyclePhase::Matching,
            3 => CyclePhase::Dispatching,
            _ => CyclePhase::Idle,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleSummary {
    pub checked_ids: usize,
    pub checked_handles: usize,
    pub interactions: usize,
    pub hit_ids: usize,
    pub hits: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing pending; the backend was not contacted.
    Idle,
    /// Another cycle is still running.
    InProgress,
    Checked(CycleSummary),
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SchedulerTotals {
    pub cycles: u64,
    pub checked_ids: u64,
    pub hits: u64,
}

/// Drives drain, fetch, match and dispatch over the correlation store.
pub struct ConfirmationScheduler<H = RequestHandle> {
    store: Arc<CorrelationStore<H>>,
    adapter: BackendAdapter,
    sink: Arc<dyn HitSink<H>>,
    phase: AtomicU8,
    cycle_guard: tokio::sync::Mutex<()>,
    cycles: AtomicU64,
    checked_ids: AtomicU64,
    hits: AtomicU64,
}

impl<H: Send + 'static> ConfirmationScheduler<H> {
    pub fn new(store: Arc<CorrelationStore<H>>, adapter: BackendAdapter, sink: Arc<dyn HitSink<H>>) -> Self {
        Self {
            store,
            adapter,
            sink,
            phase: AtomicU8::new(CyclePhase::Idle as u8),
            cycle_guard: tokio::sync::Mutex::new(()),
            cycles: AtomicU64::new(0),
            checked_ids: AtomicU64::new(0),
            hits: AtomicU64::new(0),
        }
    }

    pub fn phase(&self) -> CyclePhase {
        CyclePhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    fn set_phase(&self, phase: CyclePhase) {
        self.phase.store(phase as u8, Ordering::Release);
    }

    pub fn totals(&self) -> SchedulerTotals {
        SchedulerTotals {
            cycles: self.cycles.load(Ordering::Relaxed),
            checked_ids: self.checked_ids.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
        }
    }

    /// One confirmation cycle. Each drained identifier is checked exactly
    /// once and then forgotten, hit or miss.
    pub async fn tick(&self) -> TickOutcome {
        let Ok(_cycle) = self.cycle_guard.try_lock() else {
            debug!("Confirmation cycle already running, skipping tick");
            return TickOutcome::InProgress;
        };
        self.run_cycle().await
    }

    /// Like `tick`, but waits for a running cycle to finish and then runs
    /// its own, so identifiers registered after that cycle drained are
    /// still checked. Never returns `InProgress`.
    pub async fn tick_after_current(&self) -> TickOutcome {
        let _cycle = self.cycle_guard.lock().await;
        self.run_cycle().await
    }

    /// Caller holds `cycle_guard`.
    async fn run_cycle(&self) -> TickOutcome {
        if self.store.is_empty() {
            return TickOutcome::Idle;
        }

        self.set_phase(CyclePhase::Draining);
        let batch = self.store.drain_all();
        let checked_ids = batch.len();
        let checked_handles = batch.values().map(Vec::len).sum();

        self.set_phase(CyclePhase::Matching);
        let interactions = self.adapter.fetch_all().await;
        let hits = correlate(batch, &interactions);
        let hit_ids = {
            let mut ids: Vec<&str> = hits.iter().map(|h| h.probe_id.as_str()).collect();
            ids.sort_unstable();
            ids.dedup();
            ids.len()
        };

        self.set_phase(CyclePhase::Dispatching);
        let hit_count = hits.len();
        for hit in hits {
            info!(probe_id = %hit.probe_id, interaction = %hit.interaction, "Out-of-band interaction confirmed");
            self.sink.on_hit(hit);
        }
        self.set_phase(CyclePhase::Idle);

        self.cycles.fetch_add(1, Ordering::Relaxed);
        self.checked_ids.fetch_add(checked_ids as u64, Ordering::Relaxed);
        self.hits.fetch_add(hit_count as u64, Ordering::Relaxed);

        let summary = CycleSummary {
            checked_ids,
            checked_handles,
            interactions: interactions.len(),
            hit_ids,
            hits: hit_count,
        };
        info!(
            backend = self.adapter.backend_name(),
            checked = summary.checked_ids,
            interactions = summary.interactions,
            hits = summary.hits,
            "Confirmation cycle complete"
        );
        TickOutcome::Checked(summary)
    }
}

/// Match drained identifiers against interaction names. An identifier hits
/// when some interaction contains it; every handle of a hit identifier
/// yields its own confirmed hit.
pub fn correlate<H>(batch: PendingBatch<H>, interactions: &[String]) -> Vec<ConfirmedHit<H>> {
    let mut hits = Vec::new();
    for (probe_id, handles) in batch {
        let Some(interaction) = interactions.iter().find(|i| i.contains(probe_id.as_str())) else {
            continue;
        };
        for handle in handles {
            hits.push(ConfirmedHit {
                probe_id: probe_id.clone(),
                handle,
                interaction: interaction.clone(),
            });
        }
    }
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProbeId;

    #[test]
    fn test_correlate_substring_match() {
        let mut batch: PendingBatch<u32> = PendingBatch::new();
        batch.insert(ProbeId::from("abc"), vec![1, 2]);
        batch.insert(ProbeId::from("qrs"), vec![3]);
        let interactions = vec!["0abc.1700.x.ceye.io".to_string(), "xyz.x.ceye.io".to_string()];

        let mut hits = correlate(batch, &interactions);
        hits.sort_by_key(|h| h.handle);
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|h| h.probe_id.as_str() == "abc"));
        assert_eq!(hits[0].interaction, "0abc.1700.x.ceye.io");
        assert_eq!(hits[1].handle, 2);
    }

    #[test]
    fn test_correlate_no_interactions() {
        let mut batch: PendingBatch<u32> = PendingBatch::new();
        batch.insert(ProbeId::from("abc"), vec![1]);
        assert!(correlate(batch, &[]).is_empty());
    }

    #[test]
    fn test_phase_roundtrip() {
        for phase in [CyclePhase::Idle, CyclePhase::Draining, CyclePhase::Matching, CyclePhase::Dispatching] {
            assert_eq!(CyclePhase::from_u8(phase as u8), phase);
        }
    }
}
