use chrono::{DateTime, Utc};
use serde::Serialize;
use crate::correlation::{CyclePhase, SchedulerTotals};
use crate::executor::ExecutorSnapshot;

/// Point-in-time view of a running engine.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub backend: String,
    pub started_at: DateTime<Utc>,
    pub running: bool,
    pub pending_ids: usize,
    pub pending_handles: usize,
    pub phase: CyclePhase,
    pub totals: SchedulerTotals,
    pub executor: ExecutorSnapshot,
    pub scan_marks: usize,
    pub background_tasks: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_buffered: Option<usize>,
}

impl EngineStatus {
    pub fn summary_line(&self) -> String {
        format!(
            "{} | pending {} ids / {} probes | {} cycles, {} hits | {} workers, {} in flight, {} queued",
            self.backend,
            self.pending_ids,
            self.pending_handles,
            self.totals.cycles,
            self.totals.hits,
            self.executor.workers,
            self.executor.in_flight,
            self.executor.queued,
        )
    }
}
