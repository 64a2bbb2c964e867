pub mod scheduler;
pub mod store;

pub use scheduler::{correlate, ConfirmationScheduler, CyclePhase, CycleSummary, HitSink, SchedulerTotals, TickOutcome};
pub use store::{CorrelationStore, PendingBatch};
