use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use crate::correlation::HitSink;
use crate::models::{ConfirmedHit, Finding, RequestHandle};
use tracing::warn;

/// Receives confirmed findings for display or storage. Must not block.
pub trait FindingSink: Send + Sync {
    fn record(&self, finding: Finding);
}

/// Forwards findings over an unbounded channel to whoever renders them.
pub struct ChannelSink {
    tx: UnboundedSender<Finding>,
}

impl ChannelSink {
    pub fn new(tx: UnboundedSender<Finding>) -> Self {
        Self { tx }
    }
}

impl FindingSink for ChannelSink {
    fn record(&self, finding: Finding) {
        if self.tx.send(finding).is_err() {
            warn!("Finding receiver dropped, discarding finding");
        }
    }
}

/// Turns each confirmed hit into a finding.
pub struct FindingForwarder {
    sink: Arc<dyn FindingSink>,
}

impl FindingForwarder {
    pub fn new(sink: Arc<dyn FindingSink>) -> Self {
        Self { sink }
    }
}

impl HitSink<RequestHandle> for FindingForwarder {
    fn on_hit(&self, hit: ConfirmedHit<RequestHandle>) {
        self.sink.record(Finding::from_hit(&hit));
    }
}
