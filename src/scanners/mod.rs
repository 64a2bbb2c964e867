pub mod dispatcher;
pub mod fastjson;
pub mod filter;
pub mod json_detect;
pub mod log4j;
pub mod mutate;
pub mod payloads;
pub mod spring;

use std::sync::Arc;
use crate::archive::ProbeArchive;
use crate::correlation::CorrelationStore;
use crate::executor::{Admission, TaskExecutor};
use crate::host::{HttpExchange, HttpRequest, HttpSender};
use crate::models::{Finding, ProbeId, RequestHandle, VulnKind};
use crate::reporting::FindingSink;
use tracing::{debug, info};

pub use dispatcher::{DispatchReport, ScanDispatcher, ScannerToggles, SkipReason};
pub use filter::UrlFilter;

/// Header stamped on every probe so the interception callback never scans
/// its own traffic.
pub const PROBE_MARKER_HEADER: &str = "X-Oastscan-Probe";

/// Statuses that count as an unauthenticated hit for path probes.
const UNAUTH_STATUSES: &[u16] = &[200, 301, 302];

/// Everything a scanner needs to send probes and hand off their results.
#[derive(Clone)]
pub struct ProbeContext {
    pub sender: Arc<dyn HttpSender>,
    pub executor: TaskExecutor,
    pub store: Arc<CorrelationStore>,
    pub archive: Option<Arc<ProbeArchive>>,
    pub findings: Arc<dyn FindingSink>,
    /// Insert parameter payloads verbatim instead of percent-encoding them.
    pub verbatim_params: bool,
}

impl ProbeContext {
    /// Queue a probe confirmed out of band. The sent exchange is registered
    /// under `probe_id` even when the send fails, since a request that timed
    /// out may still have triggered the lookup.
    pub async fn submit_oast_probe(&self, kind: VulnKind, probe_id: ProbeId, request: HttpRequest) -> Admission {
        let sender = self.sender.clone();
        let store = self.store.clone();
        let archive = self.archive.clone();
        let request = request.with_added_header(PROBE_MARKER_HEADER, kind.as_str());

        self.executor
            .submit(async move {
                let (exchange, result) = match sender.send(request.clone()).await {
                    Ok(exchange) => (exchange, Ok(())),
                    Err(e) => (HttpExchange::unanswered(request), Err(e)),
                };
                if let Some(archive) = &archive {
                    archive.record(&exchange);
                }
                debug!(probe_id = %probe_id, kind = %kind, status = ?exchange.status(), "Probe sent");
                store.register(probe_id, RequestHandle::new(kind, exchange));
                result
            })
            .await
    }

    /// Queue a probe judged by its response status alone.
    pub async fn submit_status_probe(&self, request: HttpRequest) -> Admission {
        let sender = self.sender.clone();
        let findings = self.findings.clone();
        let request = request.with_added_header(PROBE_MARKER_HEADER, VulnKind::SpringUnauth.as_str());

        self.executor
            .submit(async move {
                let exchange = sender.send(request).await?;
                let Some(status) = exchange.status() else {
                    return Ok(());
                };
                if UNAUTH_STATUSES.contains(&status) {
                    info!(url = %exchange.request.url, status, "Unauthenticated endpoint found");
                    let handle = RequestHandle::new(VulnKind::SpringUnauth, exchange);
                    findings.record(Finding::unauthenticated(&handle));
                }
                Ok(())
            })
            .await
    }
}
