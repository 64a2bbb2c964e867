use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use crate::archive::ProbeArchive;
use crate::config::spring_paths::load_spring_paths;
use crate::config::{ConfirmationSettings, ScanConfig};
use crate::correlation::{ConfirmationScheduler, CorrelationStore, TickOutcome};
use crate::errors::ScanError;
use crate::executor::TaskExecutor;
use crate::host::{HttpRequest, HttpSender, ReqwestSender};
use crate::models::Finding;
use crate::oast::{create_backend, BackendAdapter, CollaboratorProvider, OastBackend};
use crate::reporting::{ChannelSink, FindingForwarder, FindingSink};
use crate::runtime::IntervalRegistry;
use crate::scanners::payloads::DEFAULT_SPRING_PATHS;
use crate::scanners::{DispatchReport, ProbeContext, ScanDispatcher, ScannerToggles, UrlFilter};
use super::state::EngineStatus;
use tracing::{info, warn};

const MARK_CLEANUP_DELAY: Duration = Duration::from_secs(600);
const MARK_CLEANUP_PERIOD: Duration = Duration::from_secs(300);
const POOL_MONITOR_PERIOD: Duration = Duration::from_secs(30);

/// Collaborators the engine does not build itself.
pub struct EngineParts {
    pub sender: Arc<dyn HttpSender>,
    pub backend: Arc<dyn OastBackend>,
    pub spring_paths: Vec<String>,
    pub archive: Option<Arc<ProbeArchive>>,
}

/// Composition root. Every component is built once here and shared by
/// reference; nothing is global.
pub struct ScanEngine {
    confirmation: ConfirmationSettings,
    adapter: BackendAdapter,
    executor: TaskExecutor,
    store: Arc<CorrelationStore>,
    scheduler: Arc<ConfirmationScheduler>,
    dispatcher: Arc<ScanDispatcher>,
    archive: Option<Arc<ProbeArchive>>,
    registry: IntervalRegistry,
    started: AtomicBool,
    started_at: DateTime<Utc>,
}

impl ScanEngine {
    /// Build the stand-alone engine: reqwest sender, configured backend,
    /// Spring path file and (when enabled) the probe archive.
    pub async fn from_config(
        config: &ScanConfig,
        collaborator: Option<Arc<dyn CollaboratorProvider>>,
    ) -> Result<(Self, UnboundedReceiver<Finding>), ScanError> {
        let sender: Arc<dyn HttpSender> = Arc::new(ReqwestSender::new(Duration::from_secs(config.probe_timeout_secs))?);
        let backend = create_backend(config, collaborator)?;

        let spring_paths = if config.spring_scan_enabled {
            match load_spring_paths(Path::new(&config.spring_scan_file_path)).await {
                Ok(paths) => paths,
                Err(e) => {
                    warn!(path = %config.spring_scan_file_path, error = %e, "Cannot load Spring paths, using built-in list");
                    DEFAULT_SPRING_PATHS.iter().map(|p| p.to_string()).collect()
                }
            }
        } else {
            Vec::new()
        };

        let archive = if config.log_enabled {
            match ProbeArchive::open(Path::new(&config.log_path), config.log_retention_days).await {
                Ok(archive) => Some(Arc::new(archive)),
                Err(e) => {
                    warn!(path = %config.log_path, error = %e, "Probe archive disabled");
                    None
                }
            }
        } else {
            None
        };

        Ok(Self::assemble(config, EngineParts { sender, backend, spring_paths, archive }))
    }

    /// Wire the engine from already-built collaborators. Findings, both
    /// confirmed hits and direct Spring results, arrive on the returned
    /// receiver.
    pub fn assemble(config: &ScanConfig, parts: EngineParts) -> (Self, UnboundedReceiver<Finding>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let findings: Arc<dyn FindingSink> = Arc::new(ChannelSink::new(tx));

        let executor = TaskExecutor::new(&config.executor);
        let store = Arc::new(CorrelationStore::new());
        let adapter = BackendAdapter::new(parts.backend, Duration::from_secs(config.backend_timeout_secs));
        let scheduler = Arc::new(ConfirmationScheduler::new(
            store.clone(),
            adapter.clone(),
            Arc::new(FindingForwarder::new(findings.clone())),
        ));

        let ctx = ProbeContext {
            sender: parts.sender,
            executor: executor.clone(),
            store: store.clone(),
            archive: parts.archive.clone(),
            findings,
            verbatim_params: config.crypto_enabled,
        };
        let dispatcher = Arc::new(ScanDispatcher::new(
            ctx,
            adapter.clone(),
            UrlFilter::from_config(config),
            ScannerToggles::from_config(config),
            &config.target_domain,
            parts.spring_paths,
        ));

        let engine = Self {
            confirmation: config.confirmation.clone(),
            adapter,
            executor,
            store,
            scheduler,
            dispatcher,
            archive: parts.archive,
            registry: IntervalRegistry::new(),
            started: AtomicBool::new(false),
            started_at: Utc::now(),
        };
        (engine, rx)
    }

    /// Register the background tasks. Calling it again is a no-op.
    pub fn start(&self) {
        if self.started.swap(true, Ordering::AcqRel) {
            return;
        }

        let scheduler = self.scheduler.clone();
        self.registry.spawn_interval(
            "confirmation",
            Duration::from_secs(self.confirmation.initial_delay_secs),
            Duration::from_secs(self.confirmation.period_secs),
            move || {
                let scheduler = scheduler.clone();
                async move {
                    scheduler.tick().await;
                }
            },
        );

        let dispatcher = self.dispatcher.clone();
        self.registry.spawn_interval("mark-cleanup", MARK_CLEANUP_DELAY, MARK_CLEANUP_PERIOD, move || {
            dispatcher.clear_marks();
            async {}
        });

        let executor = self.executor.clone();
        self.registry.spawn_interval("pool-monitor", POOL_MONITOR_PERIOD, POOL_MONITOR_PERIOD, move || {
            executor.log_status();
            async {}
        });

        if let Some(archive) = &self.archive {
            let archive = archive.clone();
            self.registry.spawn_worker("archive-flusher", move |cancel| archive.run_flusher(cancel));
        }

        info!(
            backend = self.adapter.backend_name(),
            initial_delay_secs = self.confirmation.initial_delay_secs,
            period_secs = self.confirmation.period_secs,
            "Scan engine started"
        );
    }

    /// Traffic-interception entry point.
    pub async fn handle_request(&self, request: &HttpRequest) -> DispatchReport {
        self.dispatcher.handle_request(request).await
    }

    /// Resolve once every probe submitted so far has finished.
    pub async fn wait_idle(&self) {
        self.executor.wait_idle().await
    }

    /// Run a confirmation cycle now instead of waiting for the timer. A
    /// timer cycle already in progress is waited out first.
    pub async fn confirm_now(&self) -> TickOutcome {
        self.scheduler.tick_after_current().await
    }

    pub fn backend_name(&self) -> &str {
        self.adapter.backend_name()
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            backend: self.adapter.backend_name().to_string(),
            started_at: self.started_at,
            running: self.started.load(Ordering::Acquire)
                && !self.registry.is_shutting_down()
                && !self.executor.is_shut_down(),
            pending_ids: self.store.pending_ids(),
            pending_handles: self.store.pending_handles(),
            phase: self.scheduler.phase(),
            totals: self.scheduler.totals(),
            executor: self.executor.snapshot(),
            scan_marks: self.dispatcher.mark_count(),
            background_tasks: self.registry.active_tasks(),
            archive_buffered: self.archive.as_ref().map(|a| a.buffered()),
        }
    }

    /// Stop the timers, then the executor, then flush the archive. Returns
    /// false when anything had to be aborted or the last flush failed.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        let timers_clean = self.registry.shutdown(grace).await;
        let executor_clean = self.executor.shutdown(grace).await;

        let archive_clean = match &self.archive {
            Some(archive) => match archive.flush().await {
                Ok(_) => true,
                Err(e) => {
                    warn!(error = %e, lost = archive.buffered(), "Final archive flush failed");
                    false
                }
            },
            None => true,
        };

        let status = self.status();
        info!(
            cycles = status.totals.cycles,
            hits = status.totals.hits,
            unchecked = status.pending_ids,
            "Scan engine stopped"
        );
        timers_clean && executor_clean && archive_clean
    }
}
