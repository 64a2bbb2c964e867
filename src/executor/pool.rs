use futures::FutureExt;
use serde::Serialize;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Notify;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use crate::config::ExecutorSettings;
use crate::errors::ScanError;
use super::token_bucket::TokenBucket;

pub type ProbeFuture = Pin<Box<dyn Future<Output = Result<(), ScanError>> + Send + 'static>>;

/// How a submitted task was admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Handed to an idle or busy worker through the queue.
    Queued,
    /// Started a new worker that runs the task first.
    NewWorker,
    /// Queue and pool were saturated; the submitter ran the task itself.
    CallerRuns,
    /// The executor is shut down; the task was dropped.
    Rejected,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecutorSnapshot {
    pub workers: usize,
    pub in_flight: usize,
    pub queued: usize,
    pub submitted: u64,
    pub completed: u64,
    pub failed: u64,
    pub panicked: u64,
    pub caller_runs: u64,
    pub rejected: u64,
    pub aborted: u64,
}

#[derive(Default)]
struct Counters {
    submitted: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    panicked: AtomicU64,
    caller_runs: AtomicU64,
    rejected: AtomicU64,
    aborted: AtomicU64,
}

struct Shared {
    core_size: usize,
    max_size: usize,
    keep_alive: Duration,
    queue_capacity: usize,
    bucket: TokenBucket,
    sender: Mutex<Option<mpsc::Sender<ProbeFuture>>>,
    receiver: tokio::sync::Mutex<mpsc::Receiver<ProbeFuture>>,
    workers: Mutex<JoinSet<()>>,
    worker_count: AtomicUsize,
    in_flight: AtomicUsize,
    idle: Notify,
    counters: Counters,
}

/// Bounded worker pool with token-bucket admission and caller-runs
/// backpressure. Cloning shares the same pool.
#[derive(Clone)]
pub struct TaskExecutor {
    shared: Arc<Shared>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl TaskExecutor {
    pub fn new(settings: &ExecutorSettings) -> Self {
        let core_size = settings.core_pool_size.max(1);
        let max_size = settings.max_pool_size.max(core_size);
        let queue_capacity = settings.queue_capacity.max(1);
        let (tx, rx) = mpsc::channel(queue_capacity);
        info!(
            core = core_size,
            max = max_size,
            queue = queue_capacity,
            qps = settings.qps,
            "Probe executor created"
        );
        Self {
            shared: Arc::new(Shared {
                core_size,
                max_size,
                keep_alive: Duration::from_secs(settings.keep_alive_secs),
                queue_capacity,
                bucket: TokenBucket::new(settings.qps),
                sender: Mutex::new(Some(tx)),
                receiver: tokio::sync::Mutex::new(rx),
                workers: Mutex::new(JoinSet::new()),
                worker_count: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                idle: Notify::new(),
                counters: Counters::default(),
            }),
        }
    }

    /// Submit a probe task. Waits only for a rate token; if the queue is full
    /// and the pool is at its maximum size, the task runs on the caller.
    pub async fn submit<F>(&self, task: F) -> Admission
    where
        F: Future<Output = Result<(), ScanError>> + Send + 'static,
    {
        self.submit_boxed(Box::pin(task)).await
    }

    pub async fn submit_boxed(&self, task: ProbeFuture) -> Admission {
        let shared = &self.shared;
        let Some(sender) = lock(&shared.sender).clone() else {
            shared.counters.rejected.fetch_add(1, Ordering::Relaxed);
            warn!("Probe submitted after executor shutdown, dropping");
            return Admission::Rejected;
        };

        shared.bucket.acquire().await;
        shared.in_flight.fetch_add(1, Ordering::AcqRel);
        shared.counters.submitted.fetch_add(1, Ordering::Relaxed);

        if shared.reserve_worker(shared.core_size) {
            self.spawn_worker(task, true);
            return Admission::NewWorker;
        }

        match sender.try_send(task) {
            Ok(()) => Admission::Queued,
            Err(TrySendError::Full(task)) => {
                if shared.reserve_worker(shared.max_size) {
                    self.spawn_worker(task, false);
                    Admission::NewWorker
                } else {
                    shared.counters.caller_runs.fetch_add(1, Ordering::Relaxed);
                    debug!("Probe queue saturated, running task on submitter");
                    InFlight::new(shared.clone()).run(task).await;
                    Admission::CallerRuns
                }
            }
            Err(TrySendError::Closed(task)) => {
                drop(task);
                shared.counters.rejected.fetch_add(1, Ordering::Relaxed);
                shared.finish_one();
                Admission::Rejected
            }
        }
    }

    fn spawn_worker(&self, first: ProbeFuture, core: bool) {
        // Both guards are owned by the worker future, so an abort before its
        // first poll still settles them.
        let slot = WorkerSlot(self.shared.clone());
        let guard = InFlight::new(self.shared.clone());
        lock(&self.shared.workers).spawn(worker_loop(slot, guard, first, core));
    }

    /// Resolve once every submitted task has finished.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.shared.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.shared.in_flight.load(Ordering::Acquire) == 0 {
                return;
            }
            notified.await;
        }
    }

    pub fn snapshot(&self) -> ExecutorSnapshot {
        let shared = &self.shared;
        let queued = lock(&shared.sender)
            .as_ref()
            .map(|tx| shared.queue_capacity - tx.capacity())
            .unwrap_or(0);
        let c = &shared.counters;
        ExecutorSnapshot {
            workers: shared.worker_count.load(Ordering::Acquire),
            in_flight: shared.in_flight.load(Ordering::Acquire),
            queued,
            submitted: c.submitted.load(Ordering::Relaxed),
            completed: c.completed.load(Ordering::Relaxed),
            failed: c.failed.load(Ordering::Relaxed),
            panicked: c.panicked.load(Ordering::Relaxed),
            caller_runs: c.caller_runs.load(Ordering::Relaxed),
            rejected: c.rejected.load(Ordering::Relaxed),
            aborted: c.aborted.load(Ordering::Relaxed),
        }
    }

    /// Periodic pool monitor line.
    pub fn log_status(&self) {
        let s = self.snapshot();
        info!(
            workers = s.workers,
            in_flight = s.in_flight,
            queued = s.queued,
            completed = s.completed,
            failed = s.failed,
            caller_runs = s.caller_runs,
            "Probe executor status"
        );
    }

    pub fn is_shut_down(&self) -> bool {
        lock(&self.shared.sender).is_none()
    }

    /// Stop accepting tasks, let workers drain the queue for up to `grace`,
    /// then abort what is left. Returns false when tasks were aborted.
    /// Afterwards `in_flight` and `workers` are both zero.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        drop(lock(&self.shared.sender).take());
        let mut workers = std::mem::take(&mut *lock(&self.shared.workers));

        let drained = tokio::time::timeout(grace, async {
            while workers.join_next().await.is_some() {}
        })
        .await
        .is_ok();

        if !drained {
            warn!(remaining = workers.len(), "Probe tasks still running after grace period, aborting");
            workers.abort_all();
            while workers.join_next().await.is_some() {}
        }

        let dropped = self.discard_queued().await;
        if dropped > 0 {
            warn!(dropped, "Queued probe tasks dropped at shutdown");
        }

        let s = self.snapshot();
        info!(
            completed = s.completed,
            failed = s.failed,
            aborted = s.aborted,
            clean = drained,
            "Probe executor shut down"
        );
        drained && dropped == 0
    }

    /// Close the queue and settle the accounting of every task still in it.
    async fn discard_queued(&self) -> usize {
        let mut rx = self.shared.receiver.lock().await;
        rx.close();
        let mut dropped = 0;
        while let Ok(task) = rx.try_recv() {
            drop(task);
            self.shared.counters.rejected.fetch_add(1, Ordering::Relaxed);
            self.shared.finish_one();
            dropped += 1;
        }
        dropped
    }
}

impl Shared {
    fn reserve_worker(&self, limit: usize) -> bool {
        self.worker_count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| (n < limit).then_some(n + 1))
            .is_ok()
    }

    fn finish_one(&self) {
        if self.in_flight.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.idle.notify_waiters();
        }
    }
}

/// Settles one in-flight slot when dropped, including when the running
/// future is aborted mid-task.
struct InFlight {
    shared: Arc<Shared>,
    settled: bool,
}

impl InFlight {
    fn new(shared: Arc<Shared>) -> Self {
        Self { shared, settled: false }
    }

    async fn run(mut self, task: ProbeFuture) {
        let counters = &self.shared.counters;
        match AssertUnwindSafe(task).catch_unwind().await {
            Ok(Ok(())) => {
                counters.completed.fetch_add(1, Ordering::Relaxed);
            }
            Ok(Err(e)) => {
                counters.failed.fetch_add(1, Ordering::Relaxed);
                let class = e.classify();
                if class.transient {
                    debug!(error_type = class.error_type, error = %e, "Probe task failed");
                } else {
                    warn!(error_type = class.error_type, error = %e, "Probe task failed");
                }
            }
            Err(_) => {
                counters.panicked.fetch_add(1, Ordering::Relaxed);
                error!("Probe task panicked");
            }
        }
        self.settled = true;
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if !self.settled {
            self.shared.counters.aborted.fetch_add(1, Ordering::Relaxed);
        }
        self.shared.finish_one();
    }
}

/// Releases a worker slot when the worker exits or is aborted.
struct WorkerSlot(Arc<Shared>);

impl Drop for WorkerSlot {
    fn drop(&mut self) {
        self.0.worker_count.fetch_sub(1, Ordering::AcqRel);
    }
}

async fn worker_loop(slot: WorkerSlot, first_guard: InFlight, first: ProbeFuture, core: bool) {
    let shared = slot.0.clone();
    first_guard.run(first).await;
    loop {
        let next = if core {
            shared.receiver.lock().await.recv().await
        } else {
            let recv = async { shared.receiver.lock().await.recv().await };
            match tokio::time::timeout(shared.keep_alive, recv).await {
                Ok(next) => next,
                Err(_) => {
                    debug!("Idle probe worker retired");
                    None
                }
            }
        };
        match next {
            Some(task) => InFlight::new(shared.clone()).run(task).await,
            None => break,
        }
    }
}
