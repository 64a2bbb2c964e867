use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Owns every periodic and long-running background task of the engine so that
/// they share one cancellation point and one shutdown path.
pub struct IntervalRegistry {
    cancel: CancellationToken,
    tasks: Mutex<JoinSet<()>>,
}

impl IntervalRegistry {
    pub fn new() -> Self {
        Self {
            cancel: CancellationToken::new(),
            tasks: Mutex::new(JoinSet::new()),
        }
    }

    fn tasks(&self) -> MutexGuard<'_, JoinSet<()>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `job` after `initial_delay`, then every `period`. A run is never
    /// interrupted by shutdown and runs never overlap; a run that overruns the
    /// period delays the next one.
    pub fn spawn_interval<F, Fut>(
        &self,
        name: &'static str,
        initial_delay: Duration,
        period: Duration,
        mut job: F,
    ) where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = self.cancel.child_token();
        let period = period.max(Duration::from_millis(1));
        debug!(task = name, ?initial_delay, ?period, "Registering interval task");

        self.tasks().spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!(task = name, "Interval task cancelled before first run");
                    return;
                }
                _ = tokio::time::sleep(initial_delay) => {}
            }

            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;

            loop {
                job().await;
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }
            }
            debug!(task = name, "Interval task stopped");
        });
    }

    /// Spawn a long-running task that watches the registry's token itself.
    pub fn spawn_worker<F, Fut>(&self, name: &'static str, worker: F)
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        debug!(task = name, "Registering background worker");
        let fut = worker(self.cancel.child_token());
        self.tasks().spawn(fut);
    }

    pub fn is_shutting_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn active_tasks(&self) -> usize {
        self.tasks().len()
    }

    /// Cancel every task and wait up to `grace` for in-progress runs to
    /// finish. Returns false when stragglers had to be aborted.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        self.cancel.cancel();
        let mut tasks = std::mem::take(&mut *self.tasks());
        let count = tasks.len();

        let drained = tokio::time::timeout(grace, async {
            while tasks.join_next().await.is_some() {}
        })
        .await
        .is_ok();

        if !drained {
            warn!(remaining = tasks.len(), "Background tasks did not stop in time, aborting");
            tasks.abort_all();
            while tasks.join_next().await.is_some() {}
        }
        info!(tasks = count, clean = drained, "Background tasks stopped");
        drained
    }
}

impl Default for IntervalRegistry {
    fn default() -> Self {
        Self::new()
    }
}
