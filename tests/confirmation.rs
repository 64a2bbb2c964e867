use async_trait::async_trait;
use oastscan::correlation::{ConfirmationScheduler, CorrelationStore, CyclePhase, HitSink, TickOutcome};
use oastscan::errors::ScanError;
use oastscan::models::{ConfirmedHit, ProbeId};
use oastscan::oast::{BackendAdapter, OastBackend};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

struct CannedBackend {
    interactions: Vec<String>,
    fail: bool,
    gate: Option<Arc<Semaphore>>,
    calls: AtomicUsize,
}

impl CannedBackend {
    fn returning(interactions: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            interactions: interactions.iter().map(|s| s.to_string()).collect(),
            fail: false,
            gate: None,
            calls: AtomicUsize::new(0),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self { interactions: Vec::new(), fail: true, gate: None, calls: AtomicUsize::new(0) })
    }

    /// Every fetch waits for a permit on `gate` before answering.
    fn gated(interactions: &[&str], gate: Arc<Semaphore>) -> Arc<Self> {
        Arc::new(Self {
            interactions: interactions.iter().map(|s| s.to_string()).collect(),
            fail: false,
            gate: Some(gate),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl OastBackend for CannedBackend {
    async fn fetch_all_interactions(&self) -> Result<Vec<String>, ScanError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await;
        }
        if self.fail {
            return Err(ScanError::Network("connection refused".into()));
        }
        Ok(self.interactions.clone())
    }

    fn payload_domain(&self) -> Result<String, ScanError> {
        Ok("attacker.com".into())
    }

    fn backend_name(&self) -> &str {
        "canned"
    }
}

#[derive(Default)]
struct Recorder {
    hits: Mutex<Vec<ConfirmedHit<u32>>>,
}

impl HitSink<u32> for Recorder {
    fn on_hit(&self, hit: ConfirmedHit<u32>) {
        self.hits.lock().unwrap().push(hit);
    }
}

fn scheduler(
    backend: Arc<CannedBackend>,
) -> (ConfirmationScheduler<u32>, Arc<CorrelationStore<u32>>, Arc<Recorder>) {
    let store = Arc::new(CorrelationStore::new());
    let recorder = Arc::new(Recorder::default());
    let adapter = BackendAdapter::new(backend, Duration::from_secs(5));
    let scheduler = ConfirmationScheduler::new(store.clone(), adapter, recorder.clone());
    (scheduler, store, recorder)
}

#[tokio::test]
async fn hit_emitted_once_per_handle() {
    let backend = CannedBackend::returning(&["abc.attacker.com", "xyz.attacker.com"]);
    let (scheduler, store, recorder) = scheduler(backend.clone());
    store.register(ProbeId::from("abc"), 1);
    store.register(ProbeId::from("abc"), 2);
    store.register(ProbeId::from("qrs"), 3);

    let TickOutcome::Checked(summary) = scheduler.tick().await else {
        panic!("expected a checked cycle");
    };
    assert_eq!(summary.checked_ids, 2);
    assert_eq!(summary.checked_handles, 3);
    assert_eq!(summary.interactions, 2);
    assert_eq!(summary.hit_ids, 1);
    assert_eq!(summary.hits, 2);
    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);

    let hits = recorder.hits.lock().unwrap();
    let mut handles: Vec<u32> = hits.iter().map(|h| h.handle).collect();
    handles.sort_unstable();
    assert_eq!(handles, vec![1, 2]);
    assert!(hits.iter().all(|h| h.probe_id.as_str() == "abc" && h.interaction == "abc.attacker.com"));
    assert!(store.is_empty());
    assert_eq!(scheduler.phase(), CyclePhase::Idle);
}

#[tokio::test]
async fn idle_tick_does_not_poll_backend() {
    let backend = CannedBackend::returning(&["abc.attacker.com"]);
    let (scheduler, _store, recorder) = scheduler(backend.clone());

    assert_eq!(scheduler.tick().await, TickOutcome::Idle);
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    assert!(recorder.hits.lock().unwrap().is_empty());
    assert_eq!(scheduler.totals().cycles, 0);
}

#[tokio::test]
async fn failed_fetch_discards_pending_probes() {
    let backend = CannedBackend::failing();
    let (scheduler, store, recorder) = scheduler(backend.clone());
    store.register(ProbeId::from("abc"), 1);

    let TickOutcome::Checked(summary) = scheduler.tick().await else {
        panic!("expected a checked cycle");
    };
    assert_eq!(summary.checked_ids, 1);
    assert_eq!(summary.interactions, 0);
    assert_eq!(summary.hits, 0);
    assert!(store.is_empty());
    assert!(recorder.hits.lock().unwrap().is_empty());

    // Not requeued: the next tick has nothing to check.
    assert_eq!(scheduler.tick().await, TickOutcome::Idle);
    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn identifiers_are_checked_once() {
    let backend = CannedBackend::returning(&["abc.attacker.com"]);
    let (scheduler, store, recorder) = scheduler(backend.clone());
    store.register(ProbeId::from("abc"), 7);

    scheduler.tick().await;
    scheduler.tick().await;
    assert_eq!(recorder.hits.lock().unwrap().len(), 1);
    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);

    let totals = scheduler.totals();
    assert_eq!(totals.cycles, 1);
    assert_eq!(totals.checked_ids, 1);
    assert_eq!(totals.hits, 1);
}

#[tokio::test]
async fn final_check_waits_for_running_cycle() {
    let gate = Arc::new(Semaphore::new(0));
    let backend = CannedBackend::gated(&["early.attacker.com", "late.attacker.com"], gate.clone());
    let (scheduler, store, recorder) = scheduler(backend.clone());
    let scheduler = Arc::new(scheduler);

    store.register(ProbeId::from("early"), 1);
    let timer = {
        let scheduler = scheduler.clone();
        tokio::spawn(async move { scheduler.tick().await })
    };
    while backend.calls.load(Ordering::SeqCst) == 0 {
        tokio::task::yield_now().await;
    }

    // Registered after the running cycle drained the store.
    store.register(ProbeId::from("late"), 2);
    assert_eq!(scheduler.tick().await, TickOutcome::InProgress);

    let last = {
        let scheduler = scheduler.clone();
        tokio::spawn(async move { scheduler.tick_after_current().await })
    };
    tokio::task::yield_now().await;
    gate.add_permits(1);

    assert!(matches!(timer.await.unwrap(), TickOutcome::Checked(_)));
    let TickOutcome::Checked(summary) = last.await.unwrap() else {
        panic!("expected the final cycle to check the late identifier");
    };
    assert_eq!(summary.checked_ids, 1);
    assert_eq!(summary.hits, 1);
    assert!(store.is_empty());

    let mut handles: Vec<u32> = recorder.hits.lock().unwrap().iter().map(|h| h.handle).collect();
    handles.sort_unstable();
    assert_eq!(handles, vec![1, 2]);
    assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
}
