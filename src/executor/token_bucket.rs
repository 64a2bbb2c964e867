use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Process-wide request budget shared by every probe submission.
///
/// Capacity is `ceil(qps)`. The bucket starts with a single token, so the
/// first acquire is immediate but there is no start-up burst.
pub struct TokenBucket {
    /// `None` means unlimited.
    rate: Option<f64>,
    capacity: f64,
    state: Mutex<BucketState>,
}

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    pub fn new(qps: f64) -> Self {
        let rate = (qps.is_finite() && qps > 0.0).then_some(qps);
        let capacity = rate.map(|r| r.ceil().max(1.0)).unwrap_or(f64::INFINITY);
        Self {
            rate,
            capacity,
            state: Mutex::new(BucketState {
                tokens: 1.0,
                last_refill: Instant::now(),
            }),
        }
    }

    pub fn rate(&self) -> Option<f64> {
        self.rate
    }

    /// Take one token, sleeping exactly as long as it takes for one to
    /// accumulate. Refill and take happen under one lock, so concurrent
    /// callers are served one at a time.
    pub async fn acquire(&self) {
        let Some(rate) = self.rate else {
            return;
        };
        let mut state = self.state.lock().await;
        self.refill(&mut state, rate);
        if state.tokens < 1.0 {
            let wait = Duration::from_secs_f64((1.0 - state.tokens) / rate);
            tokio::time::sleep(wait).await;
            self.refill(&mut state, rate);
        }
        state.tokens = (state.tokens - 1.0).max(0.0);
    }

    /// Tokens currently available, after refilling.
    pub async fn available(&self) -> f64 {
        let Some(rate) = self.rate else {
            return f64::INFINITY;
        };
        let mut state = self.state.lock().await;
        self.refill(&mut state, rate);
        state.tokens
    }

    fn refill(&self, state: &mut BucketState, rate: f64) {
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * rate).min(self.capacity);
        state.last_refill = now;
    }
}
