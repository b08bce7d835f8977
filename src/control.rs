// Control plane: admission control for path searches
//
// Bounds concurrent searches with a semaphore and throttles request
// rate with a one-second sliding window.
//
// Numan Thabit 2025 Nov

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;
use tracing::debug;

#[derive(Clone)]
pub struct AdmissionControl {
    max_inflight: Arc<Semaphore>,
    capacity: usize,
    inner: Arc<Mutex<RateLimiter>>,
}

struct RateLimiter {
    rate_per_sec: u32,
    timestamps: VecDeque<Instant>,
    window: Duration,
}

impl RateLimiter {
    fn evict(&mut self, now: Instant) {
        while let Some(front) = self.timestamps.front() {
            if now.duration_since(*front) >= self.window {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }
}

impl AdmissionControl {
    pub fn new(max_inflight: usize, rate_per_sec: Option<u32>) -> Self {
        let max_inflight = max_inflight.max(1);
        let rl = RateLimiter {
            rate_per_sec: rate_per_sec.unwrap_or(200).max(1),
            timestamps: VecDeque::with_capacity(256),
            window: Duration::from_secs(1),
        };
        Self {
            max_inflight: Arc::new(Semaphore::new(max_inflight)),
            capacity: max_inflight,
            inner: Arc::new(Mutex::new(rl)),
        }
    }

    /// Wait for a rate-limit slot, then for an in-flight permit.
    pub async fn acquire(&self) -> AdmissionPermit {
        loop {
            let mut guard = self.inner.lock().await;
            let now = Instant::now();
            guard.evict(now);
            if (guard.timestamps.len() as u32) < guard.rate_per_sec {
                guard.timestamps.push_back(now);
                break;
            }
            let wait = guard
                .timestamps
                .front()
                .map(|front| guard.window.saturating_sub(now.duration_since(*front)))
                .unwrap_or(Duration::from_millis(5));
            drop(guard);
            debug!(wait_ms = wait.as_millis() as u64, "admission rate limited");
            tokio::time::sleep(wait.max(Duration::from_millis(1))).await;
        }

        let permit = self
            .max_inflight
            .clone()
            .acquire_owned()
            .await
            .expect("semaphore not closed");
        AdmissionPermit { _permit: permit }
    }

    /// Searches currently holding a permit
    pub fn inflight(&self) -> usize {
        self.capacity - self.max_inflight.available_permits()
    }
}

pub struct AdmissionPermit {
    _permit: OwnedSemaphorePermit,
}
