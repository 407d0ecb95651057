//! Token-bucket rate limiter shared by all delivery tasks.
//!
//! The bucket starts full. A background task adds one permit per refill
//! interval, dropping the refill when the bucket is already at capacity, so
//! up to `capacity` sends go out immediately and sustained throughput settles
//! at one send per interval.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, trace};

/// Default number of permits the bucket can hold.
pub const DEFAULT_CAPACITY: usize = 5;

/// Default time between refills.
pub const DEFAULT_REFILL_INTERVAL: Duration = Duration::from_secs(1);

/// Token bucket backed by a semaphore and a periodic refill task.
pub struct RateLimiter {
    permits: Arc<Semaphore>,
    capacity: usize,
    refill: Mutex<Option<JoinHandle<()>>>,
}

impl RateLimiter {
    /// Create a limiter with the default capacity and refill interval.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new() -> Self {
        Self::with_params(DEFAULT_CAPACITY, DEFAULT_REFILL_INTERVAL)
    }

    /// Create a limiter holding `capacity` permits, refilled one per `refill_interval`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn with_params(capacity: usize, refill_interval: Duration) -> Self {
        let permits = Arc::new(Semaphore::new(capacity));
        let refill = tokio::spawn(refill_loop(permits.clone(), capacity, refill_interval));

        debug!(
            capacity,
            refill_interval_ms = refill_interval.as_millis() as u64,
            "Rate limiter started"
        );

        Self {
            permits,
            capacity,
            refill: Mutex::new(Some(refill)),
        }
    }

    /// Wait until a permit is available, then consume it.
    pub async fn acquire(&self) {
        // The semaphore is never closed, so acquire only fails if that changes.
        if let Ok(permit) = self.permits.acquire().await {
            permit.forget();
        }
    }

    /// Permits currently available.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Stop the refill schedule. Safe to call more than once.
    pub fn close(&self) {
        if let Some(refill) = self.refill.lock().take() {
            refill.abort();
            debug!("Rate limiter closed");
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RateLimiter {
    fn drop(&mut self) {
        self.close();
    }
}

async fn refill_loop(permits: Arc<Semaphore>, capacity: usize, refill_interval: Duration) {
    let mut ticker = interval_at(Instant::now() + refill_interval, refill_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        // Only this task adds permits, so the check cannot race past capacity.
        if permits.available_permits() < capacity {
            permits.add_permits(1);
            trace!(available = permits.available_permits(), "Permit refilled");
        }
    }
}
