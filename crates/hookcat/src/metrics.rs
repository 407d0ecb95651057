//! Delivery counters shared by every in-flight send.

use parking_lot::Mutex;

/// Point-in-time copy of the delivery counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Messages acknowledged by the webhook.
    pub messages_sent: u64,
    /// Messages abandoned after exhausting retries.
    pub messages_failed: u64,
    /// Bytes of message content acknowledged by the webhook.
    pub bytes_sent: u64,
}

/// Thread-safe delivery counters.
///
/// Sent count and byte count move together under one lock so a snapshot
/// never observes one without the other.
#[derive(Debug, Default)]
pub struct Metrics {
    inner: Mutex<MetricsSnapshot>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one successful delivery of `bytes` bytes.
    pub fn record_sent(&self, bytes: usize) {
        let mut guard = self.inner.lock();
        guard.messages_sent += 1;
        guard.bytes_sent += bytes as u64;
    }

    /// Record one message that could not be delivered.
    pub fn record_failed(&self) {
        self.inner.lock().messages_failed += 1;
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        *self.inner.lock()
    }
}
