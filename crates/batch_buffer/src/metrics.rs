//! Buffer metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for a single batching buffer
#[derive(Debug, Default)]
pub struct BufferMetrics {
    /// Bytes accepted by the command loop
    appended_bytes: AtomicU64,
    /// Appends discarded (closed buffer or no command slack)
    discarded_appends: AtomicU64,
    /// Flushes handed to the write loop
    flush_count: AtomicU64,
    /// Flushes dropped because the write loop was backed up
    dropped_flush_count: AtomicU64,
    /// Idle flushes postponed because the write loop was backed up
    deferred_idle_flush_count: AtomicU64,
    /// Batches fully written
    delivered_batches: AtomicU64,
    /// Batches abandoned after exhausting retries
    abandoned_batches: AtomicU64,
    /// Bytes accepted by the sink
    written_bytes: AtomicU64,
    /// Write attempts beyond the first for each batch
    retry_count: AtomicU64,
}

impl BufferMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_appended_bytes(&self, bytes: usize) {
        self.appended_bytes.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub(crate) fn inc_discarded_appends(&self) {
        self.discarded_appends.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_flush_count(&self) {
        self.flush_count.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_dropped_flush_count(&self) {
        self.dropped_flush_count.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_deferred_idle_flush_count(&self) {
        self.deferred_idle_flush_count.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_delivered(&self, bytes: usize, attempts: usize) {
        self.delivered_batches.fetch_add(1, Ordering::Relaxed);
        self.written_bytes.fetch_add(bytes as u64, Ordering::Relaxed);
        self.add_retries(attempts);
    }

    pub(crate) fn record_abandoned(&self, written: usize, attempts: usize) {
        self.abandoned_batches.fetch_add(1, Ordering::Relaxed);
        self.written_bytes.fetch_add(written as u64, Ordering::Relaxed);
        self.add_retries(attempts);
    }

    fn add_retries(&self, attempts: usize) {
        let retries = attempts.saturating_sub(1) as u64;
        if retries > 0 {
            self.retry_count.fetch_add(retries, Ordering::Relaxed);
        }
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> BufferMetricsSnapshot {
        BufferMetricsSnapshot {
            appended_bytes: self.appended_bytes.load(Ordering::Relaxed),
            discarded_appends: self.discarded_appends.load(Ordering::Relaxed),
            flush_count: self.flush_count.load(Ordering::Relaxed),
            dropped_flush_count: self.dropped_flush_count.load(Ordering::Relaxed),
            deferred_idle_flush_count: self.deferred_idle_flush_count.load(Ordering::Relaxed),
            delivered_batches: self.delivered_batches.load(Ordering::Relaxed),
            abandoned_batches: self.abandoned_batches.load(Ordering::Relaxed),
            written_bytes: self.written_bytes.load(Ordering::Relaxed),
            retry_count: self.retry_count.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of buffer metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BufferMetricsSnapshot {
    pub appended_bytes: u64,
    pub discarded_appends: u64,
    pub flush_count: u64,
    pub dropped_flush_count: u64,
    pub deferred_idle_flush_count: u64,
    pub delivered_batches: u64,
    pub abandoned_batches: u64,
    pub written_bytes: u64,
    pub retry_count: u64,
}
