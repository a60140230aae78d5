//! Queue metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for a single dispatch queue
#[derive(Debug, Default)]
pub struct QueueMetrics {
    /// Jobs accepted into the mailbox
    accepted_count: AtomicU64,
    /// Jobs rejected because the mailbox was full or closed
    rejected_count: AtomicU64,
    /// Jobs that ran to completion
    completed_count: AtomicU64,
    /// Jobs that panicked
    panicked_count: AtomicU64,
}

impl QueueMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Get accepted count
    pub fn accepted_count(&self) -> u64 {
        self.accepted_count.load(Ordering::Relaxed)
    }

    /// Increment accepted count
    pub fn inc_accepted_count(&self) {
        self.accepted_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get rejected count
    pub fn rejected_count(&self) -> u64 {
        self.rejected_count.load(Ordering::Relaxed)
    }

    /// Increment rejected count
    pub fn inc_rejected_count(&self) {
        self.rejected_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get completed count
    pub fn completed_count(&self) -> u64 {
        self.completed_count.load(Ordering::Relaxed)
    }

    /// Increment completed count
    pub fn inc_completed_count(&self) {
        self.completed_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get panicked count
    pub fn panicked_count(&self) -> u64 {
        self.panicked_count.load(Ordering::Relaxed)
    }

    /// Increment panicked count
    pub fn inc_panicked_count(&self) {
        self.panicked_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self, pending: usize) -> QueueMetricsSnapshot {
        QueueMetricsSnapshot {
            pending,
            accepted_count: self.accepted_count(),
            rejected_count: self.rejected_count(),
            completed_count: self.completed_count(),
            panicked_count: self.panicked_count(),
        }
    }
}

/// Snapshot of queue metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueMetricsSnapshot {
    pub pending: usize,
    pub accepted_count: u64,
    pub rejected_count: u64,
    pub completed_count: u64,
    pub panicked_count: u64,
}
