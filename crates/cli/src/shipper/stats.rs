//! Shipping statistics and metrics.

use std::time::Duration;

use batch_buffer::BufferMetricsSnapshot;
use contracts::DeliveryMode;
use dispatch_queue::QueueMetricsSnapshot;
use observability::{RunningStats, StatsSummary};
use serde::Serialize;

/// Delivery-side counters, per mode
#[derive(Debug, Clone, Copy)]
pub enum DeliveryReport {
    Batched(BufferMetricsSnapshot),
    Dispatched(QueueMetricsSnapshot),
}

/// Statistics from a shipping run
#[derive(Debug, Clone)]
pub struct ShipStats {
    /// Delivery mode used
    pub mode: DeliveryMode,

    /// Lines read from the input
    pub lines_read: u64,

    /// Bytes handed to the delivery component (newlines included)
    pub bytes_read: u64,

    /// Lines refused by a full dispatch queue
    pub lines_rejected: u64,

    /// Stopped by a shutdown signal rather than end of input
    pub interrupted: bool,

    /// Total duration of the run
    pub duration: Duration,

    /// Per-line size distribution
    pub line_sizes: RunningStats,

    /// Delivery counters, filled in after the drain
    pub delivery: Option<DeliveryReport>,
}

impl ShipStats {
    /// Empty stats for a run in `mode`
    pub fn new(mode: DeliveryMode) -> Self {
        Self {
            mode,
            lines_read: 0,
            bytes_read: 0,
            lines_rejected: 0,
            interrupted: false,
            duration: Duration::ZERO,
            line_sizes: RunningStats::default(),
            delivery: None,
        }
    }

    /// Account for one line of `bytes` (newline included)
    pub fn record_line(&mut self, bytes: usize) {
        self.lines_read += 1;
        self.bytes_read += bytes as u64;
        self.line_sizes.push(bytes as f64);
    }

    /// Lines per second throughput
    pub fn lines_per_sec(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.lines_read as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Serializable view for `--json` style output
    pub fn summary(&self) -> SummaryView {
        let (written_bytes, dropped) = match self.delivery {
            Some(DeliveryReport::Batched(m)) => (Some(m.written_bytes), m.dropped_flush_count),
            Some(DeliveryReport::Dispatched(m)) => (None, m.rejected_count),
            None => (None, 0),
        };

        SummaryView {
            mode: self.mode.to_string(),
            lines_read: self.lines_read,
            bytes_read: self.bytes_read,
            written_bytes,
            dropped,
            interrupted: self.interrupted,
            duration_secs: self.duration.as_secs_f64(),
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Shipping Statistics                       ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Mode: {}", self.mode);
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Lines read: {}", self.lines_read);
        println!("   ├─ Bytes read: {}", self.bytes_read);
        println!("   ├─ Lines/s: {:.2}", self.lines_per_sec());
        println!("   ├─ Line size: {}", StatsSummary::from(&self.line_sizes));
        println!("   └─ Interrupted: {}", self.interrupted);

        match self.delivery {
            Some(DeliveryReport::Batched(m)) => {
                println!("\n📦 Batching Buffer");
                println!("   ├─ Flushes: {}", m.flush_count);
                println!("   ├─ Flushes dropped: {}", m.dropped_flush_count);
                println!("   ├─ Idle flushes deferred: {}", m.deferred_idle_flush_count);
                println!("   ├─ Batches delivered: {}", m.delivered_batches);
                println!("   ├─ Batches abandoned: {}", m.abandoned_batches);
                println!("   ├─ Retries: {}", m.retry_count);
                println!("   └─ Bytes written: {}", m.written_bytes);
            }
            Some(DeliveryReport::Dispatched(m)) => {
                println!("\n🚚 Dispatch Queue");
                println!("   ├─ Jobs accepted: {}", m.accepted_count);
                println!("   ├─ Jobs rejected: {}", m.rejected_count);
                println!("   ├─ Jobs completed: {}", m.completed_count);
                println!("   └─ Jobs panicked: {}", m.panicked_count);
            }
            None => {}
        }

        println!();
    }
}

/// Flat summary of a run
#[derive(Debug, Serialize)]
pub struct SummaryView {
    pub mode: String,
    pub lines_read: u64,
    pub bytes_read: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub written_bytes: Option<u64>,
    pub dropped: u64,
    pub interrupted: bool,
    pub duration_secs: f64,
}
