//! Delivery metrics
//!
//! Process-wide counters for the Batching Buffer and the Dispatch Queue,
//! recorded through the `metrics` facade. Nothing is recorded unless a
//! recorder (e.g. the Prometheus exporter) has been installed.

use metrics::{counter, gauge, histogram};

/// What caused a buffer flush
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushTrigger {
    /// Accumulator reached the size threshold
    Size,
    /// No append within the idle timeout
    Idle,
    /// Caller asked for a synchronous flush
    Explicit,
    /// Terminal drain on close
    Close,
}

impl FlushTrigger {
    /// Label value used in metrics and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Size => "size",
            Self::Idle => "idle",
            Self::Explicit => "explicit",
            Self::Close => "close",
        }
    }
}

impl std::fmt::Display for FlushTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record bytes appended to a buffer
pub fn record_append(buffer: &str, bytes: usize) {
    counter!("logship_buffer_appended_bytes_total", "buffer" => buffer.to_string())
        .increment(bytes as u64);
}

/// Record a flush handed to the write loop
pub fn record_flush(buffer: &str, trigger: FlushTrigger, bytes: usize) {
    counter!(
        "logship_buffer_flushes_total",
        "buffer" => buffer.to_string(),
        "trigger" => trigger.as_str()
    )
    .increment(1);
    histogram!("logship_buffer_flush_bytes", "buffer" => buffer.to_string()).record(bytes as f64);
}

/// Record a flush dropped because the write loop was backed up
pub fn record_flush_dropped(buffer: &str, trigger: FlushTrigger, bytes: usize) {
    counter!(
        "logship_buffer_flushes_dropped_total",
        "buffer" => buffer.to_string(),
        "trigger" => trigger.as_str()
    )
    .increment(1);
    counter!("logship_buffer_dropped_bytes_total", "buffer" => buffer.to_string())
        .increment(bytes as u64);
}

/// Record a batch fully written to the sink
pub fn record_batch_delivered(buffer: &str, bytes: usize, attempts: usize) {
    counter!("logship_buffer_batches_delivered_total", "buffer" => buffer.to_string())
        .increment(1);
    counter!("logship_buffer_written_bytes_total", "buffer" => buffer.to_string())
        .increment(bytes as u64);
    histogram!("logship_buffer_write_attempts", "buffer" => buffer.to_string())
        .record(attempts as f64);
}

/// Record a batch abandoned after exhausting its retries
pub fn record_batch_abandoned(buffer: &str, unwritten_bytes: usize) {
    counter!("logship_buffer_batches_abandoned_total", "buffer" => buffer.to_string())
        .increment(1);
    counter!("logship_buffer_abandoned_bytes_total", "buffer" => buffer.to_string())
        .increment(unwritten_bytes as u64);
}

/// Record a push into a dispatch queue
pub fn record_job_pushed(queue: &str, accepted: bool) {
    let status = if accepted { "accepted" } else { "rejected" };
    counter!(
        "logship_queue_jobs_pushed_total",
        "queue" => queue.to_string(),
        "status" => status
    )
    .increment(1);
}

/// Record a finished job
pub fn record_job_completed(queue: &str, panicked: bool) {
    let status = if panicked { "panicked" } else { "completed" };
    counter!(
        "logship_queue_jobs_finished_total",
        "queue" => queue.to_string(),
        "status" => status
    )
    .increment(1);
}

/// Record jobs accepted but not yet finished
pub fn record_queue_pending(queue: &str, pending: usize) {
    gauge!("logship_queue_pending_jobs", "queue" => queue.to_string()).set(pending as f64);
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.1}, max={:.1}, mean={:.1}, std={:.1} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Add a sample
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// Sample count
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Mean
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// Standard deviation
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Minimum
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Maximum
    pub fn max(&self) -> f64 {
        self.max
    }
}
