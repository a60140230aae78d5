//! Delivery configuration contracts that can be shared across crates.
//!
//! Every field has a documented default, and a zero value resolves to that
//! default instead of being rejected.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default accumulator size (bytes) that forces a flush
pub const DEFAULT_BUFFER_SIZE: usize = 1028;
/// Default inactivity before an automatic flush (milliseconds)
pub const DEFAULT_IDLE_TIMEOUT_MS: u64 = 5_000;
/// Default number of queued flushes before new ones are dropped
pub const DEFAULT_PENDING_FLUSHES: usize = 100;
/// Default write attempts per flush before giving up
pub const DEFAULT_WRITE_RETRIES: usize = 3;
/// Default slack of the buffer command channel
pub const DEFAULT_COMMAND_CAPACITY: usize = 1;

/// Default Dispatch Queue mailbox capacity
pub const DEFAULT_QUEUE_CAPACITY: usize = 20;
/// Default Dispatch Queue worker count
pub const DEFAULT_QUEUE_CONCURRENCY: usize = 1;

/// Batching Buffer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferConfig {
    /// Buffer size in bytes before flushing
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Time to wait without an append before flushing (milliseconds)
    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,

    /// Number of flushes to queue up before we start dropping
    #[serde(default = "default_pending_flushes")]
    pub pending_flushes: usize,

    /// Number of write attempts per flush before giving up
    #[serde(default = "default_write_retries")]
    pub write_retries: usize,

    /// Slack of the command channel between producers and the command loop
    #[serde(default = "default_command_capacity")]
    pub command_capacity: usize,
}

fn default_buffer_size() -> usize {
    DEFAULT_BUFFER_SIZE
}

fn default_idle_timeout_ms() -> u64 {
    DEFAULT_IDLE_TIMEOUT_MS
}

fn default_pending_flushes() -> usize {
    DEFAULT_PENDING_FLUSHES
}

fn default_write_retries() -> usize {
    DEFAULT_WRITE_RETRIES
}

fn default_command_capacity() -> usize {
    DEFAULT_COMMAND_CAPACITY
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            idle_timeout_ms: DEFAULT_IDLE_TIMEOUT_MS,
            pending_flushes: DEFAULT_PENDING_FLUSHES,
            write_retries: DEFAULT_WRITE_RETRIES,
            command_capacity: DEFAULT_COMMAND_CAPACITY,
        }
    }
}

impl BufferConfig {
    /// Config with only the flush threshold set, everything else zero
    ///
    /// Zero fields resolve to their defaults once the buffer is spawned.
    pub fn with_buffer_size(buffer_size: usize) -> Self {
        Self {
            buffer_size,
            idle_timeout_ms: 0,
            pending_flushes: 0,
            write_retries: 0,
            command_capacity: 0,
        }
    }

    /// Replace zero-valued fields with their defaults
    pub fn resolved(&self) -> Self {
        Self {
            buffer_size: non_zero(self.buffer_size, DEFAULT_BUFFER_SIZE),
            idle_timeout_ms: if self.idle_timeout_ms == 0 {
                DEFAULT_IDLE_TIMEOUT_MS
            } else {
                self.idle_timeout_ms
            },
            pending_flushes: non_zero(self.pending_flushes, DEFAULT_PENDING_FLUSHES),
            write_retries: non_zero(self.write_retries, DEFAULT_WRITE_RETRIES),
            command_capacity: non_zero(self.command_capacity, DEFAULT_COMMAND_CAPACITY),
        }
    }

    /// Idle timeout as a Duration
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }
}

/// Dispatch Queue configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Jobs to queue before new pushes are rejected
    #[serde(default = "default_queue_capacity")]
    pub capacity: usize,

    /// Number of worker tasks running jobs
    #[serde(default = "default_queue_concurrency")]
    pub concurrency: usize,
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

fn default_queue_concurrency() -> usize {
    DEFAULT_QUEUE_CONCURRENCY
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_QUEUE_CAPACITY,
            concurrency: DEFAULT_QUEUE_CONCURRENCY,
        }
    }
}

impl QueueConfig {
    /// Create a queue config
    pub fn new(capacity: usize, concurrency: usize) -> Self {
        Self {
            capacity,
            concurrency,
        }
    }

    /// Replace zero-valued fields with their defaults
    pub fn resolved(&self) -> Self {
        Self {
            capacity: non_zero(self.capacity, DEFAULT_QUEUE_CAPACITY),
            concurrency: non_zero(self.concurrency, DEFAULT_QUEUE_CONCURRENCY),
        }
    }
}

#[inline]
fn non_zero(value: usize, default: usize) -> usize {
    if value == 0 {
        default
    } else {
        value
    }
}
