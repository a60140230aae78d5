//! # Batching Buffer
//!
//! Coalesces small writes into batches and delivers them to a slow or
//! unreliable [`ByteSink`] without ever blocking the producer.
//!
//! Responsibilities:
//! - Accumulate appended bytes in a single-owner accumulator
//! - Flush on a size threshold, after an idle period, or on request
//! - Drop flushes instead of queuing without bound when the sink falls behind
//! - Retry partial/failing writes a bounded number of times, then abandon
//!
//! ## Task layout
//!
//! ```text
//!   BufferHandle (clone per producer)
//!        │ Command (append / flush / shutdown)
//!        v
//!   command loop ── owns the accumulator, runs the idle timer
//!        │ FlushRequest (bounded, `pending_flushes`)
//!        v
//!   write loop ──── owns the sink, retries up to `write_retries`
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use batch_buffer::{BatchBuffer, BufferConfig};
//!
//! let buffer = BatchBuffer::spawn(sink, &BufferConfig::default());
//! buffer.append("hello\n").await;
//! buffer.flush().await?;
//! buffer.close().await;
//! ```

mod buffer;
mod command;
pub mod error;
pub mod metrics;
mod writer;

#[cfg(test)]
mod test_sinks;

pub use buffer::{BatchBuffer, BufferHandle};
pub use contracts::{BufferConfig, ByteSink};
pub use error::BufferError;
pub use metrics::{BufferMetrics, BufferMetricsSnapshot};
