//! # Dispatch Queue
//!
//! Bounded worker pool for fire-and-forget send jobs.
//!
//! Responsibilities:
//! - Accept jobs without ever blocking the producer
//! - Reject jobs with an explicit error once the mailbox is full
//! - Run accepted jobs on a fixed set of worker tasks
//! - Let shutdown paths wait until every accepted job has finished
//!
//! ## Example
//!
//! ```ignore
//! use dispatch_queue::DispatchQueue;
//!
//! let queue = DispatchQueue::new(20, 2);
//! queue.push(async move { ship(record).await })?;
//! queue.wait().await;
//! ```

pub mod dispatcher;
pub mod error;
pub mod metrics;
pub mod queue;

pub use contracts::{QueueConfig, RecordSink};
pub use dispatcher::RecordDispatcher;
pub use error::QueueError;
pub use metrics::{QueueMetrics, QueueMetricsSnapshot};
pub use queue::{DispatchQueue, Job};
