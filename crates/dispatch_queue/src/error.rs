//! Dispatch Queue error types

use thiserror::Error;

/// Errors surfaced to the caller of `DispatchQueue::push`
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// Mailbox full - job dropped
    #[error("queue '{queue}' at capacity ({capacity}), job dropped")]
    AtCapacity { queue: String, capacity: usize },

    /// Queue shut down - job dropped
    #[error("queue '{queue}' is closed, job dropped")]
    Closed { queue: String },
}

impl QueueError {
    /// Create an at-capacity error
    pub fn at_capacity(queue: impl Into<String>, capacity: usize) -> Self {
        Self::AtCapacity {
            queue: queue.into(),
            capacity,
        }
    }

    /// Create a closed error
    pub fn closed(queue: impl Into<String>) -> Self {
        Self::Closed {
            queue: queue.into(),
        }
    }

    /// Whether the job was rejected because of backpressure
    pub fn is_capacity(&self) -> bool {
        matches!(self, Self::AtCapacity { .. })
    }
}
