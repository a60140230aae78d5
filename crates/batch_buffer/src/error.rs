//! Batching Buffer error types

use thiserror::Error;

/// Errors returned to callers of a closed buffer
///
/// Sink failures never show up here; they stay inside the write loop.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BufferError {
    /// Command loop is gone (buffer closed)
    #[error("buffer '{buffer}' is closed")]
    Closed { buffer: String },
}

impl BufferError {
    /// Create a closed error
    pub fn closed(buffer: impl Into<String>) -> Self {
        Self::Closed {
            buffer: buffer.into(),
        }
    }
}
