//! Sink construction errors

use thiserror::Error;

/// Sink-specific errors
#[derive(Debug, Error)]
pub enum SinkError {
    /// Sink creation error
    #[error("failed to create sink '{name}': {message}")]
    Creation { name: String, message: String },

    /// Error from contract (bad params, io)
    #[error("sink error: {0}")]
    Contract(#[from] contracts::ContractError),
}

impl SinkError {
    /// Create a sink creation error
    pub fn creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Creation {
            name: name.into(),
            message: message.into(),
        }
    }
}
