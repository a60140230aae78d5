//! Error types for CLI operations.

use std::path::Path;
use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Configured sink could not be created
    #[error("Failed to set up sink '{sink}': {message}")]
    SinkSetup { sink: String, message: String },

    /// Reading the input stream failed
    #[error("Failed to read input: {0}")]
    Input(#[from] std::io::Error),
}

impl CliError {
    pub fn config_not_found(path: &Path) -> Self {
        Self::ConfigNotFound {
            path: path.display().to_string(),
        }
    }

    pub fn sink_setup(sink: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkSetup {
            sink: sink.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_subject() {
        let err = CliError::config_not_found(Path::new("missing.toml"));
        assert_eq!(err.to_string(), "Configuration file not found: missing.toml");

        let err = CliError::sink_setup("main", "bad path");
        assert!(err.to_string().contains("'main'"));
    }
}
