//! ShipperBlueprint - Config Loader output
//!
//! Describes a complete delivery pipeline: which component carries the
//! records, how it is tuned, and where the records end up.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{BufferConfig, ContractError, QueueConfig};

/// Config version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete pipeline blueprint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipperBlueprint {
    /// Config version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Which delivery component carries records
    #[serde(default)]
    pub mode: DeliveryMode,

    /// Batching Buffer tuning (used in `batched` mode)
    #[serde(default)]
    pub buffer: BufferConfig,

    /// Dispatch Queue tuning (used in `dispatched` mode)
    #[serde(default)]
    pub queue: QueueConfig,

    /// Output destination
    pub sink: SinkConfig,
}

/// Delivery component selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// Coalesce records into batches (Batching Buffer)
    #[default]
    Batched,
    /// Send every record as its own job (Dispatch Queue)
    Dispatched,
}

impl std::fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Batched => write!(f, "batched"),
            Self::Dispatched => write!(f, "dispatched"),
        }
    }
}

/// Sink output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink name
    pub name: String,

    /// Sink type
    pub sink_type: SinkType,

    /// Type-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

/// Sink type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// Batch summaries through tracing
    Log,
    /// Append to a file
    File,
    /// Stream over TCP
    Tcp,
    /// Accept and drop everything
    Discard,
    /// Keep everything in memory
    Memory,
}

impl SinkConfig {
    /// Create a sink config without parameters
    pub fn new(name: impl Into<String>, sink_type: SinkType) -> Self {
        Self {
            name: name.into(),
            sink_type,
            params: HashMap::new(),
        }
    }

    /// Add a parameter (builder style)
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Look up a string parameter
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Look up an integer parameter
    ///
    /// # Errors
    /// Returns a validation error if the parameter is present but not an
    /// unsigned integer.
    pub fn param_u64(&self, key: &str) -> Result<Option<u64>, ContractError> {
        match self.params.get(key) {
            None => Ok(None),
            Some(raw) => raw.trim().parse::<u64>().map(Some).map_err(|e| {
                ContractError::config_validation(
                    format!("sink.params.{key}"),
                    format!("expected an unsigned integer, got '{raw}': {e}"),
                )
            }),
        }
    }
}
