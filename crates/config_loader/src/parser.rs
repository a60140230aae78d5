//! Config parsing
//!
//! TOML is the documented format; JSON is accepted for generated configs.

use std::path::Path;

use contracts::{ContractError, ShipperBlueprint};

/// Config file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// Infer format from a file extension (case-insensitive)
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Infer format from the extension of `path`
    ///
    /// # Errors
    /// A missing or unknown extension is a parse error naming the file.
    pub fn from_path(path: &Path) -> Result<Self, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse(format!(
                "{}: cannot determine config format without an extension",
                path.display()
            ))
        })?;

        Self::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!(
                "{}: unsupported config format .{ext} (expected .toml or .json)",
                path.display()
            ))
        })
    }

    /// Deserialize a blueprint; validation is left to the caller
    pub fn parse(self, content: &str) -> Result<ShipperBlueprint, ContractError> {
        match self {
            Self::Toml => toml::from_str(content).map_err(|e| parse_error(self, e)),
            Self::Json => serde_json::from_str(content).map_err(|e| parse_error(self, e)),
        }
    }
}

fn parse_error<E>(format: ConfigFormat, e: E) -> ContractError
where
    E: std::error::Error + Send + Sync + 'static,
{
    ContractError::ConfigParse {
        message: format!("{format:?} parse error: {e}"),
        source: Some(Box::new(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{DeliveryMode, SinkType};

    #[test]
    fn test_parse_dispatched_toml() {
        let content = r#"
mode = "dispatched"

[queue]
capacity = 5
concurrency = 2

[sink]
name = "remote"
sink_type = "tcp"
[sink.params]
addr = "127.0.0.1:5140"
"#;
        let bp = ConfigFormat::Toml.parse(content).unwrap();
        assert_eq!(bp.mode, DeliveryMode::Dispatched);
        assert_eq!(bp.queue.capacity, 5);
        assert_eq!(bp.queue.concurrency, 2);
        assert_eq!(bp.sink.sink_type, SinkType::Tcp);
    }

    #[test]
    fn test_parse_json_fills_buffer_defaults() {
        let content = r#"{
            "buffer": { "buffer_size": 512, "idle_timeout_ms": 100 },
            "sink": { "name": "log", "sink_type": "log" }
        }"#;
        let bp = ConfigFormat::Json.parse(content).unwrap();
        assert_eq!(bp.mode, DeliveryMode::Batched);
        assert_eq!(bp.buffer.buffer_size, 512);
        assert_eq!(bp.buffer.idle_timeout_ms, 100);
        assert_eq!(bp.buffer.write_retries, contracts::DEFAULT_WRITE_RETRIES);
    }

    #[test]
    fn test_syntax_error_keeps_source() {
        let err = ConfigFormat::Toml.parse("invalid toml [[[").unwrap_err();
        match err {
            ContractError::ConfigParse { message, source } => {
                assert!(message.starts_with("Toml parse error"));
                assert!(source.is_some());
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_sink_type_rejected() {
        let content = r#"
[sink]
name = "kinesis"
sink_type = "kinesis"
"#;
        assert!(ConfigFormat::Toml.parse(content).is_err());
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("logship.TOML")).unwrap(),
            ConfigFormat::Toml
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("conf/ship.json")).unwrap(),
            ConfigFormat::Json
        );

        let err = ConfigFormat::from_path(Path::new("logship.yaml")).unwrap_err();
        assert!(err.to_string().contains("logship.yaml"));
        assert!(ConfigFormat::from_path(Path::new("logship")).is_err());
    }
}
