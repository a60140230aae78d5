//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{DeliveryMode, ShipperBlueprint, SinkType};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    mode: String,
    sink_name: String,
    sink_type: String,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    // Check file exists
    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(crate::error::CliError::config_not_found(&args.config).to_string()),
            warnings: None,
            summary: None,
        };
    }

    // Try to load and validate
    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    mode: blueprint.mode.to_string(),
                    sink_name: blueprint.sink.name.clone(),
                    sink_type: format!("{:?}", blueprint.sink.sink_type),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &ShipperBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if matches!(blueprint.sink.sink_type, SinkType::Discard | SinkType::Memory) {
        warnings.push(format!(
            "Sink '{}' keeps nothing outside this process",
            blueprint.sink.name
        ));
    }

    // Tuning for the component that isn't used
    match blueprint.mode {
        DeliveryMode::Batched if blueprint.queue != Default::default() => {
            warnings.push("[queue] is ignored in batched mode".to_string());
        }
        DeliveryMode::Dispatched if blueprint.buffer != Default::default() => {
            warnings.push("[buffer] is ignored in dispatched mode".to_string());
        }
        _ => {}
    }

    let buffer = blueprint.buffer.resolved();
    if blueprint.mode == DeliveryMode::Batched && buffer.buffer_size < 64 {
        warnings.push(format!(
            "buffer.buffer_size = {} flushes almost every append",
            buffer.buffer_size
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Mode: {}", summary.mode);
            println!("  Sink: {} ({})", summary.sink_name, summary.sink_type);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn args_for(content: &str) -> (tempfile::NamedTempFile, ValidateArgs) {
        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        let args = ValidateArgs {
            config: file.path().to_path_buf(),
            json: true,
        };
        (file, args)
    }

    #[test]
    fn test_valid_config_with_warnings() {
        let (_file, args) = args_for(
            r#"
mode = "dispatched"
[buffer]
buffer_size = 8
[sink]
name = "null"
sink_type = "discard"
"#,
        );

        let result = validate_config(&args);
        assert!(result.valid);
        let warnings = result.warnings.unwrap();
        assert_eq!(warnings.len(), 2);
        assert_eq!(result.summary.unwrap().mode, "dispatched");
    }

    #[test]
    fn test_invalid_config_reports_error() {
        let (_file, args) = args_for(
            r#"
[sink]
name = "disk"
sink_type = "file"
"#,
        );

        let result = validate_config(&args);
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("path"));
        assert!(run_validate(&args).is_err());
    }

    #[test]
    fn test_missing_file() {
        let args = ValidateArgs {
            config: "/nonexistent/logship.toml".into(),
            json: false,
        };
        let result = validate_config(&args);
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("not found"));
    }
}
