//! Config validation
//!
//! Rules:
//! - sink name is non-empty
//! - file sinks have a `path`
//! - tcp sinks have a parseable `addr`
//! - timeout parameters are integers
//!
//! Numeric tuning fields are not validated: zero means "use the default".

use std::net::SocketAddr;

use contracts::{ContractError, ShipperBlueprint, SinkConfig, SinkType};

/// Sink params that must parse as integers when present
const INTEGER_PARAMS: &[&str] = &["connect_timeout_ms", "write_timeout_ms"];

/// Validate a ShipperBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &ShipperBlueprint) -> Result<(), ContractError> {
    validate_sink_name(&blueprint.sink)?;
    validate_sink_params(&blueprint.sink)?;
    Ok(())
}

fn validate_sink_name(sink: &SinkConfig) -> Result<(), ContractError> {
    if sink.name.trim().is_empty() {
        return Err(ContractError::config_validation(
            "sink.name",
            "sink name cannot be empty",
        ));
    }
    Ok(())
}

fn validate_sink_params(sink: &SinkConfig) -> Result<(), ContractError> {
    match sink.sink_type {
        SinkType::File => {
            if sink.param("path").is_none_or(|p| p.trim().is_empty()) {
                return Err(ContractError::config_validation(
                    "sink.params.path",
                    "file sink requires a 'path' parameter",
                ));
            }
        }
        SinkType::Tcp => {
            let addr = sink.param("addr").ok_or_else(|| {
                ContractError::config_validation(
                    "sink.params.addr",
                    "tcp sink requires an 'addr' parameter",
                )
            })?;
            addr.parse::<SocketAddr>().map_err(|e| {
                ContractError::config_validation(
                    "sink.params.addr",
                    format!("invalid address '{addr}': {e}"),
                )
            })?;
        }
        SinkType::Log | SinkType::Discard | SinkType::Memory => {}
    }

    for key in INTEGER_PARAMS {
        sink.param_u64(key)?;
    }
    Ok(())
}
