//! # Config Loader
//!
//! Reads a shipper config file and turns it into a validated
//! `ShipperBlueprint`. The format follows the file extension.
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let blueprint = ConfigLoader::load_from_path(Path::new("logship.toml")).unwrap();
//! println!("Sink: {}", blueprint.sink.name);
//! ```

mod parser;
mod validator;

pub use contracts::ShipperBlueprint;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate a config file (`.toml` or `.json`)
    ///
    /// # Errors
    /// - Unknown extension
    /// - File read failure
    /// - Parse or validation failure
    pub fn load_from_path(path: &Path) -> Result<ShipperBlueprint, ContractError> {
        let format = ConfigFormat::from_path(path)?;
        let content = std::fs::read_to_string(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load and validate config text in a known format
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<ShipperBlueprint, ContractError> {
        let blueprint = format.parse(content)?;
        validator::validate(&blueprint)?;
        Ok(blueprint)
    }
}
