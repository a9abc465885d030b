//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse JSON (primary) / TOML (secondary) configuration files
//! - Validate configuration legality
//! - Produce a `FusionConfig`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let config = ConfigLoader::load_from_path(Path::new("config.json")).unwrap();
//! println!("space: {}x{}", config.space.width_meters, config.space.height_meters);
//! ```

mod parser;
mod validator;

pub use contracts::FusionConfig;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;

/// Configuration loader.
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path.
    ///
    /// Automatically detects format from file extension (.json / .toml).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<FusionConfig, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load configuration from string.
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<FusionConfig, ContractError> {
        Self::parse_and_validate(content, format)
    }

    /// Serialize a `FusionConfig` to TOML.
    pub fn to_toml(config: &FusionConfig) -> Result<String, ContractError> {
        toml::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize a `FusionConfig` to JSON.
    pub fn to_json(config: &FusionConfig) -> Result<String, ContractError> {
        serde_json::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension. Returns an error
    /// when there is no extension at all.
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    /// Read configuration file content.
    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }

    /// Parse and validate configuration content.
    fn parse_and_validate(
        content: &str,
        format: ConfigFormat,
    ) -> Result<FusionConfig, ContractError> {
        let config = parser::parse(content, format)?;
        validator::validate(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL_JSON: &str = r#"{
        "space": {"width_meters": 12.0, "height_meters": 9.0},
        "sensors": {
            "wifi_access_points": {
                "ap-1": {"position": [0.0, 0.0], "position_uncertainty_meters": 2.0}
            },
            "mmwave_sensors": {
                "mm-1": {"position": [5.0, 0.0], "position_uncertainty_meters": 1.0}
            }
        },
        "synchronization": {"window_seconds": 0.25, "max_latency_seconds": 0.25, "strategy": "nearest"}
    }"#;

    #[test]
    fn test_load_from_str_json() {
        let result = ConfigLoader::load_from_str(MINIMAL_JSON, ConfigFormat::Json);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let cfg = result.unwrap();
        assert_eq!(cfg.space.width_meters, 12.0);
        assert_eq!(cfg.sensors.wifi_access_points.len(), 1);
    }

    #[test]
    fn test_round_trip_json() {
        let cfg = ConfigLoader::load_from_str(MINIMAL_JSON, ConfigFormat::Json).unwrap();
        let serialized = ConfigLoader::to_json(&cfg).unwrap();
        let cfg2 = ConfigLoader::load_from_str(&serialized, ConfigFormat::Json).unwrap();
        assert_eq!(cfg.space.width_meters, cfg2.space.width_meters);
        assert_eq!(
            cfg.sensors.mmwave_sensors.len(),
            cfg2.sensors.mmwave_sensors.len()
        );
    }

    #[test]
    fn test_round_trip_toml() {
        let cfg = ConfigLoader::load_from_str(MINIMAL_JSON, ConfigFormat::Json).unwrap();
        let toml_str = ConfigLoader::to_toml(&cfg).unwrap();
        let cfg2 = ConfigLoader::load_from_str(&toml_str, ConfigFormat::Toml).unwrap();
        assert_eq!(cfg.space.height_meters, cfg2.space.height_meters);
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = r#"{
            "space": {"width_meters": -1.0, "height_meters": 9.0},
            "synchronization": {"window_seconds": 0.25, "max_latency_seconds": 0.25, "strategy": "nearest"}
        }"#;
        let result = ConfigLoader::load_from_str(content, ConfigFormat::Json);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("width_meters"));
    }

    #[test]
    fn test_unsupported_extension() {
        let result = ConfigLoader::load_from_path(Path::new("config.yaml"));
        assert!(result.is_err());
    }
}
