//! Configuration parsing.
//!
//! Supports JSON (the canonical format) and TOML (a secondary, equivalent
//! format for deployments that prefer it).

use contracts::{ContractError, FusionConfig};

/// Configuration file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    /// Infer format from a file extension. Unknown extensions default to
    /// JSON, the canonical format.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }
}

pub fn parse_json(content: &str) -> Result<FusionConfig, ContractError> {
    serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

pub fn parse_toml(content: &str) -> Result<FusionConfig, ContractError> {
    toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

pub fn parse(content: &str, format: ConfigFormat) -> Result<FusionConfig, ContractError> {
    match format {
        ConfigFormat::Json => parse_json(content),
        ConfigFormat::Toml => parse_toml(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL_JSON: &str = r#"{
        "space": {"width_meters": 10.0, "height_meters": 8.0},
        "sensors": {
            "wifi_access_points": {
                "ap-1": {"position": [0.0, 0.0], "position_uncertainty_meters": 1.0}
            }
        },
        "synchronization": {"window_seconds": 0.25, "max_latency_seconds": 0.25, "strategy": "nearest"}
    }"#;

    #[test]
    fn test_parse_json_minimal() {
        let cfg = parse_json(MINIMAL_JSON).unwrap();
        assert_eq!(cfg.space.width_meters, 10.0);
        assert_eq!(cfg.synchronization.window_seconds, 0.25);
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let result = parse_toml("invalid toml [[[");
        assert!(matches!(result, Err(ContractError::ConfigParse { .. })));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ConfigFormat::from_extension("json"), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_extension("TOML"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
