//! `validate` command implementation.

use anyhow::{Context, Result};
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
    width_meters: f64,
    height_meters: f64,
    wifi_sources: usize,
    vision_sources: usize,
    mmwave_sources: usize,
    ble_sources: usize,
    sink_count: usize,
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

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);

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
                    width_meters: config.space.width_meters,
                    height_meters: config.space.height_meters,
                    wifi_sources: config.ingestion.wifi_sources.len(),
                    vision_sources: config.ingestion.vision_sources.len(),
                    mmwave_sources: config.ingestion.mmwave_sources.len(),
                    ble_sources: config.ingestion.ble_sources.len(),
                    sink_count: config.dispatch.sinks.len(),
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
fn collect_warnings(config: &contracts::FusionConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.dispatch.sinks.is_empty() {
        warnings.push("No sinks configured - emitted ticks will be dropped".to_string());
    }

    let ingestion = &config.ingestion;
    if ingestion.wifi_sources.is_empty()
        && ingestion.vision_sources.is_empty()
        && ingestion.mmwave_sources.is_empty()
        && ingestion.ble_sources.is_empty()
    {
        warnings.push("No ingestion sources configured".to_string());
    }

    if config.audit.require_consent && config.audit.consent_records.is_empty() {
        warnings.push(
            "audit.require_consent is set but no consent records are seeded".to_string(),
        );
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!(
                "\n  Space: {}m x {}m",
                summary.width_meters, summary.height_meters
            );
            println!(
                "  Sources: wifi={} vision={} mmwave={} ble={}",
                summary.wifi_sources,
                summary.vision_sources,
                summary.mmwave_sources,
                summary.ble_sources
            );
            println!("  Sinks: {}", summary.sink_count);
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
