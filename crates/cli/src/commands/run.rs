//! `run` command implementation.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    info!(
        width_meters = config.space.width_meters,
        height_meters = config.space.height_meters,
        wifi_sources = config.ingestion.wifi_sources.len(),
        vision_sources = config.ingestion.vision_sources.len(),
        mmwave_sources = config.ingestion.mmwave_sources.len(),
        ble_sources = config.ingestion.ble_sources.len(),
        sinks = config.dispatch.sinks.len(),
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&config);
        return Ok(());
    }

    let pipeline_config = PipelineConfig {
        config,
        poll_interval: Duration::from_secs_f64(args.poll_interval.max(0.0)),
        max_iterations: if args.max_iterations == 0 {
            None
        } else {
            Some(args.max_iterations)
        },
        timeout: if args.timeout == 0 {
            None
        } else {
            Some(Duration::from_secs(args.timeout))
        },
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
        legacy_emission: args.legacy_emission,
    };

    let pipeline = Pipeline::new(pipeline_config);

    let shutdown_signal = setup_shutdown_signal();

    info!("Starting pipeline...");

    tokio::select! {
        result = pipeline.run() => {
            match result {
                Ok(stats) => {
                    info!(
                        ticks_emitted = stats.ticks_emitted,
                        ticks_synced = stats.ticks_synced,
                        duration_secs = stats.duration.as_secs_f64(),
                        tps = format!("{:.2}", stats.ticks_per_second()),
                        "Pipeline completed successfully"
                    );

                    stats.print_summary();
                }
                Err(e) => {
                    return Err(e).context("Pipeline execution failed");
                }
            }
        }
        _ = shutdown_signal => {
            warn!("Received shutdown signal, stopping pipeline...");
        }
    }

    info!("Fusion runner finished");
    Ok(())
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(config: &contracts::FusionConfig) {
    println!("\n=== Configuration Summary ===\n");
    println!("Space:");
    println!(
        "  {}m x {}m, origin {:?}",
        config.space.width_meters, config.space.height_meters, config.space.coordinate_origin
    );

    println!("\nSensor calibration:");
    println!("  Wi-Fi access points: {}", config.sensors.wifi_access_points.len());
    println!("  Cameras: {}", config.sensors.cameras.len());
    println!("  mmWave sensors: {}", config.sensors.mmwave_sensors.len());

    println!("\nIngestion sources:");
    println!("  Wi-Fi: {}", config.ingestion.wifi_sources.len());
    println!("  Vision: {}", config.ingestion.vision_sources.len());
    println!("  mmWave: {}", config.ingestion.mmwave_sources.len());
    println!("  BLE: {}", config.ingestion.ble_sources.len());

    if !config.dispatch.sinks.is_empty() {
        println!("\nSinks ({}):", config.dispatch.sinks.len());
        for sink in &config.dispatch.sinks {
            println!("  - {} ({:?})", sink.name, sink.sink_type);
        }
    }

    println!("\nSynchronization:");
    println!("  Window: {}s", config.synchronization.window_seconds);
    println!("  Max latency: {}s", config.synchronization.max_latency_seconds);
    println!("  Strategy: {:?}", config.synchronization.strategy);

    if config.audit.enabled {
        println!("\nAudit:");
        println!("  Require consent: {}", config.audit.require_consent);
        println!("  Seeded consent records: {}", config.audit.consent_records.len());
    }

    println!();
}
