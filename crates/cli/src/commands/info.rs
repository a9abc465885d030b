//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    space: SpaceInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    sensors: Option<SensorInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sinks: Vec<SinkInfo>,
    synchronization: SyncInfo,
    audit: AuditInfo,
}

#[derive(Serialize)]
struct SpaceInfo {
    width_meters: f64,
    height_meters: f64,
    coordinate_origin: (f64, f64),
}

#[derive(Serialize)]
struct SensorInfo {
    wifi_access_points: Vec<String>,
    cameras: Vec<String>,
    mmwave_sensors: Vec<String>,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    sink_type: String,
}

#[derive(Serialize)]
struct SyncInfo {
    window_seconds: f64,
    max_latency_seconds: f64,
    strategy: String,
}

#[derive(Serialize)]
struct AuditInfo {
    enabled: bool,
    require_consent: bool,
    seeded_consent_records: usize,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&config, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&config, args);
    }

    Ok(())
}

fn build_config_info(config: &contracts::FusionConfig, args: &InfoArgs) -> ConfigInfo {
    let sensors = if args.sensors {
        Some(SensorInfo {
            wifi_access_points: config
                .sensors
                .wifi_access_points
                .keys()
                .map(|id| id.as_str().to_string())
                .collect(),
            cameras: config
                .sensors
                .cameras
                .keys()
                .map(|id| id.as_str().to_string())
                .collect(),
            mmwave_sensors: config
                .sensors
                .mmwave_sensors
                .keys()
                .map(|id| id.as_str().to_string())
                .collect(),
        })
    } else {
        None
    };

    let sinks = if args.sinks {
        config
            .dispatch
            .sinks
            .iter()
            .map(|s| SinkInfo {
                name: s.name.clone(),
                sink_type: format!("{:?}", s.sink_type),
            })
            .collect()
    } else {
        Vec::new()
    };

    ConfigInfo {
        space: SpaceInfo {
            width_meters: config.space.width_meters,
            height_meters: config.space.height_meters,
            coordinate_origin: config.space.coordinate_origin,
        },
        sensors,
        sinks,
        synchronization: SyncInfo {
            window_seconds: config.synchronization.window_seconds,
            max_latency_seconds: config.synchronization.max_latency_seconds,
            strategy: format!("{:?}", config.synchronization.strategy),
        },
        audit: AuditInfo {
            enabled: config.audit.enabled,
            require_consent: config.audit.require_consent,
            seeded_consent_records: config.audit.consent_records.len(),
        },
    }
}

fn print_config_info(config: &contracts::FusionConfig, args: &InfoArgs) {
    println!("=== Fusion Runner Configuration ===\n");

    println!("Space");
    println!(
        "  {}m x {}m, origin {:?}",
        config.space.width_meters, config.space.height_meters, config.space.coordinate_origin
    );

    if args.sensors {
        println!("\nSensor calibration");
        println!(
            "  Wi-Fi access points: {:?}",
            config.sensors.wifi_access_points.keys().collect::<Vec<_>>()
        );
        println!(
            "  Cameras: {:?}",
            config.sensors.cameras.keys().collect::<Vec<_>>()
        );
        println!(
            "  mmWave sensors: {:?}",
            config.sensors.mmwave_sensors.keys().collect::<Vec<_>>()
        );
    }

    println!("\nIngestion sources");
    println!("  Wi-Fi: {}", config.ingestion.wifi_sources.len());
    println!("  Vision: {}", config.ingestion.vision_sources.len());
    println!("  mmWave: {}", config.ingestion.mmwave_sources.len());
    println!("  BLE: {}", config.ingestion.ble_sources.len());

    println!("\nSynchronization");
    println!("  Window: {}s", config.synchronization.window_seconds);
    println!(
        "  Max latency: {}s",
        config.synchronization.max_latency_seconds
    );
    println!("  Strategy: {:?}", config.synchronization.strategy);

    if args.sinks && !config.dispatch.sinks.is_empty() {
        println!("\nSinks ({})", config.dispatch.sinks.len());
        for sink in &config.dispatch.sinks {
            println!("  - {} ({:?})", sink.name, sink.sink_type);
        }
    }

    println!("\nAudit");
    println!("  Enabled: {}", config.audit.enabled);
    println!("  Require consent: {}", config.audit.require_consent);
    println!(
        "  Seeded consent records: {}",
        config.audit.consent_records.len()
    );

    println!();
}
