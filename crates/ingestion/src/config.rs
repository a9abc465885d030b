//! Adapter construction from the opaque `ingestion.*_sources` JSON
//! configuration, each entry carrying a typed `type` discriminator plus
//! adapter-specific fields.

use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;

use contracts::{ContractError, SensorCalibration};

use crate::adapters::{
    BleStaticConfig, BleStaticSource, HttpMmwaveSource, HttpPollerConfig, HttpVisionSource,
    HttpWifiSource, LocalWiFiCaptureConfig, LocalWiFiCaptureSource, ProcessVisionConfig,
    ProcessVisionSource, SerialMmWaveConfig, SerialMmWaveSource,
};
use crate::multiplex::{MultiBleSource, MultiMmwaveSource, MultiVisionSource, MultiWifiSource};
use crate::sources::{BleSource, MmwaveSource, VisionSource, WifiSource};

fn field_str<'a>(value: &'a serde_json::Value, field: &str) -> Option<&'a str> {
    value.get(field).and_then(|v| v.as_str())
}

fn field_f64(value: &serde_json::Value, field: &str, default: f64) -> f64 {
    value.get(field).and_then(|v| v.as_f64()).unwrap_or(default)
}

fn field_u32(value: &serde_json::Value, field: &str, default: u32) -> u32 {
    value.get(field).and_then(|v| v.as_u64()).unwrap_or(default as u64) as u32
}

fn field_bool(value: &serde_json::Value, field: &str, default: bool) -> bool {
    value.get(field).and_then(|v| v.as_bool()).unwrap_or(default)
}

fn http_poller_config(value: &serde_json::Value, default_name: &str) -> HttpPollerConfig {
    HttpPollerConfig {
        source_name: field_str(value, "source_name").unwrap_or(default_name).to_string(),
        url: field_str(value, "url").unwrap_or_default().to_string(),
        timeout_seconds: field_f64(value, "timeout_seconds", 5.0),
        max_retries: field_u32(value, "max_retries", 2),
        retry_backoff_seconds: field_f64(value, "retry_backoff_seconds", 0.5),
        clock_offset_seconds: field_f64(value, "clock_offset_seconds", 0.0),
        clock_drift_tolerance_seconds: field_f64(value, "clock_drift_tolerance_seconds", 2.0),
        max_clock_offset_seconds: field_f64(value, "max_clock_offset_seconds", 300.0),
        drift_smoothing: field_f64(value, "drift_smoothing", 0.25),
    }
}

pub fn build_wifi_sources(
    configs: &[serde_json::Value],
    calibration: Arc<SensorCalibration>,
) -> Result<MultiWifiSource, ContractError> {
    let mut sources: Vec<Box<dyn WifiSource>> = Vec::with_capacity(configs.len());
    for (i, cfg) in configs.iter().enumerate() {
        let ty = field_str(cfg, "type").unwrap_or("http");
        let source: Box<dyn WifiSource> = match ty {
            "http" => Box::new(HttpWifiSource::new(
                http_poller_config(cfg, &format!("wifi-http-{i}")),
                calibration.clone(),
            )),
            "local_capture" => Box::new(LocalWiFiCaptureSource::new(
                LocalWiFiCaptureConfig {
                    source_name: field_str(cfg, "source_name").unwrap_or(&format!("wifi-local-{i}")).to_string(),
                    interface_name: field_str(cfg, "interface_name").unwrap_or("wlan0").to_string(),
                    access_point_id: field_str(cfg, "access_point_id")
                        .ok_or_else(|| ContractError::config_validation(format!("ingestion.wifi_sources[{i}]"), "missing access_point_id"))?
                        .to_string(),
                    target_bssid: field_str(cfg, "target_bssid").map(str::to_string),
                    target_ssid: field_str(cfg, "target_ssid").map(str::to_string),
                    scan_command: field_str(cfg, "scan_command").unwrap_or("iw").to_string(),
                    csi_command: field_str(cfg, "csi_command").map(str::to_string),
                    clock_offset_seconds: field_f64(cfg, "clock_offset_seconds", 0.0),
                },
                calibration.clone(),
            )),
            other => {
                return Err(ContractError::config_validation(
                    format!("ingestion.wifi_sources[{i}]"),
                    format!("unknown wifi source type '{other}'"),
                ))
            }
        };
        sources.push(source);
    }
    Ok(MultiWifiSource::new(sources))
}

pub fn build_vision_sources(
    configs: &[serde_json::Value],
    calibration: Arc<SensorCalibration>,
) -> Result<MultiVisionSource, ContractError> {
    let mut sources: Vec<Box<dyn VisionSource>> = Vec::with_capacity(configs.len());
    for (i, cfg) in configs.iter().enumerate() {
        let ty = field_str(cfg, "type").unwrap_or("http");
        let source: Box<dyn VisionSource> = match ty {
            "http" => Box::new(HttpVisionSource::new(
                http_poller_config(cfg, &format!("vision-http-{i}")),
                calibration.clone(),
            )),
            "process" => Box::new(ProcessVisionSource::new(
                ProcessVisionConfig {
                    source_name: field_str(cfg, "source_name").unwrap_or(&format!("vision-proc-{i}")).to_string(),
                    command: field_str(cfg, "command")
                        .ok_or_else(|| ContractError::config_validation(format!("ingestion.vision_sources[{i}]"), "missing command"))?
                        .to_string(),
                    args: cfg
                        .get("args")
                        .and_then(|v| v.as_array())
                        .map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
                        .unwrap_or_default(),
                    timeout_seconds: field_f64(cfg, "timeout_seconds", 5.0),
                },
                calibration.clone(),
            )),
            other => {
                return Err(ContractError::config_validation(
                    format!("ingestion.vision_sources[{i}]"),
                    format!("unknown vision source type '{other}'"),
                ))
            }
        };
        sources.push(source);
    }
    Ok(MultiVisionSource::new(sources))
}

pub fn build_mmwave_sources(configs: &[serde_json::Value]) -> Result<MultiMmwaveSource, ContractError> {
    let mut sources: Vec<Box<dyn MmwaveSource>> = Vec::with_capacity(configs.len());
    for (i, cfg) in configs.iter().enumerate() {
        let ty = field_str(cfg, "type").unwrap_or("http");
        let source: Box<dyn MmwaveSource> = match ty {
            "http" => Box::new(HttpMmwaveSource::new(http_poller_config(cfg, &format!("mmwave-http-{i}")))),
            "serial_file" => {
                let path = field_str(cfg, "port").ok_or_else(|| {
                    ContractError::config_validation(format!("ingestion.mmwave_sources[{i}]"), "missing port")
                })?;
                let file = File::open(path).map_err(|e| {
                    ContractError::exporter(format!("mmwave-serial-{i}"), format!("cannot open '{path}': {e}"))
                })?;
                Box::new(SerialMmWaveSource::new(
                    SerialMmWaveConfig {
                        source_name: field_str(cfg, "source_name").unwrap_or(&format!("mmwave-serial-{i}")).to_string(),
                        default_sensor_id: field_str(cfg, "default_sensor_id").map(str::to_string),
                        max_lines: cfg.get("max_lines").and_then(|v| v.as_u64()).unwrap_or(64) as usize,
                    },
                    BufReader::new(file),
                ))
            }
            other => {
                return Err(ContractError::config_validation(
                    format!("ingestion.mmwave_sources[{i}]"),
                    format!("unknown mmwave source type '{other}'"),
                ))
            }
        };
        sources.push(source);
    }
    Ok(MultiMmwaveSource::new(sources))
}

pub fn build_ble_sources(configs: &[serde_json::Value]) -> Result<MultiBleSource, ContractError> {
    let mut sources: Vec<Box<dyn BleSource>> = Vec::with_capacity(configs.len());
    for (i, cfg) in configs.iter().enumerate() {
        let ty = field_str(cfg, "type").unwrap_or("static");
        let source: Box<dyn BleSource> = match ty {
            "static" => {
                let payloads = cfg
                    .get("payloads")
                    .and_then(|v| v.as_array())
                    .cloned()
                    .unwrap_or_default();
                Box::new(BleStaticSource::new(
                    BleStaticConfig {
                        source_name: field_str(cfg, "source_name").unwrap_or(&format!("ble-static-{i}")).to_string(),
                        scan_interval_seconds: field_f64(cfg, "scan_interval_seconds", 5.0),
                        hash_device_id: field_bool(cfg, "hash_device_id", false),
                    },
                    payloads,
                ))
            }
            other => {
                return Err(ContractError::config_validation(
                    format!("ingestion.ble_sources[{i}]"),
                    format!("unknown ble source type '{other}'"),
                ))
            }
        };
        sources.push(source);
    }
    Ok(MultiBleSource::new(sources))
}
