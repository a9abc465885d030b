//! HTTP JSON polling adapters: each GETs a list-of-objects payload
//! accepting either `timestamp` or `timestamp_ms`, with configurable
//! `timeout_seconds`, `max_retries` (default 2), `retry_backoff_seconds`
//! (default 0.5), and the shared clock-drift-smoothing knobs
//! (`clock_offset_seconds`, `clock_drift_tolerance_seconds`,
//! `max_clock_offset_seconds`, `drift_smoothing`).

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use contracts::{ContractError, Detection, MmWaveMeasurement, SensorCalibration, WiFiMeasurement};
use tracing::warn;

use crate::clock::ClockDriftFilter;
use crate::parsers::{self, MonotonicGuard};
use crate::sources::{MmwaveSource, VisionSource, WifiSource};

/// Shared HTTP polling configuration, independent of modality.
#[derive(Clone, Debug)]
pub struct HttpPollerConfig {
    pub source_name: String,
    pub url: String,
    pub timeout_seconds: f64,
    pub max_retries: u32,
    pub retry_backoff_seconds: f64,
    pub clock_offset_seconds: f64,
    pub clock_drift_tolerance_seconds: f64,
    pub max_clock_offset_seconds: f64,
    pub drift_smoothing: f64,
}

impl Default for HttpPollerConfig {
    fn default() -> Self {
        Self {
            source_name: "http_source".into(),
            url: String::new(),
            timeout_seconds: 5.0,
            max_retries: 2,
            retry_backoff_seconds: 0.5,
            clock_offset_seconds: 0.0,
            clock_drift_tolerance_seconds: 2.0,
            max_clock_offset_seconds: 300.0,
            drift_smoothing: 0.25,
        }
    }
}

fn now_seconds() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Fetch and parse the JSON array payload, applying retry-with-backoff and
/// clock-drift correction to each record's `timestamp`/`timestamp_ms` field.
fn fetch_records(
    client: &reqwest::blocking::Client,
    config: &HttpPollerConfig,
    clock: &mut ClockDriftFilter,
) -> Result<Vec<serde_json::Value>, ContractError> {
    let mut attempt = 0;
    loop {
        let result = client
            .get(&config.url)
            .timeout(Duration::from_secs_f64(config.timeout_seconds))
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<Vec<serde_json::Value>>());

        match result {
            Ok(mut records) => {
                let fetch_time = now_seconds();
                for record in &mut records {
                    normalize_timestamp(record, clock, fetch_time);
                }
                return Ok(records);
            }
            Err(err) if attempt < config.max_retries => {
                attempt += 1;
                warn!(
                    source = %config.source_name,
                    attempt,
                    error = %err,
                    "http fetch failed, retrying"
                );
                thread::sleep(Duration::from_secs_f64(config.retry_backoff_seconds));
            }
            Err(err) => {
                metrics::counter!("ingestion_fetch_failures_total", "source" => config.source_name.clone())
                    .increment(1);
                return Err(ContractError::exporter(&config.source_name, err.to_string()));
            }
        }
    }
}

fn normalize_timestamp(record: &mut serde_json::Value, clock: &mut ClockDriftFilter, fetch_time: f64) {
    let Some(obj) = record.as_object_mut() else {
        return;
    };
    let raw_ts = obj
        .get("timestamp")
        .and_then(|v| v.as_f64())
        .or_else(|| obj.get("timestamp_ms").and_then(|v| v.as_f64()).map(|ms| ms / 1000.0));
    if let Some(raw_ts) = raw_ts {
        let corrected = clock.correct(raw_ts, fetch_time);
        obj.insert("timestamp".to_string(), serde_json::Value::from(corrected));
    }
}

pub struct HttpWifiSource {
    config: HttpPollerConfig,
    client: reqwest::blocking::Client,
    clock: ClockDriftFilter,
    calibration: Arc<SensorCalibration>,
    guard: MonotonicGuard,
}

impl HttpWifiSource {
    pub fn new(config: HttpPollerConfig, calibration: Arc<SensorCalibration>) -> Self {
        let clock = ClockDriftFilter::new(
            config.clock_offset_seconds,
            config.clock_drift_tolerance_seconds,
            config.max_clock_offset_seconds,
            config.drift_smoothing,
        );
        Self {
            client: reqwest::blocking::Client::new(),
            config,
            clock,
            calibration,
            guard: MonotonicGuard::new(),
        }
    }
}

impl WifiSource for HttpWifiSource {
    fn name(&self) -> &str {
        &self.config.source_name
    }

    fn fetch(&mut self) -> Result<Vec<WiFiMeasurement>, ContractError> {
        let records = fetch_records(&self.client, &self.config, &mut self.clock)?;
        parsers::parse_wifi_measurements(&records, &self.calibration, &mut self.guard)
    }
}

pub struct HttpVisionSource {
    config: HttpPollerConfig,
    client: reqwest::blocking::Client,
    clock: ClockDriftFilter,
    calibration: Arc<SensorCalibration>,
    guard: MonotonicGuard,
}

impl HttpVisionSource {
    pub fn new(config: HttpPollerConfig, calibration: Arc<SensorCalibration>) -> Self {
        let clock = ClockDriftFilter::new(
            config.clock_offset_seconds,
            config.clock_drift_tolerance_seconds,
            config.max_clock_offset_seconds,
            config.drift_smoothing,
        );
        Self {
            client: reqwest::blocking::Client::new(),
            config,
            clock,
            calibration,
            guard: MonotonicGuard::new(),
        }
    }
}

impl VisionSource for HttpVisionSource {
    fn name(&self) -> &str {
        &self.config.source_name
    }

    fn fetch(&mut self) -> Result<Vec<Detection>, ContractError> {
        let records = fetch_records(&self.client, &self.config, &mut self.clock)?;
        parsers::parse_detections(&records, &self.calibration, &mut self.guard)
    }
}

pub struct HttpMmwaveSource {
    config: HttpPollerConfig,
    client: reqwest::blocking::Client,
    clock: ClockDriftFilter,
    guard: MonotonicGuard,
}

impl HttpMmwaveSource {
    pub fn new(config: HttpPollerConfig) -> Self {
        let clock = ClockDriftFilter::new(
            config.clock_offset_seconds,
            config.clock_drift_tolerance_seconds,
            config.max_clock_offset_seconds,
            config.drift_smoothing,
        );
        Self {
            client: reqwest::blocking::Client::new(),
            config,
            clock,
            guard: MonotonicGuard::new(),
        }
    }
}

impl MmwaveSource for HttpMmwaveSource {
    fn name(&self) -> &str {
        &self.config.source_name
    }

    fn fetch(&mut self) -> Result<Vec<MmWaveMeasurement>, ContractError> {
        let records = fetch_records(&self.client, &self.config, &mut self.clock)?;
        parsers::parse_mmwave_measurements(&records, &mut self.guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_timestamp_ms() {
        let mut clock = ClockDriftFilter::new(0.0, 2.0, 300.0, 0.25);
        let mut record = serde_json::json!({"timestamp_ms": 1_000.0});
        normalize_timestamp(&mut record, &mut clock, 1.0);
        assert_eq!(record.get("timestamp").unwrap().as_f64(), Some(1.0));
    }
}
