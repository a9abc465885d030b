//! Per-modality record validation.
//!
//! Each parser applies the same shape of checks against raw
//! `serde_json::Value` records: required-field presence, calibration
//! lookup where applicable, and per-source monotonic-timestamp
//! enforcement.

mod ble;
mod mmwave;
mod vision;
mod wifi;

pub use ble::parse_ble_measurements;
pub use mmwave::parse_mmwave_measurements;
pub use vision::parse_detections;
pub use wifi::parse_wifi_measurements;

use contracts::ContractError;
use std::collections::HashMap;

/// Shared per-source-key last-seen-timestamp tracker, used by every parser
/// to reject out-of-order records per logical source key.
#[derive(Debug, Default)]
pub struct MonotonicGuard {
    last_seen: HashMap<String, f64>,
}

impl MonotonicGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check-and-record. Returns an error if `timestamp` is strictly less
    /// than the last timestamp seen for `source_key`; a repeated timestamp
    /// is accepted (non-decreasing, not strictly increasing).
    pub fn check(
        &mut self,
        source_key: &str,
        timestamp: f64,
        sensor_id_for_error: &str,
    ) -> Result<(), ContractError> {
        if let Some(&last) = self.last_seen.get(source_key) {
            if timestamp < last {
                return Err(ContractError::ingestion(
                    sensor_id_for_error,
                    Some(timestamp),
                    format!(
                        "out-of-order timestamp for '{source_key}': {timestamp} < last seen {last}"
                    ),
                ));
            }
        }
        self.last_seen.insert(source_key.to_string(), timestamp);
        Ok(())
    }
}

fn require_f64(value: &serde_json::Value, field: &str, sensor_id: &str) -> Result<f64, ContractError> {
    let v = value
        .get(field)
        .and_then(|v| v.as_f64())
        .ok_or_else(|| ContractError::ingestion(sensor_id, None, format!("missing field '{field}'")))?;
    if !v.is_finite() {
        return Err(ContractError::ingestion(sensor_id, None, format!("field '{field}' must be finite")));
    }
    Ok(v)
}

fn require_str<'a>(
    value: &'a serde_json::Value,
    field: &str,
    sensor_id: &str,
) -> Result<&'a str, ContractError> {
    value
        .get(field)
        .and_then(|v| v.as_str())
        .ok_or_else(|| ContractError::ingestion(sensor_id, None, format!("missing field '{field}'")))
}
