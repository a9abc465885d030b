//! Wi-Fi measurement parsing: validate required fields, enforce
//! monotonic timestamps per source key, and resolve calibration.

use super::{require_f64, require_str, MonotonicGuard};
use contracts::{Band, ContractError, Metadata, SensorCalibration, WiFiMeasurement};

/// Derive a band from an explicit channel number or `metadata.frequency_mhz`.
fn derive_band(channel: Option<u32>, metadata: &Option<Metadata>) -> Option<Band> {
    if let Some(ch) = channel {
        return match ch {
            1..=14 => Some(Band::Band24Ghz),
            32..=177 => Some(Band::Band5Ghz),
            _ => None,
        };
    }
    let freq = metadata
        .as_ref()
        .and_then(|m| m.get("frequency_mhz"))
        .and_then(|v| v.as_f64())?;
    match freq as i64 {
        2400..=2500 => Some(Band::Band24Ghz),
        5000..=5925 => Some(Band::Band5Ghz),
        5925..=7125 => Some(Band::Band6Ghz),
        _ => None,
    }
}

/// Parse a batch of raw Wi-Fi records into validated measurements.
///
/// Validation order mirrors the Python original: required fields, then
/// calibration lookup, then the per-AP monotonic timestamp check.
pub fn parse_wifi_measurements(
    records: &[serde_json::Value],
    calibration: &SensorCalibration,
    guard: &mut MonotonicGuard,
) -> Result<Vec<WiFiMeasurement>, ContractError> {
    let mut out = Vec::with_capacity(records.len());
    for record in records {
        let access_point_id = require_str(record, "access_point_id", "<unknown>")?;
        let timestamp = require_f64(record, "timestamp", access_point_id)?;
        let rssi = require_f64(record, "rssi", access_point_id)?;

        if !calibration.wifi_access_points.contains_key(access_point_id) {
            return Err(ContractError::calibration(access_point_id));
        }

        guard.check(access_point_id, timestamp, access_point_id)?;

        let csi = record
            .get("csi")
            .and_then(|v| v.as_array())
            .map(|arr| arr.iter().filter_map(|x| x.as_f64()).collect::<Vec<_>>());
        let channel = record.get("channel").and_then(|v| v.as_u64()).map(|v| v as u32);
        let metadata: Option<Metadata> = record
            .get("metadata")
            .and_then(|v| serde_json::from_value(v.clone()).ok());
        let band = record
            .get("band")
            .and_then(|v| v.as_str())
            .and_then(|s| match s {
                "2.4ghz" => Some(Band::Band24Ghz),
                "5ghz" => Some(Band::Band5Ghz),
                "6ghz" => Some(Band::Band6Ghz),
                _ => None,
            })
            .or_else(|| derive_band(channel, &metadata));

        out.push(WiFiMeasurement {
            timestamp,
            access_point_id: access_point_id.into(),
            rssi,
            csi,
            channel,
            band,
            metadata,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::AccessPointCalibration;
    use serde_json::json;

    fn calibration_with_ap(id: &str) -> SensorCalibration {
        let mut cal = SensorCalibration::default();
        cal.wifi_access_points.insert(
            id.into(),
            AccessPointCalibration {
                position: (0.0, 0.0),
                position_uncertainty_meters: 1.0,
            },
        );
        cal
    }

    #[test]
    fn test_parse_minimal() {
        let cal = calibration_with_ap("ap-1");
        let mut guard = MonotonicGuard::new();
        let records = vec![json!({"access_point_id": "ap-1", "timestamp": 1.0, "rssi": -50.0})];
        let out = parse_wifi_measurements(&records, &cal, &mut guard).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].rssi, -50.0);
    }

    #[test]
    fn test_unknown_ap_rejected() {
        let cal = calibration_with_ap("ap-1");
        let mut guard = MonotonicGuard::new();
        let records = vec![json!({"access_point_id": "ap-unknown", "timestamp": 1.0, "rssi": -50.0})];
        let result = parse_wifi_measurements(&records, &cal, &mut guard);
        assert!(matches!(result, Err(ContractError::Calibration { .. })));
    }

    #[test]
    fn test_out_of_order_rejected() {
        let cal = calibration_with_ap("ap-1");
        let mut guard = MonotonicGuard::new();
        let records = vec![
            json!({"access_point_id": "ap-1", "timestamp": 2.0, "rssi": -50.0}),
            json!({"access_point_id": "ap-1", "timestamp": 1.0, "rssi": -48.0}),
        ];
        let result = parse_wifi_measurements(&records, &cal, &mut guard);
        assert!(result.is_err());
    }

    #[test]
    fn test_band_derived_from_channel() {
        let cal = calibration_with_ap("ap-1");
        let mut guard = MonotonicGuard::new();
        let records = vec![
            json!({"access_point_id": "ap-1", "timestamp": 1.0, "rssi": -50.0, "channel": 6}),
        ];
        let out = parse_wifi_measurements(&records, &cal, &mut guard).unwrap();
        assert_eq!(out[0].band, Some(Band::Band24Ghz));
    }

    #[test]
    fn test_band_derived_from_frequency_metadata() {
        let cal = calibration_with_ap("ap-1");
        let mut guard = MonotonicGuard::new();
        let records = vec![json!({
            "access_point_id": "ap-1", "timestamp": 1.0, "rssi": -50.0,
            "metadata": {"frequency_mhz": 5180.0}
        })];
        let out = parse_wifi_measurements(&records, &cal, &mut guard).unwrap();
        assert_eq!(out[0].band, Some(Band::Band5Ghz));
    }
}
