//! mmWave measurement parsing.
//!
//! Unlike Wi-Fi/vision, mmWave has no calibration requirement: an unknown
//! `sensor_id` is accepted, it simply won't get a position contribution in
//! candidate construction.

use super::{require_f64, require_str, MonotonicGuard};
use contracts::{ContractError, Metadata, MmWaveEventType, MmWaveMeasurement};

fn optional_angle(record: &serde_json::Value, sensor_id: &str) -> Result<Option<f64>, ContractError> {
    if let Some(rad) = record.get("angle_radians").and_then(|v| v.as_f64()) {
        return Ok(Some(rad));
    }
    if let Some(deg) = record.get("angle_degrees").and_then(|v| v.as_f64()) {
        return Ok(Some(deg.to_radians()));
    }
    let _ = sensor_id;
    Ok(None)
}

pub fn parse_mmwave_measurements(
    records: &[serde_json::Value],
    guard: &mut MonotonicGuard,
) -> Result<Vec<MmWaveMeasurement>, ContractError> {
    let mut out = Vec::with_capacity(records.len());
    for record in records {
        let sensor_id = require_str(record, "sensor_id", "<unknown>")?;
        let timestamp = require_f64(record, "timestamp", sensor_id)?;
        let confidence = require_f64(record, "confidence", sensor_id)?;
        let event_type_str = require_str(record, "event_type", sensor_id)?;
        let event_type = match event_type_str {
            "presence" => MmWaveEventType::Presence,
            "motion" => MmWaveEventType::Motion,
            other => {
                return Err(ContractError::ingestion(
                    sensor_id,
                    Some(timestamp),
                    format!("unknown event_type '{other}'"),
                ))
            }
        };

        guard.check(sensor_id, timestamp, sensor_id)?;

        let range_meters = record.get("range_meters").and_then(|v| v.as_f64());
        let angle_radians = optional_angle(record, sensor_id)?;
        let metadata: Option<Metadata> = record
            .get("metadata")
            .and_then(|v| serde_json::from_value(v.clone()).ok());

        if !(0.0..=1.0).contains(&confidence) {
            return Err(ContractError::ingestion(
                sensor_id,
                Some(timestamp),
                "mmWave confidence must be between 0 and 1",
            ));
        }
        if let Some(range) = range_meters {
            if !range.is_finite() || range < 0.0 {
                return Err(ContractError::ingestion(
                    sensor_id,
                    Some(timestamp),
                    "mmWave range_meters must be non-negative when provided",
                ));
            }
        }
        if let Some(angle) = angle_radians {
            if !angle.is_finite() || !(-std::f64::consts::PI..=std::f64::consts::PI).contains(&angle) {
                return Err(ContractError::ingestion(
                    sensor_id,
                    Some(timestamp),
                    "mmWave angle_radians must be between -pi and pi",
                ));
            }
        }

        out.push(MmWaveMeasurement {
            timestamp,
            sensor_id: sensor_id.into(),
            confidence,
            event_type,
            range_meters,
            angle_radians,
            metadata,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_minimal() {
        let mut guard = MonotonicGuard::new();
        let records = vec![json!({
            "sensor_id": "mm-1", "timestamp": 1.0, "confidence": 0.8, "event_type": "presence"
        })];
        let out = parse_mmwave_measurements(&records, &mut guard).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].event_type, MmWaveEventType::Presence);
    }

    #[test]
    fn test_angle_degrees_converted() {
        let mut guard = MonotonicGuard::new();
        let records = vec![json!({
            "sensor_id": "mm-1", "timestamp": 1.0, "confidence": 0.8, "event_type": "motion",
            "angle_degrees": 90.0
        })];
        let out = parse_mmwave_measurements(&records, &mut guard).unwrap();
        assert!((out[0].angle_radians.unwrap() - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_out_of_range_rejected() {
        let mut guard = MonotonicGuard::new();
        let records = vec![json!({
            "sensor_id": "mm-1", "timestamp": 1.0, "confidence": 1.5, "event_type": "presence"
        })];
        assert!(parse_mmwave_measurements(&records, &mut guard).is_err());
    }

    #[test]
    fn test_negative_range_rejected() {
        let mut guard = MonotonicGuard::new();
        let records = vec![json!({
            "sensor_id": "mm-1", "timestamp": 1.0, "confidence": 0.5, "event_type": "presence",
            "range_meters": -1.0
        })];
        assert!(parse_mmwave_measurements(&records, &mut guard).is_err());
    }

    #[test]
    fn test_unknown_event_type_rejected() {
        let mut guard = MonotonicGuard::new();
        let records = vec![json!({
            "sensor_id": "mm-1", "timestamp": 1.0, "confidence": 0.8, "event_type": "loitering"
        })];
        assert!(parse_mmwave_measurements(&records, &mut guard).is_err());
    }
}
