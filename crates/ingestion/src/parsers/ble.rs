//! BLE advertisement parsing: decode AD structures and hash identifiers
//! before they ever leave this module.

use super::MonotonicGuard;
use contracts::{BleMeasurement, ContractError, Metadata};
use sha2::{Digest, Sha256};

const VALID_CHANNELS: [u8; 3] = [37, 38, 39];

/// Decode the concatenation of BLE AD structures (`len|type|bytes`) into a
/// metadata map. Manufacturer-specific data lives under type
/// `0xFF` (little-endian company id prefix), service data under `0x16`
/// (16-bit UUID), `0x20` (32-bit), or `0x21` (128-bit, UUID bytes
/// little-endian).
fn decode_ad_structures(bytes: &[u8]) -> Metadata {
    let mut metadata = Metadata::new();
    let mut i = 0usize;
    while i < bytes.len() {
        let len = bytes[i] as usize;
        if len == 0 || i + len >= bytes.len() {
            break;
        }
        let ad_type = bytes[i + 1];
        let data = &bytes[i + 2..i + 1 + len];
        match ad_type {
            0xFF if data.len() >= 2 => {
                let company_id = u16::from_le_bytes([data[0], data[1]]);
                metadata.insert(
                    "manufacturer_id".to_string(),
                    serde_json::Value::from(company_id),
                );
                metadata.insert(
                    "manufacturer_payload".to_string(),
                    serde_json::Value::from(hex::encode(&data[2..])),
                );
            }
            0x16 if data.len() >= 2 => {
                let uuid = u16::from_le_bytes([data[0], data[1]]);
                metadata.insert("service_uuid16".to_string(), serde_json::Value::from(uuid));
            }
            0x20 if data.len() >= 4 => {
                let uuid = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
                metadata.insert("service_uuid32".to_string(), serde_json::Value::from(uuid));
            }
            0x21 if data.len() >= 16 => {
                let mut le = data[0..16].to_vec();
                le.reverse();
                metadata.insert(
                    "service_uuid128".to_string(),
                    serde_json::Value::from(hex::encode(le)),
                );
            }
            _ => {}
        }
        i += len + 1;
    }
    metadata
}

fn hex_to_bytes(s: &str) -> Option<Vec<u8>> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(s).ok()
}

pub fn parse_ble_measurements(
    records: &[serde_json::Value],
    hash_device_id: bool,
    guard: &mut MonotonicGuard,
) -> Result<Vec<BleMeasurement>, ContractError> {
    let mut out = Vec::with_capacity(records.len());
    for record in records {
        let timestamp = record
            .get("timestamp")
            .and_then(|v| v.as_f64())
            .ok_or_else(|| ContractError::ingestion("<unknown>", None, "missing field 'timestamp'"))?;
        let rssi = record
            .get("rssi")
            .and_then(|v| v.as_f64())
            .ok_or_else(|| ContractError::ingestion("<unknown>", Some(timestamp), "missing field 'rssi'"))?;
        if !rssi.is_finite() {
            return Err(ContractError::ingestion(
                "<unknown>",
                Some(timestamp),
                "BLE rssi must be a finite number",
            ));
        }

        let device_id = record.get("device_id").and_then(|v| v.as_str()).map(str::to_string);
        let mut hashed_identifier = record
            .get("hashed_identifier")
            .and_then(|v| v.as_str())
            .map(str::to_string);

        if device_id.is_none() && hashed_identifier.is_none() {
            return Err(ContractError::ingestion(
                "<unknown>",
                Some(timestamp),
                "requires device_id or hashed_identifier",
            ));
        }

        if let (Some(id), true, None) = (&device_id, hash_device_id, &hashed_identifier) {
            let mut hasher = Sha256::new();
            hasher.update(id.as_bytes());
            hashed_identifier = Some(hex::encode(hasher.finalize()));
        }

        let source_key = device_id
            .clone()
            .or_else(|| hashed_identifier.clone())
            .unwrap_or_default();
        guard.check(&source_key, timestamp, &source_key)?;

        let channel = match record.get("channel").and_then(|v| v.as_u64()) {
            Some(ch) => {
                let ch = ch as u8;
                if !VALID_CHANNELS.contains(&ch) {
                    return Err(ContractError::ingestion(
                        &source_key,
                        Some(timestamp),
                        format!("invalid BLE channel {ch}, expected one of {VALID_CHANNELS:?}"),
                    ));
                }
                Some(ch)
            }
            None => None,
        };

        let manufacturer_data = if let Some(obj) = record.get("manufacturer_data") {
            if obj.is_object() {
                serde_json::from_value(obj.clone()).ok()
            } else if let Some(hex_str) = obj.as_str() {
                hex_to_bytes(hex_str).map(|b| decode_ad_structures(&b))
            } else if let Some(arr) = obj.as_array() {
                let bytes: Vec<u8> = arr.iter().filter_map(|v| v.as_u64()).map(|v| v as u8).collect();
                Some(decode_ad_structures(&bytes))
            } else {
                None
            }
        } else {
            record
                .get("raw_payload")
                .and_then(|v| v.as_str())
                .and_then(hex_to_bytes)
                .map(|b| decode_ad_structures(&b))
        };

        out.push(BleMeasurement {
            timestamp,
            rssi,
            device_id,
            hashed_identifier,
            channel,
            manufacturer_data,
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
        let records = vec![json!({"timestamp": 1.0, "rssi": -60.0, "device_id": "aa:bb:cc", "channel": 37})];
        let out = parse_ble_measurements(&records, false, &mut guard).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].device_id.as_deref(), Some("aa:bb:cc"));
    }

    #[test]
    fn test_missing_identifier_rejected() {
        let mut guard = MonotonicGuard::new();
        let records = vec![json!({"timestamp": 1.0, "rssi": -60.0})];
        assert!(parse_ble_measurements(&records, false, &mut guard).is_err());
    }

    #[test]
    fn test_invalid_channel_rejected() {
        let mut guard = MonotonicGuard::new();
        let records = vec![json!({"timestamp": 1.0, "rssi": -60.0, "device_id": "x", "channel": 40})];
        assert!(parse_ble_measurements(&records, false, &mut guard).is_err());
    }

    #[test]
    fn test_hashing_when_enabled() {
        let mut guard = MonotonicGuard::new();
        let records = vec![json!({"timestamp": 1.0, "rssi": -60.0, "device_id": "aa:bb:cc"})];
        let out = parse_ble_measurements(&records, true, &mut guard).unwrap();
        assert!(out[0].hashed_identifier.is_some());
        assert_eq!(out[0].hashed_identifier.as_ref().unwrap().len(), 64);
    }

    #[test]
    fn test_manufacturer_ad_structure_decoded() {
        let mut guard = MonotonicGuard::new();
        // len=4, type=0xFF, company_id=0x4C00 (LE), one payload byte 0x01
        let raw = hex::encode([0x04u8, 0xFF, 0x00, 0x4C, 0x01]);
        let records = vec![json!({
            "timestamp": 1.0, "rssi": -60.0, "device_id": "aa", "raw_payload": raw
        })];
        let out = parse_ble_measurements(&records, false, &mut guard).unwrap();
        let md = out[0].manufacturer_data.as_ref().unwrap();
        assert_eq!(md.get("manufacturer_id").unwrap().as_u64(), Some(0x4C00));
    }
}
