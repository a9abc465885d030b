//! Serial mmWave line protocol: one of (a) a JSON object per line, (b)
//! `timestamp_ms,sensor_id,event,confidence[,range_m[,angle_deg]]` CSV, or
//! (c) `key=value,...` form.
//!
//! Reads from any `BufRead` rather than a concrete serial connection, so the
//! line-protocol parsing is testable without real hardware; the caller
//! supplies the reader (an opened serial port, a named pipe, or a test
//! buffer).

use std::io::BufRead;

use contracts::{ContractError, MmWaveMeasurement};

use crate::parsers::{self, MonotonicGuard};
use crate::sources::MmwaveSource;

#[derive(Clone, Debug)]
pub struct SerialMmWaveConfig {
    pub source_name: String,
    pub default_sensor_id: Option<String>,
    pub max_lines: usize,
}

impl Default for SerialMmWaveConfig {
    fn default() -> Self {
        Self {
            source_name: "serial_mmwave".into(),
            default_sensor_id: None,
            max_lines: 64,
        }
    }
}

/// Parse one line into a raw JSON record, trying JSON, then CSV, then
/// `key=value` form, in that order.
fn parse_line(line: &str, default_sensor_id: Option<&str>) -> Option<serde_json::Value> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if line.starts_with('{') {
        return serde_json::from_str(line).ok();
    }

    if line.contains('=') && !line.contains(',') {
        return Some(parse_key_value(line, default_sensor_id));
    }
    if line.contains('=') {
        // key=value,key=value form
        if line.split(',').all(|part| part.contains('=')) {
            return Some(parse_key_value(line, default_sensor_id));
        }
    }

    parse_csv(line, default_sensor_id)
}

fn parse_key_value(line: &str, default_sensor_id: Option<&str>) -> serde_json::Value {
    let mut map = serde_json::Map::new();
    for part in line.split(',') {
        if let Some((key, value)) = part.split_once('=') {
            map.insert(key.trim().to_string(), coerce_value(value.trim()));
        }
    }
    if !map.contains_key("sensor_id") {
        if let Some(id) = default_sensor_id {
            map.insert("sensor_id".to_string(), serde_json::Value::from(id));
        }
    }
    serde_json::Value::Object(map)
}

fn parse_csv(line: &str, default_sensor_id: Option<&str>) -> Option<serde_json::Value> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() < 4 {
        return None;
    }
    let timestamp_ms: f64 = fields[0].trim().parse().ok()?;
    let sensor_id = if fields[1].trim().is_empty() {
        default_sensor_id?.to_string()
    } else {
        fields[1].trim().to_string()
    };
    let event_type = fields[2].trim().to_string();
    let confidence: f64 = fields[3].trim().parse().ok()?;

    let mut map = serde_json::Map::new();
    map.insert("timestamp".to_string(), serde_json::Value::from(timestamp_ms / 1000.0));
    map.insert("sensor_id".to_string(), serde_json::Value::from(sensor_id));
    map.insert("event_type".to_string(), serde_json::Value::from(event_type));
    map.insert("confidence".to_string(), serde_json::Value::from(confidence));
    if let Some(range_m) = fields.get(4).and_then(|s| s.trim().parse::<f64>().ok()) {
        map.insert("range_meters".to_string(), serde_json::Value::from(range_m));
    }
    if let Some(angle_deg) = fields.get(5).and_then(|s| s.trim().parse::<f64>().ok()) {
        map.insert("angle_degrees".to_string(), serde_json::Value::from(angle_deg));
    }
    Some(serde_json::Value::Object(map))
}

fn coerce_value(raw: &str) -> serde_json::Value {
    if let Ok(n) = raw.parse::<f64>() {
        return serde_json::Value::from(n);
    }
    serde_json::Value::from(raw)
}

pub struct SerialMmWaveSource<R: BufRead + Send> {
    config: SerialMmWaveConfig,
    reader: R,
    guard: MonotonicGuard,
}

impl<R: BufRead + Send> SerialMmWaveSource<R> {
    pub fn new(config: SerialMmWaveConfig, reader: R) -> Self {
        Self {
            config,
            reader,
            guard: MonotonicGuard::new(),
        }
    }
}

impl<R: BufRead + Send> MmwaveSource for SerialMmWaveSource<R> {
    fn name(&self) -> &str {
        &self.config.source_name
    }

    fn fetch(&mut self) -> Result<Vec<MmWaveMeasurement>, ContractError> {
        let mut records = Vec::new();
        let mut line = String::new();
        for _ in 0..self.config.max_lines {
            line.clear();
            let n = self
                .reader
                .read_line(&mut line)
                .map_err(|e| ContractError::exporter(&self.config.source_name, e.to_string()))?;
            if n == 0 {
                break;
            }
            if let Some(record) = parse_line(&line, self.config.default_sensor_id.as_deref()) {
                records.push(record);
            }
        }
        parsers::parse_mmwave_measurements(&records, &mut self.guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_json_line() {
        let data = b"{\"sensor_id\":\"mm-1\",\"timestamp\":1.0,\"confidence\":0.9,\"event_type\":\"presence\"}\n";
        let mut src = SerialMmWaveSource::new(SerialMmWaveConfig::default(), Cursor::new(&data[..]));
        let out = src.fetch().unwrap();
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_csv_line() {
        let data = b"1000,mm-1,presence,0.85,3.2,15\n";
        let mut src = SerialMmWaveSource::new(SerialMmWaveConfig::default(), Cursor::new(&data[..]));
        let out = src.fetch().unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].range_meters, Some(3.2));
    }

    #[test]
    fn test_key_value_line() {
        let data = b"sensor_id=mm-1,timestamp=1.5,confidence=0.7,event_type=motion\n";
        let mut src = SerialMmWaveSource::new(SerialMmWaveConfig::default(), Cursor::new(&data[..]));
        let out = src.fetch().unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].timestamp, 1.5);
    }
}
