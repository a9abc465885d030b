//! BLE static/offline source: holds a fixed set of advertisement payloads
//! and drains them once per `scan_interval_seconds`, returning nothing on
//! calls made sooner than that so a fixed payload isn't replayed every
//! tick.

use std::time::Instant;

use contracts::{BleMeasurement, ContractError};

use crate::parsers::{self, MonotonicGuard};
use crate::sources::BleSource;

#[derive(Clone, Debug)]
pub struct BleStaticConfig {
    pub source_name: String,
    pub scan_interval_seconds: f64,
    pub hash_device_id: bool,
}

pub struct BleStaticSource {
    config: BleStaticConfig,
    payloads: Vec<serde_json::Value>,
    guard: MonotonicGuard,
    last_drain: Option<Instant>,
}

impl BleStaticSource {
    pub fn new(config: BleStaticConfig, payloads: Vec<serde_json::Value>) -> Self {
        Self {
            config,
            payloads,
            guard: MonotonicGuard::new(),
            last_drain: None,
        }
    }
}

impl BleSource for BleStaticSource {
    fn name(&self) -> &str {
        &self.config.source_name
    }

    fn fetch(&mut self) -> Result<Vec<BleMeasurement>, ContractError> {
        let ready = match self.last_drain {
            None => true,
            Some(t) => t.elapsed().as_secs_f64() >= self.config.scan_interval_seconds,
        };
        if !ready {
            return Ok(Vec::new());
        }
        self.last_drain = Some(Instant::now());
        parsers::parse_ble_measurements(&self.payloads, self.config.hash_device_id, &mut self.guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_drains_once_per_interval() {
        let config = BleStaticConfig {
            source_name: "ble-static".into(),
            scan_interval_seconds: 60.0,
            hash_device_id: false,
        };
        let payloads = vec![json!({"timestamp": 1.0, "rssi": -70.0, "device_id": "d1"})];
        let mut source = BleStaticSource::new(config, payloads);
        let first = source.fetch().unwrap();
        assert_eq!(first.len(), 1);
        let second = source.fetch().unwrap();
        assert!(second.is_empty());
    }
}
