//! Local iw-based Wi-Fi capture: runs a scan command, selects the BSS entry
//! matching the configured target, optionally shells out to a separate CSI
//! command, and prefers the CSI timestamp over the scan timestamp when
//! present — a deployment-specific choice, exposed as a config knob rather
//! than fixed behavior.

use std::process::Command;
use std::sync::Arc;

use contracts::{ContractError, SensorCalibration, WiFiMeasurement};

use crate::parsers::{self, MonotonicGuard};
use crate::sources::WifiSource;

#[derive(Clone, Debug)]
pub struct LocalWiFiCaptureConfig {
    pub source_name: String,
    pub interface_name: String,
    pub access_point_id: String,
    pub target_bssid: Option<String>,
    pub target_ssid: Option<String>,
    pub scan_command: String,
    pub csi_command: Option<String>,
    pub clock_offset_seconds: f64,
}

struct ScanResult {
    bssid: String,
    ssid: Option<String>,
    signal_dbm: f64,
}

fn run_scan(config: &LocalWiFiCaptureConfig) -> Result<Vec<ScanResult>, ContractError> {
    let output = Command::new(&config.scan_command)
        .args(["dev", &config.interface_name, "scan"])
        .output()
        .map_err(|e| ContractError::exporter(&config.source_name, e.to_string()))?;
    if !output.status.success() {
        return Err(ContractError::exporter(
            &config.source_name,
            format!("scan command exited with {}", output.status),
        ));
    }
    Ok(parse_iw_scan(&String::from_utf8_lossy(&output.stdout)))
}

/// Parse `iw dev <iface> scan` output: one `BSS <mac>` entry per block,
/// each with an optional `SSID:` and `signal:` line.
fn parse_iw_scan(stdout: &str) -> Vec<ScanResult> {
    let mut results = Vec::new();
    let mut current: Option<(String, Option<String>, Option<f64>)> = None;

    for line in stdout.lines() {
        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix("BSS ") {
            if let Some((bssid, ssid, signal)) = current.take() {
                if let Some(signal) = signal {
                    results.push(ScanResult { bssid, ssid, signal_dbm: signal });
                }
            }
            let mac = rest.split(|c: char| c.is_whitespace() || c == '(').next().unwrap_or("");
            current = Some((mac.to_string(), None, None));
        } else if let Some(rest) = trimmed.strip_prefix("SSID: ") {
            if let Some(c) = current.as_mut() {
                c.1 = Some(rest.to_string());
            }
        } else if let Some(rest) = trimmed.strip_prefix("signal: ") {
            if let Some(c) = current.as_mut() {
                c.2 = rest
                    .split_whitespace()
                    .next()
                    .and_then(|v| v.parse::<f64>().ok());
            }
        }
    }
    if let Some((bssid, ssid, signal)) = current {
        if let Some(signal) = signal {
            results.push(ScanResult { bssid, ssid, signal_dbm: signal });
        }
    }
    results
}

fn select_scan_result<'a>(
    results: &'a [ScanResult],
    config: &LocalWiFiCaptureConfig,
) -> Option<&'a ScanResult> {
    if let Some(bssid) = &config.target_bssid {
        return results.iter().find(|r| &r.bssid == bssid);
    }
    if let Some(ssid) = &config.target_ssid {
        return results.iter().find(|r| r.ssid.as_deref() == Some(ssid.as_str()));
    }
    results.first()
}

/// Run the external CSI command, if configured, and parse whitespace- or
/// comma-separated floats plus an optional leading `timestamp=` token.
fn run_csi_command(command: &str, source_name: &str) -> Result<(Vec<f64>, Option<f64>), ContractError> {
    let parts: Vec<&str> = command.split_whitespace().collect();
    let (program, args) = parts
        .split_first()
        .ok_or_else(|| ContractError::exporter(source_name, "empty csi_command"))?;
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| ContractError::exporter(source_name, e.to_string()))?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut timestamp = None;
    let mut csi = Vec::new();
    for token in stdout.trim().split([',', ' ']) {
        if let Some(ts) = token.strip_prefix("timestamp=") {
            timestamp = ts.parse::<f64>().ok();
        } else if let Ok(v) = token.parse::<f64>() {
            csi.push(v);
        }
    }
    Ok((csi, timestamp))
}

pub struct LocalWiFiCaptureSource {
    config: LocalWiFiCaptureConfig,
    calibration: Arc<SensorCalibration>,
    guard: MonotonicGuard,
}

impl LocalWiFiCaptureSource {
    pub fn new(config: LocalWiFiCaptureConfig, calibration: Arc<SensorCalibration>) -> Self {
        Self {
            config,
            calibration,
            guard: MonotonicGuard::new(),
        }
    }

    /// Ensure the access point id used by the parser has a calibration
    /// entry; inserting a zero-uncertainty placeholder is not attempted
    /// here: missing calibration is a configuration error surfaced by the
    /// parser itself.
    fn require_known_ap(&self) -> Result<(), ContractError> {
        if self
            .calibration
            .wifi_access_points
            .contains_key(self.config.access_point_id.as_str())
        {
            Ok(())
        } else {
            Err(ContractError::calibration(&self.config.access_point_id))
        }
    }
}

impl WifiSource for LocalWiFiCaptureSource {
    fn name(&self) -> &str {
        &self.config.source_name
    }

    fn fetch(&mut self) -> Result<Vec<WiFiMeasurement>, ContractError> {
        self.require_known_ap()?;
        let results = run_scan(&self.config)?;
        let Some(selected) = select_scan_result(&results, &self.config) else {
            return Ok(Vec::new());
        };

        let scan_time = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0)
            + self.config.clock_offset_seconds;

        let (csi, csi_timestamp) = match &self.config.csi_command {
            Some(cmd) => run_csi_command(cmd, &self.config.source_name)?,
            None => (Vec::new(), None),
        };

        // CSI timestamp preferred over scan timestamp when present.
        let timestamp = csi_timestamp.unwrap_or(scan_time);

        let mut record = serde_json::Map::new();
        record.insert("access_point_id".to_string(), serde_json::Value::from(self.config.access_point_id.clone()));
        record.insert("timestamp".to_string(), serde_json::Value::from(timestamp));
        record.insert("rssi".to_string(), serde_json::Value::from(selected.signal_dbm));
        if !csi.is_empty() {
            record.insert(
                "csi".to_string(),
                serde_json::Value::from(csi.into_iter().map(serde_json::Value::from).collect::<Vec<_>>()),
            );
        }

        parsers::parse_wifi_measurements(
            &[serde_json::Value::Object(record)],
            &self.calibration,
            &mut self.guard,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_iw_scan_output() {
        let stdout = "BSS aa:bb:cc:dd:ee:ff(on wlan0)\n\tSSID: home-net\n\tsignal: -55.00 dBm\nBSS 11:22:33:44:55:66(on wlan0)\n\tSSID: other\n\tsignal: -70.00 dBm\n";
        let results = parse_iw_scan(stdout);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].bssid, "aa:bb:cc:dd:ee:ff");
        assert_eq!(results[0].signal_dbm, -55.0);
    }

    #[test]
    fn test_select_by_bssid() {
        let results = vec![
            ScanResult { bssid: "aa".into(), ssid: Some("x".into()), signal_dbm: -50.0 },
            ScanResult { bssid: "bb".into(), ssid: Some("y".into()), signal_dbm: -60.0 },
        ];
        let config = LocalWiFiCaptureConfig {
            source_name: "local".into(),
            interface_name: "wlan0".into(),
            access_point_id: "ap-1".into(),
            target_bssid: Some("bb".into()),
            target_ssid: None,
            scan_command: "iw".into(),
            csi_command: None,
            clock_offset_seconds: 0.0,
        };
        let selected = select_scan_result(&results, &config).unwrap();
        assert_eq!(selected.bssid, "bb");
    }
}
