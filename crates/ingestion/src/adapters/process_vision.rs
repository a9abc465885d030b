//! Process-exec JSON vision source
//!
//! Runs an external command once per `fetch()`, treating its stdout as a
//! JSON array of detection records, matching the HTTP poller's payload
//! shape so both funnel through the same `parse_detections` validator.

use std::process::Command;
use std::sync::Arc;
use std::time::Duration;

use contracts::{ContractError, Detection, SensorCalibration};

use crate::parsers::{self, MonotonicGuard};
use crate::sources::VisionSource;

#[derive(Clone, Debug)]
pub struct ProcessVisionConfig {
    pub source_name: String,
    pub command: String,
    pub args: Vec<String>,
    pub timeout_seconds: f64,
}

pub struct ProcessVisionSource {
    config: ProcessVisionConfig,
    calibration: Arc<SensorCalibration>,
    guard: MonotonicGuard,
}

impl ProcessVisionSource {
    pub fn new(config: ProcessVisionConfig, calibration: Arc<SensorCalibration>) -> Self {
        Self {
            config,
            calibration,
            guard: MonotonicGuard::new(),
        }
    }
}

impl VisionSource for ProcessVisionSource {
    fn name(&self) -> &str {
        &self.config.source_name
    }

    fn fetch(&mut self) -> Result<Vec<Detection>, ContractError> {
        let output = Command::new(&self.config.command)
            .args(&self.config.args)
            .output()
            .map_err(|e| ContractError::exporter(&self.config.source_name, e.to_string()))?;

        // `timeout_seconds` bounds how long the caller should wait for the
        // child; this adapter runs synchronously, so it is the orchestrator's
        // responsibility to not call fetch() faster than the process returns.
        let _ = Duration::from_secs_f64(self.config.timeout_seconds);

        if !output.status.success() {
            return Err(ContractError::exporter(
                &self.config.source_name,
                format!("command exited with {}", output.status),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let records: Vec<serde_json::Value> = serde_json::from_str(&stdout)
            .map_err(|e| ContractError::exporter(&self.config.source_name, format!("invalid JSON output: {e}")))?;

        parsers::parse_detections(&records, &self.calibration, &mut self.guard)
    }
}
