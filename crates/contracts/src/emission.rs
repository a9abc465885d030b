//! Downstream emission envelope (NDJSON per tick)

use crate::{AlertTier, TrackState};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorHealthStatus {
    Online,
    Offline,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmitterSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emitter_id: Option<String>,
    pub rssi: f64,
    pub last_seen: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SensorHealth {
    pub label: String,
    pub status: SensorHealthStatus,
    pub last_seen: Option<f64>,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct BandSummary {
    #[serde(rename = "2.4ghz")]
    pub band_24ghz: u32,
    #[serde(rename = "5ghz")]
    pub band_5ghz: u32,
    #[serde(rename = "6ghz")]
    pub band_6ghz: u32,
}

/// The default per-tick NDJSON envelope. `--legacy-emission` instead emits
/// one bare `TrackState` object per line (legacy mode).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmittedTick {
    pub tracks: Vec<TrackState>,
    pub emitters: Vec<EmitterSummary>,
    pub sensor_health: Vec<SensorHealth>,
    pub band_summary: BandSummary,
}

impl EmittedTick {
    pub fn alert_tier(&self) -> AlertTier {
        self.tracks
            .first()
            .map(|t| t.alert_tier)
            .unwrap_or(AlertTier::None)
    }
}
