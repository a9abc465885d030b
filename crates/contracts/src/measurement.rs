//! Per-sensor measurement variants
//!
//! Each modality produces an independent, strongly typed record. Parsers in
//! the `ingestion` crate consume opaque dynamic payloads and must produce
//! only these variants; no downstream code inspects raw payloads.

use crate::SensorId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Arbitrary string-keyed metadata carried alongside a measurement.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// Wi-Fi frequency band, derived from channel or frequency when absent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    #[serde(rename = "2.4ghz")]
    Band24Ghz,
    #[serde(rename = "5ghz")]
    Band5Ghz,
    #[serde(rename = "6ghz")]
    Band6Ghz,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WiFiMeasurement {
    pub timestamp: f64,
    pub access_point_id: SensorId,
    pub rssi: f64,
    #[serde(default)]
    pub csi: Option<Vec<f64>>,
    #[serde(default)]
    pub channel: Option<u32>,
    #[serde(default)]
    pub band: Option<Band>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

impl WiFiMeasurement {
    /// `metadata.anomaly == true` ∨ `metadata.is_anomaly == true` ∨
    /// `metadata.anomaly_score >= 0.7`.
    pub fn is_anomalous(&self) -> bool {
        let Some(metadata) = &self.metadata else {
            return false;
        };
        if matches!(metadata.get("anomaly"), Some(v) if v.as_bool() == Some(true)) {
            return true;
        }
        if matches!(metadata.get("is_anomaly"), Some(v) if v.as_bool() == Some(true)) {
            return true;
        }
        if let Some(score) = metadata.get("anomaly_score").and_then(|v| v.as_f64()) {
            return score >= 0.7;
        }
        false
    }
}

/// A 2-D bounding box, `x_min <= x_max` and `y_min <= y_max`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct BBox {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl BBox {
    pub fn center(&self) -> (f64, f64) {
        ((self.x_min + self.x_max) / 2.0, (self.y_min + self.y_max) / 2.0)
    }

    /// Bbox center x, bottom (foot projection) y.
    pub fn foot(&self) -> (f64, f64) {
        ((self.x_min + self.x_max) / 2.0, self.y_max)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Detection {
    pub timestamp: f64,
    pub camera_id: SensorId,
    pub bbox: BBox,
    pub confidence: f64,
    #[serde(default)]
    pub keypoints: Option<Vec<(f64, f64)>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MmWaveEventType {
    Presence,
    Motion,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MmWaveMeasurement {
    pub timestamp: f64,
    pub sensor_id: SensorId,
    pub confidence: f64,
    pub event_type: MmWaveEventType,
    #[serde(default)]
    pub range_meters: Option<f64>,
    #[serde(default)]
    pub angle_radians: Option<f64>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BleMeasurement {
    pub timestamp: f64,
    pub rssi: f64,
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub hashed_identifier: Option<String>,
    #[serde(default)]
    pub channel: Option<u8>,
    #[serde(default)]
    pub manufacturer_data: Option<Metadata>,
}

impl BleMeasurement {
    /// Either identifier, preferring the raw device id, for logging/sources output.
    pub fn identity(&self) -> Option<&str> {
        self.device_id
            .as_deref()
            .or(self.hashed_identifier.as_deref())
    }
}

/// Tagged union of the four measurement kinds, used by buffer/dispatcher
/// plumbing that needs to treat all modalities uniformly (e.g. source
/// provenance tagging).
#[derive(Clone, Debug)]
pub enum Measurement {
    WiFi(WiFiMeasurement),
    Detection(Detection),
    MmWave(MmWaveMeasurement),
    Ble(BleMeasurement),
}

impl Measurement {
    pub fn modality(&self) -> &'static str {
        match self {
            Measurement::WiFi(_) => "wifi",
            Measurement::Detection(_) => "vision",
            Measurement::MmWave(_) => "mmwave",
            Measurement::Ble(_) => "ble",
        }
    }

    pub fn timestamp(&self) -> f64 {
        match self {
            Measurement::WiFi(m) => m.timestamp,
            Measurement::Detection(m) => m.timestamp,
            Measurement::MmWave(m) => m.timestamp,
            Measurement::Ble(m) => m.timestamp,
        }
    }
}

/// Aligned per-tick input to the fusion core; "fusion_input".
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FusionInput {
    #[serde(default)]
    pub wifi: Vec<WiFiMeasurement>,
    #[serde(default)]
    pub vision: Vec<Detection>,
    #[serde(default)]
    pub mmwave: Vec<MmWaveMeasurement>,
    #[serde(default)]
    pub ble: Vec<BleMeasurement>,
}

impl FusionInput {
    pub fn is_empty(&self) -> bool {
        self.wifi.is_empty()
            && self.vision.is_empty()
            && self.mmwave.is_empty()
            && self.ble.is_empty()
    }
}
