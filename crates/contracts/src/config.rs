//! Top-level configuration schema.
//!
//! Nested `validator`-crate validation plus a custom schema function, with
//! field shape/defaults matching the reference fusion pipeline's
//! `_parse_*_config` functions.

use crate::{DispatchConfig, RetentionConfig, SensorCalibration, SpaceConfig, SyncStrategy};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct SynchronizationConfig {
    #[serde(default = "default_window_seconds")]
    #[validate(range(min = 0.0))]
    pub window_seconds: f64,
    #[serde(default = "default_max_latency_seconds")]
    #[validate(range(min = 0.0))]
    pub max_latency_seconds: f64,
    #[serde(default)]
    pub strategy: SyncStrategy,
}

fn default_window_seconds() -> f64 {
    0.25
}

fn default_max_latency_seconds() -> f64 {
    0.25
}

impl Default for SynchronizationConfig {
    fn default() -> Self {
        Self {
            window_seconds: default_window_seconds(),
            max_latency_seconds: default_max_latency_seconds(),
            strategy: SyncStrategy::default(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ConsentRecordSeed {
    pub status: String,
    #[serde(default)]
    pub participant_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AuditConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub require_consent: bool,
    #[serde(default)]
    pub consent_records: Vec<ConsentRecordSeed>,
}

/// Raw per-source entries, kept as opaque JSON values — the `ingestion`
/// crate owns interpreting the `type` discriminator and adapter-specific
/// fields, since `contracts` must not depend on `ingestion`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct IngestionSourcesConfig {
    #[serde(default)]
    pub wifi_sources: Vec<serde_json::Value>,
    #[serde(default)]
    pub vision_sources: Vec<serde_json::Value>,
    #[serde(default)]
    pub mmwave_sources: Vec<serde_json::Value>,
    #[serde(default)]
    pub ble_sources: Vec<serde_json::Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct FusionConfig {
    pub space: SpaceConfig,
    #[serde(default)]
    pub sensors: SensorCalibration,
    #[serde(default)]
    #[validate(nested)]
    pub synchronization: SynchronizationConfig,
    #[serde(default)]
    pub retention: RetentionConfig,
    #[serde(default)]
    pub audit: AuditConfig,
    #[serde(default)]
    #[validate(nested)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    #[validate(schema(function = "validate_ingestion_sources"))]
    pub ingestion: IngestionSourcesConfig,
}

fn validate_ingestion_sources(_ingestion: &IngestionSourcesConfig) -> Result<(), ValidationError> {
    // Adapter-specific shape validation happens in the ingestion crate when
    // each source is built; this schema-level hook exists so a future
    // cross-source invariant (e.g. "at least one source configured") has a
    // natural home.
    Ok(())
}
