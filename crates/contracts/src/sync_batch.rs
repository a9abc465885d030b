//! Synchronization buffer output: the aligned, per-tick fusion input plus
//! its staleness/drop bookkeeping, exposed as `SyncBatch`/`SyncStatus`
//! (reference_time, per-modality stale flags, dropped counts).

use crate::FusionInput;
use serde::{Deserialize, Serialize};

/// Alignment strategy used by the synchronization buffer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStrategy {
    Nearest,
    Interpolate,
}

impl Default for SyncStrategy {
    fn default() -> Self {
        SyncStrategy::Nearest
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncStatus {
    pub reference_time: f64,
    pub wifi_stale: bool,
    pub vision_stale: bool,
    pub mmwave_stale: bool,
    pub ble_stale: bool,
    pub dropped_wifi: u32,
    pub dropped_vision: u32,
    pub dropped_mmwave: u32,
    pub dropped_ble: u32,
    pub window_seconds: f64,
    pub max_latency_seconds: f64,
    pub strategy: SyncStrategy,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncBatch {
    pub fusion_input: FusionInput,
    pub status: SyncStatus,
}
