//! # Ingestion
//!
//! Per-modality sensor data ingestion: raw-record validation, clock-drift
//! correction, pull-based adapters, and the polling orchestrator.
//!
//! Responsibilities:
//! - Validate raw records into `contracts` measurement types
//! - Smooth per-source clock offsets
//! - Poll configured adapters each tick and fan their results into the
//!   synchronization buffer
//!
//! ## Usage
//!
//! ```ignore
//! use ingestion::{build_wifi_sources, build_vision_sources, build_mmwave_sources, build_ble_sources, Orchestrator};
//!
//! let wifi = build_wifi_sources(&config.ingestion.wifi_sources, calibration.clone())?;
//! let vision = build_vision_sources(&config.ingestion.vision_sources, calibration.clone())?;
//! let mmwave = build_mmwave_sources(&config.ingestion.mmwave_sources)?;
//! let ble = build_ble_sources(&config.ingestion.ble_sources)?;
//! let mut orchestrator = Orchestrator::new(wifi, vision, mmwave, ble);
//! orchestrator.poll(&mut buffer);
//! ```

mod adapters;
mod clock;
mod config;
mod error;
mod multiplex;
mod orchestrator;
mod parsers;
mod sources;

pub use adapters::{
    BleStaticConfig, BleStaticSource, HttpMmwaveSource, HttpPollerConfig, HttpVisionSource,
    HttpWifiSource, LocalWiFiCaptureConfig, LocalWiFiCaptureSource, ProcessVisionConfig,
    ProcessVisionSource, SerialMmWaveConfig, SerialMmWaveSource,
};
pub use clock::ClockDriftFilter;
pub use config::{build_ble_sources, build_mmwave_sources, build_vision_sources, build_wifi_sources};
pub use error::{IngestionError, Result};
pub use multiplex::{MultiBleSource, MultiMmwaveSource, MultiVisionSource, MultiWifiSource};
pub use orchestrator::{Orchestrator, SyncSink};
pub use parsers::{parse_ble_measurements, parse_detections, parse_mmwave_measurements, parse_wifi_measurements, MonotonicGuard};
pub use sources::{BleSource, MmwaveSource, VisionSource, WifiSource};
