//! # Contracts
//!
//! Frozen interface contracts (ICD), defining inter-module data structures
//! and traits. All business crates depend only on this crate; reverse
//! dependencies are prohibited.
//!
//! ## Time model
//! - Wall-clock seconds (`f64`) is the primary clock, corrected per-source
//!   via the ingestion-layer clock-drift smoothing.

mod calibration;
mod config;
mod dispatch;
mod emission;
mod error;
mod measurement;
mod retention;
mod sensor_id;
mod sink;
mod sync_batch;
mod track;

pub use calibration::*;
pub use config::*;
pub use dispatch::*;
pub use emission::*;
pub use error::*;
pub use measurement::*;
pub use retention::*;
pub use sensor_id::SensorId;
pub use sink::*;
pub use sync_batch::*;
pub use track::*;
