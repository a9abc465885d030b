//! # Fusion Core
//!
//! Turns a time-aligned [`contracts::FusionInput`] into a set of tracked,
//! alert-tiered [`contracts::TrackState`]s: candidate
//! construction per modality, global nearest-neighbor association (Hungarian
//! assignment under a hard distance gate), a constant-velocity Kalman
//! filter per track, a confirm/lost/terminate lifecycle, alert-tier
//! classification, and consent-gated emission.
//!
//! ## Usage Example
//!
//! ```ignore
//! use fusion_core::FusionCore;
//! use contracts::{SpaceConfig, SensorCalibration};
//!
//! let mut core = FusionCore::new(SpaceConfig { width_meters: 20.0, height_meters: 20.0, coordinate_origin: (0.0, 0.0) }, SensorCalibration::default());
//! let tick = core.fuse(&sync_batch.fusion_input, true, Some(sync_batch.status.reference_time))?;
//! ```

mod alert;
mod association;
mod audit;
mod candidate;
mod error;
mod fuse;
mod hungarian;
mod kalman;
mod track_store;

pub use alert::{classify as classify_alert, TrackSignals};
pub use association::{associate, Assignment};
pub use audit::{
    AuditLogger, ConsentRecord, ConsentStatus, ConsentStore, InMemoryConsentStore,
    SensorProvenanceLog, TrackUpdateLog,
};
pub use candidate::{build_candidates, Candidate, PositionHint};
pub use error::{FusionError, Result};
pub use fuse::FusionCore;
pub use hungarian::{assignment_cost, solve as solve_assignment};
pub use kalman::{euclidean_distance, init_state, predict, update, GATE_METERS, PROCESS_NOISE_Q};
pub use track_store::{TrackStore, CONFIRM_HITS, LOST_MISSES, TERMINATE_MISSES};
