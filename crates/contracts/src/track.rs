//! Track memory (fusion-core-owned) and the emitted `TrackState` snapshot:
//! position, velocity, covariance, hit/miss counters, and lifecycle status.
//! The Kalman state representation uses flat fixed-size arrays rather than
//! a matrix crate, in keeping with this codebase's small-array convention
//! for per-track linear algebra.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a track
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackStatus {
    Init,
    Confirmed,
    Lost,
    Terminated,
}

/// Severity label attached to every track emitted on a tick
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertTier {
    None,
    Blue,
    Yellow,
    Orange,
    Red,
}

/// Constant-velocity 2-D Kalman state: `(x, y, vx, vy)` with a 4x4
/// covariance, stored as flat row-major arrays.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct KalmanState {
    pub state: [f64; 4],
    pub covariance: [[f64; 4]; 4],
}

impl KalmanState {
    pub fn position(&self) -> (f64, f64) {
        (self.state[0], self.state[1])
    }

    pub fn velocity(&self) -> (f64, f64) {
        (self.state[2], self.state[3])
    }

    /// `(sigma_x, sigma_y) = (sqrt(P00), sqrt(P11))`.
    pub fn uncertainty(&self) -> (f64, f64) {
        (self.covariance[0][0].max(0.0).sqrt(), self.covariance[1][1].max(0.0).sqrt())
    }
}

/// One live track, owned exclusively by the fusion core.
#[derive(Clone, Debug)]
pub struct TrackMemory {
    pub track_id: String,
    pub timestamp: f64,
    pub kalman: KalmanState,
    pub confidence: f64,
    pub status: TrackStatus,
    pub hits: u32,
    pub misses: u32,
}

impl TrackMemory {
    pub fn position(&self) -> (f64, f64) {
        self.kalman.position()
    }

    pub fn velocity(&self) -> (f64, f64) {
        self.kalman.velocity()
    }

    pub fn uncertainty(&self) -> (f64, f64) {
        self.kalman.uncertainty()
    }

    /// Independent value copy for downstream emission.
    pub fn to_state(&self, alert_tier: AlertTier) -> TrackState {
        TrackState {
            track_id: self.track_id.clone(),
            timestamp: self.timestamp,
            position: self.position(),
            velocity: if self.status == TrackStatus::Init && self.hits <= 1 {
                None
            } else {
                Some(self.velocity())
            },
            uncertainty: self.uncertainty(),
            confidence: self.confidence,
            alert_tier,
        }
    }
}

/// Emitted, self-contained snapshot of a track.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrackState {
    pub track_id: String,
    pub timestamp: f64,
    pub position: (f64, f64),
    #[serde(default)]
    pub velocity: Option<(f64, f64)>,
    pub uncertainty: (f64, f64),
    pub confidence: f64,
    pub alert_tier: AlertTier,
}
