//! Immutable, process-scoped calibration registry: camera intrinsics/
//! extrinsics, access point positions, and mmWave sensor placement, plus
//! homography for camera-to-world projection.

use crate::SensorId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    pub focal_length: (f64, f64),
    pub principal_point: (f64, f64),
    #[serde(default)]
    pub skew: f64,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct CameraExtrinsics {
    pub translation: (f64, f64),
    #[serde(default)]
    pub rotation_radians: f64,
}

/// Row-major 3x3 projective transform, image-plane -> world-plane.
pub type Homography = [[f64; 3]; 3];

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CameraCalibration {
    pub intrinsics: CameraIntrinsics,
    pub extrinsics: CameraExtrinsics,
    #[serde(default)]
    pub homography: Option<Homography>,
    #[serde(default)]
    pub camera_height_m: Option<f64>,
    #[serde(default)]
    pub tilt_rad: Option<f64>,
}

impl CameraCalibration {
    /// Apply the homography to an image-plane point, dividing by the
    /// homogeneous coordinate. Returns `None` if the denominator is too
    /// small to trust (|w| < 1e-6).
    pub fn project_homography(&self, point: (f64, f64)) -> Option<(f64, f64)> {
        let h = self.homography?;
        let (x, y) = point;
        let w = h[2][0] * x + h[2][1] * y + h[2][2];
        if w.abs() < 1e-6 {
            return None;
        }
        let wx = (h[0][0] * x + h[0][1] * y + h[0][2]) / w;
        let wy = (h[1][0] * x + h[1][1] * y + h[1][2]) / w;
        Some((wx, wy))
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct AccessPointCalibration {
    pub position: (f64, f64),
    pub position_uncertainty_meters: f64,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct MmWaveCalibration {
    pub position: (f64, f64),
    #[serde(default)]
    pub rotation_radians: f64,
    #[serde(default)]
    pub range_bias_meters: f64,
    #[serde(default)]
    pub angle_bias_radians: f64,
    #[serde(default = "default_mmwave_uncertainty")]
    pub position_uncertainty_meters: f64,
}

fn default_mmwave_uncertainty() -> f64 {
    1.0
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SensorCalibration {
    #[serde(default)]
    pub wifi_access_points: HashMap<SensorId, AccessPointCalibration>,
    #[serde(default)]
    pub cameras: HashMap<SensorId, CameraCalibration>,
    #[serde(default)]
    pub mmwave_sensors: HashMap<SensorId, MmWaveCalibration>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SpaceConfig {
    pub width_meters: f64,
    pub height_meters: f64,
    #[serde(default)]
    pub coordinate_origin: (f64, f64),
}
