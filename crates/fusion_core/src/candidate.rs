//! Per-modality position hints and candidate construction: Wi-Fi AP-weighted
//! centroid, vision foot-point projection, mmWave range/angle projection,
//! and confidence-weighted blending across whichever hints are available
//! this tick.

use contracts::{Detection, FusionInput, MmWaveEventType, SensorCalibration, SpaceConfig};

#[derive(Clone, Copy, Debug)]
pub struct PositionHint {
    pub position: (f64, f64),
    pub uncertainty: (f64, f64),
    pub confidence: f64,
}

#[derive(Clone, Debug)]
pub struct Candidate {
    pub timestamp: f64,
    pub position: (f64, f64),
    pub uncertainty: (f64, f64),
    pub confidence: f64,
}

/// Wi-Fi AP-weighted centroid Weight `max(1.0, 100 + rssi)`;
/// confidence is the mean of per-measurement `rssi_to_confidence`.
pub fn wifi_hint(input: &FusionInput, calibration: &SensorCalibration) -> Option<PositionHint> {
    if input.wifi.is_empty() {
        return None;
    }
    let mut weighted_x = 0.0;
    let mut weighted_y = 0.0;
    let mut total_weight = 0.0;
    let mut confidences = Vec::new();

    for m in &input.wifi {
        let Some(calib) = calibration.wifi_access_points.get(&m.access_point_id) else {
            continue;
        };
        let weight = (100.0 + m.rssi).max(1.0);
        weighted_x += calib.position.0 * weight;
        weighted_y += calib.position.1 * weight;
        total_weight += weight;
        confidences.push(rssi_to_confidence(m.rssi));
    }

    if total_weight <= 0.0 {
        return None;
    }
    let confidence = confidences.iter().sum::<f64>() / confidences.len().max(1) as f64;
    Some(PositionHint {
        position: (weighted_x / total_weight, weighted_y / total_weight),
        uncertainty: (1.5, 1.5),
        confidence,
    })
}

fn rssi_to_confidence(rssi: f64) -> f64 {
    let normalized = ((rssi + 100.0) / 60.0).clamp(0.0, 1.0);
    0.2 + 0.8 * normalized
}

/// Vision position for one detection: bbox center-x, bottom-y (foot
/// projection), via homography if calibrated, else normalized-image or
/// raw-world fallback
pub fn vision_position(
    detection: &Detection,
    space: &SpaceConfig,
    calibration: &SensorCalibration,
) -> (f64, f64) {
    let foot = detection.bbox.foot();

    if let Some(camera) = calibration.cameras.get(&detection.camera_id) {
        if let Some(world) = camera.project_homography(foot) {
            return world;
        }
    }

    let (fx, fy) = foot;
    if (0.0..=1.0).contains(&fx) && (0.0..=1.0).contains(&fy) {
        let (ox, oy) = space.coordinate_origin;
        return (ox + fx * space.width_meters, oy + fy * space.height_meters);
    }
    foot
}

/// mmWave position from the single highest-confidence measurement.
pub fn mmwave_hint(input: &FusionInput, calibration: &SensorCalibration) -> Option<PositionHint> {
    let best = input
        .mmwave
        .iter()
        .max_by(|a, b| a.confidence.partial_cmp(&b.confidence).unwrap_or(std::cmp::Ordering::Equal))?;

    let Some(calib) = calibration.mmwave_sensors.get(&best.sensor_id) else {
        // mmWave has no calibration requirement: an uncalibrated sensor id
        // is not an ingestion error, just produces no usable position hint.
        return None;
    };

    match (best.range_meters, best.angle_radians) {
        (Some(range), Some(angle)) => {
            let range_adj = range + calib.range_bias_meters;
            let theta = angle + calib.angle_bias_radians + calib.rotation_radians;
            let position = (
                calib.position.0 + range_adj * theta.cos(),
                calib.position.1 + range_adj * theta.sin(),
            );
            Some(PositionHint {
                position,
                uncertainty: (calib.position_uncertainty_meters, calib.position_uncertainty_meters),
                confidence: best.confidence,
            })
        }
        _ => Some(PositionHint {
            position: calib.position,
            uncertainty: (
                calib.position_uncertainty_meters * 1.5,
                calib.position_uncertainty_meters * 1.5,
            ),
            confidence: best.confidence,
        }),
    }
}

/// Confidence-weighted blend of 2-4 position hints: weight
/// `w_i = confidence_i` (floor sum at 1e-3); fused confidence is
/// `min(1, mean of constituent confidences)`.
fn blend(hints: &[PositionHint]) -> PositionHint {
    let total_weight = hints.iter().map(|h| h.confidence).sum::<f64>().max(1e-3);
    let x = hints.iter().map(|h| h.position.0 * h.confidence).sum::<f64>() / total_weight;
    let y = hints.iter().map(|h| h.position.1 * h.confidence).sum::<f64>() / total_weight;
    let ux = hints.iter().map(|h| h.uncertainty.0 * h.confidence).sum::<f64>() / total_weight;
    let uy = hints.iter().map(|h| h.uncertainty.1 * h.confidence).sum::<f64>() / total_weight;
    let mean_confidence = hints.iter().map(|h| h.confidence).sum::<f64>() / hints.len() as f64;
    PositionHint {
        position: (x, y),
        uncertainty: (ux, uy),
        confidence: mean_confidence.min(1.0),
    }
}

/// Build the per-tick candidate set: one candidate per vision
/// detection when vision is present (fused with Wi-Fi/mmWave hints), else
/// a single Wi-Fi/mmWave-fused candidate, else none.
pub fn build_candidates(
    input: &FusionInput,
    reference_time: f64,
    space: &SpaceConfig,
    calibration: &SensorCalibration,
) -> Vec<Candidate> {
    let wifi = wifi_hint(input, calibration);
    let mmwave = mmwave_hint(input, calibration);

    if !input.vision.is_empty() {
        return input
            .vision
            .iter()
            .map(|detection| {
                let vision_hint = PositionHint {
                    position: vision_position(detection, space, calibration),
                    uncertainty: (0.8, 0.8),
                    confidence: detection.confidence,
                };
                let mut hints = vec![vision_hint];
                if let Some(w) = wifi {
                    hints.push(w);
                }
                if let Some(m) = mmwave {
                    hints.push(m);
                }
                let fused = blend(&hints);
                Candidate {
                    timestamp: reference_time,
                    position: fused.position,
                    uncertainty: fused.uncertainty,
                    confidence: fused.confidence,
                }
            })
            .collect();
    }

    let mut hints = Vec::new();
    if let Some(w) = wifi {
        hints.push(w);
    }
    if let Some(m) = mmwave {
        hints.push(m);
    }
    if hints.is_empty() {
        return Vec::new();
    }
    let fused = blend(&hints);
    vec![Candidate {
        timestamp: reference_time,
        position: fused.position,
        uncertainty: fused.uncertainty,
        confidence: fused.confidence,
    }]
}

/// `true` if any mmWave measurement is present this tick, regardless of
/// event type (the alert-tier table only cares whether mmWave data exists).
pub fn has_mmwave(input: &FusionInput) -> bool {
    !input.mmwave.is_empty()
}

pub fn has_mmwave_event(input: &FusionInput, event: MmWaveEventType) -> bool {
    input.mmwave.iter().any(|m| m.event_type == event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{AccessPointCalibration, BBox, Detection, SensorCalibration, WiFiMeasurement};

    fn space() -> SpaceConfig {
        SpaceConfig {
            width_meters: 10.0,
            height_meters: 10.0,
            coordinate_origin: (0.0, 0.0),
        }
    }

    #[test]
    fn test_wifi_centroid_single_ap() {
        let mut calibration = SensorCalibration::default();
        calibration.wifi_access_points.insert(
            "ap-1".into(),
            AccessPointCalibration { position: (2.0, 3.0), position_uncertainty_meters: 1.0 },
        );
        let input = FusionInput {
            wifi: vec![WiFiMeasurement {
                timestamp: 0.0,
                access_point_id: "ap-1".into(),
                rssi: -45.0,
                csi: None,
                channel: None,
                band: None,
                metadata: None,
            }],
            ..Default::default()
        };
        let hint = wifi_hint(&input, &calibration).unwrap();
        assert!((hint.position.0 - 2.0).abs() < 1e-9);
        assert!((hint.position.1 - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_vision_normalized_coords_map_to_world() {
        let detection = Detection {
            timestamp: 0.0,
            camera_id: "cam-1".into(),
            bbox: BBox { x_min: 0.4, y_min: 0.4, x_max: 0.6, y_max: 0.6 },
            confidence: 0.9,
            keypoints: None,
        };
        let calibration = SensorCalibration::default();
        let position = vision_position(&detection, &space(), &calibration);
        assert!((position.0 - 5.0).abs() < 1e-9);
        assert!((position.1 - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_measurements_yields_no_candidates() {
        let input = FusionInput::default();
        let calibration = SensorCalibration::default();
        let candidates = build_candidates(&input, 0.0, &space(), &calibration);
        assert!(candidates.is_empty());
    }
}
