//! Vision detection parsing: bbox validation and camera calibration lookup.

use super::{require_f64, require_str, MonotonicGuard};
use contracts::{BBox, ContractError, Detection, SensorCalibration};

pub fn parse_detections(
    records: &[serde_json::Value],
    calibration: &SensorCalibration,
    guard: &mut MonotonicGuard,
) -> Result<Vec<Detection>, ContractError> {
    let mut out = Vec::with_capacity(records.len());
    for record in records {
        let camera_id = require_str(record, "camera_id", "<unknown>")?;
        let timestamp = require_f64(record, "timestamp", camera_id)?;
        let confidence = require_f64(record, "confidence", camera_id)?;

        if !calibration.cameras.contains_key(camera_id) {
            return Err(ContractError::calibration(camera_id));
        }

        guard.check(camera_id, timestamp, camera_id)?;

        let bbox_value = record
            .get("bbox")
            .ok_or_else(|| ContractError::ingestion(camera_id, Some(timestamp), "missing field 'bbox'"))?;
        let bbox = BBox {
            x_min: require_f64(bbox_value, "x_min", camera_id)?,
            y_min: require_f64(bbox_value, "y_min", camera_id)?,
            x_max: require_f64(bbox_value, "x_max", camera_id)?,
            y_max: require_f64(bbox_value, "y_max", camera_id)?,
        };
        if bbox.x_min > bbox.x_max || bbox.y_min > bbox.y_max {
            return Err(ContractError::ingestion(
                camera_id,
                Some(timestamp),
                "bbox min must not exceed max",
            ));
        }

        let keypoints = record.get("keypoints").and_then(|v| v.as_array()).map(|arr| {
            arr.iter()
                .filter_map(|p| {
                    let pair = p.as_array()?;
                    Some((pair.first()?.as_f64()?, pair.get(1)?.as_f64()?))
                })
                .collect::<Vec<_>>()
        });

        out.push(Detection {
            timestamp,
            camera_id: camera_id.into(),
            bbox,
            confidence,
            keypoints,
        });
    }
    Ok(out)
}
