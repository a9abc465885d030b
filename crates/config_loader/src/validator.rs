//! Configuration validation module.
//!
//! Uses the `validator` crate for structured validation while retaining
//! custom validation rules in a second pass (derive validation, then
//! id-uniqueness / reference-integrity checks).
//!
//! Validation rules:
//! - wifi access point / camera / mmwave sensor ids are unique within their
//!   own registry (`HashMap` keys already guarantee this; validated here to
//!   surface a descriptive error rather than silent overwrite during
//!   deserialization)
//! - `synchronization.window_seconds` / `max_latency_seconds` >= 0 (handled
//!   by validator derive)
//! - `space.width_meters` / `height_meters` > 0
//! - retention, if enabled, must configure at least one TTL

use std::collections::HashSet;

use contracts::{ContractError, FusionConfig};
use validator::Validate;

/// Validate a `FusionConfig`.
///
/// First runs structured validator checks, then executes custom validation.
pub fn validate(config: &FusionConfig) -> Result<(), ContractError> {
    config
        .validate()
        .map_err(|e| ContractError::config_validation("validation", format!("{}", e)))?;

    validate_space(config)?;
    validate_unique_sensor_ids(config)?;
    validate_retention(config)?;

    Ok(())
}

fn validate_space(config: &FusionConfig) -> Result<(), ContractError> {
    if config.space.width_meters <= 0.0 || config.space.height_meters <= 0.0 {
        return Err(ContractError::config_validation(
            "space",
            "width_meters and height_meters must both be positive",
        ));
    }
    Ok(())
}

/// Sensor ids are already unique per modality (`HashMap` keys), but a
/// sensor id reused *across* modalities (e.g. the same string naming both a
/// camera and an access point) is a configuration mistake worth catching
/// early, since downstream health/emitter summaries key on sensor id.
fn validate_unique_sensor_ids(config: &FusionConfig) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for id in config.sensors.wifi_access_points.keys() {
        if !seen.insert(id.as_ref()) {
            return Err(ContractError::config_validation(
                format!("sensors.wifi_access_points[{id}]"),
                "duplicate sensor id across modalities",
            ));
        }
    }
    for id in config.sensors.cameras.keys() {
        if !seen.insert(id.as_ref()) {
            return Err(ContractError::config_validation(
                format!("sensors.cameras[{id}]"),
                "duplicate sensor id across modalities",
            ));
        }
    }
    for id in config.sensors.mmwave_sensors.keys() {
        if !seen.insert(id.as_ref()) {
            return Err(ContractError::config_validation(
                format!("sensors.mmwave_sensors[{id}]"),
                "duplicate sensor id across modalities",
            ));
        }
    }
    Ok(())
}

fn validate_retention(config: &FusionConfig) -> Result<(), ContractError> {
    if config.retention.enabled && !config.retention.is_enabled() {
        return Err(ContractError::config_validation(
            "retention",
            "retention.enabled is true but no measurement_ttl_seconds or log_ttl_seconds is set",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{AccessPointCalibration, SensorCalibration, SpaceConfig};

    fn minimal_config() -> FusionConfig {
        let mut sensors = SensorCalibration::default();
        sensors.wifi_access_points.insert(
            "ap-1".into(),
            AccessPointCalibration {
                position: (0.0, 0.0),
                position_uncertainty_meters: 1.0,
            },
        );
        FusionConfig {
            space: SpaceConfig {
                width_meters: 10.0,
                height_meters: 8.0,
                coordinate_origin: (0.0, 0.0),
            },
            sensors,
            synchronization: Default::default(),
            retention: Default::default(),
            audit: Default::default(),
            dispatch: Default::default(),
            ingestion: Default::default(),
        }
    }

    #[test]
    fn test_valid_config() {
        let cfg = minimal_config();
        assert!(validate(&cfg).is_ok());
    }

    #[test]
    fn test_negative_space_dimensions() {
        let mut cfg = minimal_config();
        cfg.space.width_meters = -1.0;
        let result = validate(&cfg);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("width_meters"));
    }

    #[test]
    fn test_duplicate_id_across_modalities() {
        let mut cfg = minimal_config();
        cfg.sensors.cameras.insert(
            "ap-1".into(),
            contracts::CameraCalibration {
                intrinsics: contracts::CameraIntrinsics {
                    focal_length: (1.0, 1.0),
                    principal_point: (0.0, 0.0),
                    skew: 0.0,
                },
                extrinsics: contracts::CameraExtrinsics {
                    translation: (0.0, 0.0),
                    rotation_radians: 0.0,
                },
                homography: None,
                camera_height_m: None,
                tilt_rad: None,
            },
        );
        let result = validate(&cfg);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("duplicate sensor id"));
    }

    #[test]
    fn test_invalid_window_range() {
        let mut cfg = minimal_config();
        cfg.synchronization.window_seconds = -0.5;
        let result = validate(&cfg);
        assert!(result.is_err());
    }

    #[test]
    fn test_retention_enabled_without_ttl() {
        let mut cfg = minimal_config();
        cfg.retention.enabled = true;
        let result = validate(&cfg);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("retention"));
    }
}
