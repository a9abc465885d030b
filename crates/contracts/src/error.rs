//! Layered error definitions
//!
//! Categorized by the stage that raises them: config / ingestion
//! / exporter (transport) / calibration / consent / association / retention.

use thiserror::Error;

/// Unified error type shared across the workspace.
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Ingestion Errors =====
    /// A parser rejected a raw record; fatal at the adapter boundary, since
    /// the pipeline refuses to silently drop un-calibrated inputs.
    #[error("ingestion error for sensor '{sensor_id}' at t={timestamp:?}: {message}")]
    Ingestion {
        sensor_id: String,
        timestamp: Option<f64>,
        message: String,
    },

    /// Missing calibration entry for a sensor/AP/camera at ingestion time.
    #[error("calibration error: missing calibration for '{sensor_id}'")]
    Calibration { sensor_id: String },

    // ===== Exporter (transport) Errors =====
    /// HTTP/serial/process transport or payload-shape failure.
    #[error("exporter '{source_name}' error: {message}")]
    Exporter { source_name: String, message: String },

    // ===== Consent / Audit Errors =====
    /// Consent record missing or revoked; aborts emission for the tick only.
    #[error("consent error: {message}")]
    Consent { message: String },

    // ===== Association (never surfaced; covered by gating) =====
    #[error("association error: {message}")]
    Association { message: String },

    // ===== Retention Errors (non-fatal) =====
    #[error("retention error: {message}")]
    Retention { message: String },

    // ===== Sink Errors =====
    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    /// Sink connection error
    #[error("sink '{sink_name}' connection error: {message}")]
    SinkConnection { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn ingestion(
        sensor_id: impl Into<String>,
        timestamp: Option<f64>,
        message: impl Into<String>,
    ) -> Self {
        Self::Ingestion {
            sensor_id: sensor_id.into(),
            timestamp,
            message: message.into(),
        }
    }

    pub fn calibration(sensor_id: impl Into<String>) -> Self {
        Self::Calibration {
            sensor_id: sensor_id.into(),
        }
    }

    pub fn exporter(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Exporter {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    pub fn consent(message: impl Into<String>) -> Self {
        Self::Consent {
            message: message.into(),
        }
    }

    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }
}
