//! Retention policy for in-memory measurements and audit logs. Retention is
//! opt-in; `enabled=true` plus at least one TTL activates it.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct RetentionConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub measurement_ttl_seconds: Option<f64>,
    #[serde(default)]
    pub log_ttl_seconds: Option<f64>,
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_seconds: f64,
}

fn default_cleanup_interval() -> f64 {
    60.0
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            measurement_ttl_seconds: None,
            log_ttl_seconds: None,
            cleanup_interval_seconds: default_cleanup_interval(),
        }
    }
}

impl RetentionConfig {
    pub fn is_enabled(&self) -> bool {
        self.enabled
            && (self.measurement_ttl_seconds.is_some_and(|t| t > 0.0)
                || self.log_ttl_seconds.is_some_and(|t| t > 0.0))
    }
}
