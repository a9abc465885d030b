//! Output sink configuration for emitted tick dispatch.
//!
//! A sink entry is just a name/type/queue_capacity/params tuple; the
//! dispatcher's fan-out-per-sink architecture applies identically regardless
//! of the payload shape, so this schema stays minimal.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SinkConfig {
    #[validate(length(min = 1, message = "sink name cannot be empty"))]
    pub name: String,

    pub sink_type: SinkType,

    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    #[serde(default)]
    pub params: HashMap<String, String>,
}

fn default_queue_capacity() -> usize {
    100
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    Log,
    File,
    Network,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct DispatchConfig {
    #[serde(default)]
    #[validate(nested)]
    pub sinks: Vec<SinkConfig>,
}
