//! Concrete `fetch()` adapters

mod ble_static;
mod http;
mod local_wifi_capture;
mod process_vision;
mod serial_mmwave;

pub use ble_static::{BleStaticConfig, BleStaticSource};
pub use http::{HttpMmwaveSource, HttpPollerConfig, HttpVisionSource, HttpWifiSource};
pub use local_wifi_capture::{LocalWiFiCaptureConfig, LocalWiFiCaptureSource};
pub use process_vision::{ProcessVisionConfig, ProcessVisionSource};
pub use serial_mmwave::{SerialMmWaveConfig, SerialMmWaveSource};
