//! Pull-based per-modality source contracts: each source exposes a single
//! `fetch()` that may return nothing, and may perform blocking I/O
//! internally (serial port reads, subprocess calls).

use contracts::{BleMeasurement, ContractError, Detection, MmWaveMeasurement, WiFiMeasurement};

pub trait WifiSource: Send {
    fn name(&self) -> &str;
    fn fetch(&mut self) -> Result<Vec<WiFiMeasurement>, ContractError>;
}

pub trait VisionSource: Send {
    fn name(&self) -> &str;
    fn fetch(&mut self) -> Result<Vec<Detection>, ContractError>;
}

pub trait MmwaveSource: Send {
    fn name(&self) -> &str;
    fn fetch(&mut self) -> Result<Vec<MmWaveMeasurement>, ContractError>;
}

pub trait BleSource: Send {
    fn name(&self) -> &str;
    fn fetch(&mut self) -> Result<Vec<BleMeasurement>, ContractError>;
}
