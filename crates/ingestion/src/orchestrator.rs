//! Ingestion orchestrator: one polling step fetches every configured
//! modality source and pushes whatever came back into the synchronization
//! sink. The sink is a narrow trait here (rather than a direct dependency
//! on `sync_engine`) so `ingestion` stays a leaf crate; `sync_engine`'s
//! buffer implements it.

use contracts::{BleMeasurement, Detection, MmWaveMeasurement, WiFiMeasurement};

use crate::multiplex::{MultiBleSource, MultiMmwaveSource, MultiVisionSource, MultiWifiSource};

/// Narrow push contract satisfied by the synchronization buffer.
pub trait SyncSink {
    fn add_wifi(&mut self, records: Vec<WiFiMeasurement>);
    fn add_vision(&mut self, records: Vec<Detection>);
    fn add_mmwave(&mut self, records: Vec<MmWaveMeasurement>);
    fn add_ble(&mut self, records: Vec<BleMeasurement>);
}

pub struct Orchestrator {
    wifi: MultiWifiSource,
    vision: MultiVisionSource,
    mmwave: MultiMmwaveSource,
    ble: MultiBleSource,
}

impl Orchestrator {
    pub fn new(
        wifi: MultiWifiSource,
        vision: MultiVisionSource,
        mmwave: MultiMmwaveSource,
        ble: MultiBleSource,
    ) -> Self {
        Self { wifi, vision, mmwave, ble }
    }

    /// Fetch every modality once and push the results into `sink`. Returns
    /// `true` if any modality yielded at least one record this tick — the
    /// caller uses that to decide whether to call `emit` on the buffer.
    pub fn poll(&mut self, sink: &mut impl SyncSink) -> bool {
        let wifi = self.wifi.fetch();
        let vision = self.vision.fetch();
        let mmwave = self.mmwave.fetch();
        let ble = self.ble.fetch();

        let any_data = !wifi.is_empty() || !vision.is_empty() || !mmwave.is_empty() || !ble.is_empty();

        if !wifi.is_empty() {
            sink.add_wifi(wifi);
        }
        if !vision.is_empty() {
            sink.add_vision(vision);
        }
        if !mmwave.is_empty() {
            sink.add_mmwave(mmwave);
        }
        if !ble.is_empty() {
            sink.add_ble(ble);
        }

        any_data
    }
}
