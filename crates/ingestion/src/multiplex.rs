//! Per-modality fan-in multiplexers: each wraps any number of concrete
//! sources and fetches all of them every tick, catching and logging a
//! failing adapter rather than aborting the whole poll — one broken source
//! downgrades to an empty fetch instead of stalling the others.

use crate::sources::{BleSource, MmwaveSource, VisionSource, WifiSource};
use contracts::{BleMeasurement, Detection, MmWaveMeasurement, WiFiMeasurement};
use tracing::warn;

macro_rules! multi_source {
    ($name:ident, $trait_:ident, $item:ty) => {
        pub struct $name {
            sources: Vec<Box<dyn $trait_>>,
        }

        impl $name {
            pub fn new(sources: Vec<Box<dyn $trait_>>) -> Self {
                Self { sources }
            }

            pub fn fetch(&mut self) -> Vec<$item> {
                let mut out = Vec::new();
                for source in &mut self.sources {
                    match source.fetch() {
                        Ok(mut records) => out.append(&mut records),
                        Err(err) => {
                            warn!(source = source.name(), error = %err, "adapter fetch failed, skipping")
                        }
                    }
                }
                out
            }
        }
    };
}

multi_source!(MultiWifiSource, WifiSource, WiFiMeasurement);
multi_source!(MultiVisionSource, VisionSource, Detection);
multi_source!(MultiMmwaveSource, MmwaveSource, MmWaveMeasurement);
multi_source!(MultiBleSource, BleSource, BleMeasurement);
