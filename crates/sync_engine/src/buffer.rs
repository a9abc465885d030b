//! The synchronization buffer: four trailing per-modality windows,
//! group-by-source-key alignment with a `nearest`/`interpolate` strategy,
//! and staleness/drop accounting. Eviction rebuilds each window via
//! `retain`, which is enough for the trailing-window sizes this buffer
//! operates at.

use std::collections::BTreeMap;

use contracts::{
    BleMeasurement, Detection, FusionInput, MmWaveMeasurement, SyncBatch, SyncStatus,
    SyncStrategy, WiFiMeasurement,
};
use ingestion::SyncSink;

/// Per-modality deleted-record counts, returned by `prune_history`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneCounts {
    pub wifi: usize,
    pub vision: usize,
    pub mmwave: usize,
    pub ble: usize,
}

#[derive(Debug, Clone)]
pub struct SynchronizationBuffer {
    window_seconds: f64,
    max_latency_seconds: f64,
    strategy: SyncStrategy,

    wifi: Vec<WiFiMeasurement>,
    vision: Vec<Detection>,
    mmwave: Vec<MmWaveMeasurement>,
    ble: Vec<BleMeasurement>,

    last_emitted_reference_time: Option<f64>,
}

impl SynchronizationBuffer {
    pub fn new(window_seconds: f64, max_latency_seconds: f64, strategy: SyncStrategy) -> Self {
        Self {
            window_seconds,
            max_latency_seconds,
            strategy,
            wifi: Vec::new(),
            vision: Vec::new(),
            mmwave: Vec::new(),
            ble: Vec::new(),
            last_emitted_reference_time: None,
        }
    }

    fn retain_window(latest: f64, window_seconds: f64, timestamp: f64) -> bool {
        timestamp >= latest - window_seconds
    }

    pub fn add_wifi(&mut self, mut records: Vec<WiFiMeasurement>) {
        self.wifi.append(&mut records);
        if let Some(latest) = self.wifi.iter().map(|r| r.timestamp).fold(None, max_f64) {
            let window = self.window_seconds;
            self.wifi.retain(|r| Self::retain_window(latest, window, r.timestamp));
        }
    }

    pub fn add_vision(&mut self, mut records: Vec<Detection>) {
        self.vision.append(&mut records);
        if let Some(latest) = self.vision.iter().map(|r| r.timestamp).fold(None, max_f64) {
            let window = self.window_seconds;
            self.vision.retain(|r| Self::retain_window(latest, window, r.timestamp));
        }
    }

    pub fn add_mmwave(&mut self, mut records: Vec<MmWaveMeasurement>) {
        self.mmwave.append(&mut records);
        if let Some(latest) = self.mmwave.iter().map(|r| r.timestamp).fold(None, max_f64) {
            let window = self.window_seconds;
            self.mmwave.retain(|r| Self::retain_window(latest, window, r.timestamp));
        }
    }

    pub fn add_ble(&mut self, mut records: Vec<BleMeasurement>) {
        self.ble.append(&mut records);
        if let Some(latest) = self.ble.iter().map(|r| r.timestamp).fold(None, max_f64) {
            let window = self.window_seconds;
            self.ble.retain(|r| Self::retain_window(latest, window, r.timestamp));
        }
    }

    fn latest_timestamp(&self) -> Option<f64> {
        [
            self.wifi.iter().map(|r| r.timestamp).fold(None, max_f64),
            self.vision.iter().map(|r| r.timestamp).fold(None, max_f64),
            self.mmwave.iter().map(|r| r.timestamp).fold(None, max_f64),
            self.ble.iter().map(|r| r.timestamp).fold(None, max_f64),
        ]
        .into_iter()
        .flatten()
        .fold(None, max_f64)
    }

    /// Emit one aligned `SyncBatch`. Returns `None` if there is
    /// nothing to align, or if `reference_time` would move the tick
    /// sequence backward: the buffer refuses to emit an earlier
    /// reference time once a later one has been served.
    pub fn emit(&mut self, reference_time: Option<f64>) -> Option<SyncBatch> {
        let reference_time = reference_time.or_else(|| self.latest_timestamp())?;

        if let Some(last) = self.last_emitted_reference_time {
            if reference_time < last {
                return None;
            }
        }

        let cutoff = reference_time - self.max_latency_seconds;
        let dropped_wifi = drop_before(&mut self.wifi, cutoff, |r| r.timestamp);
        let dropped_vision = drop_before(&mut self.vision, cutoff, |r| r.timestamp);
        let dropped_mmwave = drop_before(&mut self.mmwave, cutoff, |r| r.timestamp);
        let dropped_ble = drop_before(&mut self.ble, cutoff, |r| r.timestamp);

        let wifi_latest = self.wifi.iter().map(|r| r.timestamp).fold(None, max_f64);
        let vision_latest = self.vision.iter().map(|r| r.timestamp).fold(None, max_f64);
        let mmwave_latest = self.mmwave.iter().map(|r| r.timestamp).fold(None, max_f64);
        let ble_latest = self.ble.iter().map(|r| r.timestamp).fold(None, max_f64);

        let wifi_stale = is_stale(wifi_latest, reference_time, self.max_latency_seconds);
        let vision_stale = is_stale(vision_latest, reference_time, self.max_latency_seconds);
        let mmwave_stale = is_stale(mmwave_latest, reference_time, self.max_latency_seconds);
        let ble_stale = is_stale(ble_latest, reference_time, self.max_latency_seconds);

        let aligned_wifi = align_wifi(&self.wifi, reference_time, self.window_seconds, self.strategy);
        let aligned_vision = align_vision(&self.vision, reference_time, self.window_seconds, self.strategy);
        let aligned_mmwave = align_mmwave(&self.mmwave, reference_time, self.window_seconds, self.strategy);
        let aligned_ble = align_ble(&self.ble, reference_time, self.window_seconds, self.strategy);

        if aligned_wifi.is_empty() && aligned_vision.is_empty() && aligned_mmwave.is_empty() && aligned_ble.is_empty() {
            return None;
        }

        self.last_emitted_reference_time = Some(reference_time);

        Some(SyncBatch {
            fusion_input: FusionInput {
                wifi: aligned_wifi,
                vision: aligned_vision,
                mmwave: aligned_mmwave,
                ble: aligned_ble,
            },
            status: SyncStatus {
                reference_time,
                wifi_stale,
                vision_stale,
                mmwave_stale,
                ble_stale,
                dropped_wifi: dropped_wifi as u32,
                dropped_vision: dropped_vision as u32,
                dropped_mmwave: dropped_mmwave as u32,
                dropped_ble: dropped_ble as u32,
                window_seconds: self.window_seconds,
                max_latency_seconds: self.max_latency_seconds,
                strategy: self.strategy,
            },
        })
    }

    /// Drop measurements older than `ttl_seconds` relative to
    /// `reference_time` (fallback: latest timestamp across modalities).
    /// TTL `<= 0` disables pruning for every modality.
    pub fn prune_history(&mut self, ttl_seconds: f64, reference_time: Option<f64>) -> PruneCounts {
        if ttl_seconds <= 0.0 {
            return PruneCounts::default();
        }
        let Some(reference_time) = reference_time.or_else(|| self.latest_timestamp()) else {
            return PruneCounts::default();
        };
        let cutoff = reference_time - ttl_seconds;
        PruneCounts {
            wifi: drop_before(&mut self.wifi, cutoff, |r| r.timestamp),
            vision: drop_before(&mut self.vision, cutoff, |r| r.timestamp),
            mmwave: drop_before(&mut self.mmwave, cutoff, |r| r.timestamp),
            ble: drop_before(&mut self.ble, cutoff, |r| r.timestamp),
        }
    }
}

impl SyncSink for SynchronizationBuffer {
    fn add_wifi(&mut self, records: Vec<WiFiMeasurement>) {
        SynchronizationBuffer::add_wifi(self, records)
    }
    fn add_vision(&mut self, records: Vec<Detection>) {
        SynchronizationBuffer::add_vision(self, records)
    }
    fn add_mmwave(&mut self, records: Vec<MmWaveMeasurement>) {
        SynchronizationBuffer::add_mmwave(self, records)
    }
    fn add_ble(&mut self, records: Vec<BleMeasurement>) {
        SynchronizationBuffer::add_ble(self, records)
    }
}

fn max_f64(acc: Option<f64>, x: f64) -> Option<f64> {
    Some(acc.map_or(x, |a| a.max(x)))
}

fn is_stale(latest: Option<f64>, reference_time: f64, max_latency: f64) -> bool {
    match latest {
        None => true,
        Some(t) => reference_time - t > max_latency,
    }
}

fn drop_before<T>(records: &mut Vec<T>, cutoff: f64, ts: impl Fn(&T) -> f64) -> usize {
    let before = records.len();
    records.retain(|r| ts(r) >= cutoff);
    before - records.len()
}

/// Group records by a string source key, preserving arrival order within
/// each group.
fn group_by_key<'a, T>(records: &'a [T], key: impl Fn(&T) -> String) -> BTreeMap<String, Vec<&'a T>> {
    let mut groups: BTreeMap<String, Vec<&T>> = BTreeMap::new();
    for record in records {
        groups.entry(key(record)).or_default().push(record);
    }
    groups
}

/// Select one aligned record per group using the `nearest`/`interpolate`
/// strategy, delegating type-specific interpolation to `interpolate`.
fn select_aligned<'a, T: Clone>(
    group: &[&'a T],
    reference_time: f64,
    window_seconds: f64,
    strategy: SyncStrategy,
    ts: impl Fn(&T) -> f64,
    interpolate: impl Fn(&T, &T, f64) -> Option<T>,
) -> Option<T> {
    match strategy {
        SyncStrategy::Nearest => nearest(group, reference_time, window_seconds, ts),
        SyncStrategy::Interpolate => {
            if let Some(bracketed) = bracket(group, reference_time, window_seconds, &ts) {
                let (before, after) = bracketed;
                if ts(before) == ts(after) {
                    return Some(before.clone());
                }
                if let Some(value) = interpolate(before, after, reference_time) {
                    return Some(value);
                }
            }
            nearest(group, reference_time, window_seconds, ts)
        }
    }
}

fn nearest<T: Clone>(
    group: &[&T],
    reference_time: f64,
    window_seconds: f64,
    ts: impl Fn(&T) -> f64,
) -> Option<T> {
    group
        .iter()
        .map(|r| (r, (ts(r) - reference_time).abs()))
        .filter(|(_, gap)| *gap <= window_seconds)
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(r, _)| (*r).clone())
}

/// Bracket `reference_time` by the latest record at/before it and the
/// earliest record at/after it, both within `window_seconds`.
fn bracket<'a, T>(
    group: &[&'a T],
    reference_time: f64,
    window_seconds: f64,
    ts: &impl Fn(&T) -> f64,
) -> Option<(&'a T, &'a T)> {
    let before = group
        .iter()
        .filter(|r| ts(r) <= reference_time && reference_time - ts(r) <= window_seconds)
        .max_by(|a, b| ts(a).partial_cmp(&ts(b)).unwrap_or(std::cmp::Ordering::Equal))
        .copied();
    let after = group
        .iter()
        .filter(|r| ts(r) >= reference_time && ts(r) - reference_time <= window_seconds)
        .min_by(|a, b| ts(a).partial_cmp(&ts(b)).unwrap_or(std::cmp::Ordering::Equal))
        .copied();
    match (before, after) {
        (Some(b), Some(a)) => Some((b, a)),
        _ => None,
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn lerp_fraction(t0: f64, t1: f64, reference_time: f64) -> f64 {
    if (t1 - t0).abs() < 1e-12 {
        0.0
    } else {
        (reference_time - t0) / (t1 - t0)
    }
}

fn lerp_vec(a: &[f64], b: &[f64], t: f64) -> Option<Vec<f64>> {
    if a.len() != b.len() {
        return None;
    }
    Some(a.iter().zip(b).map(|(x, y)| lerp(*x, *y, t)).collect())
}

fn lerp_points(a: &[(f64, f64)], b: &[(f64, f64)], t: f64) -> Option<Vec<(f64, f64)>> {
    if a.len() != b.len() {
        return None;
    }
    Some(a.iter().zip(b).map(|(x, y)| (lerp(x.0, y.0, t), lerp(x.1, y.1, t))).collect())
}

fn align_wifi(
    records: &[WiFiMeasurement],
    reference_time: f64,
    window_seconds: f64,
    strategy: SyncStrategy,
) -> Vec<WiFiMeasurement> {
    let groups = group_by_key(records, |r| r.access_point_id.to_string());
    groups
        .values()
        .filter_map(|group| {
            select_aligned(
                group,
                reference_time,
                window_seconds,
                strategy,
                |r| r.timestamp,
                |before, after, reference_time| {
                    let t = lerp_fraction(before.timestamp, after.timestamp, reference_time);
                    let csi = match (&before.csi, &after.csi) {
                        (Some(a), Some(b)) => lerp_vec(a, b, t),
                        _ => None,
                    };
                    Some(WiFiMeasurement {
                        timestamp: reference_time,
                        access_point_id: before.access_point_id.clone(),
                        rssi: lerp(before.rssi, after.rssi, t),
                        csi,
                        channel: before.channel,
                        band: before.band,
                        metadata: None,
                    })
                },
            )
        })
        .collect()
}

fn align_vision(
    records: &[Detection],
    reference_time: f64,
    window_seconds: f64,
    strategy: SyncStrategy,
) -> Vec<Detection> {
    let groups = group_by_key(records, |r| r.camera_id.to_string());
    groups
        .values()
        .filter_map(|group| {
            select_aligned(
                group,
                reference_time,
                window_seconds,
                strategy,
                |r| r.timestamp,
                |before, after, reference_time| {
                    let t = lerp_fraction(before.timestamp, after.timestamp, reference_time);
                    let keypoints = match (&before.keypoints, &after.keypoints) {
                        (Some(a), Some(b)) => lerp_points(a, b, t),
                        _ => None,
                    };
                    Some(Detection {
                        timestamp: reference_time,
                        camera_id: before.camera_id.clone(),
                        bbox: contracts::BBox {
                            x_min: lerp(before.bbox.x_min, after.bbox.x_min, t),
                            y_min: lerp(before.bbox.y_min, after.bbox.y_min, t),
                            x_max: lerp(before.bbox.x_max, after.bbox.x_max, t),
                            y_max: lerp(before.bbox.y_max, after.bbox.y_max, t),
                        },
                        confidence: lerp(before.confidence, after.confidence, t),
                        keypoints,
                    })
                },
            )
        })
        .collect()
}

fn align_mmwave(
    records: &[MmWaveMeasurement],
    reference_time: f64,
    window_seconds: f64,
    strategy: SyncStrategy,
) -> Vec<MmWaveMeasurement> {
    let groups = group_by_key(records, |r| r.sensor_id.to_string());
    groups
        .values()
        .filter_map(|group| {
            select_aligned(
                group,
                reference_time,
                window_seconds,
                strategy,
                |r| r.timestamp,
                |before, after, reference_time| {
                    let t = lerp_fraction(before.timestamp, after.timestamp, reference_time);
                    let range_meters = match (before.range_meters, after.range_meters) {
                        (Some(a), Some(b)) => Some(lerp(a, b, t)),
                        _ => None,
                    };
                    let angle_radians = match (before.angle_radians, after.angle_radians) {
                        (Some(a), Some(b)) => Some(lerp(a, b, t)),
                        _ => None,
                    };
                    Some(MmWaveMeasurement {
                        timestamp: reference_time,
                        sensor_id: before.sensor_id.clone(),
                        confidence: lerp(before.confidence, after.confidence, t),
                        event_type: before.event_type,
                        range_meters,
                        angle_radians,
                        metadata: None,
                    })
                },
            )
        })
        .collect()
}

fn align_ble(
    records: &[BleMeasurement],
    reference_time: f64,
    window_seconds: f64,
    strategy: SyncStrategy,
) -> Vec<BleMeasurement> {
    let groups = group_by_key(records, |r| {
        r.device_id.clone().or_else(|| r.hashed_identifier.clone()).unwrap_or_default()
    });
    groups
        .values()
        .filter_map(|group| {
            select_aligned(
                group,
                reference_time,
                window_seconds,
                strategy,
                |r| r.timestamp,
                |before, after, reference_time| {
                    let t = lerp_fraction(before.timestamp, after.timestamp, reference_time);
                    Some(BleMeasurement {
                        timestamp: reference_time,
                        rssi: lerp(before.rssi, after.rssi, t),
                        device_id: before.device_id.clone(),
                        hashed_identifier: before.hashed_identifier.clone(),
                        channel: before.channel,
                        manufacturer_data: None,
                    })
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wifi(ap: &str, ts: f64, rssi: f64) -> WiFiMeasurement {
        WiFiMeasurement {
            timestamp: ts,
            access_point_id: ap.into(),
            rssi,
            csi: None,
            channel: None,
            band: None,
            metadata: None,
        }
    }

    #[test]
    fn test_empty_buffer_emits_nothing() {
        let mut buffer = SynchronizationBuffer::new(0.25, 0.25, SyncStrategy::Nearest);
        assert!(buffer.emit(None).is_none());
    }

    #[test]
    fn test_nearest_alignment() {
        let mut buffer = SynchronizationBuffer::new(0.25, 0.25, SyncStrategy::Nearest);
        buffer.add_wifi(vec![wifi("ap-1", 1.0, -50.0), wifi("ap-1", 1.2, -52.0)]);
        let batch = buffer.emit(Some(1.05)).unwrap();
        assert_eq!(batch.fusion_input.wifi.len(), 1);
        assert_eq!(batch.fusion_input.wifi[0].rssi, -50.0);
    }

    #[test]
    fn test_interpolate_alignment() {
        let mut buffer = SynchronizationBuffer::new(1.0, 1.0, SyncStrategy::Interpolate);
        buffer.add_wifi(vec![wifi("ap-1", 1.0, -50.0), wifi("ap-1", 2.0, -60.0)]);
        let batch = buffer.emit(Some(1.5)).unwrap();
        assert_eq!(batch.fusion_input.wifi.len(), 1);
        assert!((batch.fusion_input.wifi[0].rssi - (-55.0)).abs() < 1e-9);
    }

    #[test]
    fn test_stale_flag_set_without_recent_data() {
        let mut buffer = SynchronizationBuffer::new(5.0, 0.25, SyncStrategy::Nearest);
        buffer.add_wifi(vec![wifi("ap-1", 1.0, -50.0)]);
        let batch = buffer.emit(Some(1.0)).unwrap();
        assert!(batch.status.vision_stale);
        assert!(!batch.status.wifi_stale);
    }

    #[test]
    fn test_reference_time_non_decreasing() {
        let mut buffer = SynchronizationBuffer::new(5.0, 5.0, SyncStrategy::Nearest);
        buffer.add_wifi(vec![wifi("ap-1", 5.0, -50.0)]);
        assert!(buffer.emit(Some(5.0)).is_some());
        buffer.add_wifi(vec![wifi("ap-1", 5.5, -50.0)]);
        assert!(buffer.emit(Some(3.0)).is_none());
    }

    #[test]
    fn test_prune_history_ttl_disabled() {
        let mut buffer = SynchronizationBuffer::new(5.0, 5.0, SyncStrategy::Nearest);
        buffer.add_wifi(vec![wifi("ap-1", 1.0, -50.0)]);
        let counts = buffer.prune_history(0.0, Some(100.0));
        assert_eq!(counts, PruneCounts::default());
    }

    #[test]
    fn test_prune_history_drops_old_records() {
        let mut buffer = SynchronizationBuffer::new(100.0, 100.0, SyncStrategy::Nearest);
        buffer.add_wifi(vec![wifi("ap-1", 1.0, -50.0), wifi("ap-1", 50.0, -52.0)]);
        let counts = buffer.prune_history(10.0, Some(51.0));
        assert_eq!(counts.wifi, 1);
    }
}
