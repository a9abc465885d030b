//! Top-level fusion entry point: candidates -> association ->
//! Kalman update -> lifecycle -> alert tiering -> consent gating -> emission.

use contracts::{
    AuditConfig, Band, BandSummary, EmittedTick, EmitterSummary, FusionInput, SensorCalibration,
    SensorHealth, SensorHealthStatus, SpaceConfig, TrackStatus,
};
use metrics::{counter, gauge};
use tracing::debug;

use crate::alert::{self, TrackSignals};
use crate::association::{self, Assignment};
use crate::audit::{AuditLogger, ConsentRecord, ConsentStatus, InMemoryConsentStore};
use crate::candidate::{self, Candidate};
use crate::error::Result;
use crate::track_store::TrackStore;

/// A sensor stream with no fresh measurement for longer than this is
/// reported offline in the emitted tick's `sensor_health`.
const SENSOR_OFFLINE_AFTER_SECONDS: f64 = 5.0;

/// Legacy (`aligned = false`) re-alignment window: the core picks the max
/// timestamp across modalities as its own reference time and drops any
/// record further than this from it, rather than trusting a pre-aligned
/// `SyncBatch` from the synchronization buffer.
const LEGACY_ALIGNMENT_WINDOW_SECONDS: f64 = 0.5;

struct SensorClock {
    wifi: Option<f64>,
    vision: Option<f64>,
    mmwave: Option<f64>,
    ble: Option<f64>,
}

impl SensorClock {
    fn new() -> Self {
        Self { wifi: None, vision: None, mmwave: None, ble: None }
    }

    fn status(last_seen: Option<f64>, reference_time: f64) -> SensorHealthStatus {
        match last_seen {
            Some(t) if reference_time - t <= SENSOR_OFFLINE_AFTER_SECONDS => SensorHealthStatus::Online,
            _ => SensorHealthStatus::Offline,
        }
    }
}

pub struct FusionCore {
    space: SpaceConfig,
    calibration: SensorCalibration,
    tracks: TrackStore,
    clock: SensorClock,
    audit_config: AuditConfig,
    audit: Option<AuditLogger<InMemoryConsentStore>>,
}

impl FusionCore {
    pub fn new(space: SpaceConfig, calibration: SensorCalibration) -> Self {
        Self {
            space,
            calibration,
            tracks: TrackStore::new(),
            clock: SensorClock::new(),
            audit_config: AuditConfig::default(),
            audit: None,
        }
    }

    /// Build the audit subsystem from config, seeding consent records.
    /// Seed records are kept even with no `participant_id`: the gate is a
    /// single global "latest record" check, not scoped to an identity, so a
    /// participant-less granted record is a legitimate blanket decision. A
    /// parse failure for a seed record's status is skipped rather than
    /// treated as a startup error.
    pub fn with_audit_config(mut self, audit_config: AuditConfig) -> Self {
        if audit_config.enabled {
            let mut store = InMemoryConsentStore::new();
            for seed in &audit_config.consent_records {
                let status = match seed.status.as_str() {
                    "granted" => ConsentStatus::Granted,
                    "revoked" => ConsentStatus::Revoked,
                    other => {
                        debug!(status = other, "unrecognized consent status in seed, skipping");
                        continue;
                    }
                };
                store.set_consent(ConsentRecord {
                    status,
                    participant_id: seed.participant_id.clone(),
                    session_id: seed.session_id.clone().unwrap_or_default(),
                    timestamp: 0.0,
                });
            }
            self.audit = Some(AuditLogger::new(store));
        }
        self.audit_config = audit_config;
        self
    }

    /// Prune provenance/update audit log entries older than `ttl_s`. A no-op
    /// if no audit logger is attached or `ttl_s <= 0`.
    pub fn prune_audit_logs(&mut self, ttl_s: f64, now: f64) -> usize {
        self.audit.as_mut().map_or(0, |audit| audit.prune_logs(ttl_s, now))
    }

    /// Run one fusion tick. `aligned` distinguishes the normal path (input
    /// already time-aligned by the synchronization buffer) from the legacy
    /// direct-call path that bypasses alignment; both share identical
    /// candidate/association/lifecycle logic, `aligned` only affects which
    /// `reference_time` the caller is expected to have computed.
    pub fn fuse(&mut self, input: &FusionInput, aligned: bool, reference_time: Option<f64>) -> Result<EmittedTick> {
        let realigned;
        let (input, reference_time) = if aligned {
            (input, reference_time.unwrap_or_else(|| latest_timestamp(input)))
        } else {
            let reference_time = latest_timestamp(input);
            realigned = legacy_realign(input, reference_time);
            (&realigned, reference_time)
        };
        debug!(aligned, reference_time, "fusion tick");

        if let Err(err) = self.gate_consent(input) {
            counter!("fusion_consent_rejections_total").increment(1);
            return Err(err);
        }
        self.update_sensor_clock(input, reference_time);

        let candidates = candidate::build_candidates(input, reference_time, &self.space, &self.calibration);
        let predicted = self.tracks.predicted_positions(reference_time);
        let assignments = association::associate(&predicted, &candidates);

        self.apply_assignments(&assignments, &candidates, reference_time);
        self.drop_terminated();

        let wifi_anomaly = input.wifi.iter().any(|m| m.is_anomalous());
        let has_mmwave = candidate::has_mmwave(input);
        let has_vision = !input.vision.is_empty();
        let has_ble = !input.ble.is_empty();

        let tier = alert::classify(TrackSignals {
            mmwave: has_mmwave,
            vision: has_vision,
            wifi_anomaly,
            ble: has_ble,
        });
        let sources = sources_for(input);
        let tracks: Vec<_> = self.tracks.tracks().iter().map(|t| t.to_state(tier)).collect();

        if let Some(audit) = &mut self.audit {
            for t in self.tracks.tracks() {
                audit.log_sensor_provenance(crate::audit::SensorProvenanceLog {
                    track_id: t.track_id.clone(),
                    timestamp: t.timestamp,
                    sources: sources.clone(),
                    captured_at: reference_time,
                });
                audit.log_track_update(crate::audit::TrackUpdateLog {
                    track_id: t.track_id.clone(),
                    timestamp: t.timestamp,
                    sources: sources.clone(),
                    captured_at: reference_time,
                });
            }
        }

        gauge!("fusion_active_tracks").set(self.tracks.tracks().len() as f64);

        Ok(EmittedTick {
            tracks,
            emitters: build_emitters(input),
            sensor_health: self.sensor_health(reference_time),
            band_summary: build_band_summary(input),
        })
    }

    /// Gate the whole tick once against the single global latest consent
    /// record, independent of which modalities are present this tick: a
    /// wifi/vision/mmwave-only tick is gated exactly like a BLE one.
    fn gate_consent(&self, input: &FusionInput) -> Result<()> {
        if !self.audit_config.enabled || !self.audit_config.require_consent {
            return Ok(());
        }
        let has_data =
            !input.wifi.is_empty() || !input.vision.is_empty() || !input.mmwave.is_empty() || !input.ble.is_empty();
        if !has_data {
            return Ok(());
        }
        let Some(audit) = &self.audit else { return Ok(()) };
        audit.require_consent()
    }

    fn update_sensor_clock(&mut self, input: &FusionInput, reference_time: f64) {
        if !input.wifi.is_empty() {
            self.clock.wifi = Some(reference_time);
        }
        if !input.vision.is_empty() {
            self.clock.vision = Some(reference_time);
        }
        if !input.mmwave.is_empty() {
            self.clock.mmwave = Some(reference_time);
        }
        if !input.ble.is_empty() {
            self.clock.ble = Some(reference_time);
        }
    }

    fn apply_assignments(&mut self, assignments: &[Assignment], candidates: &[Candidate], reference_time: f64) {
        let mut terminated: Vec<usize> = Vec::new();
        for assignment in assignments {
            match *assignment {
                Assignment::Matched { track, candidate } => {
                    self.tracks.apply_hit(track, &candidates[candidate], reference_time);
                }
                Assignment::TrackUnmatched { track } => {
                    if !self.tracks.apply_miss(track, reference_time) {
                        terminated.push(track);
                    }
                }
                Assignment::CandidateUnmatched { candidate } => {
                    self.tracks.spawn(&candidates[candidate]);
                }
            }
        }
        if !terminated.is_empty() {
            let keep: Vec<bool> = (0..self.tracks.tracks().len())
                .map(|i| !terminated.contains(&i))
                .collect();
            self.tracks.retain_index(&keep);
        }
    }

    fn drop_terminated(&mut self) {
        let keep: Vec<bool> = self
            .tracks
            .tracks()
            .iter()
            .map(|t| t.status != TrackStatus::Terminated)
            .collect();
        self.tracks.retain_index(&keep);
    }

    fn sensor_health(&self, reference_time: f64) -> Vec<SensorHealth> {
        vec![
            SensorHealth {
                label: "wifi".into(),
                status: SensorClock::status(self.clock.wifi, reference_time),
                last_seen: self.clock.wifi,
            },
            SensorHealth {
                label: "vision".into(),
                status: SensorClock::status(self.clock.vision, reference_time),
                last_seen: self.clock.vision,
            },
            SensorHealth {
                label: "mmwave".into(),
                status: SensorClock::status(self.clock.mmwave, reference_time),
                last_seen: self.clock.mmwave,
            },
            SensorHealth {
                label: "ble".into(),
                status: SensorClock::status(self.clock.ble, reference_time),
                last_seen: self.clock.ble,
            },
        ]
    }
}

fn latest_timestamp(input: &FusionInput) -> f64 {
    let mut latest = 0.0f64;
    for m in &input.wifi {
        latest = latest.max(m.timestamp);
    }
    for m in &input.vision {
        latest = latest.max(m.timestamp);
    }
    for m in &input.mmwave {
        latest = latest.max(m.timestamp);
    }
    for m in &input.ble {
        latest = latest.max(m.timestamp);
    }
    latest
}

/// Legacy, non-buffer-aligned re-alignment: drop any record further than
/// `LEGACY_ALIGNMENT_WINDOW_SECONDS` from `reference_time`, in place of the
/// synchronization buffer's own windowed alignment.
fn legacy_realign(input: &FusionInput, reference_time: f64) -> FusionInput {
    let within = |t: f64| (reference_time - t).abs() <= LEGACY_ALIGNMENT_WINDOW_SECONDS;
    FusionInput {
        wifi: input.wifi.iter().filter(|m| within(m.timestamp)).cloned().collect(),
        vision: input.vision.iter().filter(|m| within(m.timestamp)).cloned().collect(),
        mmwave: input.mmwave.iter().filter(|m| within(m.timestamp)).cloned().collect(),
        ble: input.ble.iter().filter(|m| within(m.timestamp)).cloned().collect(),
    }
}

/// Deduplicated, insertion-ordered `"{modality}:{id}"` strings for every
/// record that contributed to the tick
fn sources_for(input: &FusionInput) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut sources = Vec::new();
    let mut push = |s: String, seen: &mut std::collections::HashSet<String>, sources: &mut Vec<String>| {
        if seen.insert(s.clone()) {
            sources.push(s);
        }
    };
    for m in &input.wifi {
        push(format!("wifi:{}", m.access_point_id), &mut seen, &mut sources);
    }
    for m in &input.vision {
        push(format!("vision:{}", m.camera_id), &mut seen, &mut sources);
    }
    for m in &input.mmwave {
        push(format!("mmwave:{}", m.sensor_id), &mut seen, &mut sources);
    }
    for m in &input.ble {
        push(format!("ble:{}", m.identity().unwrap_or("unknown")), &mut seen, &mut sources);
    }
    sources
}

fn build_emitters(input: &FusionInput) -> Vec<EmitterSummary> {
    let mut emitters = Vec::new();
    for m in &input.wifi {
        emitters.push(EmitterSummary {
            device_id: None,
            emitter_id: Some(m.access_point_id.to_string()),
            rssi: m.rssi,
            last_seen: m.timestamp,
        });
    }
    for m in &input.ble {
        emitters.push(EmitterSummary {
            device_id: m.identity().map(|s| s.to_string()),
            emitter_id: None,
            rssi: m.rssi,
            last_seen: m.timestamp,
        });
    }
    emitters
}

fn build_band_summary(input: &FusionInput) -> BandSummary {
    let mut summary = BandSummary::default();
    for m in &input.wifi {
        match m.band {
            Some(Band::Band24Ghz) => summary.band_24ghz += 1,
            Some(Band::Band5Ghz) => summary.band_5ghz += 1,
            Some(Band::Band6Ghz) => summary.band_6ghz += 1,
            None => {}
        }
    }
    summary
}
