//! # Retention scheduler
//!
//! Periodic pruning of in-memory measurement history and audit logs.
//! Two modes share one sweep implementation:
//!
//! - `run_once` — synchronous, tick-driven: the runner loop calls it
//!   directly after each fused tick, serialized with the rest of the loop by
//!   construction (no separate task involved).
//! - `start`/`stop` — a cooperative background task on its own interval,
//!   serialized against the fusion loop via the shared `Mutex`es over the
//!   synchronization buffer and fusion core (shared with exclusive
//!   mutation).
//!
//! `start()` is idempotent (calling it on an already-running scheduler is a
//! no-op); `stop()` signals the worker and joins within a bounded wait.

use std::sync::Arc;
use std::time::Duration;

use fusion_core::FusionCore;
use sync_engine::SynchronizationBuffer;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// How long the `stop()` call waits for the worker task to join before
/// giving up and dropping the handle.
const SHUTDOWN_JOIN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, Debug)]
pub struct RetentionSettings {
    /// TTL for buffered measurement history. `None` or `<= 0` disables it.
    pub measurement_ttl_seconds: Option<f64>,
    /// TTL for audit provenance/update logs. `None` or `<= 0` disables it.
    pub log_ttl_seconds: Option<f64>,
    /// Cadence of the background worker default 60s.
    pub cleanup_interval_seconds: f64,
}

impl From<contracts::RetentionConfig> for RetentionSettings {
    fn from(cfg: contracts::RetentionConfig) -> Self {
        Self {
            measurement_ttl_seconds: cfg.enabled.then_some(cfg.measurement_ttl_seconds).flatten(),
            log_ttl_seconds: cfg.enabled.then_some(cfg.log_ttl_seconds).flatten(),
            cleanup_interval_seconds: cfg.cleanup_interval_seconds,
        }
    }
}

/// Per-modality deleted-record counts plus audit log entries removed by one
/// sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepResult {
    pub wifi: usize,
    pub vision: usize,
    pub mmwave: usize,
    pub ble: usize,
    pub logs: usize,
}

impl SweepResult {
    pub fn measurements_dropped(&self) -> usize {
        self.wifi + self.vision + self.mmwave + self.ble
    }
}

struct Worker {
    stop_tx: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

/// Owns the shared buffer/fusion-core handles and a sweep cadence; exposes
/// both the synchronous tick-driven path and an optional background task.
pub struct RetentionScheduler {
    buffer: Arc<Mutex<SynchronizationBuffer>>,
    fusion: Arc<Mutex<FusionCore>>,
    settings: RetentionSettings,
    worker: Option<Worker>,
}

impl RetentionScheduler {
    pub fn new(
        buffer: Arc<Mutex<SynchronizationBuffer>>,
        fusion: Arc<Mutex<FusionCore>>,
        settings: RetentionSettings,
    ) -> Self {
        Self { buffer, fusion, settings, worker: None }
    }

    pub fn settings(&self) -> RetentionSettings {
        self.settings
    }

    /// Run one pruning pass. `reference_time` anchors the measurement-buffer
    /// TTL (falls back to the buffer's own latest timestamp when `None`,
    /// matching [`sync_engine::SynchronizationBuffer::prune_history`]);
    /// `now` anchors the audit-log TTL.
    pub async fn run_once(&self, reference_time: Option<f64>, now: f64) -> SweepResult {
        let mut result = SweepResult::default();

        if let Some(ttl) = self.settings.measurement_ttl_seconds.filter(|t| *t > 0.0) {
            let mut buffer = self.buffer.lock().await;
            let pruned = buffer.prune_history(ttl, reference_time);
            result.wifi = pruned.wifi;
            result.vision = pruned.vision;
            result.mmwave = pruned.mmwave;
            result.ble = pruned.ble;
        }

        if let Some(ttl) = self.settings.log_ttl_seconds.filter(|t| *t > 0.0) {
            let mut fusion = self.fusion.lock().await;
            result.logs = fusion.prune_audit_logs(ttl, now);
        }

        if result.measurements_dropped() > 0 || result.logs > 0 {
            debug!(
                wifi = result.wifi,
                vision = result.vision,
                mmwave = result.mmwave,
                ble = result.ble,
                logs = result.logs,
                "retention sweep"
            );
        }

        result
    }

    /// Start the background worker if it isn't already running. No-op if
    /// both TTL dimensions are disabled or a worker is already active.
    pub fn start(&mut self) {
        if self.worker.is_some() {
            return;
        }
        if self.settings.measurement_ttl_seconds.is_none_or(|t| t <= 0.0)
            && self.settings.log_ttl_seconds.is_none_or(|t| t <= 0.0)
        {
            return;
        }

        let interval = Duration::from_secs_f64(self.settings.cleanup_interval_seconds.max(0.01));
        let buffer = Arc::clone(&self.buffer);
        let fusion = Arc::clone(&self.fusion);
        let settings = self.settings;
        let (stop_tx, mut stop_rx) = mpsc::channel::<()>(1);

        let handle = tokio::spawn(async move {
            let scheduler = RetentionScheduler { buffer, fusion, settings, worker: None };
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // first tick fires immediately; skip it

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let now = monotonic_seconds();
                        let _ = scheduler.run_once(None, now).await;
                    }
                    _ = stop_rx.recv() => {
                        info!("retention scheduler stopped");
                        break;
                    }
                }
            }
        });

        self.worker = Some(Worker { stop_tx, handle });
    }

    /// Signal the background worker to stop and join it within a bounded
    /// wait. Idempotent: calling `stop()` with no worker running is a no-op.
    pub async fn stop(&mut self) {
        let Some(worker) = self.worker.take() else { return };
        let _ = worker.stop_tx.send(()).await;
        if tokio::time::timeout(SHUTDOWN_JOIN_TIMEOUT, worker.handle).await.is_err() {
            warn!("retention scheduler did not stop within the shutdown window");
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }
}

/// A monotonic wall-clock reading in seconds, used to anchor audit-log TTLs
/// for background sweeps (the tick-driven `run_once` caller supplies its own
/// `now` derived from the fused tick's reference time instead).
fn monotonic_seconds() -> f64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs_f64()).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{SensorCalibration, SpaceConfig, SyncStrategy};

    fn space() -> SpaceConfig {
        SpaceConfig { width_meters: 10.0, height_meters: 10.0, coordinate_origin: (0.0, 0.0) }
    }

    #[tokio::test]
    async fn run_once_disabled_ttls_is_noop() {
        let buffer = Arc::new(Mutex::new(SynchronizationBuffer::new(1.0, 1.0, SyncStrategy::Nearest)));
        let fusion = Arc::new(Mutex::new(FusionCore::new(space(), SensorCalibration::default())));
        let scheduler = RetentionScheduler::new(
            buffer,
            fusion,
            RetentionSettings {
                measurement_ttl_seconds: None,
                log_ttl_seconds: None,
                cleanup_interval_seconds: 60.0,
            },
        );
        let result = scheduler.run_once(Some(100.0), 100.0).await;
        assert_eq!(result, SweepResult::default());
    }

    #[tokio::test]
    async fn run_once_prunes_buffer_history() {
        let buffer = Arc::new(Mutex::new(SynchronizationBuffer::new(5.0, 5.0, SyncStrategy::Nearest)));
        {
            let mut b = buffer.lock().await;
            b.add_wifi(vec![contracts::WiFiMeasurement {
                timestamp: 0.0,
                access_point_id: "ap-1".into(),
                rssi: -40.0,
                csi: None,
                channel: None,
                band: None,
                metadata: Default::default(),
            }]);
        }
        let fusion = Arc::new(Mutex::new(FusionCore::new(space(), SensorCalibration::default())));
        let scheduler = RetentionScheduler::new(
            buffer.clone(),
            fusion,
            RetentionSettings {
                measurement_ttl_seconds: Some(1.0),
                log_ttl_seconds: None,
                cleanup_interval_seconds: 60.0,
            },
        );
        let result = scheduler.run_once(Some(100.0), 100.0).await;
        assert_eq!(result.wifi, 1);
    }

    #[tokio::test]
    async fn start_is_idempotent_and_stop_joins() {
        let buffer = Arc::new(Mutex::new(SynchronizationBuffer::new(1.0, 1.0, SyncStrategy::Nearest)));
        let fusion = Arc::new(Mutex::new(FusionCore::new(space(), SensorCalibration::default())));
        let mut scheduler = RetentionScheduler::new(
            buffer,
            fusion,
            RetentionSettings {
                measurement_ttl_seconds: Some(1.0),
                log_ttl_seconds: None,
                cleanup_interval_seconds: 60.0,
            },
        );
        scheduler.start();
        assert!(scheduler.is_running());
        scheduler.start();
        assert!(scheduler.is_running());
        scheduler.stop().await;
        assert!(!scheduler.is_running());
    }

    #[test]
    fn settings_from_disabled_config_disables_both_ttls() {
        let cfg = contracts::RetentionConfig {
            enabled: false,
            measurement_ttl_seconds: Some(10.0),
            log_ttl_seconds: Some(10.0),
            cleanup_interval_seconds: 60.0,
        };
        let settings: RetentionSettings = cfg.into();
        assert!(settings.measurement_ttl_seconds.is_none());
        assert!(settings.log_ttl_seconds.is_none());
    }
}
