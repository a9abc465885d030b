//! Pipeline orchestrator - coordinates all components.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::{EmittedTick, FusionConfig};
use fusion_core::FusionCore;
use ingestion::Orchestrator as IngestionOrchestrator;
use observability::{record_sync_metrics, record_tick_emitted};
use retention::{RetentionScheduler, RetentionSettings};
use sync_engine::SynchronizationBuffer;
use tokio::sync::{mpsc, Mutex};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use super::PipelineStats;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The loaded fusion configuration
    pub config: FusionConfig,

    /// Interval between ingestion polls
    pub poll_interval: Duration,

    /// Maximum number of ticks to emit (None = unlimited)
    pub max_iterations: Option<u64>,

    /// Pipeline timeout (None = no timeout)
    pub timeout: Option<Duration>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,

    /// Emit one bare `TrackState` per line instead of the full envelope
    pub legacy_emission: bool,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the pipeline to completion
    pub async fn run(self) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let fusion_config = &self.config.config;

        // ==== Stage 1: Initialize Metrics (optional) ====
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!(port, "Metrics endpoint available");
        }

        // ==== Stage 2: Build ingestion adapters ====
        info!("Building ingestion adapters...");
        let calibration = Arc::new(fusion_config.sensors.clone());
        let wifi = ingestion::build_wifi_sources(
            &fusion_config.ingestion.wifi_sources,
            calibration.clone(),
        )
        .context("Failed to build wifi sources")?;
        let vision = ingestion::build_vision_sources(
            &fusion_config.ingestion.vision_sources,
            calibration.clone(),
        )
        .context("Failed to build vision sources")?;
        let mmwave = ingestion::build_mmwave_sources(&fusion_config.ingestion.mmwave_sources)
            .context("Failed to build mmwave sources")?;
        let ble = ingestion::build_ble_sources(&fusion_config.ingestion.ble_sources)
            .context("Failed to build ble sources")?;

        let mut orchestrator = IngestionOrchestrator::new(wifi, vision, mmwave, ble);

        // ==== Stage 3: Setup sync buffer ====
        info!("Configuring synchronization buffer...");
        let sync = &fusion_config.synchronization;
        let buffer = Arc::new(Mutex::new(SynchronizationBuffer::new(
            sync.window_seconds,
            sync.max_latency_seconds,
            sync.strategy,
        )));

        // ==== Stage 4: Setup fusion core ====
        info!("Configuring fusion core...");
        let fusion = Arc::new(Mutex::new(
            FusionCore::new(fusion_config.space, (*calibration).clone())
                .with_audit_config(fusion_config.audit.clone()),
        ));

        // ==== Stage 4b: Setup retention scheduler ====
        // Shared handles over the same buffer/fusion-core the main loop uses
        // (shared with exclusive mutation); default mode is the
        // synchronous `run_once` called from this tick loop, not the
        // background worker.
        let retention_scheduler = RetentionScheduler::new(
            Arc::clone(&buffer),
            Arc::clone(&fusion),
            RetentionSettings::from(fusion_config.retention.clone()),
        );

        // ==== Stage 5: Setup dispatcher ====
        info!("Setting up dispatcher...");
        let (tick_tx, tick_rx) = mpsc::channel::<EmittedTick>(100);

        if fusion_config.dispatch.sinks.is_empty() {
            warn!("No sinks configured - emitted ticks will be dropped");
        }

        let active_sinks = fusion_config.dispatch.sinks.len();
        let dispatcher =
            dispatcher::create_dispatcher(fusion_config.dispatch.sinks.clone(), tick_rx)
                .await
                .context("Failed to create dispatcher")?;
        let dispatcher_handle = dispatcher.spawn();

        info!(active_sinks, "Dispatcher started");

        // ==== Stage 6: Run the poll -> sync -> fuse -> emit loop ====
        let max_iterations = self.config.max_iterations;
        let legacy_emission = self.config.legacy_emission;
        let cleanup_interval = retention_scheduler.settings().cleanup_interval_seconds;

        info!(
            poll_interval_ms = self.config.poll_interval.as_millis(),
            max_iterations = ?max_iterations,
            "Pipeline running"
        );

        let pipeline_task = async move {
            let mut stats = PipelineStats::default();
            stats.active_sinks = active_sinks;

            let mut ticker = tokio::time::interval(self.config.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            let mut last_cleanup = Instant::now();
            let mut last_reference_time: Option<f64> = None;

            loop {
                ticker.tick().await;

                let any_data = {
                    let mut buf = buffer.lock().await;
                    orchestrator.poll(&mut *buf)
                };
                if any_data {
                    stats.polls_with_data += 1;
                }

                let batch = { buffer.lock().await.emit(None) };
                if let Some(batch) = batch {
                    record_sync_metrics(&batch.status);
                    stats.sync_metrics.update(&batch.status);
                    stats.ticks_synced += 1;
                    last_reference_time = Some(batch.status.reference_time);

                    let fused = {
                        let mut core = fusion.lock().await;
                        core.fuse(&batch.fusion_input, true, Some(batch.status.reference_time))
                    };

                    match fused {
                        Ok(tick) => {
                            record_tick_emitted(&tick);

                            info!(
                                reference_time = format!("{:.3}", batch.status.reference_time),
                                tracks = tick.tracks.len(),
                                alert_tier = ?tick.alert_tier(),
                                "Tick fused"
                            );

                            if legacy_emission {
                                for track in &tick.tracks {
                                    match serde_json::to_string(track) {
                                        Ok(line) => println!("{line}"),
                                        Err(e) => warn!(error = %e, "Failed to serialize track"),
                                    }
                                }
                            } else if tick_tx.send(tick).await.is_err() {
                                warn!("Dispatcher channel closed");
                                break;
                            }

                            stats.ticks_emitted += 1;
                        }
                        Err(e) => {
                            stats.consent_rejections += 1;
                            warn!(error = %e, "Tick rejected by consent gate");
                        }
                    }

                    if let Some(max) = max_iterations {
                        if max > 0 && stats.ticks_emitted >= max {
                            info!(ticks = stats.ticks_emitted, "Reached max iterations");
                            break;
                        }
                    }
                }

                // Tick-driven retention sweep `run_once` mode
                // (the default; the scheduler also offers a background
                // `start()`/`stop()` worker for deployments that prefer it).
                if last_cleanup.elapsed().as_secs_f64() >= cleanup_interval {
                    let reference_time = last_reference_time.unwrap_or(0.0);
                    let swept = retention_scheduler.run_once(last_reference_time, reference_time).await;
                    if swept.measurements_dropped() > 0 || swept.logs > 0 {
                        stats.sweeps_run += 1;
                        info!(
                            wifi = swept.wifi,
                            vision = swept.vision,
                            mmwave = swept.mmwave,
                            ble = swept.ble,
                            logs = swept.logs,
                            "Retention sweep pruned stale history"
                        );
                    }
                    last_cleanup = Instant::now();
                }
            }

            stats
        };

        let stats = if let Some(timeout) = self.config.timeout {
            match tokio::time::timeout(timeout, pipeline_task).await {
                Ok(stats) => stats,
                Err(_) => {
                    warn!(timeout_secs = timeout.as_secs(), "Pipeline timed out");
                    PipelineStats::default()
                }
            }
        } else {
            pipeline_task.await
        };

        // ==== Stage 7: Cleanup ====
        info!("Shutting down pipeline...");

        let _ = tokio::time::timeout(Duration::from_secs(5), dispatcher_handle).await;

        let mut final_stats = stats;
        final_stats.duration = start_time.elapsed();

        info!(
            duration_secs = final_stats.duration.as_secs_f64(),
            ticks_per_sec = format!("{:.2}", final_stats.ticks_per_second()),
            "Pipeline shutdown complete"
        );

        Ok(final_stats)
    }
}
