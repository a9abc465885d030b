//! Fusion pipeline metrics collection module
//!
//! Collects and aggregates sync/fusion runtime metrics based on `SyncStatus`
//! and `EmittedTick`.

use contracts::{EmittedTick, SyncStatus};
use metrics::{counter, gauge, histogram};

/// Record metrics from a `SyncStatus`
///
/// Call this function each time the sync buffer produces an aligned batch.
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_sync_metrics;
///
/// if let Some(batch) = sync_buffer.push(input) {
///     record_sync_metrics(&batch.status);
///     // ...
/// }
/// ```
pub fn record_sync_metrics(status: &SyncStatus) {
    counter!("fusion_ticks_total").increment(1);

    histogram!("fusion_window_size_ms").record(status.window_seconds * 1000.0);
    histogram!("fusion_max_latency_ms").record(status.max_latency_seconds * 1000.0);

    let dropped_total =
        status.dropped_wifi + status.dropped_vision + status.dropped_mmwave + status.dropped_ble;
    if dropped_total > 0 {
        counter!("fusion_packets_dropped_total").increment(dropped_total as u64);
    }
    gauge!("fusion_packets_dropped_current").set(dropped_total as f64);

    counter!("fusion_packets_dropped_total", "modality" => "wifi")
        .increment(status.dropped_wifi as u64);
    counter!("fusion_packets_dropped_total", "modality" => "vision")
        .increment(status.dropped_vision as u64);
    counter!("fusion_packets_dropped_total", "modality" => "mmwave")
        .increment(status.dropped_mmwave as u64);
    counter!("fusion_packets_dropped_total", "modality" => "ble")
        .increment(status.dropped_ble as u64);

    let stale_count = [
        status.wifi_stale,
        status.vision_stale,
        status.mmwave_stale,
        status.ble_stale,
    ]
    .iter()
    .filter(|s| **s)
    .count();
    gauge!("fusion_sensors_stale").set(stale_count as f64);
    if stale_count > 0 {
        counter!("fusion_ticks_with_stale_sensors_total").increment(1);
    }
}

/// Record per-tick emission outcome: active tracks, alert tier, sink fanout.
pub fn record_tick_emitted(tick: &EmittedTick) {
    gauge!("fusion_active_tracks").set(tick.tracks.len() as f64);
    counter!("fusion_alert_tier_total", "tier" => format!("{:?}", tick.alert_tier())).increment(1);

    let online = tick
        .sensor_health
        .iter()
        .filter(|s| s.status == contracts::SensorHealthStatus::Online)
        .count();
    gauge!("fusion_sensors_online").set(online as f64);
}

/// Record sensor packet reception
pub fn record_packet_received(sensor_id: &str, sensor_type: &str) {
    counter!(
        "fusion_packets_received_total",
        "sensor_id" => sensor_id.to_string(),
        "sensor_type" => sensor_type.to_string()
    )
    .increment(1);
}

/// Record emitted tick dispatch to a sink
pub fn record_tick_dispatched(sink_name: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "fusion_ticks_dispatched_total",
        "sink" => sink_name.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record pipeline latency (from data generation to sync completion)
pub fn record_sync_latency_ms(latency_ms: f64) {
    histogram!("fusion_sync_latency_ms").record(latency_ms);
}

/// Record buffer depth
pub fn record_buffer_depth(sensor_id: &str, depth: usize) {
    gauge!(
        "fusion_buffer_depth",
        "sensor_id" => sensor_id.to_string()
    )
    .set(depth as f64);
}

/// Record the Hungarian association's total assignment cost for a tick
pub fn record_association_cost(cost: f64) {
    histogram!("fusion_association_cost").record(cost);
}

/// Record a Kalman filter innovation (pre-update residual distance) for a track
pub fn record_kalman_residual(track_id: &str, residual: f64) {
    gauge!(
        "fusion_kalman_residual",
        "track_id" => track_id.to_string()
    )
    .set(residual);

    histogram!("fusion_kalman_residual_hist").record(residual.abs());
}

/// Fusion metrics aggregator
///
/// Aggregates metrics in memory for statistics and summary output.
#[derive(Debug, Clone, Default)]
pub struct SyncMetricsAggregator {
    /// Total ticks
    pub total_ticks: u64,

    /// Total dropped packets (all modalities)
    pub total_dropped: u64,

    /// Ticks with at least one stale modality
    pub ticks_with_stale: u64,

    /// Window size statistics
    pub window_stats: RunningStats,

    /// Max latency statistics
    pub latency_stats: RunningStats,

    /// Dropped count per modality
    pub dropped_counts: std::collections::HashMap<String, u64>,
}

impl SyncMetricsAggregator {
    /// Create new aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Update aggregate statistics
    pub fn update(&mut self, status: &SyncStatus) {
        self.total_ticks += 1;

        let dropped_total = status.dropped_wifi
            + status.dropped_vision
            + status.dropped_mmwave
            + status.dropped_ble;
        self.total_dropped += dropped_total as u64;

        *self.dropped_counts.entry("wifi".into()).or_insert(0) += status.dropped_wifi as u64;
        *self.dropped_counts.entry("vision".into()).or_insert(0) += status.dropped_vision as u64;
        *self.dropped_counts.entry("mmwave".into()).or_insert(0) += status.dropped_mmwave as u64;
        *self.dropped_counts.entry("ble".into()).or_insert(0) += status.dropped_ble as u64;

        if status.wifi_stale || status.vision_stale || status.mmwave_stale || status.ble_stale {
            self.ticks_with_stale += 1;
        }

        self.window_stats.push(status.window_seconds * 1000.0);
        self.latency_stats.push(status.max_latency_seconds * 1000.0);
    }

    /// Generate summary report
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_ticks: self.total_ticks,
            total_dropped: self.total_dropped,
            ticks_with_stale: self.ticks_with_stale,
            drop_rate: if self.total_ticks > 0 {
                self.total_dropped as f64 / self.total_ticks as f64 * 100.0
            } else {
                0.0
            },
            stale_rate: if self.total_ticks > 0 {
                self.ticks_with_stale as f64 / self.total_ticks as f64 * 100.0
            } else {
                0.0
            },
            window_size_ms: StatsSummary::from(&self.window_stats),
            max_latency_ms: StatsSummary::from(&self.latency_stats),
            dropped_counts: self.dropped_counts.clone(),
        }
    }

    /// Reset statistics
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Metrics summary
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_ticks: u64,
    pub total_dropped: u64,
    pub ticks_with_stale: u64,
    pub drop_rate: f64,
    pub stale_rate: f64,
    pub window_size_ms: StatsSummary,
    pub max_latency_ms: StatsSummary,
    pub dropped_counts: std::collections::HashMap<String, u64>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Fusion Metrics Summary ===")?;
        writeln!(f, "Total ticks: {}", self.total_ticks)?;
        writeln!(
            f,
            "Dropped packets: {} ({:.2}%)",
            self.total_dropped, self.drop_rate
        )?;
        writeln!(
            f,
            "Ticks with stale sensors: {} ({:.2}%)",
            self.ticks_with_stale, self.stale_rate
        )?;
        writeln!(f, "Window size (ms): {}", self.window_size_ms)?;
        writeln!(f, "Max latency (ms): {}", self.max_latency_ms)?;

        if !self.dropped_counts.is_empty() {
            writeln!(f, "Dropped packet counts by modality:")?;
            for (modality, count) in &self.dropped_counts {
                writeln!(f, "  {}: {}", modality, count)?;
            }
        }

        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics calculator (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Add new value
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// Sample count
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Mean
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// Standard deviation
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Minimum value
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Maximum value
    pub fn max(&self) -> f64 {
        self.max
    }
}
