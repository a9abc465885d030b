//! Pipeline statistics and metrics.

use std::time::Duration;

use observability::SyncMetricsAggregator;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Total sync batches emitted by the synchronization buffer
    pub ticks_synced: u64,

    /// Total ticks successfully fused and handed to the dispatcher/stdout
    pub ticks_emitted: u64,

    /// Total polls that yielded at least one modality's data
    pub polls_with_data: u64,

    /// Ticks rejected by the consent gate
    pub consent_rejections: u64,

    /// Retention sweeps run
    pub sweeps_run: u64,

    /// Total duration of the pipeline run
    pub duration: Duration,

    /// Number of sinks that received data
    pub active_sinks: usize,

    /// Sync engine metrics aggregator
    pub sync_metrics: SyncMetricsAggregator,
}

impl PipelineStats {
    /// Calculate ticks-per-second throughput
    pub fn ticks_per_second(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.ticks_emitted as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Calculate consent-rejection rate as percentage
    pub fn rejection_rate(&self) -> f64 {
        let total = self.ticks_synced;
        if total > 0 {
            (self.consent_rejections as f64 / total as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Pipeline Statistics ===\n");

        println!("Overview");
        println!("  Duration: {:.2}s", self.duration.as_secs_f64());
        println!("  Ticks synced: {}", self.ticks_synced);
        println!("  Ticks emitted: {}", self.ticks_emitted);
        println!("  Throughput: {:.2} ticks/s", self.ticks_per_second());
        println!("  Polls with data: {}", self.polls_with_data);
        println!("  Active sinks: {}", self.active_sinks);
        println!(
            "  Consent rejections: {} ({:.2}%)",
            self.consent_rejections,
            self.rejection_rate()
        );
        println!("  Retention sweeps: {}", self.sweeps_run);

        let summary = self.sync_metrics.summary();

        println!("\nSynchronization Metrics");
        println!("  Total dropped packets: {}", summary.total_dropped);
        println!(
            "  Ticks with stale sensors: {} ({:.2}%)",
            summary.ticks_with_stale, summary.stale_rate
        );
        println!("  Window size (ms): {}", summary.window_size_ms);
        println!("  Max latency (ms): {}", summary.max_latency_ms);

        if !summary.dropped_counts.is_empty() {
            println!("\nDropped Packet Counts");
            for (modality, count) in &summary.dropped_counts {
                println!("  {}: {}", modality, count);
            }
        }

        println!();
    }
}
