//! LogSink - logs tick summary via tracing

use contracts::{ContractError, DataSink, EmittedTick};
use tracing::{info, instrument};

/// Sink that logs tick summaries for debugging
pub struct LogSink {
    name: String,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn log_tick_summary(&self, tick: &EmittedTick) {
        info!(
            sink = %self.name,
            tracks = tick.tracks.len(),
            alert_tier = ?tick.alert_tier(),
            emitters = tick.emitters.len(),
            sensors_online = tick
                .sensor_health
                .iter()
                .filter(|s| s.status == contracts::SensorHealthStatus::Online)
                .count(),
            "EmittedTick received"
        );
    }
}

impl DataSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "log_sink_write", skip(self, tick), fields(sink = %self.name))]
    async fn write(&mut self, tick: &EmittedTick) -> Result<(), ContractError> {
        self.log_tick_summary(tick);
        Ok(())
    }

    #[instrument(name = "log_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        // Nothing to flush for log sink
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, "LogSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::BandSummary;

    #[tokio::test]
    async fn test_log_sink_write() {
        let mut sink = LogSink::new("test_log");
        let tick = EmittedTick {
            tracks: Vec::new(),
            emitters: Vec::new(),
            sensor_health: Vec::new(),
            band_summary: BandSummary::default(),
        };

        let result = sink.write(&tick).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_log_sink_name() {
        let sink = LogSink::new("my_logger");
        assert_eq!(sink.name(), "my_logger");
    }
}
