//! FileSink - appends emitted ticks to an NDJSON file

use contracts::{ContractError, DataSink, EmittedTick};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, error, instrument};

/// Configuration for FileSink
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Output directory; ticks are appended to `<base_path>/ticks.ndjson`.
    pub base_path: PathBuf,
}

impl FileSinkConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let base_path = params
            .get("base_path")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./output"));

        Self { base_path }
    }
}

/// Sink that appends one NDJSON line per tick to disk
pub struct FileSink {
    name: String,
    config: FileSinkConfig,
    file: File,
}

impl FileSink {
    /// Create a new FileSink
    pub fn new(name: impl Into<String>, config: FileSinkConfig) -> std::io::Result<Self> {
        fs::create_dir_all(&config.base_path)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(config.base_path.join("ticks.ndjson"))?;

        Ok(Self {
            name: name.into(),
            config,
            file,
        })
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        let config = FileSinkConfig::from_params(params);
        Self::new(name, config)
    }

    fn write_tick_to_disk(&mut self, tick: &EmittedTick) -> std::io::Result<()> {
        serde_json::to_writer(&mut self.file, tick)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        self.file.write_all(b"\n")?;
        Ok(())
    }

    fn persist_tick(&mut self, tick: &EmittedTick) -> Result<(), ContractError> {
        self.write_tick_to_disk(tick).map_err(|e| {
            error!(sink = %self.name, error = %e, "Write failed");
            ContractError::sink_write(&self.name, e.to_string())
        })
    }
}

impl DataSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "file_sink_write", skip(self, tick), fields(sink = %self.name))]
    async fn write(&mut self, tick: &EmittedTick) -> Result<(), ContractError> {
        self.persist_tick(tick)?;
        Ok(())
    }

    #[instrument(name = "file_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        self.file
            .flush()
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))
    }

    #[instrument(name = "file_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        debug!(sink = %self.name, path = %self.config.base_path.display(), "FileSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::BandSummary;
    use std::io::{BufRead, BufReader};
    use tempfile::tempdir;

    fn tick() -> EmittedTick {
        EmittedTick {
            tracks: Vec::new(),
            emitters: Vec::new(),
            sensor_health: Vec::new(),
            band_summary: BandSummary::default(),
        }
    }

    #[tokio::test]
    async fn test_file_sink_write() {
        let dir = tempdir().unwrap();
        let config = FileSinkConfig {
            base_path: dir.path().to_path_buf(),
        };

        let mut sink = FileSink::new("test_file", config).unwrap();
        sink.write(&tick()).await.unwrap();
        sink.write(&tick()).await.unwrap();
        sink.flush().await.unwrap();

        let path = dir.path().join("ticks.ndjson");
        assert!(path.exists());
        let lines: Vec<_> = BufReader::new(File::open(path).unwrap()).lines().collect();
        assert_eq!(lines.len(), 2);
    }
}
