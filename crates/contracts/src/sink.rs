//! DataSink trait - dispatcher output interface
//!
//! Defines the abstract interface for sinks, unchanged in shape from the
//! teacher's `LocalDataSink`/`DataSink` split (`trait_variant` auto-derives a
//! `Send` marker bound on the async trait), retargeted to carry emitted
//! ticks instead of `SyncedFrame`.

use crate::{ContractError, EmittedTick};

/// Data output trait. All sink implementations must implement this trait.
#[trait_variant::make(DataSink: Send)]
pub trait LocalDataSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write one emitted tick.
    ///
    /// # Errors
    /// Returns a write error (should include context).
    async fn write(&mut self, tick: &EmittedTick) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}
