//! # Sync Engine
//!
//! Time-aligned synchronization of the four measurement streams into
//! per-tick `SyncBatch`es
//!
//! Responsibilities:
//! - Per-modality trailing-window buffering
//! - Nearest/interpolate alignment by source key
//! - Staleness and drop accounting
//! - TTL-based history pruning
//!
//! ## Usage Example
//!
//! ```ignore
//! use sync_engine::SynchronizationBuffer;
//! use contracts::SyncStrategy;
//!
//! let mut buffer = SynchronizationBuffer::new(0.25, 0.25, SyncStrategy::Nearest);
//! buffer.add_wifi(records);
//! if let Some(batch) = buffer.emit(None) {
//!     // feed batch.fusion_input to fusion_core::fuse
//! }
//! ```

mod buffer;

pub use buffer::{PruneCounts, SynchronizationBuffer};
