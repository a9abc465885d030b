//! Ingestion error types.

pub use contracts::ContractError as IngestionError;

/// Ingestion result type alias.
pub type Result<T> = std::result::Result<T, IngestionError>;
