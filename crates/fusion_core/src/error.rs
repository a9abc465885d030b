//! Fusion-core error kinds
//!
//! `Association` has no live path today: gating in `association.rs` always
//! produces a well-formed (possibly empty) match set. Kept for symmetry
//! with the rest of the error taxonomy and for future association
//! strategies that may reject a configuration outright.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FusionError {
    /// Consent record missing or revoked; aborts emission for the tick only.
    #[error("consent error: {0}")]
    Consent(String),

    #[error("association error: {0}")]
    Association(String),
}

pub type Result<T> = std::result::Result<T, FusionError>;
