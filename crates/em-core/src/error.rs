//! Workspace base error type.
//!
//! Sub-crates define their own error enums and wrap `CoreError` as one
//! variant via `#[from]`.

use thiserror::Error;

/// The top-level error type for `em-core`.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Missing or unusable configuration values.  Contradictory strategy
    /// flags are *not* reported here; they are normalised by
    /// [`ExperimentConfig::validate`][crate::ExperimentConfig::validate].
    #[error("configuration error: {0}")]
    Config(String),

    /// A baseline needed for exact restoration is absent or malformed.
    #[error("data integrity error: {0}")]
    DataIntegrity(String),
}

/// Shorthand result type for `em-core`.
pub type CoreResult<T> = Result<T, CoreError>;
