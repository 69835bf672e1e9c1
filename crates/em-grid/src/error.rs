//! Dataset error type.

use std::path::PathBuf;

use thiserror::Error;

use em_traci::GatewayError;

/// Errors produced while building, saving or loading a dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("invalid grid: {0}")]
    InvalidGrid(String),

    /// Dumps are never overwritten.
    #[error("dump {} already exists", .0.display())]
    AlreadyExists(PathBuf),

    #[error("dump {}: unsupported format version {found} (expected {expected})", path.display())]
    UnsupportedVersion { path: PathBuf, found: u32, expected: u32 },

    /// A baseline or reference needed for exact restoration is missing or
    /// unusable.
    #[error("data integrity: {0}")]
    DataIntegrity(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io { path: PathBuf, source: std::io::Error },

    #[error("malformed dump {}: {source}", path.display())]
    Json { path: PathBuf, source: serde_json::Error },
}

pub type DatasetResult<T> = Result<T, DatasetError>;
