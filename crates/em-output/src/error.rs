//! Error types for em-output.

use thiserror::Error;

/// Errors that can occur when writing experiment output.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("step row has {got} values for {expected} areas")]
    ColumnMismatch { expected: usize, got: usize },
}

/// Alias for `Result<T, OutputError>`.
pub type OutputResult<T> = Result<T, OutputError>;
