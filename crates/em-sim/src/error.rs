use thiserror::Error;

use em_core::CoreError;
use em_grid::DatasetError;
use em_mitigation::MitigationError;
use em_traci::GatewayError;

#[derive(Debug, Error)]
pub enum ExperimentError {
    #[error("experiment configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Mitigation(#[from] MitigationError),

    #[error("experiment panicked: {0}")]
    Panicked(String),

    #[error("worker pool error: {0}")]
    Pool(String),
}

pub type ExperimentResult<T> = Result<T, ExperimentError>;
