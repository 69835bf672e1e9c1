use thiserror::Error;

use em_traci::GatewayError;

#[derive(Debug, Error)]
pub enum MitigationError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("data integrity error: {0}")]
    DataIntegrity(String),
}

pub type MitigationResult<T> = Result<T, MitigationError>;
