//! Gateway error type.

use thiserror::Error;

/// Errors produced while talking to the simulation engine.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The engine process could not be started or reached.
    #[error("failed to start simulation session: {0}")]
    Launch(String),

    /// The engine answered a command with an error status.
    #[error("command 0x{command:02x} failed: {message}")]
    Command { command: u8, message: String },

    /// The byte stream did not match the protocol.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// An object id the engine does not know.
    #[error("unknown {kind} {id:?}")]
    UnknownObject { kind: &'static str, id: String },

    /// The session was already closed.
    #[error("session closed")]
    Closed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type GatewayResult<T> = Result<T, GatewayError>;
