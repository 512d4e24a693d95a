//! Session error types

use chat_state::ConnectionStatus;
use chat_transport::TransportError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Connection unavailable (status: {0})")]
    ConnectionUnavailable(ConnectionStatus),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SessionError>;
