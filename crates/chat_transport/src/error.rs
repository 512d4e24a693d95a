//! Transport error types

use thiserror::Error;

use crate::event::ConnectionHandle;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Connection {0} is not open")]
    NotOpen(ConnectionHandle),

    #[error("Connection {0} has shut down")]
    ChannelClosed(ConnectionHandle),
}

pub type Result<T> = std::result::Result<T, TransportError>;
