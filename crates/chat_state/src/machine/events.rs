//! Connection events - Defines events that trigger status transitions

use serde::{Deserialize, Serialize};

/// Events that can trigger transitions in the connection FSM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConnectionEvent {
    // ========== Caller Events ==========
    /// A new connection attempt was started.
    ConnectRequested,

    /// The caller tore the connection down (reconnect or disposal).
    CloseRequested,

    // ========== Transport Events ==========
    /// The transport completed the handshake.
    Opened,

    /// The transport reported the connection ended, by close or by error.
    Closed { reason: String },
}

impl ConnectionEvent {
    /// Check if this event ends a connection.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::CloseRequested | Self::Closed { .. })
    }

    /// Short name used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ConnectRequested => "connect_requested",
            Self::CloseRequested => "close_requested",
            Self::Opened => "opened",
            Self::Closed { .. } => "closed",
        }
    }
}
