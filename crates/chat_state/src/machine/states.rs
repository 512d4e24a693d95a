//! Connection states - Defines all possible states of a session's connection

use std::fmt;

use serde::{Deserialize, Serialize};

/// The connection status of a chat session.
///
/// Exactly one value holds at any time. Within one connection attempt the
/// status only moves forward (`Disconnected -> Connecting -> Connected`);
/// a close or error drops it back to `Disconnected` from anywhere.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    /// No live connection. Initial state, and terminal for each attempt.
    #[default]
    Disconnected,

    /// A connection was opened and the handshake has not completed.
    Connecting,

    /// The handshake completed; questions may be sent.
    Connected,
}

impl ConnectionStatus {
    /// Check if questions may be submitted in this state.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Check if the session is waiting for the transport (drives the "loading" view).
    pub fn is_pending(&self) -> bool {
        !self.is_connected()
    }

    /// Get a human-readable description of the current state.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Disconnected => "Disconnected",
            Self::Connecting => "Connecting",
            Self::Connected => "Connected",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}
