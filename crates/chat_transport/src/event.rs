//! Transport events - What a connection reports back to its owner

use std::fmt;

use serde::Serialize;
use uuid::Uuid;

/// Identifies one connection attempt. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ConnectionHandle(Uuid);

impl ConnectionHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The first group is enough to tell connections apart in logs.
        let id = self.0.simple().to_string();
        f.write_str(&id[..8])
    }
}

/// Why a connection ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// The handshake never completed (unreachable, refused, rejected).
    ConnectFailed(String),
    /// The server sent a close frame.
    ClosedByPeer { code: Option<u16>, reason: String },
    /// The stream ended without a close frame.
    StreamEnded,
    /// A read or write failed.
    Error(String),
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectFailed(e) => write!(f, "connect failed: {}", e),
            Self::ClosedByPeer { code: Some(code), reason } if !reason.is_empty() => {
                write!(f, "closed by server ({}): {}", code, reason)
            }
            Self::ClosedByPeer { code: Some(code), .. } => write!(f, "closed by server ({})", code),
            Self::ClosedByPeer { .. } => f.write_str("closed by server"),
            Self::StreamEnded => f.write_str("stream ended"),
            Self::Error(e) => write!(f, "transport error: {}", e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// Handshake completed. Fires at most once per handle.
    Opened,
    /// One inbound frame of response text.
    Frame(String),
    /// The connection is gone. Nothing follows this for the same handle.
    Closed(CloseReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportEvent {
    pub handle: ConnectionHandle,
    pub kind: EventKind,
}

impl TransportEvent {
    pub fn opened(handle: ConnectionHandle) -> Self {
        Self {
            handle,
            kind: EventKind::Opened,
        }
    }

    pub fn frame(handle: ConnectionHandle, text: impl Into<String>) -> Self {
        Self {
            handle,
            kind: EventKind::Frame(text.into()),
        }
    }

    pub fn closed(handle: ConnectionHandle, reason: CloseReason) -> Self {
        Self {
            handle,
            kind: EventKind::Closed(reason),
        }
    }
}
