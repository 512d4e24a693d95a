//! Session data structures

use chat_core::SessionParameters;
use chat_state::{ConnectionStatus, GrowthEvent};
use chat_transport::{CloseReason, ConnectionHandle};
use serde::Serialize;

/// The question being typed, owned by the caller-facing input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingQuestion(String);

impl PendingQuestion {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn set(&mut self, text: impl Into<String>) {
        self.0 = text.into();
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Empty or whitespace only; such questions are never sent.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl From<&str> for PendingQuestion {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for PendingQuestion {
    fn from(text: String) -> Self {
        Self(text)
    }
}

/// Result of a successful `submit` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The request frame was handed to the transport.
    Sent,
    /// The question was blank; nothing was sent.
    SkippedEmpty,
}

/// What handling one transport event did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionUpdate {
    /// The connection status moved.
    StatusChanged(ConnectionStatus),
    /// A frame grew the transcript.
    Appended { growth: GrowthEvent, followed: bool },
    /// The active connection ended without being asked to.
    Disconnected { reason: CloseReason },
    /// The event came from a connection that is no longer active.
    Stale(ConnectionHandle),
    /// The event changed nothing (empty frame, repeated open).
    Ignored,
}

/// Read-only view of a session for presentation layers.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub status: ConnectionStatus,
    pub connection: Option<ConnectionHandle>,
    pub transcript_len: usize,
    pub following: bool,
    pub can_submit: bool,
    pub parameters: SessionParameters,
}
