//! State transitions - FSM transition logic
//!
//! Implements the state machine that handles event-driven status transitions.

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::events::ConnectionEvent;
use super::states::ConnectionStatus;

/// Error type for invalid state transitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Invalid transition from {from:?} with event {event}")]
    InvalidTransition {
        from: ConnectionStatus,
        event: &'static str,
    },
}

/// Represents a state transition result.
#[derive(Debug, Clone)]
pub struct StateTransition {
    /// The state before the transition.
    pub from: ConnectionStatus,
    /// The state after the transition.
    pub to: ConnectionStatus,
    /// The event that triggered the transition.
    pub event: ConnectionEvent,
    /// Whether the state actually changed.
    pub changed: bool,
    /// When the event was handled.
    pub at: DateTime<Utc>,
}

/// State machine for managing connection status transitions.
#[derive(Debug, Clone)]
pub struct StateMachine {
    /// Current state.
    current_state: ConnectionStatus,
    /// Transition history (limited).
    history: Vec<StateTransition>,
    /// Max history entries to keep.
    max_history: usize,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    /// Create a new state machine in Disconnected state.
    pub fn new() -> Self {
        Self::with_state(ConnectionStatus::Disconnected)
    }

    /// Create a state machine with a specific initial state.
    pub fn with_state(state: ConnectionStatus) -> Self {
        Self {
            current_state: state,
            history: Vec::new(),
            max_history: 50,
        }
    }

    /// Get the current state.
    pub fn state(&self) -> ConnectionStatus {
        self.current_state
    }

    /// Get the transition history.
    pub fn history(&self) -> &[StateTransition] {
        &self.history
    }

    /// Handle an event and transition to a new state.
    ///
    /// Events that do not apply in the current state leave it unchanged.
    pub fn handle_event(&mut self, event: ConnectionEvent) -> StateTransition {
        let old_state = self.current_state;
        let new_state = Self::compute_next_state(old_state, &event);
        let changed = old_state != new_state;

        self.current_state = new_state;

        let transition = StateTransition {
            from: old_state,
            to: new_state,
            event,
            changed,
            at: Utc::now(),
        };

        if changed {
            tracing::debug!(
                "Connection status {} -> {} ({})",
                transition.from,
                transition.to,
                transition.event.name()
            );
        }

        // Add to history
        self.history.push(transition.clone());
        if self.history.len() > self.max_history {
            self.history.remove(0);
        }

        transition
    }

    /// Handle an event, rejecting it if it is not legal in the current state.
    ///
    /// Terminal events are always legal, so closing twice is not an error.
    pub fn try_handle_event(
        &mut self,
        event: ConnectionEvent,
    ) -> Result<StateTransition, TransitionError> {
        if !Self::is_legal(self.current_state, &event) {
            return Err(TransitionError::InvalidTransition {
                from: self.current_state,
                event: event.name(),
            });
        }
        Ok(self.handle_event(event))
    }

    /// Compute the next state given current state and event.
    fn compute_next_state(state: ConnectionStatus, event: &ConnectionEvent) -> ConnectionStatus {
        use ConnectionEvent::*;
        use ConnectionStatus::*;

        match (state, event) {
            (Disconnected, ConnectRequested) => Connecting,
            (Connecting, Opened) => Connected,

            // ========== Teardown from anywhere ==========
            (_, CloseRequested) => Disconnected,
            (_, Closed { .. }) => Disconnected,

            // ========== Default: No transition ==========
            _ => state,
        }
    }

    fn is_legal(state: ConnectionStatus, event: &ConnectionEvent) -> bool {
        event.is_terminal() || Self::compute_next_state(state, event) != state
    }
}
