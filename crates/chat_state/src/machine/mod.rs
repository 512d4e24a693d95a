//! State machine module
//!
//! Contains the FSM for the connection lifecycle of a chat session.

mod events;
mod states;
mod transitions;

pub use events::ConnectionEvent;
pub use states::ConnectionStatus;
pub use transitions::{StateMachine, StateTransition, TransitionError};
