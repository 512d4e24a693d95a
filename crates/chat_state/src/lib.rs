//! chat_state - State machine and buffer logic for chat sessions
//!
//! This crate provides the pieces a session owns:
//! - `machine` - the connection status FSM
//! - `accumulator` - the append-only message buffer
//! - `viewport` - the auto-scroll follow decision

pub mod accumulator;
pub mod machine;
pub mod viewport;

// Re-export commonly used types
pub use accumulator::{GrowthEvent, MessageAccumulator};
pub use machine::{ConnectionEvent, ConnectionStatus, StateMachine, StateTransition, TransitionError};
pub use viewport::{FollowDecision, ScrollMetrics, ViewportFollowController};
