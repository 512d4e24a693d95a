//! # Session Manager
//!
//! Owns one chat session: its parameters, connection status, transcript and
//! viewport-follow flag. Transport events are fed in one at a time and the
//! rendering collaborator is told what changed.

pub mod error;
pub mod manager;
pub mod renderer;
pub mod structs;

// Re-exports
pub use error::SessionError;
pub use manager::ChatSession;
pub use renderer::Renderer;
pub use structs::{PendingQuestion, SessionSnapshot, SessionUpdate, SubmitOutcome};
