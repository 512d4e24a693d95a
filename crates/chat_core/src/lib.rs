//! chat_core - Core types for the DocChat session client
//!
//! This crate provides the foundational types used across the chat crates:
//! - `params` - SessionParameters and the opaque Credential
//! - `request` - ChatRequest, the outbound frame
//! - `config` - Config loading from files and environment

pub mod config;
pub mod error;
pub mod params;
pub mod request;

// Re-export commonly used types
pub use config::Config;
pub use error::{ConfigError, ParameterError};
pub use params::{Credential, SessionParameters, MAX_TEMPERATURE};
pub use request::ChatRequest;
