//! chat_transport - Streaming socket transport for chat sessions
//!
//! A [`Transport`] opens one connection per handle and reports everything
//! that happens on it as handle-tagged [`TransportEvent`]s on a channel.
//! [`WsTransport`] is the WebSocket implementation.

pub mod error;
pub mod event;
pub mod tls;
pub mod transport;
pub mod ws;

pub use error::{Result, TransportError};
pub use event::{CloseReason, ConnectionHandle, EventKind, TransportEvent};
pub use transport::{event_channel, EventReceiver, EventSender, Transport};
pub use ws::WsTransport;
