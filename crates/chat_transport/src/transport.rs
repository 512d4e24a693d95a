use chat_core::Credential;
use tokio::sync::mpsc;
use url::Url;

use crate::error::Result;
use crate::event::{ConnectionHandle, TransportEvent};

pub type EventSender = mpsc::UnboundedSender<TransportEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<TransportEvent>;

/// Channel a transport reports on and its owner drains.
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// A streaming connection factory.
///
/// None of these calls block. Outcomes of `open` arrive later as
/// [`TransportEvent`]s tagged with the returned handle, in the order the
/// connection produced them.
pub trait Transport: Send {
    /// Start connecting to `url`. An unreachable URL is reported as a
    /// `Closed` event, never as an error here.
    fn open(&mut self, url: &Url, credential: Option<&Credential>) -> ConnectionHandle;

    /// Send one complete text frame. Fails unless `handle` has opened and not closed.
    fn send(&mut self, handle: ConnectionHandle, payload: String) -> Result<()>;

    /// Release the connection. Unknown or already closed handles are a no-op.
    fn close(&mut self, handle: ConnectionHandle);
}
