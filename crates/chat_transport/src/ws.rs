//! WebSocket transport built on tokio-tungstenite
//!
//! Each `open` spawns one task that owns the socket for its whole life:
//! it performs the handshake, forwards queued outbound frames, and turns
//! inbound messages into events. `close` cancels that task. A second task
//! watches the first so that a panic still ends in a `Closed` event.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chat_core::Credential;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{header::AUTHORIZATION, HeaderValue, Request};
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::connect_async;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{Result, TransportError};
use crate::event::{CloseReason, ConnectionHandle, TransportEvent};
use crate::tls::ensure_crypto_provider;
use crate::transport::{EventSender, Transport};

struct Connection {
    outbound: mpsc::UnboundedSender<String>,
    cancel: CancellationToken,
    open: Arc<AtomicBool>,
}

/// WebSocket [`Transport`]. `open` must be called from within a tokio runtime.
pub struct WsTransport {
    events: EventSender,
    connections: HashMap<ConnectionHandle, Connection>,
}

impl WsTransport {
    pub fn new(events: EventSender) -> Self {
        ensure_crypto_provider();
        Self {
            events,
            connections: HashMap::new(),
        }
    }

    /// Number of handles opened and not yet closed by the owner.
    pub fn tracked_connections(&self) -> usize {
        self.connections.len()
    }
}

impl Transport for WsTransport {
    fn open(&mut self, url: &Url, credential: Option<&Credential>) -> ConnectionHandle {
        let handle = ConnectionHandle::new();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let open = Arc::new(AtomicBool::new(false));

        info!("[{}] Opening {}", handle, url);

        let task = ConnectionTask {
            handle,
            events: self.events.clone(),
            cancel: cancel.clone(),
            open: open.clone(),
        };
        let url = url.clone();
        let credential = credential.cloned();
        let worker = tokio::spawn(task.run(url, credential, outbound_rx));

        let supervisor = ConnectionTask {
            handle,
            events: self.events.clone(),
            cancel: cancel.clone(),
            open: open.clone(),
        };
        tokio::spawn(async move {
            if let Err(e) = worker.await {
                warn!("[{}] Connection task failed: {}", handle, e);
                supervisor.finish(CloseReason::Error(format!("connection task failed: {}", e)));
            }
        });

        self.connections.insert(
            handle,
            Connection {
                outbound: outbound_tx,
                cancel,
                open,
            },
        );
        handle
    }

    fn send(&mut self, handle: ConnectionHandle, payload: String) -> Result<()> {
        let connection = self
            .connections
            .get(&handle)
            .filter(|c| c.open.load(Ordering::SeqCst))
            .ok_or(TransportError::NotOpen(handle))?;

        connection
            .outbound
            .send(payload)
            .map_err(|_| TransportError::ChannelClosed(handle))
    }

    fn close(&mut self, handle: ConnectionHandle) {
        if let Some(connection) = self.connections.remove(&handle) {
            debug!("[{}] Closing", handle);
            connection.open.store(false, Ordering::SeqCst);
            connection.cancel.cancel();
        }
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        for (_, connection) in self.connections.drain() {
            connection.cancel.cancel();
        }
    }
}

struct ConnectionTask {
    handle: ConnectionHandle,
    events: EventSender,
    cancel: CancellationToken,
    open: Arc<AtomicBool>,
}

impl ConnectionTask {
    async fn run(
        self,
        url: Url,
        credential: Option<Credential>,
        mut outbound: mpsc::UnboundedReceiver<String>,
    ) {
        let handle = self.handle;

        let request = match build_request(&url, credential.as_ref()) {
            Ok(request) => request,
            Err(e) => {
                self.finish(CloseReason::ConnectFailed(e.to_string()));
                return;
            }
        };

        let connected = tokio::select! {
            _ = self.cancel.cancelled() => return,
            result = connect_async(request) => result,
        };

        let socket = match connected {
            Ok((socket, _response)) => socket,
            Err(e) => {
                warn!("[{}] Handshake with {} failed: {}", handle, url, e);
                self.finish(CloseReason::ConnectFailed(e.to_string()));
                return;
            }
        };

        // A close issued while the handshake was finishing wins.
        if self.cancel.is_cancelled() {
            return;
        }
        self.open.store(true, Ordering::SeqCst);
        info!("[{}] Connected", handle);
        if self.events.send(TransportEvent::opened(handle)).is_err() {
            return;
        }

        let (mut write, mut read) = socket.split();

        let reason = loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    let _ = write.send(Message::Close(None)).await;
                    self.open.store(false, Ordering::SeqCst);
                    return;
                }
                queued = outbound.recv() => {
                    let Some(payload) = queued else {
                        // Owner dropped the transport.
                        let _ = write.send(Message::Close(None)).await;
                        return;
                    };
                    debug!("[{}] Sending {} bytes", handle, payload.len());
                    if let Err(e) = write.send(Message::text(payload)).await {
                        break CloseReason::Error(e.to_string());
                    }
                }
                inbound = read.next() => {
                    match inbound {
                        Some(Ok(message)) => match inbound_text(message) {
                            Inbound::Text(text) => {
                                if self.events.send(TransportEvent::frame(handle, text)).is_err() {
                                    return;
                                }
                            }
                            Inbound::Close(frame) => break close_reason(frame),
                            Inbound::Skip => continue,
                        },
                        Some(Err(WsError::ConnectionClosed)) | None => break CloseReason::StreamEnded,
                        Some(Err(e)) => break CloseReason::Error(e.to_string()),
                    }
                }
            }
        };

        self.finish(reason);
    }

    fn finish(&self, reason: CloseReason) {
        self.open.store(false, Ordering::SeqCst);
        if self.cancel.is_cancelled() {
            return;
        }
        info!("[{}] Connection ended: {}", self.handle, reason);
        let _ = self.events.send(TransportEvent::closed(self.handle, reason));
    }
}

enum Inbound {
    Text(String),
    Close(Option<CloseFrame>),
    Skip,
}

fn inbound_text(message: Message) -> Inbound {
    match message {
        Message::Text(text) => Inbound::Text(text.as_str().to_owned()),
        Message::Binary(data) => Inbound::Text(String::from_utf8_lossy(&data).into_owned()),
        Message::Close(frame) => Inbound::Close(frame),
        Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => Inbound::Skip,
    }
}

fn close_reason(frame: Option<CloseFrame>) -> CloseReason {
    match frame {
        Some(frame) => CloseReason::ClosedByPeer {
            code: Some(u16::from(frame.code)),
            reason: frame.reason.as_str().to_owned(),
        },
        None => CloseReason::ClosedByPeer {
            code: None,
            reason: String::new(),
        },
    }
}

fn build_request(url: &Url, credential: Option<&Credential>) -> std::result::Result<Request<()>, WsError> {
    let mut request = url.as_str().into_client_request()?;
    if let Some(credential) = credential {
        let value = HeaderValue::from_str(&format!("Bearer {}", credential.expose()))
            .map_err(|e| WsError::HttpFormat(e.into()))?;
        request.headers_mut().insert(AUTHORIZATION, value);
    }
    Ok(request)
}
