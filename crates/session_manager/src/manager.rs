//! Chat session service

use chat_core::{ChatRequest, SessionParameters};
use chat_state::{
    ConnectionEvent, ConnectionStatus, FollowDecision, MessageAccumulator, ScrollMetrics,
    StateMachine, ViewportFollowController,
};
use chat_transport::{
    event_channel, ConnectionHandle, EventKind, EventReceiver, Transport, TransportEvent,
    WsTransport,
};
use tracing::{debug, info, warn};

use crate::error::{Result, SessionError};
use crate::renderer::Renderer;
use crate::structs::{PendingQuestion, SessionSnapshot, SessionUpdate, SubmitOutcome};

/// One chat session over one transport.
///
/// Only the connection recorded as active may touch the status or the
/// transcript. Events from any earlier handle are dropped, so a reconnect
/// never sees late frames from the connection it replaced.
pub struct ChatSession<T: Transport, R: Renderer> {
    transport: T,
    events: EventReceiver,
    renderer: R,
    params: SessionParameters,
    status: StateMachine,
    active: Option<ConnectionHandle>,
    transcript: MessageAccumulator,
    follow: ViewportFollowController,
}

impl<R: Renderer> ChatSession<WsTransport, R> {
    /// Session over a WebSocket transport. Must be created inside a tokio runtime
    /// before calling `connect`.
    pub fn with_websocket(renderer: R, params: SessionParameters) -> Self {
        let (tx, rx) = event_channel();
        Self::new(WsTransport::new(tx), rx, renderer, params)
    }
}

impl<T: Transport, R: Renderer> ChatSession<T, R> {
    /// Create a disconnected session. `events` must be the receiving end of
    /// the channel `transport` reports on. Nothing is rendered until `connect`.
    pub fn new(transport: T, events: EventReceiver, renderer: R, params: SessionParameters) -> Self {
        Self {
            transport,
            events,
            renderer,
            params,
            status: StateMachine::new(),
            active: None,
            transcript: MessageAccumulator::new(),
            follow: ViewportFollowController::new(),
        }
    }

    /// Open a connection with the current parameters.
    pub fn connect(&mut self) -> ConnectionHandle {
        let params = self.params.clone();
        self.reconnect(params)
    }

    /// Tear down any connection, clear the transcript and connect with `params`.
    pub fn reconnect(&mut self, params: SessionParameters) -> ConnectionHandle {
        self.teardown();
        self.transcript.reset();
        self.params = params;

        self.status.handle_event(ConnectionEvent::ConnectRequested);
        let handle = self
            .transport
            .open(self.params.endpoint_url(), self.params.credential());
        self.active = Some(handle);
        info!("[{}] Connecting to {}", handle, self.params.endpoint_url());

        self.render_placeholder();
        handle
    }

    /// Swap parameters, reconnecting only if the endpoint changed.
    ///
    /// Model, temperature and system message apply from the next `submit`.
    pub fn update_parameters(&mut self, params: SessionParameters) -> Option<ConnectionHandle> {
        if self.params.requires_reconnect(&params) {
            return Some(self.reconnect(params));
        }
        debug!(
            "Parameters updated without reconnect (model={}, temperature={})",
            params.model(),
            params.temperature()
        );
        self.params = params;
        None
    }

    /// Close the active connection, keeping the transcript.
    pub fn disconnect(&mut self) {
        if self.teardown() {
            self.render_placeholder();
        }
    }

    /// Whether `submit` can currently send (drives the send button).
    pub fn can_submit(&self) -> bool {
        self.active.is_some() && self.status.state().is_connected()
    }

    /// Send the pending question and clear it.
    ///
    /// Blank questions are skipped without touching the transport.
    pub fn submit(&mut self, pending: &mut PendingQuestion) -> Result<SubmitOutcome> {
        if pending.is_blank() {
            return Ok(SubmitOutcome::SkippedEmpty);
        }

        let handle = match self.active {
            Some(handle) if self.status.state().is_connected() => handle,
            _ => {
                debug!("Submit rejected while {}", self.status.state());
                return Err(SessionError::ConnectionUnavailable(self.status.state()));
            }
        };

        let frame = ChatRequest::new(pending.as_str(), &self.params).to_frame()?;
        self.transport.send(handle, frame)?;
        debug!("[{}] Question sent ({} chars)", handle, pending.as_str().len());

        pending.clear();
        Ok(SubmitOutcome::Sent)
    }

    /// Apply one transport event.
    pub fn handle_event(&mut self, event: TransportEvent) -> SessionUpdate {
        if self.active != Some(event.handle) {
            debug!("[{}] Dropping event from inactive connection", event.handle);
            return SessionUpdate::Stale(event.handle);
        }

        match event.kind {
            EventKind::Opened => match self.status.try_handle_event(ConnectionEvent::Opened) {
                Ok(transition) if transition.changed => {
                    info!("[{}] Connected", event.handle);
                    self.render_placeholder();
                    SessionUpdate::StatusChanged(transition.to)
                }
                Ok(_) => SessionUpdate::Ignored,
                Err(e) => {
                    warn!("[{}] {}", event.handle, e);
                    SessionUpdate::Ignored
                }
            },
            EventKind::Frame(text) => {
                let Some(growth) = self.transcript.on_frame(&text) else {
                    return SessionUpdate::Ignored;
                };
                self.renderer.render(self.transcript.as_str());

                let followed = match self.follow.on_growth_event(&growth) {
                    FollowDecision::ScrollToBottom => {
                        self.renderer.scroll_to_bottom();
                        true
                    }
                    FollowDecision::Hold => false,
                };
                SessionUpdate::Appended { growth, followed }
            }
            EventKind::Closed(reason) => {
                warn!("[{}] Connection closed unexpectedly: {}", event.handle, reason);
                self.active = None;
                self.transport.close(event.handle);
                self.status.handle_event(ConnectionEvent::Closed {
                    reason: reason.to_string(),
                });
                self.render_placeholder();
                SessionUpdate::Disconnected { reason }
            }
        }
    }

    /// Wait for the next transport event and apply it.
    ///
    /// Returns `None` once the transport side of the channel is gone.
    pub async fn next_update(&mut self) -> Option<SessionUpdate> {
        let event = self.events.recv().await?;
        Some(self.handle_event(event))
    }

    /// Record where the user's scroll position is.
    pub fn on_scroll_position_observed(&mut self, at_bottom: bool) {
        self.follow.on_scroll_position_observed(at_bottom);
    }

    pub fn observe_scroll(&mut self, metrics: ScrollMetrics) {
        self.follow.observe_scroll(metrics);
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status.state()
    }

    pub fn status_machine(&self) -> &StateMachine {
        &self.status
    }

    pub fn transcript(&self) -> &str {
        self.transcript.as_str()
    }

    pub fn parameters(&self) -> &SessionParameters {
        &self.params
    }

    pub fn active_handle(&self) -> Option<ConnectionHandle> {
        self.active
    }

    pub fn is_following(&self) -> bool {
        self.follow.is_following()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.status(),
            connection: self.active,
            transcript_len: self.transcript.len(),
            following: self.is_following(),
            can_submit: self.can_submit(),
            parameters: self.params.clone(),
        }
    }

    /// Close the active connection if any. Returns whether anything was closed.
    fn teardown(&mut self) -> bool {
        let Some(handle) = self.active.take() else {
            return false;
        };
        debug!("[{}] Tearing down", handle);
        self.transport.close(handle);
        self.status.handle_event(ConnectionEvent::CloseRequested);
        true
    }

    fn render_placeholder(&mut self) {
        if !self.transcript.is_empty() {
            return;
        }
        if self.status.state().is_pending() {
            self.renderer.render_connecting_state();
        } else {
            self.renderer.render_ready_state();
        }
    }
}

impl<T: Transport, R: Renderer> Drop for ChatSession<T, R> {
    fn drop(&mut self) {
        if let Some(handle) = self.active.take() {
            self.transport.close(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_core::Credential;
    use chat_transport::{CloseReason, EventSender, TransportError};
    use url::Url;

    #[derive(Default)]
    struct RecordingTransport {
        opened: Vec<(ConnectionHandle, Url, Option<String>)>,
        sent: Vec<(ConnectionHandle, String)>,
        closed: Vec<ConnectionHandle>,
    }

    impl Transport for RecordingTransport {
        fn open(&mut self, url: &Url, credential: Option<&Credential>) -> ConnectionHandle {
            let handle = ConnectionHandle::new();
            self.opened
                .push((handle, url.clone(), credential.map(|c| c.expose().to_string())));
            handle
        }

        fn send(&mut self, handle: ConnectionHandle, payload: String) -> chat_transport::Result<()> {
            if self.closed.contains(&handle) {
                return Err(TransportError::NotOpen(handle));
            }
            self.sent.push((handle, payload));
            Ok(())
        }

        fn close(&mut self, handle: ConnectionHandle) {
            if !self.closed.contains(&handle) {
                self.closed.push(handle);
            }
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Render(String),
        Connecting,
        Ready,
        ScrollToBottom,
    }

    #[derive(Default)]
    struct RecordingRenderer {
        calls: Vec<Call>,
    }

    impl RecordingRenderer {
        fn take(&mut self) -> Vec<Call> {
            std::mem::take(&mut self.calls)
        }
    }

    impl Renderer for RecordingRenderer {
        fn render(&mut self, transcript: &str) {
            self.calls.push(Call::Render(transcript.to_string()));
        }

        fn render_connecting_state(&mut self) {
            self.calls.push(Call::Connecting);
        }

        fn render_ready_state(&mut self) {
            self.calls.push(Call::Ready);
        }

        fn scroll_to_bottom(&mut self) {
            self.calls.push(Call::ScrollToBottom);
        }
    }

    type TestSession = ChatSession<RecordingTransport, RecordingRenderer>;

    fn params(url: &str) -> SessionParameters {
        SessionParameters::new(url, "m", 50, "s").unwrap()
    }

    fn session_with_sender() -> (TestSession, EventSender) {
        let (tx, rx) = event_channel();
        let session = ChatSession::new(
            RecordingTransport::default(),
            rx,
            RecordingRenderer::default(),
            params("wss://x"),
        );
        (session, tx)
    }

    fn session() -> TestSession {
        session_with_sender().0
    }

    fn connected_session() -> (TestSession, ConnectionHandle) {
        let mut session = session();
        let handle = session.connect();
        session.handle_event(TransportEvent::opened(handle));
        session.renderer_mut().take();
        (session, handle)
    }

    #[test]
    fn starts_disconnected_without_rendering() {
        let session = session();
        assert_eq!(session.status(), ConnectionStatus::Disconnected);
        assert!(session.renderer().calls.is_empty());
        assert!(!session.can_submit());
    }

    #[test]
    fn connect_shows_loading_view_once() {
        let mut session = session();
        session.connect();
        assert_eq!(session.renderer().calls, vec![Call::Connecting]);
    }

    #[test]
    fn connect_then_open_reaches_connected() {
        let mut session = session();
        let handle = session.connect();
        assert_eq!(session.status(), ConnectionStatus::Connecting);
        assert_eq!(session.transport().opened.len(), 1);
        assert_eq!(session.transport().opened[0].1.as_str(), "wss://x/");

        let update = session.handle_event(TransportEvent::opened(handle));
        assert_eq!(update, SessionUpdate::StatusChanged(ConnectionStatus::Connected));
        assert!(session.can_submit());
        assert_eq!(session.renderer().calls.last(), Some(&Call::Ready));
    }

    #[test]
    fn submit_sends_framed_request_and_clears_question() {
        let (mut session, handle) = connected_session();
        let mut question = PendingQuestion::from("hi");

        let outcome = session.submit(&mut question).unwrap();

        assert_eq!(outcome, SubmitOutcome::Sent);
        assert!(question.is_empty());
        assert_eq!(
            session.transport().sent,
            vec![(
                handle,
                r#"{"question":"hi","system":"s","temperature":0.5,"model":"m"}"#.to_string()
            )]
        );
    }

    #[test]
    fn blank_questions_never_reach_transport() {
        let (mut session, _) = connected_session();
        for text in ["", "   ", "\n\t "] {
            let mut question = PendingQuestion::from(text);
            assert_eq!(session.submit(&mut question).unwrap(), SubmitOutcome::SkippedEmpty);
            assert_eq!(question.as_str(), text);
        }
        assert!(session.transport().sent.is_empty());
    }

    #[test]
    fn blank_question_is_skipped_even_when_disconnected() {
        let mut session = session();
        let mut question = PendingQuestion::default();
        assert_eq!(session.submit(&mut question).unwrap(), SubmitOutcome::SkippedEmpty);
    }

    #[test]
    fn submit_while_connecting_is_rejected() {
        let mut session = session();
        session.connect();
        let mut question = PendingQuestion::from("hello?");

        let err = session.submit(&mut question).unwrap_err();

        assert!(matches!(
            err,
            SessionError::ConnectionUnavailable(ConnectionStatus::Connecting)
        ));
        assert_eq!(question.as_str(), "hello?");
        assert!(session.transport().sent.is_empty());
    }

    #[test]
    fn transport_send_failure_keeps_question() {
        let (mut session, handle) = connected_session();
        // The transport already dropped the connection; the session has not heard yet.
        session.transport.closed.push(handle);

        let mut question = PendingQuestion::from("still there?");
        let err = session.submit(&mut question).unwrap_err();

        assert!(matches!(err, SessionError::Transport(TransportError::NotOpen(_))));
        assert_eq!(question.as_str(), "still there?");
    }

    #[test]
    fn parameter_changes_apply_at_next_submit() {
        let (mut session, _) = connected_session();
        let tweaked = params("wss://x")
            .with_model("m2")
            .with_temperature(7)
            .unwrap()
            .with_system_message("");

        assert_eq!(session.update_parameters(tweaked), None);
        assert_eq!(session.transport().opened.len(), 1);

        session.submit(&mut PendingQuestion::from("q")).unwrap();
        let sent: serde_json::Value =
            serde_json::from_str(&session.transport().sent[0].1).unwrap();
        assert_eq!(sent["model"], "m2");
        assert_eq!(sent["temperature"], 0.07);
        assert_eq!(sent["system"], "");
    }

    #[test]
    fn frames_accumulate_and_follow_by_default() {
        let (mut session, handle) = connected_session();
        for frame in ["Hel", "lo ", "World"] {
            let update = session.handle_event(TransportEvent::frame(handle, frame));
            assert!(matches!(update, SessionUpdate::Appended { followed: true, .. }));
        }

        assert_eq!(session.transcript(), "Hello World");
        assert_eq!(
            session.renderer().calls,
            vec![
                Call::Render("Hel".to_string()),
                Call::ScrollToBottom,
                Call::Render("Hello ".to_string()),
                Call::ScrollToBottom,
                Call::Render("Hello World".to_string()),
                Call::ScrollToBottom,
            ]
        );
    }

    #[test]
    fn scrolled_up_user_is_not_pulled_down() {
        let (mut session, handle) = connected_session();
        session.on_scroll_position_observed(false);

        let update = session.handle_event(TransportEvent::frame(handle, "more text"));

        assert!(matches!(update, SessionUpdate::Appended { followed: false, .. }));
        assert!(!session.renderer().calls.contains(&Call::ScrollToBottom));
        assert_eq!(session.renderer().calls, vec![Call::Render("more text".to_string())]);
    }

    #[test]
    fn scroll_geometry_drives_follow_flag() {
        let (mut session, handle) = connected_session();
        session.observe_scroll(ScrollMetrics {
            scroll_height: 900.0,
            client_height: 300.0,
            scroll_top: 100.0,
        });
        assert!(!session.is_following());

        session.observe_scroll(ScrollMetrics {
            scroll_height: 900.0,
            client_height: 300.0,
            scroll_top: 599.5,
        });
        assert!(session.is_following());
        session.handle_event(TransportEvent::frame(handle, "x"));
        assert_eq!(session.renderer().calls.last(), Some(&Call::ScrollToBottom));
    }

    #[test]
    fn empty_frame_is_ignored() {
        let (mut session, handle) = connected_session();
        assert_eq!(
            session.handle_event(TransportEvent::frame(handle, "")),
            SessionUpdate::Ignored
        );
        assert!(session.renderer().calls.is_empty());
    }

    #[test]
    fn reconnect_resets_transcript_and_status() {
        let (mut session, old) = connected_session();
        session.handle_event(TransportEvent::frame(old, "previous answer"));

        let new = session.reconnect(params("wss://y/ws"));

        assert_ne!(old, new);
        assert_eq!(session.transcript(), "");
        assert_eq!(session.status(), ConnectionStatus::Connecting);
        assert_eq!(session.transport().closed, vec![old]);
        assert_eq!(session.active_handle(), Some(new));
        assert_eq!(session.renderer().calls.last(), Some(&Call::Connecting));
    }

    #[test]
    fn reconnect_passes_through_disconnected() {
        let (mut session, _) = connected_session();
        session.reconnect(params("wss://y"));

        let history = session.status_machine().history();
        let tail: Vec<_> = history[history.len() - 2..].iter().map(|t| t.to).collect();
        assert_eq!(
            tail,
            vec![ConnectionStatus::Disconnected, ConnectionStatus::Connecting]
        );
    }

    #[test]
    fn endpoint_change_forces_reconnect() {
        let (mut session, old) = connected_session();
        let handle = session.update_parameters(params("wss://elsewhere"));
        assert!(handle.is_some());
        assert_eq!(session.transport().closed, vec![old]);
        assert_eq!(session.transport().opened.len(), 2);
    }

    #[test]
    fn stale_frames_do_not_touch_new_transcript() {
        let (mut session, old) = connected_session();
        session.handle_event(TransportEvent::frame(old, "old "));
        let new = session.reconnect(params("wss://y"));
        session.renderer_mut().take();

        assert_eq!(
            session.handle_event(TransportEvent::frame(old, "late frame")),
            SessionUpdate::Stale(old)
        );
        assert_eq!(
            session.handle_event(TransportEvent::opened(old)),
            SessionUpdate::Stale(old)
        );
        assert_eq!(
            session.handle_event(TransportEvent::closed(old, CloseReason::StreamEnded)),
            SessionUpdate::Stale(old)
        );

        assert_eq!(session.transcript(), "");
        assert_eq!(session.status(), ConnectionStatus::Connecting);
        assert!(session.renderer().calls.is_empty());

        session.handle_event(TransportEvent::opened(new));
        session.handle_event(TransportEvent::frame(new, "fresh"));
        assert_eq!(session.transcript(), "fresh");
    }

    #[test]
    fn unexpected_close_disconnects_without_retry() {
        let (mut session, handle) = connected_session();
        session.handle_event(TransportEvent::frame(handle, "partial"));

        let reason = CloseReason::Error("connection reset".to_string());
        let update = session.handle_event(TransportEvent::closed(handle, reason.clone()));

        assert_eq!(update, SessionUpdate::Disconnected { reason });
        assert_eq!(session.status(), ConnectionStatus::Disconnected);
        assert_eq!(session.active_handle(), None);
        assert_eq!(session.transcript(), "partial");
        assert_eq!(session.transport().opened.len(), 1);
        assert_eq!(session.transport().closed, vec![handle]);
        assert!(session.submit(&mut PendingQuestion::from("q")).is_err());
    }

    #[test]
    fn failed_connect_never_reaches_connected() {
        let mut session = session();
        let handle = session.connect();
        session.handle_event(TransportEvent::closed(
            handle,
            CloseReason::ConnectFailed("refused".to_string()),
        ));
        assert_eq!(session.status(), ConnectionStatus::Disconnected);
        assert_eq!(session.renderer().calls.last(), Some(&Call::Connecting));
    }

    #[test]
    fn duplicate_open_is_ignored() {
        let (mut session, handle) = connected_session();
        assert_eq!(
            session.handle_event(TransportEvent::opened(handle)),
            SessionUpdate::Ignored
        );
        assert_eq!(session.status(), ConnectionStatus::Connected);
    }

    #[test]
    fn disconnect_keeps_transcript_and_is_idempotent() {
        let (mut session, handle) = connected_session();
        session.handle_event(TransportEvent::frame(handle, "kept"));
        session.disconnect();
        session.disconnect();

        assert_eq!(session.status(), ConnectionStatus::Disconnected);
        assert_eq!(session.transcript(), "kept");
        assert_eq!(session.transport().closed, vec![handle]);
    }

    #[test]
    fn credential_is_passed_to_transport() {
        let mut session = session();
        let with_key = params("wss://x").with_credential(Some(Credential::new("key")));
        session.reconnect(with_key);
        assert_eq!(session.transport().opened[0].2.as_deref(), Some("key"));
    }

    #[test]
    fn snapshot_reflects_state() {
        let (mut session, handle) = connected_session();
        session.handle_event(TransportEvent::frame(handle, "abc"));
        session.on_scroll_position_observed(false);

        let snapshot = session.snapshot();
        assert_eq!(snapshot.status, ConnectionStatus::Connected);
        assert_eq!(snapshot.connection, Some(handle));
        assert_eq!(snapshot.transcript_len, 3);
        assert!(!snapshot.following);
        assert!(snapshot.can_submit);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["status"], "connected");
        assert_eq!(json["parameters"]["model"], "m");
    }

    #[tokio::test]
    async fn next_update_drains_events_in_order() {
        let (mut session, tx) = session_with_sender();
        let handle = session.connect();

        tx.send(TransportEvent::opened(handle)).unwrap();
        for frame in ["Hel", "lo ", "World"] {
            tx.send(TransportEvent::frame(handle, frame)).unwrap();
        }
        drop(tx);

        let mut updates = Vec::new();
        while let Some(update) = session.next_update().await {
            updates.push(update);
        }

        assert_eq!(updates.len(), 4);
        assert_eq!(
            updates[0],
            SessionUpdate::StatusChanged(ConnectionStatus::Connected)
        );
        assert_eq!(session.transcript(), "Hello World");
    }
}
