//! Session controller.
//!
//! Owns at most one [`Session`] and drives it through the authentication
//! phases. Pure state machine: every operation and every transport event
//! returns the [`SessionAction`]s the caller must execute, and time only
//! enters through [`SessionController::tick`].
//!
//! # Echo contract
//!
//! The server reflects every chat message back to all participants,
//! including the sender. Under [`EchoPolicy::ServerEcho`] the controller
//! therefore never renders its own outbound messages. Under
//! [`EchoPolicy::LocalEcho`] it renders them immediately and suppresses the
//! first inbound message with the same `(from, content, timestamp)`.

use std::{collections::VecDeque, time::Duration};

use tracing::{debug, info, warn};
use wirechat_proto::{
    AuthSignal, ChatMessage, InboundFrame, classify, encode_chat, is_registration_refusal,
};

use crate::{
    credentials::Credentials,
    env::Environment,
    error::SessionError,
    event::{SessionAction, TransportEvent},
    session::{AuthPhase, ConnectionId, HandleState, Session, SessionPurpose},
};

/// Server the client talks to unless configured otherwise.
pub const DEFAULT_ENDPOINT: &str = "ws://localhost:8100";

/// Time allowed between opening a connection and receiving an outcome.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound on locally echoed messages still waiting for their server
/// echo. Oldest entries are forgotten first.
const MAX_PENDING_ECHOES: usize = 256;

/// Who renders the user's own messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EchoPolicy {
    /// Rely on the server reflecting each message back
    #[default]
    ServerEcho,
    /// Render on send and drop the matching server echo
    LocalEcho,
}

/// Controller configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// WebSocket URL of the chat server
    pub endpoint: String,
    /// Time allowed for an attempt to reach an outcome
    pub handshake_timeout: Duration,
    /// Rendering of the user's own messages
    pub echo: EchoPolicy,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            echo: EchoPolicy::default(),
        }
    }
}

/// Session controller state machine.
///
/// Generic over `E: Environment` so tests run on a manual clock.
#[derive(Debug)]
pub struct SessionController<E: Environment> {
    env: E,
    config: ControllerConfig,
    session: Option<Session<E::Instant>>,
    next_connection: u64,
    /// Locally rendered messages awaiting their server echo.
    pending_echoes: VecDeque<ChatMessage>,
}

impl<E: Environment> SessionController<E> {
    /// Create a controller with no session.
    pub fn new(env: E, config: ControllerConfig) -> Self {
        Self { env, config, session: None, next_connection: 1, pending_echoes: VecDeque::new() }
    }

    /// Current session, if an attempt was ever made.
    ///
    /// A session that has ended stays visible until the next attempt.
    pub fn session(&self) -> Option<&Session<E::Instant>> {
        self.session.as_ref()
    }

    /// Authentication phase of the current session.
    pub fn auth_phase(&self) -> AuthPhase {
        self.session.as_ref().map_or(AuthPhase::Unauthenticated, Session::phase)
    }

    /// Whether [`send`](Self::send) would put a frame on the wire.
    pub fn is_sending_enabled(&self) -> bool {
        self.session.as_ref().is_some_and(Session::can_send)
    }

    /// Start a single-shot registration.
    ///
    /// Supersedes any live session. With an empty username or password
    /// nothing happens beyond reporting `SessionError::Validation`.
    pub fn register(
        &mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Vec<SessionAction> {
        self.begin(SessionPurpose::Register, username.into(), password.into())
    }

    /// Start a login session.
    ///
    /// Supersedes any live session. With an empty username or password
    /// nothing happens beyond reporting `SessionError::Validation`.
    pub fn connect(
        &mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Vec<SessionAction> {
        self.begin(SessionPurpose::Login, username.into(), password.into())
    }

    /// Send a chat message from the authenticated user.
    ///
    /// Surrounding whitespace is trimmed; blank text is ignored. Outside an
    /// authenticated session this only reports
    /// `SessionError::NotAuthenticated`.
    pub fn send(&mut self, text: &str) -> Vec<SessionAction> {
        let Some(session) = self.session.as_ref().filter(|s| s.can_send()) else {
            return vec![SessionAction::ReportError(SessionError::NotAuthenticated)];
        };

        let content = text.trim();
        if content.is_empty() {
            return Vec::new();
        }

        let connection = session.connection();
        let message = ChatMessage::new(session.identity(), content, self.env.wall_clock_millis());
        let frame = match encode_chat(&message) {
            Ok(frame) => frame,
            Err(err) => return vec![SessionAction::ReportError(err.into())],
        };

        debug!(%connection, bytes = frame.len(), "sending chat message");
        let mut actions = vec![SessionAction::Send { connection, frame }, SessionAction::ClearPendingText];

        if self.config.echo == EchoPolicy::LocalEcho {
            if self.pending_echoes.len() >= MAX_PENDING_ECHOES {
                self.pending_echoes.pop_front();
            }
            self.pending_echoes.push_back(message.clone());
            actions.push(SessionAction::RenderMessage(message));
        }

        actions
    }

    /// Release the current connection. Idempotent.
    pub fn close(&mut self) -> Vec<SessionAction> {
        let Some(session) = self.session.as_ref() else {
            return Vec::new();
        };
        if !session.handle().is_live() {
            return Vec::new();
        }

        let connection = session.connection();
        let purpose = session.purpose();
        let mut actions = self.release_current("closed by user");
        info!(%connection, "session closed by user");
        actions.push(SessionAction::status(closed_status(purpose)));
        actions
    }

    /// Process an event from the transport.
    ///
    /// Events for any connection other than the live one are dropped, except
    /// that a late `Opened` is answered with `Close` so the superseded socket
    /// does not linger.
    pub fn handle_transport(&mut self, event: TransportEvent) -> Vec<SessionAction> {
        let connection = event.connection();
        let live = self.session.as_ref().is_some_and(|s| s.accepts(connection));
        if !live {
            debug!(%connection, "dropping event for released connection");
            return match event {
                TransportEvent::Opened(connection) => vec![SessionAction::Close {
                    connection,
                    reason: "connection superseded".to_string(),
                }],
                _ => Vec::new(),
            };
        }

        match event {
            TransportEvent::Opened(_) => self.handle_opened(),
            TransportEvent::Frame { text, .. } => self.handle_frame(&text),
            TransportEvent::Error { message, .. } => {
                warn!(%connection, %message, "transport error");
                vec![SessionAction::ReportError(SessionError::Transport(message))]
            },
            TransportEvent::Closed(_) => self.handle_closed(),
        }
    }

    /// Enforce the handshake timeout.
    ///
    /// Call periodically. An attempt that has not reached an outcome within
    /// `handshake_timeout` of being started is closed.
    pub fn tick(&mut self, now: E::Instant) -> Vec<SessionAction> {
        let Some(session) = self.session.as_ref() else {
            return Vec::new();
        };
        if !session.is_awaiting_outcome() {
            return Vec::new();
        }

        let elapsed = now - session.started_at();
        if elapsed <= self.config.handshake_timeout {
            return Vec::new();
        }

        warn!(connection = %session.connection(), ?elapsed, "no outcome before timeout");
        let mut actions = vec![SessionAction::ReportError(SessionError::HandshakeTimeout { elapsed })];
        actions.extend(self.release_current("handshake timeout"));
        actions
    }

    fn begin(
        &mut self,
        purpose: SessionPurpose,
        username: String,
        password: String,
    ) -> Vec<SessionAction> {
        let credentials = match Credentials::new(username, password) {
            Ok(credentials) => credentials,
            Err(err) => return vec![SessionAction::ReportError(err)],
        };
        let request = match credentials.encode_request(purpose.request_kind()) {
            Ok(request) => request,
            Err(err) => return vec![SessionAction::ReportError(err.into())],
        };

        let mut actions = self.release_current("superseded by a new attempt");

        let connection = ConnectionId::new(self.next_connection);
        self.next_connection = self.next_connection.saturating_add(1);
        info!(%connection, ?purpose, username = credentials.username(), "starting session");

        self.session = Some(Session::new(
            credentials.username().to_string(),
            purpose,
            connection,
            request,
            self.env.now(),
        ));
        self.pending_echoes.clear();

        let status = match purpose {
            SessionPurpose::Register => "Attempting to register...",
            SessionPurpose::Login => "Attempting to connect...",
        };
        actions.push(SessionAction::status(status));
        actions.push(SessionAction::Open { connection, endpoint: self.config.endpoint.clone() });
        actions
    }

    fn handle_opened(&mut self) -> Vec<SessionAction> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        let connection = session.connection();
        if session.handle() != HandleState::Opening {
            warn!(%connection, handle = ?session.handle(), "duplicate open");
            return Vec::new();
        }

        session.set_handle(HandleState::Open);
        let Some(request) = session.take_request() else {
            return Vec::new();
        };
        session.set_phase(AuthPhase::Pending);
        info!(%connection, purpose = ?session.purpose(), "connected, sending credentials");

        let status = match session.purpose() {
            SessionPurpose::Register => "Connected to server, sending registration...",
            SessionPurpose::Login => "Connected to server, sending login credentials...",
        };
        vec![SessionAction::status(status), SessionAction::Send { connection, frame: request }]
    }

    fn handle_frame(&mut self, text: &str) -> Vec<SessionAction> {
        let Some(session) = self.session.as_ref() else {
            return Vec::new();
        };
        if session.handle() != HandleState::Open {
            debug!(connection = %session.connection(), "dropping frame on closing connection");
            return Vec::new();
        }

        match session.purpose() {
            SessionPurpose::Register => self.handle_registration_reply(text),
            SessionPurpose::Login => self.handle_login_frame(text),
        }
    }

    fn handle_registration_reply(&mut self, text: &str) -> Vec<SessionAction> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        let connection = session.connection();
        session.set_handle(HandleState::Closing);

        let is_error = is_registration_refusal(text);
        info!(%connection, refused = is_error, "registration reply received");
        vec![
            SessionAction::ReportStatus { text: format!("Server response: {text}"), is_error },
            SessionAction::Close { connection, reason: "registration complete".to_string() },
        ]
    }

    fn handle_login_frame(&mut self, text: &str) -> Vec<SessionAction> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        let connection = session.connection();

        match (session.phase(), classify(text)) {
            (AuthPhase::Pending, InboundFrame::Auth(AuthSignal::Success)) => {
                session.set_phase(AuthPhase::Authenticated);
                info!(%connection, identity = session.identity(), "authenticated");
                vec![
                    SessionAction::status("Successfully connected and authenticated"),
                    SessionAction::SetSendingEnabled(true),
                ]
            },
            (AuthPhase::Pending, InboundFrame::Auth(AuthSignal::Failure)) => {
                session.set_phase(AuthPhase::Rejected);
                session.set_handle(HandleState::Closing);
                warn!(%connection, identity = session.identity(), "authentication rejected");
                vec![
                    SessionAction::ReportError(SessionError::AuthenticationRejected),
                    SessionAction::Close {
                        connection,
                        reason: "authentication rejected".to_string(),
                    },
                    SessionAction::SetSendingEnabled(false),
                ]
            },
            (AuthPhase::Pending, _) => {
                warn!(%connection, "dropping frame received before authentication");
                vec![SessionAction::status("Ignored message received before authentication")]
            },
            (AuthPhase::Authenticated, InboundFrame::Chat(message)) => self.deliver(message),
            (AuthPhase::Authenticated, InboundFrame::Unparsed(failure)) => {
                warn!(%connection, error = %failure.error, "undecodable frame");
                vec![SessionAction::status(format!("Received: {}", failure.raw))]
            },
            (AuthPhase::Authenticated, InboundFrame::Auth(signal)) => {
                warn!(%connection, ?signal, "auth signal after authentication");
                Vec::new()
            },
            (phase, _) => {
                debug!(%connection, ?phase, "dropping frame");
                Vec::new()
            },
        }
    }

    fn deliver(&mut self, message: ChatMessage) -> Vec<SessionAction> {
        if self.config.echo == EchoPolicy::LocalEcho
            && let Some(index) = self.pending_echoes.iter().position(|sent| *sent == message)
        {
            self.pending_echoes.remove(index);
            debug!("suppressing server echo of local message");
            return Vec::new();
        }

        vec![SessionAction::RenderMessage(message)]
    }

    fn handle_closed(&mut self) -> Vec<SessionAction> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        let connection = session.connection();
        let previous = session.phase();
        session.release();
        info!(%connection, ?previous, phase = ?session.phase(), "connection closed");

        vec![
            SessionAction::status(closed_status(session.purpose())),
            SessionAction::SetSendingEnabled(false),
        ]
    }

    /// Give up the live handle, if any.
    ///
    /// Emits `Close` unless a close is already in flight, and always disables
    /// sending.
    fn release_current(&mut self, reason: &str) -> Vec<SessionAction> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };

        let mut actions = Vec::new();
        match session.handle() {
            HandleState::Opening | HandleState::Open => actions.push(SessionAction::Close {
                connection: session.connection(),
                reason: reason.to_string(),
            }),
            HandleState::Closing => {},
            HandleState::Released => return actions,
        }

        session.release();
        actions.push(SessionAction::SetSendingEnabled(false));
        actions
    }
}

fn closed_status(purpose: SessionPurpose) -> &'static str {
    match purpose {
        SessionPurpose::Register => "Registration connection closed",
        SessionPurpose::Login => "Connection closed",
    }
}
