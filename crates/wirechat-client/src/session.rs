//! Session value.
//!
//! A [`Session`] is one connection attempt and everything that follows from
//! it. The [`SessionController`](crate::SessionController) owns at most one;
//! a new `register`/`connect` replaces it and releases the old handle.
//!
//! # State Machine
//!
//! ```text
//! ┌─────────────────┐ Opened ┌─────────┐  Success   ┌───────────────┐
//! │ Unauthenticated │───────>│ Pending │───────────>│ Authenticated │
//! └─────────────────┘        └─────────┘            └───────────────┘
//!                                 │ Failure                 │
//!                                 ↓                         │ Closed/close()
//!                            ┌──────────┐  Closed      ┌────────┐
//!                            │ Rejected │─────────────>│ Closed │
//!                            └──────────┘              └────────┘
//! ```
//!
//! Any phase moves to `Closed` when the transport disconnects or on
//! `close()`. Registration sessions end in `Unauthenticated` instead, since
//! they never authenticate.

use std::fmt;

use wirechat_proto::RequestKind;

/// Handle of one transport connection.
///
/// Minted by the controller, strictly increasing. Transport events carry the
/// id of the connection they came from so late events from a superseded
/// connection can be told apart and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Wrap a raw id.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Authentication phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthPhase {
    /// No request sent yet (connecting), or a registration finished
    Unauthenticated,
    /// Request sent, waiting for the outcome
    Pending,
    /// Login accepted; chat traffic allowed
    Authenticated,
    /// Login refused by the server
    Rejected,
    /// Login session ended
    Closed,
}

/// What a session was opened for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionPurpose {
    /// Single-shot account creation
    Register,
    /// Authenticated chat session
    Login,
}

impl SessionPurpose {
    /// Request kind sent when the connection opens.
    pub fn request_kind(self) -> RequestKind {
        match self {
            Self::Register => RequestKind::Register,
            Self::Login => RequestKind::Login,
        }
    }

    /// Phase a session of this purpose settles in once its connection is
    /// gone.
    pub fn ended_phase(self) -> AuthPhase {
        match self {
            Self::Register => AuthPhase::Unauthenticated,
            Self::Login => AuthPhase::Closed,
        }
    }
}

/// Lifecycle of the session's connection handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleState {
    /// `Open` requested, transport not yet connected
    Opening,
    /// Transport connected
    Open,
    /// We asked the transport to close; waiting for it to report `Closed`
    Closing,
    /// Handle released; no further events are accepted for it
    Released,
}

impl HandleState {
    /// Whether the transport may still deliver events for this handle.
    pub fn is_live(self) -> bool {
        !matches!(self, Self::Released)
    }
}

/// One connection attempt and its authentication state.
///
/// Generic over `I` (Instant type) so tests can use virtual time.
#[derive(Debug, Clone)]
pub struct Session<I> {
    identity: String,
    purpose: SessionPurpose,
    phase: AuthPhase,
    connection: ConnectionId,
    handle: HandleState,
    /// Encoded auth request, taken when the transport opens.
    request: Option<String>,
    started_at: I,
}

impl<I: Copy> Session<I> {
    pub(crate) fn new(
        identity: String,
        purpose: SessionPurpose,
        connection: ConnectionId,
        request: String,
        started_at: I,
    ) -> Self {
        Self {
            identity,
            purpose,
            phase: AuthPhase::Unauthenticated,
            connection,
            handle: HandleState::Opening,
            request: Some(request),
            started_at,
        }
    }

    /// Name the user authenticated (or is authenticating) as.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Register or login.
    pub fn purpose(&self) -> SessionPurpose {
        self.purpose
    }

    /// Current authentication phase.
    pub fn phase(&self) -> AuthPhase {
        self.phase
    }

    /// The session's connection handle.
    pub fn connection(&self) -> ConnectionId {
        self.connection
    }

    /// Lifecycle of the connection handle.
    pub fn handle(&self) -> HandleState {
        self.handle
    }

    /// When the attempt started.
    pub fn started_at(&self) -> I {
        self.started_at
    }

    /// Whether an event tagged `connection` belongs to this session.
    pub fn accepts(&self, connection: ConnectionId) -> bool {
        self.connection == connection && self.handle.is_live()
    }

    /// Whether the attempt is still waiting for an outcome.
    pub fn is_awaiting_outcome(&self) -> bool {
        matches!(self.handle, HandleState::Opening | HandleState::Open)
            && matches!(self.phase, AuthPhase::Unauthenticated | AuthPhase::Pending)
    }

    /// Whether chat messages may be sent.
    pub fn can_send(&self) -> bool {
        self.phase == AuthPhase::Authenticated && self.handle == HandleState::Open
    }

    pub(crate) fn set_phase(&mut self, phase: AuthPhase) {
        self.phase = phase;
    }

    pub(crate) fn set_handle(&mut self, handle: HandleState) {
        self.handle = handle;
    }

    pub(crate) fn take_request(&mut self) -> Option<String> {
        self.request.take()
    }

    /// Release the handle and settle in the purpose's ended phase.
    pub(crate) fn release(&mut self) {
        self.handle = HandleState::Released;
        self.request = None;
        self.phase = self.purpose.ended_phase();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(purpose: SessionPurpose) -> Session<u64> {
        Session::new("alice".into(), purpose, ConnectionId::new(1), "{}".into(), 0)
    }

    #[test]
    fn new_session_is_opening() {
        let session = session(SessionPurpose::Login);
        assert_eq!(session.phase(), AuthPhase::Unauthenticated);
        assert_eq!(session.handle(), HandleState::Opening);
        assert!(session.is_awaiting_outcome());
        assert!(!session.can_send());
    }

    #[test]
    fn release_settles_by_purpose() {
        let mut login = session(SessionPurpose::Login);
        login.set_phase(AuthPhase::Authenticated);
        login.release();
        assert_eq!(login.phase(), AuthPhase::Closed);
        assert!(!login.accepts(ConnectionId::new(1)));

        let mut register = session(SessionPurpose::Register);
        register.set_phase(AuthPhase::Pending);
        register.release();
        assert_eq!(register.phase(), AuthPhase::Unauthenticated);
    }

    #[test]
    fn accepts_only_own_connection() {
        let session = session(SessionPurpose::Login);
        assert!(session.accepts(ConnectionId::new(1)));
        assert!(!session.accepts(ConnectionId::new(2)));
    }

    #[test]
    fn request_is_taken_once() {
        let mut session = session(SessionPurpose::Login);
        assert_eq!(session.take_request().as_deref(), Some("{}"));
        assert_eq!(session.take_request(), None);
    }

    #[test]
    fn connection_id_display() {
        assert_eq!(ConnectionId::new(7).to_string(), "#7");
    }
}
