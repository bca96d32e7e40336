//! Session controller properties and scenarios.
//!
//! The controller is driven with a manual clock and a scripted transport:
//! every test feeds operations and `TransportEvent`s in and inspects the
//! returned actions. No sockets are involved.

use std::time::Duration;

use proptest::prelude::*;
use wirechat_client::{
    AuthPhase, ChatMessage, ConnectionId, ControllerConfig, DEFAULT_HANDSHAKE_TIMEOUT, EchoPolicy,
    Environment, ManualEnv, SessionAction, SessionController, SessionError, TransportEvent,
};

/// Wall-clock reading of the test clock at creation.
const WALL_CLOCK_BASE: i64 = 1_700_000_000_000;

fn controller_with(config: ControllerConfig) -> (SessionController<ManualEnv>, ManualEnv) {
    let env = ManualEnv::new(WALL_CLOCK_BASE);
    (SessionController::new(env.clone(), config), env)
}

fn controller() -> (SessionController<ManualEnv>, ManualEnv) {
    controller_with(ControllerConfig::default())
}

fn frame(id: u64, text: &str) -> TransportEvent {
    TransportEvent::Frame { connection: ConnectionId::new(id), text: text.to_string() }
}

fn opened(id: u64) -> TransportEvent {
    TransportEvent::Opened(ConnectionId::new(id))
}

fn closed(id: u64) -> TransportEvent {
    TransportEvent::Closed(ConnectionId::new(id))
}

/// Log in as alice on connection #1.
fn authenticate(controller: &mut SessionController<ManualEnv>) {
    controller.connect("alice", "pw1");
    controller.handle_transport(opened(1));
    controller.handle_transport(frame(1, "Authentication successful"));
    assert_eq!(controller.auth_phase(), AuthPhase::Authenticated);
}

fn transport_actions(actions: &[SessionAction]) -> Vec<&SessionAction> {
    actions.iter().filter(|a| a.is_transport()).collect()
}

fn rendered(actions: &[SessionAction]) -> Vec<&ChatMessage> {
    actions
        .iter()
        .filter_map(|a| match a {
            SessionAction::RenderMessage(message) => Some(message),
            _ => None,
        })
        .collect()
}

#[test]
fn scenario_successful_login() {
    let (mut controller, _env) = controller();

    let actions = controller.connect("alice", "pw1");
    assert!(actions.iter().any(|a| matches!(a, SessionAction::Open { .. })));

    let actions = controller.handle_transport(opened(1));
    assert!(actions.contains(&SessionAction::Send {
        connection: ConnectionId::new(1),
        frame: r#"{"type":"login","username":"alice","password":"pw1"}"#.to_string(),
    }));
    assert_eq!(controller.auth_phase(), AuthPhase::Pending);

    let actions = controller.handle_transport(frame(1, "Authentication successful"));
    assert!(actions.contains(&SessionAction::SetSendingEnabled(true)));
    assert_eq!(controller.auth_phase(), AuthPhase::Authenticated);
    assert!(controller.is_sending_enabled());
    assert_eq!(controller.session().map(|s| s.identity()), Some("alice"));
}

#[test]
fn scenario_rejected_login() {
    let (mut controller, _env) = controller();
    controller.connect("alice", "pw1");
    controller.handle_transport(opened(1));

    let actions = controller.handle_transport(frame(1, "Authentication failed"));
    assert_eq!(actions, vec![
        SessionAction::ReportError(SessionError::AuthenticationRejected),
        SessionAction::Close {
            connection: ConnectionId::new(1),
            reason: "authentication rejected".to_string()
        },
        SessionAction::SetSendingEnabled(false),
    ]);
    assert_eq!(controller.auth_phase(), AuthPhase::Rejected);
    assert!(!controller.is_sending_enabled());

    // Frames racing the close are not delivered
    let actions = controller.handle_transport(frame(1, r#"{"from":"bob","content":"hi","timestamp":1}"#));
    assert!(actions.is_empty());

    controller.handle_transport(closed(1));
    assert_eq!(controller.auth_phase(), AuthPhase::Closed);
}

#[test]
fn scenario_send_trims_and_clears_input() {
    let (mut controller, env) = controller();
    authenticate(&mut controller);
    env.advance(Duration::from_millis(250));

    let actions = controller.send("  hello  ");
    let expected = format!(
        r#"{{"from":"alice","content":"hello","timestamp":{}}}"#,
        WALL_CLOCK_BASE + 250
    );
    assert_eq!(actions, vec![
        SessionAction::Send { connection: ConnectionId::new(1), frame: expected },
        SessionAction::ClearPendingText,
    ]);
    assert!(rendered(&actions).is_empty());
}

#[test]
fn scenario_inbound_message_is_rendered() {
    let (mut controller, _env) = controller();
    authenticate(&mut controller);

    let actions =
        controller.handle_transport(frame(1, r#"{"from":"bob","content":"hi","timestamp":1234}"#));
    assert_eq!(actions, vec![SessionAction::RenderMessage(ChatMessage::new("bob", "hi", 1234))]);
}

#[test]
fn scenario_send_before_login() {
    let (mut controller, _env) = controller();

    let actions = controller.send("hi");
    assert_eq!(actions, vec![SessionAction::ReportError(SessionError::NotAuthenticated)]);
}

#[test]
fn send_while_pending_is_refused() {
    let (mut controller, _env) = controller();
    controller.connect("alice", "pw1");
    controller.handle_transport(opened(1));

    let actions = controller.send("hi");
    assert_eq!(actions, vec![SessionAction::ReportError(SessionError::NotAuthenticated)]);
}

#[test]
fn undecodable_frame_becomes_status() {
    let (mut controller, _env) = controller();
    authenticate(&mut controller);

    let actions = controller.handle_transport(frame(1, "Welcome to the chat"));
    assert_eq!(actions, vec![SessionAction::status("Received: Welcome to the chat")]);
    assert_eq!(controller.auth_phase(), AuthPhase::Authenticated);
}

#[test]
fn pre_auth_chat_frame_is_dropped() {
    let (mut controller, _env) = controller();
    controller.connect("alice", "pw1");
    controller.handle_transport(opened(1));

    let actions =
        controller.handle_transport(frame(1, r#"{"from":"bob","content":"early","timestamp":5}"#));
    assert!(rendered(&actions).is_empty());
    assert_eq!(actions, vec![SessionAction::status(
        "Ignored message received before authentication"
    )]);
    assert_eq!(controller.auth_phase(), AuthPhase::Pending);
}

#[test]
fn superseding_attempt_closes_previous_connection() {
    let (mut controller, _env) = controller();
    authenticate(&mut controller);

    let actions = controller.connect("bob", "pw2");
    assert_eq!(transport_actions(&actions), vec![
        &SessionAction::Close {
            connection: ConnectionId::new(1),
            reason: "superseded by a new attempt".to_string()
        },
        &SessionAction::Open {
            connection: ConnectionId::new(2),
            endpoint: "ws://localhost:8100".to_string()
        },
    ]);
    assert!(actions.contains(&SessionAction::SetSendingEnabled(false)));

    // Late traffic on the old connection is ignored
    let late = controller
        .handle_transport(frame(1, r#"{"from":"carol","content":"late","timestamp":9}"#));
    assert!(late.is_empty());
    assert!(controller.handle_transport(closed(1)).is_empty());
    assert_eq!(controller.auth_phase(), AuthPhase::Unauthenticated);
    assert_eq!(controller.session().map(|s| s.identity()), Some("bob"));
}

#[test]
fn late_open_on_superseded_connection_is_closed() {
    let (mut controller, _env) = controller();
    controller.connect("alice", "pw1");
    controller.connect("alice", "pw1");

    let actions = controller.handle_transport(opened(1));
    assert_eq!(actions, vec![SessionAction::Close {
        connection: ConnectionId::new(1),
        reason: "connection superseded".to_string(),
    }]);
}

#[test]
fn unexpected_disconnect_closes_session() {
    let (mut controller, _env) = controller();
    authenticate(&mut controller);

    let actions = controller.handle_transport(closed(1));
    assert_eq!(actions, vec![
        SessionAction::status("Connection closed"),
        SessionAction::SetSendingEnabled(false),
    ]);
    assert_eq!(controller.auth_phase(), AuthPhase::Closed);
    assert_eq!(
        controller.send("hi"),
        vec![SessionAction::ReportError(SessionError::NotAuthenticated)]
    );
}

#[test]
fn pending_attempt_times_out() {
    let config =
        ControllerConfig { handshake_timeout: Duration::from_secs(5), ..ControllerConfig::default() };
    let (mut controller, env) = controller_with(config);
    controller.connect("alice", "pw1");
    controller.handle_transport(opened(1));

    env.advance(Duration::from_secs(5));
    assert!(controller.tick(env.now()).is_empty());

    env.advance(Duration::from_secs(1));
    let actions = controller.tick(env.now());
    assert_eq!(actions[0], SessionAction::ReportError(SessionError::HandshakeTimeout {
        elapsed: Duration::from_secs(6)
    }));
    assert!(actions.iter().any(|a| matches!(a, SessionAction::Close { .. })));
    assert_eq!(controller.auth_phase(), AuthPhase::Closed);

    // The sentinel arriving after the timeout no longer counts
    assert!(controller.handle_transport(frame(1, "Authentication successful")).is_empty());
    assert!(controller.tick(env.now()).is_empty());
}

#[test]
fn unanswered_registration_times_out_unauthenticated() {
    let config =
        ControllerConfig { handshake_timeout: Duration::from_secs(5), ..ControllerConfig::default() };
    let (mut controller, env) = controller_with(config);
    controller.register("alice", "pw1");
    controller.handle_transport(opened(1));
    assert_eq!(controller.auth_phase(), AuthPhase::Pending);

    env.advance(Duration::from_secs(6));
    let actions = controller.tick(env.now());
    assert_eq!(actions[0], SessionAction::ReportError(SessionError::HandshakeTimeout {
        elapsed: Duration::from_secs(6)
    }));
    assert_eq!(transport_actions(&actions), vec![&SessionAction::Close {
        connection: ConnectionId::new(1),
        reason: "handshake timeout".to_string(),
    }]);

    // A registration that never completed leaves no login session behind
    assert_eq!(controller.auth_phase(), AuthPhase::Unauthenticated);
    assert!(!controller.is_sending_enabled());

    // The reply arriving after the timeout is ignored
    assert!(controller.handle_transport(frame(1, "Registration successful")).is_empty());
}

#[test]
fn registration_that_never_connects_times_out() {
    let (mut controller, env) = controller();
    controller.register("alice", "pw1");

    env.advance(DEFAULT_HANDSHAKE_TIMEOUT + Duration::from_millis(1));
    let actions = controller.tick(env.now());

    assert!(actions.iter().any(|a| matches!(a, SessionAction::Close { .. })));
    assert_eq!(controller.auth_phase(), AuthPhase::Unauthenticated);
}

#[test]
fn authenticated_session_never_times_out() {
    let (mut controller, env) = controller();
    authenticate(&mut controller);

    env.advance(Duration::from_secs(3600));
    assert!(controller.tick(env.now()).is_empty());
    assert_eq!(controller.auth_phase(), AuthPhase::Authenticated);
}

#[test]
fn local_echo_renders_each_message_once() {
    let config = ControllerConfig { echo: EchoPolicy::LocalEcho, ..ControllerConfig::default() };
    let (mut controller, _env) = controller_with(config);
    authenticate(&mut controller);

    let sent = controller.send("hello");
    let local = rendered(&sent);
    assert_eq!(local.len(), 1);
    let message = local[0].clone();

    let echo = format!(
        r#"{{"from":"alice","content":"hello","timestamp":{}}}"#,
        message.timestamp
    );
    assert!(rendered(&controller.handle_transport(frame(1, &echo))).is_empty());

    // A second identical frame is someone else's business
    assert_eq!(rendered(&controller.handle_transport(frame(1, &echo))), vec![&message]);
}

#[test]
fn server_echo_is_rendered_by_default() {
    let (mut controller, _env) = controller();
    authenticate(&mut controller);

    let sent = controller.send("hello");
    assert!(rendered(&sent).is_empty());

    let echo = format!(r#"{{"from":"alice","content":"hello","timestamp":{WALL_CLOCK_BASE}}}"#);
    assert_eq!(rendered(&controller.handle_transport(frame(1, &echo))).len(), 1);
}

#[test]
fn registration_never_authenticates() {
    let (mut controller, _env) = controller();
    controller.register("alice", "pw1");
    let actions = controller.handle_transport(opened(1));
    assert!(actions.contains(&SessionAction::Send {
        connection: ConnectionId::new(1),
        frame: r#"{"type":"register","username":"alice","password":"pw1"}"#.to_string(),
    }));

    // Even the success sentinel is just a reply here
    controller.handle_transport(frame(1, "Authentication successful"));
    assert!(!controller.is_sending_enabled());
    controller.handle_transport(closed(1));
    assert_eq!(controller.auth_phase(), AuthPhase::Unauthenticated);
}

/// Operations a user or the transport can perform.
#[derive(Debug, Clone)]
enum Op {
    Connect,
    Register,
    Open(u64),
    Sentinel(u64, bool),
    Chat(u64),
    Garbage(u64),
    Disconnect(u64),
    Send(String),
    Close,
    Tick(u64),
}

fn arbitrary_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Connect),
        Just(Op::Register),
        (1..4u64).prop_map(Op::Open),
        (1..4u64, any::<bool>()).prop_map(|(id, ok)| Op::Sentinel(id, ok)),
        (1..4u64).prop_map(Op::Chat),
        (1..4u64).prop_map(Op::Garbage),
        (1..4u64).prop_map(Op::Disconnect),
        "[ a-z]{0,8}".prop_map(Op::Send),
        Just(Op::Close),
        (0..40u64).prop_map(Op::Tick),
    ]
}

fn apply(controller: &mut SessionController<ManualEnv>, env: &ManualEnv, op: Op) -> Vec<SessionAction> {
    match op {
        Op::Connect => controller.connect("alice", "pw1"),
        Op::Register => controller.register("alice", "pw1"),
        Op::Open(id) => controller.handle_transport(opened(id)),
        Op::Sentinel(id, ok) => {
            let text = if ok { "Authentication successful" } else { "Authentication failed" };
            controller.handle_transport(frame(id, text))
        },
        Op::Chat(id) => {
            controller.handle_transport(frame(id, r#"{"from":"bob","content":"hi","timestamp":1}"#))
        },
        Op::Garbage(id) => controller.handle_transport(frame(id, "{not json")),
        Op::Disconnect(id) => controller.handle_transport(closed(id)),
        Op::Send(text) => controller.send(&text),
        Op::Close => controller.close(),
        Op::Tick(secs) => {
            env.advance(Duration::from_secs(secs));
            controller.tick(env.now())
        },
    }
}

proptest! {
    #[test]
    fn prop_auth_requests_never_decode_as_chat(
        username in prop_oneof![Just("from".to_string()), Just("content".to_string()), "[a-z\"{}:,]{1,12}"],
        password in "[a-z\"{}:,]{1,12}",
        register in any::<bool>(),
    ) {
        let (mut controller, _env) = controller();
        if register {
            controller.register(username.clone(), password);
        } else {
            controller.connect(username.clone(), password);
        }
        let actions = controller.handle_transport(opened(1));

        // INVARIANT: whatever the credentials, the auth request is not a chat envelope
        for action in transport_actions(&actions) {
            if let SessionAction::Send { frame, .. } = action {
                prop_assert!(wirechat_proto::decode_frame(frame).is_err());
            }
        }

        if !register {
            controller.handle_transport(frame(1, "Authentication successful"));
            let actions = controller.send("hello");
            let sent: Vec<_> = actions
                .iter()
                .filter_map(|a| match a {
                    SessionAction::Send { frame, .. } => wirechat_proto::decode_frame(frame).ok(),
                    _ => None,
                })
                .collect();
            prop_assert_eq!(sent.len(), 1);
            prop_assert_eq!(&sent[0].from, &username);
        }
    }

    #[test]
    fn prop_empty_credentials_never_touch_transport(
        username in prop_oneof![Just(String::new()), "[a-z]{1,8}"],
        password in prop_oneof![Just(String::new()), "[a-z]{1,8}"],
        register in any::<bool>(),
    ) {
        prop_assume!(username.is_empty() || password.is_empty());
        let (mut controller, _env) = controller();

        let actions = if register {
            controller.register(username, password)
        } else {
            controller.connect(username, password)
        };

        // PROPERTY: only a validation error, no connection attempt
        prop_assert_eq!(actions, vec![SessionAction::ReportError(SessionError::Validation)]);
        prop_assert!(controller.session().is_none());
    }

    #[test]
    fn prop_send_only_when_authenticated(ops in prop::collection::vec(arbitrary_op(), 0..30)) {
        let (mut controller, env) = controller();

        for op in ops {
            let authenticated = controller.auth_phase() == AuthPhase::Authenticated
                && controller.is_sending_enabled();
            let is_send = matches!(op, Op::Send(_));
            let actions = apply(&mut controller, &env, op);

            if is_send {
                let sent = actions.iter().any(|a| matches!(a, SessionAction::Send { .. }));
                // PROPERTY: a chat frame goes out only from an authenticated session
                prop_assert!(!sent || authenticated);
                if !authenticated {
                    prop_assert_eq!(
                        &actions,
                        &vec![SessionAction::ReportError(SessionError::NotAuthenticated)]
                    );
                }
            }
        }
    }

    #[test]
    fn prop_chat_is_never_rendered_before_authentication(
        ops in prop::collection::vec(arbitrary_op(), 0..30),
    ) {
        let (mut controller, env) = controller();

        for op in ops {
            let authenticated = controller.auth_phase() == AuthPhase::Authenticated;
            let actions = apply(&mut controller, &env, op);

            // PROPERTY: inbound chat reaches the presenter only after Success
            if !authenticated {
                prop_assert!(rendered(&actions).is_empty());
            }
        }
    }

    #[test]
    fn prop_non_sentinel_frames_keep_phase(
        ops in prop::collection::vec(arbitrary_op(), 0..20),
        junk in any::<String>(),
    ) {
        prop_assume!(junk != "Authentication successful" && junk != "Authentication failed");
        let (mut controller, env) = controller();
        for op in ops {
            apply(&mut controller, &env, op);
        }

        let Some(connection) = controller.session().map(|s| s.connection()) else {
            return Ok(());
        };
        let before = controller.auth_phase();

        controller.handle_transport(TransportEvent::Frame { connection, text: junk });

        // PROPERTY: only a sentinel or a disconnect moves the session
        prop_assert_eq!(controller.auth_phase(), before);
    }

    #[test]
    fn prop_close_is_idempotent(ops in prop::collection::vec(arbitrary_op(), 0..30)) {
        let (mut controller, env) = controller();
        for op in ops {
            apply(&mut controller, &env, op);
        }

        controller.close();
        let phase = controller.auth_phase();

        // PROPERTY: a second close does nothing
        prop_assert!(controller.close().is_empty());
        prop_assert_eq!(controller.auth_phase(), phase);
        prop_assert!(!controller.is_sending_enabled());
    }

    #[test]
    fn prop_at_most_one_connection_live(ops in prop::collection::vec(arbitrary_op(), 0..40)) {
        let (mut controller, env) = controller();
        let mut live: Vec<ConnectionId> = Vec::new();

        for op in ops {
            let disconnected = match op {
                Op::Disconnect(id) => Some(ConnectionId::new(id)),
                _ => None,
            };
            for action in apply(&mut controller, &env, op) {
                match action {
                    SessionAction::Open { connection, .. } => live.push(connection),
                    SessionAction::Close { connection, .. } => live.retain(|c| *c != connection),
                    _ => {},
                }
            }
            if let Some(gone) = disconnected {
                live.retain(|c| *c != gone);
            }
            // PROPERTY: every superseded connection was told to close
            prop_assert!(live.len() <= 1, "live connections: {:?}", live);
        }
    }
}
