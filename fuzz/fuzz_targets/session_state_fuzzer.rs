//! Fuzz target for the session controller state machine
//!
//! # Strategy
//!
//! - Operations: register, connect, send, close, transport events, ticks
//! - Connection ids: the current one and stale or unknown ones
//! - Frames: sentinels, chat envelopes, arbitrary text
//!
//! # Invariants
//!
//! - Chat is never rendered unless the session is authenticated
//! - Sending is enabled only while authenticated
//! - A send is only emitted on the current, authenticated connection
//! - At most one connection is open at any time

#![no_main]

use std::{collections::HashSet, time::Duration};

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use wirechat_client::{
    AuthPhase, ConnectionId, ControllerConfig, Environment, ManualEnv, SessionAction,
    SessionController, TransportEvent,
};

#[derive(Debug, Clone, Arbitrary)]
enum Op {
    Register { username: String, password: String },
    Connect { username: String, password: String },
    Send { text: String },
    Close,
    Opened { conn: u8 },
    Frame { conn: u8, frame: FrameChoice },
    Error { conn: u8 },
    Closed { conn: u8 },
    Advance { secs: u8 },
}

#[derive(Debug, Clone, Arbitrary)]
enum FrameChoice {
    Success,
    Failure,
    Chat { from: String, content: String },
    Raw(String),
}

impl FrameChoice {
    fn text(&self) -> String {
        match self {
            Self::Success => "Authentication successful".to_string(),
            Self::Failure => "Authentication failed".to_string(),
            Self::Chat { from, content } => {
                wirechat_proto::encode_chat(&wirechat_proto::ChatMessage::new(
                    from.as_str(),
                    content.as_str(),
                    0,
                ))
                .unwrap_or_default()
            }
            Self::Raw(text) => text.clone(),
        }
    }
}

fuzz_target!(|ops: Vec<Op>| {
    let env = ManualEnv::new(1_700_000_000_000);
    let mut controller = SessionController::new(env.clone(), ControllerConfig::default());
    let mut open: HashSet<ConnectionId> = HashSet::new();

    for op in ops {
        let was_authenticated = controller.auth_phase() == AuthPhase::Authenticated;

        let actions = match op {
            Op::Register { username, password } => controller.register(username, password),
            Op::Connect { username, password } => controller.connect(username, password),
            Op::Send { text } => controller.send(&text),
            Op::Close => controller.close(),
            Op::Opened { conn } => {
                controller.handle_transport(TransportEvent::Opened(ConnectionId::new(conn.into())))
            }
            Op::Frame { conn, frame } => controller.handle_transport(TransportEvent::Frame {
                connection: ConnectionId::new(conn.into()),
                text: frame.text(),
            }),
            Op::Error { conn } => controller.handle_transport(TransportEvent::Error {
                connection: ConnectionId::new(conn.into()),
                message: "fuzz".to_string(),
            }),
            Op::Closed { conn } => {
                let id = ConnectionId::new(conn.into());
                open.remove(&id);
                controller.handle_transport(TransportEvent::Closed(id))
            }
            Op::Advance { secs } => {
                env.advance(Duration::from_secs(secs.into()));
                controller.tick(env.now())
            }
        };

        for action in &actions {
            match action {
                SessionAction::Open { connection, .. } => {
                    open.insert(*connection);
                }
                SessionAction::Close { connection, .. } => {
                    open.remove(connection);
                }
                SessionAction::RenderMessage(_) => {
                    assert!(
                        was_authenticated || controller.auth_phase() == AuthPhase::Authenticated,
                        "chat rendered outside an authenticated session"
                    );
                }
                SessionAction::Send { connection, frame } => {
                    let session = controller.session().expect("send without a session");
                    assert_eq!(*connection, session.connection());
                    // Auth requests go out before authentication; chat only after
                    if wirechat_proto::decode_frame(frame).is_ok() {
                        assert!(controller.is_sending_enabled());
                    }
                }
                _ => {}
            }
        }

        assert!(open.len() <= 1, "more than one open connection: {open:?}");
        if controller.is_sending_enabled() {
            assert_eq!(controller.auth_phase(), AuthPhase::Authenticated);
        }
    }
});
