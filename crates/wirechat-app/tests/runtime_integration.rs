//! Runtime integration tests.
//!
//! Drive the real [`Runtime`] with a scripted driver: keystrokes come from a
//! script and a fake chat server inside the driver answers transport actions
//! the way the real one does.

use std::{
    collections::VecDeque,
    convert::Infallible,
    sync::{Arc, Mutex},
    time::Duration,
};

use wirechat_app::{App, AppEvent, Driver, KeyInput, Runtime};
use wirechat_client::{
    AuthPhase, ConnectionId, ControllerConfig, Environment, ManualEnv, SessionAction,
    TransportEvent, env::VirtualInstant,
};

/// One scripted step.
enum Step {
    /// Type a line and press Enter.
    Line(&'static str),
    /// Press a single key.
    Key(KeyInput),
    /// Let virtual time pass and deliver a tick.
    Advance(Duration),
}

/// How the fake server treats login requests.
#[derive(Clone, Copy)]
enum Server {
    Accepting,
    Rejecting,
    Silent,
}

/// What the driver observed, shared with the test.
#[derive(Default)]
struct Observed {
    executed: Vec<SessionAction>,
    last_render: Option<App>,
    stopped: bool,
}

struct ScriptedDriver {
    env: ManualEnv,
    server: Server,
    script: VecDeque<Step>,
    inbox: VecDeque<AppEvent>,
    observed: Arc<Mutex<Observed>>,
}

impl ScriptedDriver {
    fn new(env: ManualEnv, server: Server, script: Vec<Step>) -> (Self, Arc<Mutex<Observed>>) {
        let observed = Arc::new(Mutex::new(Observed::default()));
        let driver = Self {
            env,
            server,
            script: script.into(),
            inbox: VecDeque::new(),
            observed: Arc::clone(&observed),
        };
        (driver, observed)
    }

    fn reply(&mut self, connection: ConnectionId, text: &str) {
        self.inbox.push_back(AppEvent::Transport(TransportEvent::Frame {
            connection,
            text: text.to_string(),
        }));
    }
}

impl Driver for ScriptedDriver {
    type Error = Infallible;
    type Instant = VirtualInstant;

    async fn poll_event(&mut self) -> Result<Option<AppEvent>, Self::Error> {
        if let Some(event) = self.inbox.pop_front() {
            return Ok(Some(event));
        }

        let event = match self.script.pop_front() {
            Some(Step::Line(line)) => {
                for c in line.chars() {
                    self.inbox.push_back(AppEvent::Key(KeyInput::Char(c)));
                }
                self.inbox.push_back(AppEvent::Key(KeyInput::Enter));
                self.inbox.pop_front()
            },
            Some(Step::Key(key)) => Some(AppEvent::Key(key)),
            Some(Step::Advance(duration)) => {
                self.env.advance(duration);
                Some(AppEvent::Tick)
            },
            None => Some(AppEvent::Key(KeyInput::Esc)),
        };
        Ok(event)
    }

    fn execute(&mut self, action: SessionAction) -> Result<(), Self::Error> {
        match &action {
            SessionAction::Open { connection, .. } => {
                self.inbox.push_back(AppEvent::Transport(TransportEvent::Opened(*connection)));
            },
            SessionAction::Send { connection, frame } => {
                if frame.contains(r#""type":"login""#) {
                    match self.server {
                        Server::Accepting => self.reply(*connection, "Authentication successful"),
                        Server::Rejecting => self.reply(*connection, "Authentication failed"),
                        Server::Silent => {},
                    }
                } else if frame.contains(r#""type":"register""#) {
                    self.reply(*connection, "Registration successful");
                } else {
                    // Chat frames are broadcast back to the sender
                    self.reply(*connection, frame);
                }
            },
            SessionAction::Close { connection, .. } => {
                self.inbox.push_back(AppEvent::Transport(TransportEvent::Closed(*connection)));
            },
            _ => {},
        }
        self.observed.lock().unwrap().executed.push(action);
        Ok(())
    }

    fn now(&self) -> Self::Instant {
        self.env.now()
    }

    fn render(&mut self, app: &App) -> Result<(), Self::Error> {
        self.observed.lock().unwrap().last_render = Some(app.clone());
        Ok(())
    }

    fn stop(&mut self) {
        self.observed.lock().unwrap().stopped = true;
    }
}

async fn run(server: Server, script: Vec<Step>) -> Observed {
    let env = ManualEnv::new(1_700_000_000_000);
    let (driver, observed) = ScriptedDriver::new(env.clone(), server, script);
    let runtime = Runtime::new(driver, env, ControllerConfig::default());
    runtime.run().await.unwrap();
    Arc::try_unwrap(observed).ok().unwrap().into_inner().unwrap()
}

#[tokio::test]
async fn login_and_chat() {
    let observed = run(Server::Accepting, vec![
        Step::Line("/connect alice pw1"),
        Step::Line("  hello  "),
        Step::Key(KeyInput::Char('x')),
    ])
    .await;

    let app = observed.last_render.unwrap();
    let messages: Vec<_> =
        app.messages().iter().map(|m| (m.from.as_str(), m.content.as_str())).collect();
    assert_eq!(messages, vec![("alice", "hello")]);
    assert!(app.is_sending_enabled());
    assert_eq!(app.phase(), AuthPhase::Authenticated);
    assert_eq!(app.input().buffer(), "x");

    // Quitting closes the session before stopping
    assert!(matches!(observed.executed.last(), Some(SessionAction::Close { .. })));
    assert!(observed.stopped);
}

#[tokio::test]
async fn send_before_login_keeps_draft() {
    let observed = run(Server::Accepting, vec![Step::Line("hi")]).await;

    let app = observed.last_render.unwrap();
    assert_eq!(app.input().buffer(), "hi");
    assert!(app.status().is_some_and(|s| s.is_error));
    assert!(observed.executed.is_empty());
}

#[tokio::test]
async fn rejected_login_disables_input() {
    let observed = run(Server::Rejecting, vec![Step::Line("/connect alice nope")]).await;

    let app = observed.last_render.unwrap();
    assert!(!app.is_sending_enabled());
    assert_eq!(app.phase(), AuthPhase::Closed);
    assert!(app.messages().is_empty());
}

#[tokio::test]
async fn registration_round_trip() {
    let observed = run(Server::Accepting, vec![Step::Line("/register alice pw1")]).await;

    let app = observed.last_render.unwrap();
    assert_eq!(app.phase(), AuthPhase::Unauthenticated);
    assert_eq!(
        app.status().map(|s| s.text.as_str()),
        Some("Registration connection closed")
    );
}

#[tokio::test]
async fn silent_server_times_out() {
    let observed = run(Server::Silent, vec![
        Step::Line("/connect alice pw1"),
        Step::Advance(Duration::from_secs(10)),
        Step::Advance(Duration::from_secs(25)),
    ])
    .await;

    let app = observed.last_render.unwrap();
    assert_eq!(app.phase(), AuthPhase::Closed);
    assert!(app.status().is_some_and(|s| s.is_error));

    let opens = observed.executed.iter().filter(|a| matches!(a, SessionAction::Open { .. })).count();
    let closes =
        observed.executed.iter().filter(|a| matches!(a, SessionAction::Close { .. })).count();
    assert_eq!((opens, closes), (1, 1));
}
