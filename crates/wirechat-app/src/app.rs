//! Application state machine.
//!
//! This module defines the [`App`] state machine, which manages the
//! interactive state of the application completely decoupled from I/O and
//! protocol mechanics.
//!
//! This is a pure state machine: it consumes [`crate::AppEvent`] inputs and
//! produces [`crate::AppAction`] instructions for the runtime to execute. It
//! is also the [`Presenter`] the session bridge reports into.
//!
//! # Responsibilities
//!
//! - Edits the input line and turns submitted lines into commands.
//! - Keeps the conversation, the status line and the sending switch.
//! - Mirrors the session phase and identity for the status bar.

use std::collections::VecDeque;

use wirechat_client::AuthPhase;
use wirechat_proto::ChatMessage;

use crate::{
    AppAction, AppEvent, InputState, KeyInput, Presenter,
    commands::{self, Command},
};

/// Conversation length kept in memory. Oldest messages are dropped first.
pub const MAX_MESSAGES: usize = 1000;

/// Latest status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    /// Text to show.
    pub text: String,
    /// Render as an error.
    pub is_error: bool,
}

/// Application state machine.
///
/// Pure state machine that processes events and produces actions.
/// No I/O dependencies - fully testable without a terminal.
#[derive(Debug, Clone)]
pub struct App {
    /// Server URL, for display.
    endpoint: String,
    /// Conversation, oldest first.
    messages: VecDeque<ChatMessage>,
    /// Latest status line. `None` until something happens.
    status: Option<StatusLine>,
    /// Whether the message input accepts text for sending.
    sending_enabled: bool,
    /// Credentials from the last `/register` or `/connect`.
    username: String,
    password: String,
    /// Input line, doubling as the message draft.
    input: InputState,
    /// Session phase as last reported by the bridge.
    phase: AuthPhase,
    /// Session identity as last reported by the bridge.
    identity: Option<String>,
    /// Terminal dimensions (columns, rows).
    terminal_size: (u16, u16),
}

impl App {
    /// Create a new App for the given server URL.
    pub fn new(endpoint: String) -> Self {
        Self {
            endpoint,
            messages: VecDeque::new(),
            status: None,
            sending_enabled: false,
            username: String::new(),
            password: String::new(),
            input: InputState::new(),
            phase: AuthPhase::Unauthenticated,
            identity: None,
            terminal_size: (80, 24),
        }
    }

    /// Process an event and return actions.
    ///
    /// Transport events are not for the App; the runtime routes them to the
    /// bridge.
    pub fn handle(&mut self, event: AppEvent) -> Vec<AppAction> {
        match event {
            AppEvent::Key(key) => self.handle_key(key),
            AppEvent::Resize(cols, rows) => {
                self.terminal_size = (cols, rows);
                vec![AppAction::Render]
            },
            AppEvent::Tick | AppEvent::Transport(_) => vec![],
        }
    }

    fn set_error(&mut self, text: impl Into<String>) {
        self.status = Some(StatusLine { text: text.into(), is_error: true });
    }

    fn handle_key(&mut self, key: KeyInput) -> Vec<AppAction> {
        match key {
            KeyInput::Esc => vec![AppAction::Quit],
            KeyInput::Enter => self.handle_enter(),
            key => {
                if self.input.edit(key) {
                    vec![AppAction::Render]
                } else {
                    vec![]
                }
            },
        }
    }

    /// Handle Enter: run a command, or ask for the draft to be sent.
    ///
    /// A chat draft stays in the input until the controller confirms it went
    /// out, so a refused send keeps the user's text.
    fn handle_enter(&mut self) -> Vec<AppAction> {
        if self.input.buffer().is_empty() {
            return vec![];
        }

        match commands::parse(self.input.buffer()) {
            Command::Message { .. } => vec![AppAction::Send, AppAction::Render],
            Command::Register { username, password } => {
                self.input.clear();
                self.username = username;
                self.password = password;
                vec![AppAction::Register, AppAction::Render]
            },
            Command::Connect { username, password } => {
                self.input.clear();
                self.username = username;
                self.password = password;
                vec![AppAction::Connect, AppAction::Render]
            },
            Command::Close => {
                self.input.clear();
                vec![AppAction::Close, AppAction::Render]
            },
            Command::Quit => vec![AppAction::Quit],
            Command::Unknown { input } => {
                self.input.clear();
                self.set_error(format!("Unknown command: /{input}"));
                vec![AppAction::Render]
            },
            Command::InvalidArgs { command, error } => {
                self.input.clear();
                self.set_error(format!("/{command}: {error}"));
                vec![AppAction::Render]
            },
        }
    }

    /// Server URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Conversation, oldest first.
    pub fn messages(&self) -> &VecDeque<ChatMessage> {
        &self.messages
    }

    /// Latest status line. `None` until something happens.
    pub fn status(&self) -> Option<&StatusLine> {
        self.status.as_ref()
    }

    /// Whether the message input is enabled.
    pub fn is_sending_enabled(&self) -> bool {
        self.sending_enabled
    }

    /// The input line.
    pub fn input(&self) -> &InputState {
        &self.input
    }

    /// Session phase for the status bar.
    pub fn phase(&self) -> AuthPhase {
        self.phase
    }

    /// Who the session is for, if one was started.
    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    /// Terminal dimensions (columns, rows).
    pub fn terminal_size(&self) -> (u16, u16) {
        self.terminal_size
    }
}

impl Presenter for App {
    fn render_message(&mut self, message: &ChatMessage) {
        if self.messages.len() >= MAX_MESSAGES {
            self.messages.pop_front();
        }
        self.messages.push_back(message.clone());
    }

    fn render_status(&mut self, text: &str, is_error: bool) {
        self.status = Some(StatusLine { text: text.to_string(), is_error });
    }

    fn set_sending_enabled(&mut self, enabled: bool) {
        self.sending_enabled = enabled;
    }

    fn credentials(&self) -> (String, String) {
        (self.username.clone(), self.password.clone())
    }

    fn pending_text(&self) -> &str {
        self.input.buffer()
    }

    fn clear_pending_text(&mut self) {
        self.input.clear();
    }

    fn show_session(&mut self, phase: AuthPhase, identity: Option<&str>) {
        self.phase = phase;
        self.identity = identity.map(str::to_string);
    }
}
