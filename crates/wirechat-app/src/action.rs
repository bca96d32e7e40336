//! Application side-effects and intents.
//!
//! This module defines the [`AppAction`] enum, which represents instructions
//! produced by the [`crate::App`] state machine for the runtime to execute.

/// Actions produced by the App state machine.
///
/// Session actions carry no data: the [`crate::Bridge`] reads credentials and
/// the pending message from the [`crate::Presenter`] when it executes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    /// Render the UI.
    Render,

    /// Quit the application.
    Quit,

    /// Register an account with the stored credentials.
    Register,

    /// Log in with the stored credentials.
    Connect,

    /// Send the pending text as a chat message.
    Send,

    /// Close the current session.
    Close,
}

impl AppAction {
    /// Whether this action is executed by the session bridge.
    pub fn is_session(self) -> bool {
        matches!(self, Self::Register | Self::Connect | Self::Send | Self::Close)
    }
}
