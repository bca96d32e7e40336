//! Presentation collaborator contract.
//!
//! The session layer never touches widgets. It pushes results into a
//! [`Presenter`] and pulls user input (credentials, the message draft) out of
//! it, so any UI that implements this trait can host a session.

use wirechat_client::AuthPhase;
use wirechat_proto::ChatMessage;

/// What the session layer needs from a user interface.
pub trait Presenter {
    /// Append a chat message to the conversation view.
    fn render_message(&mut self, message: &ChatMessage);

    /// Replace the status line.
    fn render_status(&mut self, text: &str, is_error: bool);

    /// Enable or disable the message input.
    fn set_sending_enabled(&mut self, enabled: bool);

    /// Username and password as currently entered.
    fn credentials(&self) -> (String, String);

    /// Message draft as currently entered.
    fn pending_text(&self) -> &str;

    /// Empty the message draft.
    fn clear_pending_text(&mut self);

    /// Session summary after every controller step.
    ///
    /// For status displays; the default ignores it.
    fn show_session(&mut self, _phase: AuthPhase, _identity: Option<&str>) {}
}
