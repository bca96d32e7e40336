//! Session-to-Application translation layer.
//!
//! The [`Bridge`] wraps the Sans-IO [`SessionController`] and adapts it to
//! the application lifecycle.
//!
//! # Responsibilities
//!
//! - Turns session [`AppAction`]s into controller operations, reading
//!   credentials and the message draft from the [`Presenter`].
//! - Applies presentation actions (messages, statuses, the sending switch)
//!   to the [`Presenter`] immediately.
//! - Accumulates transport actions (`Open`, `Send`, `Close`) for the driver
//!   to execute in the next I/O cycle.
//! - Passes time ticks through generically, so tests can use virtual time.

use wirechat_client::{
    ControllerConfig, Environment, Session, SessionAction, SessionController, TransportEvent,
};

use crate::{AppAction, Presenter};

/// Bridge between the App and the session controller.
///
/// Generic over Environment to support both production and tests.
/// The Instant type is determined by the Environment's associated type.
pub struct Bridge<E: Environment> {
    controller: SessionController<E>,
    outgoing: Vec<SessionAction>,
}

impl<E: Environment> Bridge<E> {
    /// Create a new Bridge with the given environment and configuration.
    pub fn new(env: E, config: ControllerConfig) -> Self {
        Self { controller: SessionController::new(env, config), outgoing: Vec::new() }
    }

    /// The wrapped controller.
    pub fn controller(&self) -> &SessionController<E> {
        &self.controller
    }

    /// Execute a session action from the App.
    ///
    /// Returns true if the presenter changed. Non-session actions are
    /// ignored.
    pub fn process_app_action<P: Presenter>(&mut self, action: AppAction, presenter: &mut P) -> bool {
        let actions = match action {
            AppAction::Register => {
                let (username, password) = presenter.credentials();
                self.controller.register(username, password)
            },
            AppAction::Connect => {
                let (username, password) = presenter.credentials();
                self.controller.connect(username, password)
            },
            AppAction::Send => {
                let text = presenter.pending_text().to_string();
                self.controller.send(&text)
            },
            AppAction::Close => self.controller.close(),
            AppAction::Render | AppAction::Quit => return false,
        };
        self.apply(actions, presenter)
    }

    /// Handle an event from the transport.
    pub fn handle_transport<P: Presenter>(&mut self, event: TransportEvent, presenter: &mut P) -> bool {
        let actions = self.controller.handle_transport(event);
        self.apply(actions, presenter)
    }

    /// Process a time tick.
    pub fn handle_tick<P: Presenter>(&mut self, now: E::Instant, presenter: &mut P) -> bool {
        let actions = self.controller.tick(now);
        self.apply(actions, presenter)
    }

    /// Take pending transport actions.
    pub fn take_outgoing(&mut self) -> Vec<SessionAction> {
        std::mem::take(&mut self.outgoing)
    }

    /// Route controller actions. Returns true if the presenter was touched.
    fn apply<P: Presenter>(&mut self, actions: Vec<SessionAction>, presenter: &mut P) -> bool {
        if actions.is_empty() {
            return false;
        }

        let mut presented = false;
        for action in actions {
            match action {
                SessionAction::Open { .. } | SessionAction::Send { .. } | SessionAction::Close { .. } => {
                    self.outgoing.push(action);
                    continue;
                },
                SessionAction::RenderMessage(message) => presenter.render_message(&message),
                SessionAction::ReportStatus { text, is_error } => presenter.render_status(&text, is_error),
                SessionAction::ReportError(err) => presenter.render_status(&err.to_string(), true),
                SessionAction::SetSendingEnabled(enabled) => presenter.set_sending_enabled(enabled),
                SessionAction::ClearPendingText => presenter.clear_pending_text(),
            }
            presented = true;
        }

        presenter.show_session(
            self.controller.auth_phase(),
            self.controller.session().map(Session::identity),
        );
        presented
    }
}
