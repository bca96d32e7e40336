//! Generic runtime for application orchestration.
//!
//! The Runtime drives the application event loop, coordinating between:
//! - [`App`]: UI state machine and presenter
//! - [`Bridge`]: Session bridge to the controller
//! - [`Driver`]: Platform-specific I/O

use wirechat_client::{ControllerConfig, Environment};

use crate::{App, AppAction, AppEvent, Bridge, Driver};

/// Generic runtime that orchestrates App, Bridge, and Driver.
///
/// # Type Parameters
///
/// - `D`: Platform-specific I/O driver
/// - `E`: Environment supplying time to the controller
pub struct Runtime<D, E>
where
    D: Driver,
    E: Environment,
{
    driver: D,
    app: App,
    bridge: Bridge<E>,
}

impl<D, E> Runtime<D, E>
where
    D: Driver<Instant = E::Instant>,
    E: Environment,
{
    /// Create a new runtime with the given driver, environment and
    /// controller configuration.
    pub fn new(driver: D, env: E, config: ControllerConfig) -> Self {
        let app = App::new(config.endpoint.clone());
        let bridge = Bridge::new(env, config);
        Self { driver, app, bridge }
    }

    /// Run the main event loop until the user quits.
    ///
    /// Each cycle polls one event from the driver and routes it:
    /// 1. Transport events and ticks go to the bridge
    /// 2. Everything else goes to the App, whose actions are executed
    /// 3. Transport actions queued by the bridge are handed to the driver
    ///
    /// On quit the session is closed before the driver stops.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn run(mut self) -> Result<(), D::Error> {
        self.driver.render(&self.app)?;

        loop {
            if self.process_cycle().await? {
                break;
            }
        }

        self.bridge.process_app_action(AppAction::Close, &mut self.app);
        self.flush_outgoing()?;
        self.driver.stop();
        Ok(())
    }

    /// Process one cycle of the event loop.
    ///
    /// Returns `true` if the application should quit.
    async fn process_cycle(&mut self) -> Result<bool, D::Error> {
        let Some(event) = self.driver.poll_event().await? else {
            return Ok(false);
        };

        match event {
            AppEvent::Transport(event) => {
                let changed = self.bridge.handle_transport(event, &mut self.app);
                self.flush_outgoing()?;
                if changed {
                    self.driver.render(&self.app)?;
                }
                Ok(false)
            },
            AppEvent::Tick => {
                let now = self.driver.now();
                let changed = self.bridge.handle_tick(now, &mut self.app);
                self.flush_outgoing()?;
                if changed {
                    self.driver.render(&self.app)?;
                }
                Ok(false)
            },
            event @ (AppEvent::Key(_) | AppEvent::Resize(..)) => {
                let actions = self.app.handle(event);
                self.process_actions(actions)
            },
        }
    }

    /// Process actions returned by the App.
    ///
    /// Returns `true` if should quit.
    fn process_actions(&mut self, actions: Vec<AppAction>) -> Result<bool, D::Error> {
        for action in actions {
            match action {
                AppAction::Render => self.driver.render(&self.app)?,
                AppAction::Quit => return Ok(true),
                AppAction::Register | AppAction::Connect | AppAction::Send | AppAction::Close => {
                    tracing::debug!(?action, "session action");
                    self.bridge.process_app_action(action, &mut self.app);
                    self.flush_outgoing()?;
                },
            }
        }
        Ok(false)
    }

    /// Hand all queued transport actions to the driver.
    fn flush_outgoing(&mut self) -> Result<(), D::Error> {
        for action in self.bridge.take_outgoing() {
            self.driver.execute(action)?;
        }
        Ok(())
    }
}
