//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] trait decouples the application runtime from specific I/O
//! implementations. Each frontend implements the trait to provide
//! platform-specific I/O, while the generic [`crate::Runtime`] handles all
//! orchestration.

use std::{future::Future, ops::Sub, time::Duration};

use wirechat_client::SessionAction;

use crate::{App, AppEvent};

/// Abstracts I/O operations for the application runtime.
///
/// Implementations provide platform-specific I/O while the generic
/// [`Runtime`](crate::Runtime) handles orchestration logic. This ensures
/// the same orchestration code runs in the terminal and in tests.
///
/// # Implementations
///
/// - **TUI**: crossterm for terminal events, tokio-tungstenite for WebSocket
/// - **Tests**: scripted events and a recorded transport
///
/// # Associated Types
///
/// - [`Error`](Driver::Error): Platform-specific error type
/// - [`Instant`](Driver::Instant): Time representation (real or virtual)
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Time instant type. Enables virtual time in tests.
    type Instant: Copy + Ord + Send + Sync + Sub<Output = Duration>;

    /// Wait for the next input event.
    ///
    /// Terminal input, transport events and periodic ticks all arrive here.
    /// Returns `None` if nothing happened before the driver's poll interval.
    fn poll_event(&mut self) -> impl Future<Output = Result<Option<AppEvent>, Self::Error>> + Send;

    /// Execute a transport action (`Open`, `Send` or `Close`).
    ///
    /// Outcomes are reported later as [`AppEvent::Transport`]. Other actions
    /// are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the action could not be handed to the transport.
    fn execute(&mut self, action: SessionAction) -> Result<(), Self::Error>;

    /// Current time instant.
    fn now(&self) -> Self::Instant;

    /// Render the application state.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render(&mut self, app: &App) -> Result<(), Self::Error>;

    /// Stop all connections and clean up resources.
    fn stop(&mut self);
}
