//! Application input events.
//!
//! This module defines [`AppEvent`], the set of inputs that drive the
//! [`crate::Runtime`].
//!
//! Events originate from two distinct sources:
//! - User interactions (keyboard, resize) and system ticks.
//! - Transport notifications for the session controller.

use wirechat_client::TransportEvent;

use crate::KeyInput;

/// Events polled from a [`crate::Driver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Keyboard input.
    Key(KeyInput),

    /// Periodic tick. Drives the handshake timeout.
    Tick,

    /// Terminal resize (columns, rows).
    Resize(u16, u16),

    /// Something happened on a connection.
    Transport(TransportEvent),
}
