//! Client
//!
//! Action-based session controller for the Wirechat protocol. Tracks one
//! authenticated WebSocket session at a time and gates chat traffic on the
//! outcome of the login handshake.
//!
//! # Architecture
//!
//! The controller is Sans-IO. It receives user operations and
//! [`TransportEvent`]s, runs them through pure state machine logic, and
//! returns [`SessionAction`]s for the caller to execute. Time enters through
//! the [`Environment`] trait so tests can drive a manual clock.
//!
//! # Components
//!
//! - [`SessionController`]: Session state machine
//! - [`Session`]: The current attempt, its phase and its connection handle
//! - [`Credentials`]: Validated username and password
//! - [`SessionError`]: Errors surfaced to the presentation layer
//!
//! # Transport (optional)
//!
//! With the `transport` feature enabled, this crate also provides:
//! - [`transport::WsConnection`]: One WebSocket connection driven by a task
//! - [`transport::open`]: Connect and feed events into a channel
//! - [`transport::ConnectionPool`]: The handles a driver holds, released on
//!   close

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod controller;
mod credentials;
pub mod env;
mod error;
mod event;
mod session;

#[cfg(feature = "transport")]
pub mod transport;

pub use controller::{
    ControllerConfig, DEFAULT_ENDPOINT, DEFAULT_HANDSHAKE_TIMEOUT, EchoPolicy, SessionController,
};
pub use credentials::Credentials;
pub use env::{Environment, ManualEnv, SystemEnv};
pub use error::SessionError;
pub use event::{SessionAction, TransportEvent};
pub use session::{AuthPhase, ConnectionId, HandleState, Session, SessionPurpose};
pub use wirechat_proto::ChatMessage;
