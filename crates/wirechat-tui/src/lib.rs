//! Terminal UI for Wirechat
//!
//! A thin shell over [`wirechat_app::Driver`] that provides terminal-specific
//! I/O. All orchestration logic lives in the generic [`wirechat_app::Runtime`]
//!
//! This crate only handles terminal input, rendering and handing transport
//! actions to WebSocket connections.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod terminal;
pub mod ui;

pub use terminal::{TerminalDriver, TerminalError};
pub use wirechat_app::{App, AppAction, AppEvent, Bridge, Driver, KeyInput, Runtime};
