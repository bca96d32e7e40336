//! Application layer for Wirechat
//!
//! Pure state machines and a generic runtime for the UI and session
//! orchestration, so the same code runs under test drivers and in the
//! terminal frontend.
//!
//! # Components
//!
//! - [`App`]: UI state machine (input editing, commands, message list)
//! - [`Presenter`]: What the session layer needs from a UI
//! - [`Bridge`]: Session bridge (feeds App actions to the controller)
//! - [`Driver`]: Trait for platform-specific I/O abstraction
//! - [`Runtime`]: Generic orchestration loop using Driver

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod app;
mod bridge;
pub mod commands;
mod driver;
mod event;
mod input;
mod presenter;
mod runtime;

pub use action::AppAction;
pub use app::{App, MAX_MESSAGES, StatusLine};
pub use bridge::Bridge;
pub use driver::Driver;
pub use event::AppEvent;
pub use input::{InputState, KeyInput};
pub use presenter::Presenter;
pub use runtime::Runtime;
