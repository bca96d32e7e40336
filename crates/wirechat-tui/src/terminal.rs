//! Terminal driver for the TUI.
//!
//! Implements the [`Driver`] trait for terminal I/O using crossterm for
//! keyboard events and ratatui for rendering. Network uses one WebSocket
//! connection per session attempt, all reporting on a single channel.

use std::{
    io::{self, Stdout, stdout},
    time::{Duration, Instant},
};

use crossterm::{
    ExecutableCommand,
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::{Stream, StreamExt};
use ratatui::{Terminal, backend::CrosstermBackend};
use thiserror::Error;
use tokio::{
    sync::mpsc,
    time::{Interval, MissedTickBehavior, interval},
};
use tracing::warn;
use wirechat_app::{App, AppEvent, Driver, KeyInput};
use wirechat_client::{SessionAction, TransportEvent, transport::ConnectionPool};

use crate::ui;

/// Interval between ticks, kept regardless of other traffic.
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Transport events buffered before connection tasks wait on the UI.
const EVENT_CAPACITY: usize = 256;

/// Terminal driver errors.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// I/O error from terminal operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Terminal driver implementing the [`Driver`] trait.
///
/// Handles terminal I/O (crossterm), rendering (ratatui), and network
/// communication (tokio-tungstenite WebSocket).
pub struct TerminalDriver {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    event_stream: EventStream,
    events_tx: mpsc::Sender<TransportEvent>,
    events_rx: mpsc::Receiver<TransportEvent>,
    pool: ConnectionPool,
    tick: Interval,
}

impl TerminalDriver {
    /// Create a new terminal driver, switching the terminal to raw mode.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new() -> Result<Self, TerminalError> {
        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout());
        let terminal = Terminal::new(backend)?;
        let (events_tx, events_rx) = mpsc::channel(EVENT_CAPACITY);

        Ok(Self {
            terminal,
            event_stream: EventStream::new(),
            pool: ConnectionPool::new(events_tx.clone()),
            events_tx,
            events_rx,
            tick: tick_interval(),
        })
    }
}

/// Tick timer. A late tick is delayed, never burst.
fn tick_interval() -> Interval {
    let mut tick = interval(TICK_INTERVAL);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tick
}

/// Wait for the next terminal event, transport event or tick.
///
/// The tick timer lives across calls, so steady input cannot starve it.
async fn next_event<S>(
    terminal: &mut S,
    transport: &mut mpsc::Receiver<TransportEvent>,
    tick: &mut Interval,
) -> Result<Option<AppEvent>, TerminalError>
where
    S: Stream<Item = io::Result<Event>> + Unpin,
{
    tokio::select! {
        biased;

        // Terminal events
        maybe_event = terminal.next() => {
            match maybe_event {
                Some(Ok(Event::Key(key_event))) if key_event.kind == KeyEventKind::Press => {
                    Ok(convert_key(key_event).map(AppEvent::Key))
                },
                Some(Ok(Event::Resize(cols, rows))) => Ok(Some(AppEvent::Resize(cols, rows))),
                Some(Err(e)) => Err(TerminalError::Io(e)),
                _ => Ok(None),
            }
        }

        // Transport events from every connection
        Some(event) = transport.recv() => Ok(Some(AppEvent::Transport(event))),

        _ = tick.tick() => Ok(Some(AppEvent::Tick)),
    }
}

/// Convert a crossterm key event to a [`KeyInput`].
///
/// Ctrl+C maps to Esc since raw mode swallows the signal.
pub fn convert_key(event: KeyEvent) -> Option<KeyInput> {
    match event.code {
        KeyCode::Char('c') if event.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(KeyInput::Esc)
        },
        KeyCode::Char(c) => Some(KeyInput::Char(c)),
        KeyCode::Enter => Some(KeyInput::Enter),
        KeyCode::Backspace => Some(KeyInput::Backspace),
        KeyCode::Delete => Some(KeyInput::Delete),
        KeyCode::Esc => Some(KeyInput::Esc),
        KeyCode::Left => Some(KeyInput::Left),
        KeyCode::Right => Some(KeyInput::Right),
        KeyCode::Up => Some(KeyInput::Up),
        KeyCode::Down => Some(KeyInput::Down),
        KeyCode::Home => Some(KeyInput::Home),
        KeyCode::End => Some(KeyInput::End),
        _ => None,
    }
}

impl Driver for TerminalDriver {
    type Error = TerminalError;
    type Instant = Instant;

    async fn poll_event(&mut self) -> Result<Option<AppEvent>, Self::Error> {
        let event = next_event(&mut self.event_stream, &mut self.events_rx, &mut self.tick).await?;
        if let Some(AppEvent::Transport(transport_event)) = &event {
            self.pool.observe(transport_event);
        }
        Ok(event)
    }

    fn execute(&mut self, action: SessionAction) -> Result<(), Self::Error> {
        if let Err(err) = self.pool.execute(&action)
            && let SessionAction::Send { connection, .. } = action
        {
            warn!(%connection, error = %err, "send failed");
            // Surfaces through the controller like any other transport error
            let _ = self
                .events_tx
                .try_send(TransportEvent::Error { connection, message: err.to_string() });
        }
        Ok(())
    }

    #[allow(clippy::disallowed_methods)]
    fn now(&self) -> Self::Instant {
        Instant::now()
    }

    fn render(&mut self, app: &App) -> Result<(), Self::Error> {
        self.terminal.draw(|frame| {
            ui::render(frame, app);
        })?;
        Ok(())
    }

    fn stop(&mut self) {
        self.pool.stop_all();
    }
}

impl Drop for TerminalDriver {
    fn drop(&mut self) {
        self.stop();
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);
    }
}
