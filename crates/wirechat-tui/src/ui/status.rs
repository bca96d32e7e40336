//! Status bar
//!
//! Displays the session phase, who the session is for, and the latest
//! status message.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};
use wirechat_app::App;
use wirechat_client::AuthPhase;

/// Label and color for a phase.
fn phase_span(phase: AuthPhase) -> Span<'static> {
    match phase {
        AuthPhase::Unauthenticated => {
            Span::styled("Not signed in", Style::default().fg(Color::Gray))
        },
        AuthPhase::Pending => Span::styled("Authenticating...", Style::default().fg(Color::Yellow)),
        AuthPhase::Authenticated => Span::styled(
            "Authenticated",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
        AuthPhase::Rejected => Span::styled("Rejected", Style::default().fg(Color::Red)),
        AuthPhase::Closed => Span::styled("Closed", Style::default().fg(Color::Red)),
    }
}

/// Render the status bar.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::raw(" "), phase_span(app.phase())];

    if let Some(identity) = app.identity() {
        spans.push(Span::raw(format!(" | {identity}")));
    }

    if let Some(status) = app.status() {
        let style = if status.is_error {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::White)
        };
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(status.text.clone(), style));
    }

    let paragraph =
        Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray).fg(Color::White));

    frame.render_widget(paragraph, area);
}
