//! Chat area
//!
//! Displays the conversation, newest message at the bottom.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
};
use wirechat_app::App;

const BORDER_SIZE: u16 = 2;

/// Render the chat area.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let title = format!(" {} ", app.endpoint());
    let block = Block::default().borders(Borders::ALL).title(title);

    let items: Vec<ListItem> = if app.messages().is_empty() {
        vec![ListItem::new(Line::from(Span::styled(
            "Use /register or /connect <username> <password> to start",
            Style::default().fg(Color::DarkGray),
        )))]
    } else {
        app.messages()
            .iter()
            .map(|msg| {
                // Own messages stand out from everyone else's
                let color =
                    if app.identity() == Some(msg.from.as_str()) { Color::Cyan } else { Color::Green };

                ListItem::new(Line::from(vec![
                    Span::styled(
                        format!("{}:", msg.from),
                        Style::default().fg(color).add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(" "),
                    Span::raw(msg.content.clone()),
                ]))
            })
            .collect()
    };

    let visible_height = area.height.saturating_sub(BORDER_SIZE) as usize;
    let skip = items.len().saturating_sub(visible_height);
    let visible_items: Vec<_> = items.into_iter().skip(skip).collect();

    let list = List::new(visible_items).block(block);

    frame.render_widget(list, area);
}
