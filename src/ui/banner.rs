use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap};
use unicode_width::UnicodeWidthStr;

use crate::error::{ErrorKind, FetchError};

/// A single line of text in the middle of `area`.
pub fn render_message(message: &str, style: Style, area: Rect, buf: &mut Buffer) {
    let width = u16::try_from(message.width()).unwrap_or(u16::MAX);
    let rect = centered_rect(width, 1, area);
    Paragraph::new(Span::styled(message.to_string(), style))
        .alignment(Alignment::Center)
        .render(rect, buf);
}

/// A boxed error in the middle of `area`, replacing whatever was drawn there.
pub fn render_error(err: &FetchError, refreshing: bool, area: Rect, buf: &mut Buffer) {
    let rect = centered_rect(60, 8, area);
    Clear.render(rect, buf);

    let mut lines = vec![
        Line::from(Span::raw(err.message.clone())),
        Line::from(""),
    ];
    if let Some(hint) = hint(err.kind) {
        lines.push(Line::from(Span::styled(hint, Style::default().fg(Color::Gray))));
    }
    lines.push(if refreshing {
        Line::from(Span::styled("retrying…", Style::default().fg(Color::Yellow)))
    } else {
        Line::from(vec![
            Span::raw("press "),
            Span::styled("r", Style::default().fg(Color::Green)),
            Span::raw(" to retry, "),
            Span::styled("q", Style::default().fg(Color::Red)),
            Span::raw(" to quit"),
        ])
    });

    Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red))
                .title(Span::styled(
                    format!(" {} ", capitalize(&err.kind.to_string())),
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                )),
        )
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(rect, buf);
}

fn hint(kind: ErrorKind) -> Option<&'static str> {
    match kind {
        ErrorKind::Auth => Some("check JIRA_USER and JIRA_TOKEN"),
        ErrorKind::NotFound => Some("check JIRA_BOARD_ID and JIRA_HOST"),
        _ => None,
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// A `width` x `height` rect centered in `outer`, shrunk to fit.
fn centered_rect(width: u16, height: u16, outer: Rect) -> Rect {
    let inner_width = width.min(outer.width);
    let inner_height = height.min(outer.height);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length((outer.height.saturating_sub(inner_height)) / 2),
            Constraint::Length(inner_height),
            Constraint::Min(0),
        ])
        .split(outer);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length((outer.width.saturating_sub(inner_width)) / 2),
            Constraint::Length(inner_width),
            Constraint::Min(0),
        ])
        .split(vertical[1]);

    horizontal[1]
}
