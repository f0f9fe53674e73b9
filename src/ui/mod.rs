mod banner;
mod board;
mod frame;

pub use frame::Frame;

use chrono::{DateTime, Utc};
use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Widget, Wrap};

use crate::app::{App, SyncStatus};

const MIN_WIDTH: u16 = 20;
const MIN_HEIGHT: u16 = 6;
/// From this height on the detail pane also shows the description
const TALL_HEIGHT: u16 = 16;
const DESCRIPTION_ROWS: u16 = 3;

const HELP: &str = "←↓↑→/hjkl: move | r: refresh | q: quit";

/// Lay out the whole screen for the app's current state. Only reads `app`,
/// so the same state and clock always give the same frame.
pub fn render(app: &App, now: DateTime<Utc>, width: u16, height: u16) -> Frame {
    let area = Rect::new(0, 0, width, height);
    let mut buf = Buffer::empty(area);

    if width < MIN_WIDTH || height < MIN_HEIGHT {
        banner::render_message("terminal too small", Style::default().fg(Color::Yellow), area, &mut buf);
        return Frame::new(buf);
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(detail_height(height)),
            Constraint::Length(1),
        ])
        .split(area);

    render_header(app, chunks[0], &mut buf);
    render_body(app, chunks[1], &mut buf);
    render_detail(app, chunks[2], &mut buf);
    render_status_bar(app, now, chunks[3], &mut buf);

    Frame::new(buf)
}

fn render_header(app: &App, area: Rect, buf: &mut Buffer) {
    let mut spans = vec![Span::styled(
        format!("canoa - board {}", app.board_id()),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )];
    if let Some(board) = app.board() {
        spans.push(Span::styled(
            format!("  {} issues in {} columns", board.issue_count(), board.columns().len()),
            Style::default().fg(Color::Gray),
        ));
    }

    Paragraph::new(Line::from(spans))
        .style(Style::default().bg(Color::DarkGray))
        .render(area, buf);
}

fn render_body(app: &App, area: Rect, buf: &mut Buffer) {
    if let Some(err) = app.fatal_error() {
        banner::render_error(err, app.is_fetching(), area, buf);
        return;
    }

    match app.board() {
        None => banner::render_message(
            "Loading board …",
            Style::default().fg(Color::Yellow),
            area,
            buf,
        ),
        Some(snapshot) if snapshot.is_empty() => banner::render_message(
            "No issues on this board",
            Style::default().fg(Color::DarkGray),
            area,
            buf,
        ),
        Some(snapshot) => board::render(snapshot, area, buf),
    }
}

fn detail_height(height: u16) -> u16 {
    if height >= TALL_HEIGHT {
        1 + DESCRIPTION_ROWS
    } else {
        1
    }
}

fn render_detail(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(issue) = app
        .board()
        .filter(|_| app.fatal_error().is_none())
        .and_then(|b| b.focused_issue())
    else {
        return;
    };

    let mut spans = vec![
        Span::styled(
            issue.key.clone(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(format!("[{}]", issue.status), Style::default().fg(Color::Yellow)),
    ];
    if let Some(kind) = &issue.kind {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(kind.clone(), Style::default().fg(Color::Magenta)));
    }
    spans.extend([
        Span::raw(" "),
        Span::styled(
            format!("@{}", issue.assignee.as_deref().unwrap_or("unassigned")),
            Style::default().fg(Color::Gray),
        ),
        Span::raw("  "),
        Span::raw(issue.summary.clone()),
    ]);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(area);

    Paragraph::new(Line::from(spans)).render(chunks[0], buf);

    if chunks[1].height == 0 {
        return;
    }
    let description = match issue.description.as_deref() {
        Some(text) => Paragraph::new(text),
        None => Paragraph::new("(no description)").style(Style::default().fg(Color::DarkGray)),
    };
    description
        .wrap(Wrap { trim: true })
        .render(chunks[1], buf);
}

fn render_status_bar(app: &App, now: DateTime<Utc>, area: Rect, buf: &mut Buffer) {
    let (label, color) = status_label(app.sync_status(), now);
    let age = format_age(app.board().map(|b| b.fetched_at()), now);

    let line = Line::from(vec![
        Span::styled(label, Style::default().fg(color)),
        Span::styled(format!(" | updated {}", age), Style::default().fg(Color::Gray)),
        Span::styled(format!(" | {}", HELP), Style::default().fg(Color::Gray)),
    ]);

    Paragraph::new(line)
        .style(Style::default().bg(Color::DarkGray))
        .render(area, buf);
}

fn status_label(status: SyncStatus<'_>, now: DateTime<Utc>) -> (String, Color) {
    match status {
        SyncStatus::Loading => ("loading".to_string(), Color::Yellow),
        SyncStatus::Fresh => ("fresh".to_string(), Color::Green),
        SyncStatus::Refreshing => ("refreshing".to_string(), Color::Yellow),
        SyncStatus::Retrying { at, attempt, error } => {
            let secs = at.signed_duration_since(now).num_seconds().max(0);
            (
                format!("retrying in {}s (attempt {}): {}", secs, attempt, error.message),
                Color::Yellow,
            )
        }
        SyncStatus::Failed(error) => (format!("error: {}", error.message), Color::Red),
    }
}

/// Age of the displayed data, e.g. `3m`
fn format_age(fetched_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(fetched_at) = fetched_at else {
        return "never".to_string();
    };
    let duration = now.signed_duration_since(fetched_at);

    if duration.num_days() > 0 {
        format!("{}d", duration.num_days())
    } else if duration.num_hours() > 0 {
        format!("{}h", duration.num_hours())
    } else if duration.num_minutes() > 0 {
        format!("{}m", duration.num_minutes())
    } else if duration.num_seconds() >= 5 {
        format!("{}s", duration.num_seconds())
    } else {
        "just now".to_string()
    }
}
