use std::ops::Range;

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Widget};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::types::{BoardSnapshot, Column, Issue};

const FOCUS_MARKER: &str = "▶ ";
const NO_MARKER: &str = "  ";

/// Narrowest a column gets before columns start scrolling sideways
pub const MIN_COLUMN_WIDTH: u16 = 16;

pub fn render(board: &BoardSnapshot, area: Rect, buf: &mut Buffer) {
    let cursor = board.cursor();
    let columns = board.columns();
    let shown = visible_columns(columns.len(), area.width, cursor.map(|p| p.column));
    let mut x = area.x;

    for (index, width) in shown.clone().zip(column_widths(area.width, shown.len())) {
        let title = ColumnTitle {
            more_left: index == shown.start && shown.start > 0,
            more_right: index + 1 == shown.end && shown.end < columns.len(),
        };
        let focused = cursor.filter(|p| p.column == index).map(|p| p.issue);
        render_column(&columns[index], title, focused, Rect::new(x, area.y, width, area.height), buf);
        x += width;
    }
}

/// Split `total` cells into `count` near-equal widths, remainder going to the leftmost.
pub fn column_widths(total: u16, count: usize) -> Vec<u16> {
    if count == 0 {
        return Vec::new();
    }
    let total = usize::from(total);
    let base = total / count;
    let remainder = total % count;
    (0..count)
        .map(|i| (base + usize::from(i < remainder)) as u16)
        .collect()
}

/// First item of a `visible`-long window over `len` items that keeps `focused`
/// in view, scrolled no further than needed.
fn scroll_start(len: usize, visible: usize, focused: Option<usize>) -> usize {
    let start = match focused {
        Some(i) if i >= visible => i + 1 - visible,
        _ => 0,
    };
    start.min(len.saturating_sub(visible))
}

/// Which columns fit side by side in `width` cells, at least one and each at
/// least [`MIN_COLUMN_WIDTH`] wide when more than one is shown.
pub fn visible_columns(count: usize, width: u16, focused: Option<usize>) -> Range<usize> {
    if count == 0 {
        return 0..0;
    }
    let fit = usize::from(width / MIN_COLUMN_WIDTH).clamp(1, count);
    let start = scroll_start(count, fit, focused);
    start..start + fit
}

/// Which issues are visible in a column with `rows` text rows, and whether an
/// overflow indicator is needed.
///
/// With two or more rows the indicator takes the last row; with a single row
/// it shares that row with the one visible issue. The window only scrolls as
/// far as needed to keep `focused` on the last list row.
pub fn visible_window(len: usize, rows: usize, focused: Option<usize>) -> (Range<usize>, bool) {
    if rows == 0 {
        return (0..0, false);
    }
    if len <= rows {
        return (0..len, false);
    }

    let list_rows = if rows >= 2 { rows - 1 } else { 1 };
    let start = scroll_start(len, list_rows, focused);

    (start..start + list_rows, true)
}

#[derive(Debug, Clone, Copy, Default)]
struct ColumnTitle {
    more_left: bool,
    more_right: bool,
}

fn render_column(
    column: &Column,
    title: ColumnTitle,
    focused: Option<usize>,
    area: Rect,
    buf: &mut Buffer,
) {
    let is_active = focused.is_some();

    let title_style = if is_active {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(
            format!(
                " {}{} ({}){} ",
                if title.more_left { "« " } else { "" },
                column.name,
                column.issues.len(),
                if title.more_right { " »" } else { "" },
            ),
            title_style,
        ))
        .border_style(if is_active {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::DarkGray)
        });

    let inner = block.inner(area);
    block.render(area, buf);

    if column.issues.is_empty() {
        Paragraph::new("(empty)")
            .style(Style::default().fg(Color::DarkGray))
            .render(inner, buf);
        return;
    }

    let width = usize::from(inner.width);
    let rows = usize::from(inner.height);
    let (window, overflow) = visible_window(column.issues.len(), rows, focused);

    let indicator = overflow.then(|| {
        format!("↑{} ↓{}", window.start, column.issues.len() - window.end)
    });
    let inline = overflow && window.len() == rows;
    let issue_width = match &indicator {
        Some(text) if inline => width.saturating_sub(text.width() + 1),
        _ => width,
    };

    let mut lines: Vec<Line> = column.issues[window.clone()]
        .iter()
        .enumerate()
        .map(|(offset, issue)| {
            issue_line(issue, focused == Some(window.start + offset), issue_width)
        })
        .collect();

    if let Some(text) = indicator {
        let style = Style::default().fg(Color::DarkGray);
        if inline {
            if let Some(last) = lines.last_mut() {
                last.spans.push(Span::raw(" "));
                last.spans.push(Span::styled(text, style));
            }
        } else {
            lines.push(Line::from(Span::styled(truncate(&format!("  {}", text), width), style)));
        }
    }

    Paragraph::new(lines).render(inner, buf);
}

fn issue_line(issue: &Issue, is_focused: bool, width: usize) -> Line<'static> {
    let marker = if is_focused { FOCUS_MARKER } else { NO_MARKER };
    let mut remaining = width.saturating_sub(marker.width());

    let key = truncate(&issue.key, remaining);
    remaining = remaining.saturating_sub(key.width());

    let initials = match issue.assignee_initials() {
        Some(initials) if remaining > initials.width() + 1 => {
            let text = format!(" {}", initials);
            remaining -= text.width();
            text
        }
        _ => String::new(),
    };

    let summary = if remaining > 1 {
        let text = truncate(&issue.summary, remaining - 1);
        let pad = (remaining - 1).saturating_sub(text.width());
        remaining = 0;
        format!(" {}{}", text, " ".repeat(pad))
    } else {
        String::new()
    };
    let filler = " ".repeat(remaining);

    let (key_style, initials_style, summary_style) = if is_focused {
        let focus = Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD | Modifier::REVERSED);
        (focus, focus, focus)
    } else {
        (
            Style::default().fg(Color::Cyan),
            Style::default().fg(Color::Gray),
            Style::default(),
        )
    };

    Line::from(vec![
        Span::styled(marker, if is_focused { key_style } else { Style::default() }),
        Span::styled(key, key_style),
        Span::styled(initials, initials_style),
        Span::styled(summary, summary_style),
        Span::styled(filler, summary_style),
    ])
}

/// Cut `text` to at most `max` terminal cells, marking the cut with `…`.
pub fn truncate(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }
    if max == 0 {
        return String::new();
    }

    let mut cut = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > max - 1 {
            break;
        }
        cut.push(ch);
        used += w;
    }
    cut.push('…');
    cut
}
