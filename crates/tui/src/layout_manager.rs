//! Layout Manager — screen split, scroll math and the title/hint bars.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use super::{TuiTheme, matching_slash_commands};

pub const TUI_SCROLL_STEP: usize = 3;
pub const SOURCES_SIDEBAR_WIDTH: u16 = 34;

#[derive(Debug, Clone)]
pub struct TuiSessionViewState {
    pub scroll_offset: usize,
    pub auto_follow: bool,
    pub body_height: usize,
}

impl Default for TuiSessionViewState {
    fn default() -> Self {
        Self {
            scroll_offset: 0,
            auto_follow: true,
            body_height: 1,
        }
    }
}

pub fn build_title_bar<'a>(endpoint: &str, pending: bool, theme: &TuiTheme) -> Line<'a> {
    let (state_text, state_color) = if pending {
        ("querying...", theme.warning)
    } else {
        ("idle", theme.text_muted)
    };
    Line::from(vec![
        Span::styled(
            " citelens ",
            Style::default()
                .fg(theme.primary)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(" ", Style::default()),
        Span::styled(endpoint.to_string(), Style::default().fg(theme.text_dim)),
        Span::styled("  ", Style::default()),
        Span::styled(state_text, Style::default().fg(state_color)),
    ])
}

/// Hint bar: slash command matches while typing one, otherwise marker
/// selection state and key help.
pub fn build_status_hint_bar<'a>(
    input: &str,
    marker_count: usize,
    selected: Option<usize>,
    pending: bool,
    theme: &TuiTheme,
) -> Line<'a> {
    let trimmed = input.trim_start();
    if trimmed.starts_with('/') && !trimmed.contains(char::is_whitespace) {
        let cmds = matching_slash_commands(trimmed)
            .iter()
            .map(|s| s.command)
            .collect::<Vec<_>>()
            .join("  ");
        return Line::from(vec![
            Span::styled(" ", Style::default()),
            Span::styled(cmds, Style::default().fg(theme.text_muted)),
        ]);
    }

    let sep = Span::styled(" │ ", Style::default().fg(theme.border_dim));
    let mut spans = vec![
        Span::styled(" /help", Style::default().fg(theme.text_muted)),
        sep.clone(),
    ];
    let citation_text = match selected {
        Some(i) => format!("citation {}/{}", i + 1, marker_count),
        None => format!("citations {}", marker_count),
    };
    spans.push(Span::styled(
        citation_text,
        Style::default().fg(theme.citation),
    ));
    spans.push(sep);
    if pending {
        spans.push(Span::styled(
            "waiting for answer  PgUp/Dn scroll  Ctrl+C exit",
            Style::default().fg(theme.text_dim),
        ));
    } else {
        spans.push(Span::styled(
            "Tab cite  Enter send/open  ↑↓ history  PgUp/Dn scroll  Esc exit",
            Style::default().fg(theme.text_dim),
        ));
    }
    Line::from(spans)
}

pub fn input_line_count(input: &str) -> u16 {
    let lines = input.chars().filter(|c| *c == '\n').count() as u16 + 1;
    lines.clamp(1, 4)
}

/// Title bar, conversation body, hint bar, bordered input box.
pub fn tui_layout_constraints(input_lines: u16) -> Vec<Constraint> {
    vec![
        Constraint::Length(1),
        Constraint::Min(5),
        Constraint::Length(1),
        Constraint::Length(input_lines + 2),
    ]
}

/// Split a conversation body area horizontally into (conversation, sources_sidebar).
///
/// The sidebar is only allocated when `show_sources` is set and the area is
/// at least 70 columns wide.
pub fn tui_session_split(area: Rect, show_sources: bool) -> (Rect, Option<Rect>) {
    if !show_sources || area.width < 70 {
        return (area, None);
    }
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(36), Constraint::Length(SOURCES_SIDEBAR_WIDTH)])
        .split(area);
    (chunks[0], Some(chunks[1]))
}

pub fn calc_log_scroll_usize(log_count: usize, body_height: usize) -> usize {
    log_count.saturating_sub(body_height)
}

pub fn effective_log_scroll(log_count: usize, session_view: &TuiSessionViewState) -> usize {
    let max_scroll = calc_log_scroll_usize(log_count, session_view.body_height);
    if session_view.auto_follow {
        max_scroll
    } else {
        session_view.scroll_offset.min(max_scroll)
    }
}

/// A rectangle of `percent_x` × `percent_y` centered in `area`.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
