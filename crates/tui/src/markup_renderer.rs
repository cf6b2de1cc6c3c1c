//! Markup nodes to styled ratatui lines (plain-markup rendering path).

use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use citelens_core::{Inline, ListKind, MarkupNode};

use super::TuiTheme;

pub const UNORDERED_BULLET: &str = "•";

fn inline_span(inline: &Inline, theme: &TuiTheme) -> Span<'static> {
    match inline {
        Inline::Text(text) => Span::styled(text.clone(), Style::default().fg(theme.text_base)),
        Inline::Strong(text) => Span::styled(
            text.clone(),
            Style::default()
                .fg(theme.text_strong)
                .add_modifier(Modifier::BOLD),
        ),
        Inline::Emphasis(text) => Span::styled(
            text.clone(),
            Style::default()
                .fg(theme.text_base)
                .add_modifier(Modifier::ITALIC),
        ),
        Inline::Code(text) => Span::styled(
            text.clone(),
            Style::default().fg(theme.code_fg).bg(theme.code_bg),
        ),
    }
}

fn heading_style(level: u8, theme: &TuiTheme) -> Style {
    let style = Style::default()
        .fg(theme.heading)
        .add_modifier(Modifier::BOLD);
    if level == 1 {
        style.add_modifier(Modifier::UNDERLINED)
    } else {
        style
    }
}

/// Render markup nodes into lines. Headings and lists always occupy whole
/// lines; a `Break` ends the current line.
pub fn markup_lines(nodes: &[MarkupNode], theme: &TuiTheme) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();

    for node in nodes {
        match node {
            MarkupNode::Inline(inline) => current.push(inline_span(inline, theme)),
            MarkupNode::Break => lines.push(Line::from(std::mem::take(&mut current))),
            MarkupNode::Heading { level, content } => {
                if !current.is_empty() {
                    lines.push(Line::from(std::mem::take(&mut current)));
                }
                let style = heading_style(*level, theme);
                let spans: Vec<Span<'static>> = content
                    .iter()
                    .map(|inline| Span::styled(inline.text().to_string(), style))
                    .collect();
                lines.push(Line::from(spans));
            }
            MarkupNode::List { kind, items } => {
                if !current.is_empty() {
                    lines.push(Line::from(std::mem::take(&mut current)));
                }
                for item in items {
                    let marker = match kind {
                        ListKind::Unordered => UNORDERED_BULLET.to_string(),
                        ListKind::Ordered => item.marker.clone(),
                    };
                    let mut spans = vec![Span::styled(
                        format!("  {} ", marker),
                        Style::default().fg(theme.primary),
                    )];
                    spans.extend(item.content.iter().map(|i| inline_span(i, theme)));
                    lines.push(Line::from(spans));
                }
            }
        }
    }

    if !current.is_empty() {
        lines.push(Line::from(current));
    }
    lines
}
