//! Sources sidebar panel — deduplicated sources of the whole transcript.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use citelens_core::SourceSummary;

use super::TuiTheme;

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width && width > 1 {
        let truncated: String = text.chars().take(width - 1).collect();
        format!("{}…", truncated)
    } else {
        text.to_string()
    }
}

/// Panel body: one block per summary (title, description, optional
/// details), blank line between blocks. The last line reports hidden
/// entries when the panel is too short.
pub fn sources_panel_lines(
    summaries: &[SourceSummary],
    scroll_offset: usize,
    max_lines: usize,
    max_width: usize,
    theme: &TuiTheme,
) -> Vec<Line<'static>> {
    if summaries.is_empty() {
        return vec![Line::from(Span::styled(
            "No sources yet",
            Style::default()
                .fg(theme.text_muted)
                .add_modifier(Modifier::ITALIC),
        ))];
    }

    let mut blocks: Vec<Vec<Line<'static>>> = Vec::new();
    for (i, summary) in summaries.iter().enumerate().skip(scroll_offset) {
        let prefix = format!("{}. ", i + 1);
        let mut block = vec![Line::from(vec![
            Span::styled(prefix.clone(), Style::default().fg(theme.text_muted)),
            Span::styled(
                truncate(&summary.title, max_width.saturating_sub(prefix.len())),
                Style::default()
                    .fg(theme.primary)
                    .add_modifier(Modifier::BOLD),
            ),
        ])];
        block.push(Line::from(Span::styled(
            format!("   {}", truncate(&summary.description, max_width.saturating_sub(3))),
            Style::default().fg(theme.text_base),
        )));
        if !summary.details.is_empty() {
            block.push(Line::from(Span::styled(
                format!("   {}", truncate(&summary.details, max_width.saturating_sub(3))),
                Style::default().fg(theme.text_muted),
            )));
        }
        blocks.push(block);
    }

    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut shown = 0usize;
    for block in &blocks {
        let gap = usize::from(!lines.is_empty());
        // keep a line free for the overflow note unless this is the last block
        let reserve = usize::from(shown + 1 < blocks.len());
        if lines.len() + gap + block.len() + reserve > max_lines {
            break;
        }
        if gap == 1 {
            lines.push(Line::default());
        }
        lines.extend(block.iter().cloned());
        shown += 1;
    }

    let remaining = blocks.len() - shown;
    if remaining > 0 {
        lines.push(Line::from(Span::styled(
            format!("  ...{} more", remaining),
            Style::default()
                .fg(theme.text_muted)
                .add_modifier(Modifier::ITALIC),
        )));
    }
    lines
}

/// Render the sources sidebar into the given area.
pub fn render_sources_sidebar(
    frame: &mut Frame,
    area: Rect,
    summaries: &[SourceSummary],
    scroll_offset: usize,
    theme: &TuiTheme,
) {
    let title = format!(" Sources ({}) ", summaries.len());
    let block = Block::default()
        .title(Span::styled(
            title,
            Style::default()
                .fg(theme.primary)
                .add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border_normal));

    let inner = block.inner(area);
    let lines = sources_panel_lines(
        summaries,
        scroll_offset,
        inner.height as usize,
        inner.width as usize,
        theme,
    );
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::line_plain;

    fn summary(title: &str, description: &str, details: &str) -> SourceSummary {
        SourceSummary {
            title: title.into(),
            description: description.into(),
            details: details.into(),
        }
    }

    fn plain(lines: &[Line<'_>]) -> Vec<String> {
        lines.iter().map(line_plain).collect()
    }

    #[test]
    fn test_empty_panel() {
        let lines = sources_panel_lines(&[], 0, 10, 26, &TuiTheme::default_dark());
        assert_eq!(plain(&lines), vec!["No sources yet"]);
    }

    #[test]
    fn test_blocks_with_and_without_details() {
        let summaries = vec![
            summary(
                "Database Query",
                "California Safe Cosmetics Database",
                "Structured data query",
            ),
            summary("Semantic Search", "Pinecone Vector Database", ""),
        ];
        let lines = sources_panel_lines(&summaries, 0, 20, 26, &TuiTheme::default_dark());
        assert_eq!(
            plain(&lines),
            vec![
                "1. Database Query",
                "   California Safe Cosmet…",
                "   Structured data query",
                "",
                "2. Semantic Search",
                "   Pinecone Vector Databa…",
            ]
        );
    }

    #[test]
    fn test_overflow_note() {
        let summaries: Vec<SourceSummary> = (0..5)
            .map(|_| summary("Semantic Search", "Pinecone", "Acme"))
            .collect();
        let lines = sources_panel_lines(&summaries, 0, 8, 26, &TuiTheme::default_dark());
        let text = plain(&lines);
        assert!(text.len() <= 8);
        assert_eq!(text.last().map(String::as_str), Some("  ...3 more"));
    }

    #[test]
    fn test_scroll_offset_keeps_numbering() {
        let summaries = vec![summary("A", "a", ""), summary("B", "b", "")];
        let lines = sources_panel_lines(&summaries, 1, 10, 26, &TuiTheme::default_dark());
        assert_eq!(plain(&lines)[0], "2. B");
    }
}
