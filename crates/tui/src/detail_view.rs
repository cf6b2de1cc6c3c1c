//! Detail overlay for an activated citation marker.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use serde_json::Value;

use citelens_core::{Citation, display_value};

use super::{MarkerRef, TuiTheme, centered_rect};

/// An opened citation: a copy of the record plus the turn's explanation.
#[derive(Debug, Clone, PartialEq)]
pub struct CitationDetail {
    pub marker: MarkerRef,
    pub citation: Citation,
    pub explanation: Option<Value>,
}

fn field_line(name: &str, value: String, theme: &TuiTheme) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("{name}: "),
            Style::default().fg(theme.text_muted),
        ),
        Span::styled(value, Style::default().fg(theme.text_strong)),
    ])
}

/// Query type and step list from an explanation object, when present.
fn explanation_lines(explanation: &Value, theme: &TuiTheme) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let query_type = explanation
        .pointer("/intent/query_type")
        .or_else(|| explanation.get("query_type"))
        .and_then(Value::as_str);
    if let Some(query_type) = query_type {
        lines.push(field_line("query type", query_type.to_string(), theme));
    }
    if let Some(steps) = explanation.get("steps").and_then(Value::as_array) {
        for step in steps {
            lines.push(Line::from(Span::styled(
                format!("  · {}", display_value(step)),
                Style::default().fg(theme.text_muted),
            )));
        }
    }
    lines
}

pub fn detail_lines(detail: &CitationDetail, theme: &TuiTheme) -> Vec<Line<'static>> {
    let citation = &detail.citation;
    let mut lines = vec![
        field_line("type", citation.kind.to_string(), theme),
        field_line("citation_id", citation.citation_id.clone(), theme),
        field_line("row", citation.row_index.to_string(), theme),
        Line::default(),
    ];
    if citation.row_data.is_empty() {
        lines.push(Line::from(Span::styled(
            "(no row data)",
            Style::default().fg(theme.text_dim),
        )));
    }
    for (name, value) in &citation.row_data {
        lines.push(field_line(name, display_value(value), theme));
    }

    if let Some(explanation) = &detail.explanation {
        let extra = explanation_lines(explanation, theme);
        if !extra.is_empty() {
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(
                "Explanation",
                Style::default()
                    .fg(theme.primary)
                    .add_modifier(Modifier::BOLD),
            )));
            lines.extend(extra);
        }
    }
    lines
}

pub fn render_detail_popup(f: &mut Frame, area: Rect, detail: &CitationDetail, theme: &TuiTheme) {
    let popup = centered_rect(70, 70, area);
    let title = format!(
        " Citation [{}] · {} · Esc to close ",
        detail.citation.citation_number, detail.citation.kind
    );
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border_active))
        .title(Span::styled(
            title,
            Style::default()
                .fg(theme.primary)
                .add_modifier(Modifier::BOLD),
        ));
    f.render_widget(Clear, popup);
    f.render_widget(
        Paragraph::new(detail_lines(detail, theme))
            .block(block)
            .wrap(Wrap { trim: false }),
        popup,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{line_plain, sql_citation};
    use serde_json::json;

    fn detail(explanation: Option<Value>) -> CitationDetail {
        CitationDetail {
            marker: MarkerRef {
                message: 1,
                ordinal: 0,
                number: 1,
            },
            citation: sql_citation(1, "Shampoo A"),
            explanation,
        }
    }

    #[test]
    fn test_detail_lists_every_field() {
        let plain: Vec<String> = detail_lines(&detail(None), &TuiTheme::default_dark())
            .iter()
            .map(line_plain)
            .collect();
        assert_eq!(plain[0], "type: sql");
        assert_eq!(plain[1], "citation_id: sql-1");
        assert_eq!(plain[2], "row: 1");
        assert!(plain.contains(&"ProductName: Shampoo A".to_string()));
        assert!(plain.contains(&"CompanyName: Acme".to_string()));
        assert!(!plain.contains(&"Explanation".to_string()));
    }

    #[test]
    fn test_detail_explanation_footer() {
        let explanation = json!({
            "intent": {"query_type": "COMBINED"},
            "steps": ["SQL executed: 2 results", "Semantic search: 3 results"]
        });
        let plain: Vec<String> = detail_lines(&detail(Some(explanation)), &TuiTheme::default_dark())
            .iter()
            .map(line_plain)
            .collect();
        let at = plain.iter().position(|l| l == "Explanation").unwrap();
        assert_eq!(plain[at + 1], "query type: COMBINED");
        assert_eq!(plain[at + 2], "  · SQL executed: 2 results");
    }
}
