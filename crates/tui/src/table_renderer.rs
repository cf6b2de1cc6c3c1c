//! Result tables as fixed-width text rows.

use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use citelens_core::{Table, display_value};

use super::TuiTheme;

pub const TABLE_CELL_MAX_WIDTH: usize = 24;
const CELL_GAP: &str = "  ";

fn clip(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count <= width {
        return format!("{text:<width$}");
    }
    let mut clipped: String = text.chars().take(width.saturating_sub(1)).collect();
    clipped.push('…');
    clipped
}

/// Cell text with newlines flattened.
fn cell_text(table: &Table, row: usize, column: &str) -> String {
    table.rows[row]
        .get(column)
        .map(display_value)
        .unwrap_or_default()
        .replace(['\n', '\r'], " ")
}

/// Render one named table: title, header row, separator, data rows.
/// Columns come from the first row; an empty table renders nothing.
pub fn table_lines(table: &Table, theme: &TuiTheme) -> Vec<Line<'static>> {
    if table.is_empty() {
        return Vec::new();
    }
    let columns = table.columns();
    let widths: Vec<usize> = columns
        .iter()
        .map(|column| {
            let longest = (0..table.rows.len())
                .map(|row| cell_text(table, row, column).chars().count())
                .max()
                .unwrap_or(0)
                .max(column.chars().count());
            longest.clamp(1, TABLE_CELL_MAX_WIDTH)
        })
        .collect();

    let mut lines = Vec::with_capacity(table.rows.len() + 3);
    lines.push(Line::from(Span::styled(
        format!("{} ({})", table.name, table.rows.len()),
        Style::default()
            .fg(theme.primary)
            .add_modifier(Modifier::BOLD),
    )));

    let header = columns
        .iter()
        .zip(&widths)
        .map(|(column, width)| clip(column, *width))
        .collect::<Vec<_>>()
        .join(CELL_GAP);
    lines.push(Line::from(Span::styled(
        header.trim_end().to_string(),
        Style::default()
            .fg(theme.text_strong)
            .add_modifier(Modifier::BOLD),
    )));

    let rule = widths
        .iter()
        .map(|w| "─".repeat(*w))
        .collect::<Vec<_>>()
        .join(CELL_GAP);
    lines.push(Line::from(Span::styled(
        rule,
        Style::default().fg(theme.border_normal),
    )));

    for row in 0..table.rows.len() {
        let text = columns
            .iter()
            .zip(&widths)
            .map(|(column, width)| clip(&cell_text(table, row, column), *width))
            .collect::<Vec<_>>()
            .join(CELL_GAP);
        lines.push(Line::from(Span::styled(
            text.trim_end().to_string(),
            Style::default().fg(theme.text_base),
        )));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{line_plain, row};

    #[test]
    fn test_empty_table_renders_nothing() {
        let table = Table::new("SQL Results", Vec::new());
        assert!(table_lines(&table, &TuiTheme::default_dark()).is_empty());
    }

    #[test]
    fn test_columns_from_first_row_in_order() {
        let table = Table::new(
            "SQL Results",
            vec![
                row(&[("Product", "Shampoo A"), ("Company", "Acme")]),
                row(&[("Company", "Beta"), ("Extra", "ignored")]),
            ],
        );
        let plain: Vec<String> = table_lines(&table, &TuiTheme::default_dark())
            .iter()
            .map(line_plain)
            .collect();
        assert_eq!(plain[0], "SQL Results (2)");
        assert_eq!(plain[1], "Product    Company");
        assert_eq!(plain[3], "Shampoo A  Acme");
        assert_eq!(plain[4], "           Beta");
        assert!(!plain.iter().any(|l| l.contains("ignored")));
    }

    #[test]
    fn test_long_cells_are_clipped() {
        let long = "x".repeat(40);
        let table = Table::new("Semantic Results", vec![row(&[("Product", long.as_str())])]);
        let plain: Vec<String> = table_lines(&table, &TuiTheme::default_dark())
            .iter()
            .map(line_plain)
            .collect();
        assert_eq!(plain[3].chars().count(), TABLE_CELL_MAX_WIDTH);
        assert!(plain[3].ends_with('…'));
    }
}
