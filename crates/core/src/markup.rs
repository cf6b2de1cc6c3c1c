//! Markup transformer — assistant text to typed markup nodes.
//!
//! Supports exactly the light markup the backend's answers use: `**bold**`,
//! `_italic_`, `` `code` ``, `#`/`##`/`###` headings, flat `-`/`•`/`*`
//! bullet lists, flat `1.` numbered lists and line breaks. Input is consumed
//! line by line by a small state machine; there is no nesting and no
//! escaping.

/// Inline span inside a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Strong(String),
    Emphasis(String),
    Code(String),
}

impl Inline {
    pub fn text(&self) -> &str {
        match self {
            Inline::Text(s) | Inline::Strong(s) | Inline::Emphasis(s) | Inline::Code(s) => s,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Unordered,
    Ordered,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    /// Bullet glyph or number as written, e.g. `-`, `•`, `12.`.
    pub marker: String,
    pub content: Vec<Inline>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupNode {
    Inline(Inline),
    Heading { level: u8, content: Vec<Inline> },
    List { kind: ListKind, items: Vec<ListItem> },
    Break,
}

enum LineKind<'a> {
    Heading(u8, &'a str),
    Item(ListKind, &'a str, &'a str),
    Plain(&'a str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    List(ListKind),
}

struct Transformer {
    nodes: Vec<MarkupNode>,
    mode: Mode,
    items: Vec<ListItem>,
    /// The previous line was plain text; its newline becomes a `Break`.
    newline_pending: bool,
}

impl Transformer {
    fn new() -> Self {
        Self {
            nodes: Vec::new(),
            mode: Mode::Normal,
            items: Vec::new(),
            newline_pending: false,
        }
    }

    fn feed(&mut self, line: &str) {
        if std::mem::take(&mut self.newline_pending) {
            self.nodes.push(MarkupNode::Break);
        }
        match classify(line) {
            LineKind::Heading(level, text) => {
                self.close_list();
                self.nodes.push(MarkupNode::Heading {
                    level,
                    content: parse_inline(text),
                });
            }
            LineKind::Item(kind, marker, text) => {
                if self.mode != Mode::List(kind) {
                    self.close_list();
                    self.mode = Mode::List(kind);
                }
                self.items.push(ListItem {
                    marker: marker.to_string(),
                    content: parse_inline(text),
                });
            }
            LineKind::Plain(text) => {
                self.close_list();
                self.nodes
                    .extend(parse_inline(text).into_iter().map(MarkupNode::Inline));
                self.newline_pending = true;
            }
        }
    }

    fn close_list(&mut self) {
        if let Mode::List(kind) = self.mode {
            self.nodes.push(MarkupNode::List {
                kind,
                items: std::mem::take(&mut self.items),
            });
            self.mode = Mode::Normal;
        }
    }

    fn finish(mut self) -> Vec<MarkupNode> {
        self.close_list();
        self.nodes
    }
}

/// Convert raw assistant text into markup nodes.
pub fn transform(raw: &str) -> Vec<MarkupNode> {
    if raw.is_empty() {
        return Vec::new();
    }
    let mut transformer = Transformer::new();
    for line in raw.split('\n') {
        transformer.feed(line.strip_suffix('\r').unwrap_or(line));
    }
    transformer.finish()
}

fn classify(line: &str) -> LineKind<'_> {
    let hashes = line.bytes().take_while(|b| *b == b'#').count();
    if (1..=3).contains(&hashes) {
        let rest = &line[hashes..];
        if rest.starts_with(char::is_whitespace) {
            return LineKind::Heading(hashes as u8, rest.trim());
        }
    }

    let trimmed = line.trim_start();
    for bullet in ['-', '•', '*'] {
        if let Some(rest) = trimmed.strip_prefix(bullet)
            && rest.starts_with(char::is_whitespace)
        {
            return LineKind::Item(ListKind::Unordered, &trimmed[..bullet.len_utf8()], rest.trim());
        }
    }

    let digits = trimmed.bytes().take_while(u8::is_ascii_digit).count();
    if digits > 0
        && let Some(rest) = trimmed[digits..].strip_prefix('.')
        && rest.starts_with(char::is_whitespace)
    {
        return LineKind::Item(ListKind::Ordered, &trimmed[..digits + 1], rest.trim());
    }

    LineKind::Plain(line)
}

/// Split one line into inline spans. Delimiters are matched left to right;
/// an unterminated or empty delimiter pair is literal text.
pub fn parse_inline(line: &str) -> Vec<Inline> {
    let mut spans = Vec::new();
    let mut text = String::new();
    let mut rest = line;

    while let Some(ch) = rest.chars().next() {
        let delimited = if rest.starts_with("**") {
            closing(rest, "**").map(|(inner, after)| (Inline::Strong(inner.to_string()), after))
        } else if ch == '_' {
            closing(rest, "_").map(|(inner, after)| (Inline::Emphasis(inner.to_string()), after))
        } else if ch == '`' {
            closing(rest, "`").map(|(inner, after)| (Inline::Code(inner.to_string()), after))
        } else {
            None
        };

        match delimited {
            Some((span, after)) => {
                if !text.is_empty() {
                    spans.push(Inline::Text(std::mem::take(&mut text)));
                }
                spans.push(span);
                rest = after;
            }
            None => {
                text.push(ch);
                rest = &rest[ch.len_utf8()..];
            }
        }
    }

    if !text.is_empty() {
        spans.push(Inline::Text(text));
    }
    spans
}

fn closing<'a>(input: &'a str, delimiter: &str) -> Option<(&'a str, &'a str)> {
    let body = &input[delimiter.len()..];
    let end = body.find(delimiter)?;
    if end == 0 {
        return None;
    }
    Some((&body[..end], &body[end + delimiter.len()..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> MarkupNode {
        MarkupNode::Inline(Inline::Text(s.to_string()))
    }

    fn flatten(nodes: &[MarkupNode]) -> String {
        nodes
            .iter()
            .map(|n| match n {
                MarkupNode::Inline(i) => i.text().to_string(),
                MarkupNode::Break => "\n".to_string(),
                _ => panic!("unexpected block node {n:?}"),
            })
            .collect()
    }

    #[test]
    fn test_empty_input() {
        assert!(transform("").is_empty());
    }

    #[test]
    fn test_plain_text_only_gains_breaks() {
        for input in [
            "hello world",
            "line one\nline two",
            "a\n\nb",
            "trailing newline\n",
            "numbers 3.5 and dashes-in-words",
        ] {
            let nodes = transform(input);
            assert_eq!(flatten(&nodes), input, "{input:?}");
        }
        assert_eq!(
            transform("a\nb"),
            vec![text("a"), MarkupNode::Break, text("b")]
        );
    }

    #[test]
    fn test_inline_spans() {
        assert_eq!(
            parse_inline("a **bold** _it_ `code` z"),
            vec![
                Inline::Text("a ".into()),
                Inline::Strong("bold".into()),
                Inline::Text(" ".into()),
                Inline::Emphasis("it".into()),
                Inline::Text(" ".into()),
                Inline::Code("code".into()),
                Inline::Text(" z".into()),
            ]
        );
    }

    #[test]
    fn test_inline_unterminated_is_literal() {
        assert_eq!(
            parse_inline("**open and _half"),
            vec![Inline::Text("**open and _half".into())]
        );
        assert_eq!(parse_inline("****"), vec![Inline::Text("****".into())]);
    }

    #[test]
    fn test_code_span_content_is_literal() {
        assert_eq!(
            parse_inline("`snake_case_name`"),
            vec![Inline::Code("snake_case_name".into())]
        );
    }

    #[test]
    fn test_heading_levels() {
        let nodes = transform("# One\n## Two\n### Three\n#### Four");
        assert_eq!(nodes.len(), 4);
        for (node, level) in nodes.iter().take(3).zip(1u8..) {
            assert!(matches!(node, MarkupNode::Heading { level: l, .. } if *l == level));
        }
        assert_eq!(nodes[3], text("#### Four"));
    }

    #[test]
    fn test_heading_needs_space() {
        assert_eq!(transform("#hashtag"), vec![text("#hashtag")]);
    }

    #[test]
    fn test_bullet_run_is_one_list() {
        for n in 1..=5 {
            let input = (0..n)
                .map(|i| format!("- item {i}"))
                .collect::<Vec<_>>()
                .join("\n");
            let nodes = transform(&input);
            assert_eq!(nodes.len(), 1, "{input:?}");
            match &nodes[0] {
                MarkupNode::List { kind, items } => {
                    assert_eq!(*kind, ListKind::Unordered);
                    assert_eq!(items.len(), n);
                }
                other => panic!("expected list, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_mixed_bullet_glyphs_share_a_list() {
        let nodes = transform("- a\n• b\n* c");
        assert!(matches!(&nodes[..], [MarkupNode::List { items, .. }] if items.len() == 3));
        if let MarkupNode::List { items, .. } = &nodes[0] {
            assert_eq!(items[1].marker, "•");
        }
    }

    #[test]
    fn test_numbered_interrupts_bullets() {
        let nodes = transform("- a\n- b\n1. one\n2. two");
        assert_eq!(nodes.len(), 2);
        assert!(matches!(&nodes[0], MarkupNode::List { kind: ListKind::Unordered, items } if items.len() == 2));
        match &nodes[1] {
            MarkupNode::List { kind, items } => {
                assert_eq!(*kind, ListKind::Ordered);
                assert_eq!(items[0].marker, "1.");
                assert_eq!(items[1].content, vec![Inline::Text("two".into())]);
            }
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn test_plain_line_closes_list() {
        let nodes = transform("- a\nafter\n- b");
        assert_eq!(nodes.len(), 4);
        assert!(matches!(nodes[0], MarkupNode::List { .. }));
        assert_eq!(nodes[1], text("after"));
        assert_eq!(nodes[2], MarkupNode::Break);
        assert!(matches!(nodes[3], MarkupNode::List { .. }));
    }

    #[test]
    fn test_indented_items_do_not_nest() {
        let nodes = transform("- a\n  - b");
        assert!(matches!(&nodes[..], [MarkupNode::List { items, .. }] if items.len() == 2));
    }

    #[test]
    fn test_bold_line_is_not_a_bullet() {
        let nodes = transform("**Note:** careful");
        assert_eq!(
            nodes,
            vec![
                MarkupNode::Inline(Inline::Strong("Note:".into())),
                text(" careful"),
            ]
        );
    }

    #[test]
    fn test_list_items_get_inline_formatting() {
        let nodes = transform("* **Brand**: Acme");
        match &nodes[0] {
            MarkupNode::List { items, .. } => assert_eq!(
                items[0].content,
                vec![Inline::Strong("Brand".into()), Inline::Text(": Acme".into())]
            ),
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn test_summary_heading_then_list() {
        let nodes = transform("### Summary\n- Found 3 matches\n- All compliant");
        assert_eq!(nodes.len(), 2);
        assert_eq!(
            nodes[0],
            MarkupNode::Heading {
                level: 3,
                content: vec![Inline::Text("Summary".into())]
            }
        );
        match &nodes[1] {
            MarkupNode::List { kind, items } => {
                assert_eq!(*kind, ListKind::Unordered);
                assert_eq!(items.len(), 2);
                assert_eq!(items[0].content, vec![Inline::Text("Found 3 matches".into())]);
            }
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn test_blank_line_before_block_is_kept() {
        let nodes = transform("Intro\n\n- a");
        assert_eq!(nodes[..3], [text("Intro"), MarkupNode::Break, MarkupNode::Break]);
        assert!(matches!(nodes[3], MarkupNode::List { .. }));

        let nodes = transform("Intro\n\n# T");
        assert_eq!(nodes[..3], [text("Intro"), MarkupNode::Break, MarkupNode::Break]);
        assert!(matches!(nodes[3], MarkupNode::Heading { level: 1, .. }));
    }

    #[test]
    fn test_block_lines_absorb_their_newline() {
        let nodes = transform("# T\nMore");
        assert!(matches!(&nodes[..], [MarkupNode::Heading { .. }, n] if *n == text("More")));

        let nodes = transform("- a\nMore");
        assert!(matches!(&nodes[..], [MarkupNode::List { .. }, n] if *n == text("More")));
    }

    #[test]
    fn test_crlf_is_tolerated() {
        assert_eq!(
            transform("a\r\nb"),
            vec![text("a"), MarkupNode::Break, text("b")]
        );
    }
}
