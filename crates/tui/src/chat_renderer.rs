//! Chat Renderer — transcript to styled lines.
//!
//! Assistant messages that carry citations take the citation-aware path:
//! the tokenizer output is rendered with every `[n]` as a marker, resolved
//! markers selectable, unresolved ones dimmed and struck. Everything else
//! goes through the markup transformer. Result tables follow the body.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use citelens_core::{Message, Role, Segment, Transcript, tokenize, transform};

use super::{markup_lines, table_lines};

#[derive(Debug, Clone, Copy)]
pub struct TuiTheme {
    pub text_strong: Color,
    pub text_base: Color,
    pub text_muted: Color,
    pub text_dim: Color,
    pub primary: Color,
    pub success: Color,
    pub warning: Color,
    pub danger: Color,
    pub info: Color,
    pub user_accent: Color,
    pub assistant_accent: Color,
    pub heading: Color,
    pub code_fg: Color,
    pub code_bg: Color,
    pub citation: Color,
    pub border_normal: Color,
    pub border_active: Color,
    pub border_dim: Color,
}

impl TuiTheme {
    pub fn default_dark() -> Self {
        Self {
            text_strong: Color::White,
            text_base: Color::Gray,
            text_muted: Color::DarkGray,
            text_dim: Color::Rgb(100, 100, 100),
            primary: Color::Cyan,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
            info: Color::Blue,
            user_accent: Color::Blue,
            assistant_accent: Color::Cyan,
            heading: Color::White,
            code_fg: Color::Yellow,
            code_bg: Color::Rgb(40, 40, 40),
            citation: Color::LightBlue,
            border_normal: Color::DarkGray,
            border_active: Color::Cyan,
            border_dim: Color::Rgb(60, 60, 60),
        }
    }
}

pub const PROCESSING_NOTE: &str = "processing...";

/// Identifies one citation marker in the transcript: the `ordinal`-th
/// marker of message `message`, written as `[number]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerRef {
    pub message: usize,
    pub ordinal: usize,
    pub number: u32,
}

/// Where a resolved marker landed in the rendered output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerPosition {
    pub marker: MarkerRef,
    pub line: usize,
}

#[derive(Debug, Clone, Default)]
pub struct RenderedTranscript {
    pub lines: Vec<Line<'static>>,
    pub markers: Vec<MarkerPosition>,
}

/// The text of a line with styling dropped.
pub fn line_text(line: &Line<'_>) -> String {
    line.spans.iter().map(|s| s.content.as_ref()).collect()
}

impl RenderedTranscript {
    pub fn plain_lines(&self) -> Vec<String> {
        self.lines.iter().map(line_text).collect()
    }

    pub fn line_of(&self, marker: MarkerRef) -> Option<usize> {
        self.markers
            .iter()
            .find(|p| p.marker == marker)
            .map(|p| p.line)
    }
}

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub show_tables: bool,
    pub selected: Option<MarkerRef>,
    pub theme: TuiTheme,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            show_tables: true,
            selected: None,
            theme: TuiTheme::default_dark(),
        }
    }
}

/// Render the transcript with default options.
pub fn render(transcript: &Transcript, pending: bool, error: Option<&str>) -> RenderedTranscript {
    render_transcript(transcript, pending, error, &RenderOptions::default())
}

pub fn render_transcript(
    transcript: &Transcript,
    pending: bool,
    error: Option<&str>,
    options: &RenderOptions,
) -> RenderedTranscript {
    let theme = &options.theme;
    let mut out = RenderedTranscript::default();
    let mut turn = 0usize;

    for (idx, message) in transcript.messages().iter().enumerate() {
        if message.role() == Role::User {
            turn += 1;
        }
        if idx > 0 {
            out.lines.push(Line::default());
        }
        render_message(idx, turn.max(1), message, options, &mut out);
    }

    if pending {
        out.lines.push(Line::from(vec![
            Span::styled("  ◆ ", Style::default().fg(theme.warning)),
            Span::styled(PROCESSING_NOTE, Style::default().fg(theme.warning)),
        ]));
    }
    if let Some(error) = error {
        out.lines.push(Line::from(vec![
            Span::styled(
                "  ✗ ",
                Style::default()
                    .fg(theme.danger)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("Error: {error}"), Style::default().fg(theme.danger)),
        ]));
    }
    out
}

fn accent(role: Role, theme: &TuiTheme) -> Color {
    match role {
        Role::User => theme.user_accent,
        Role::Assistant => theme.assistant_accent,
    }
}

fn render_message(
    idx: usize,
    turn: usize,
    message: &Message,
    options: &RenderOptions,
    out: &mut RenderedTranscript,
) {
    let theme = &options.theme;
    let accent = accent(message.role(), theme);

    // Header: ▌ You [#n]  HH:MM:SS
    out.lines.push(Line::from(vec![
        Span::styled("▌ ", Style::default().fg(accent)),
        Span::styled(
            format!("{} [#{}]", message.role().label(), turn),
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  {}", message.time_label()),
            Style::default().fg(theme.text_dim),
        ),
    ]));

    let body_start = out.lines.len();
    let body = if message.has_citations() {
        let (lines, positions) = citation_lines(idx, message, options);
        out.markers.extend(positions.into_iter().map(|mut p| {
            p.line += body_start;
            p
        }));
        lines
    } else {
        markup_lines(&transform(message.content()), theme)
    };
    push_bordered(out, body, accent);

    if options.show_tables {
        for table in message.tables().iter().filter(|t| !t.is_empty()) {
            push_bordered(out, table_lines(table, theme), accent);
        }
    }

    out.lines.push(Line::from(Span::styled(
        "└─",
        Style::default().fg(accent),
    )));
}

fn push_bordered(out: &mut RenderedTranscript, body: Vec<Line<'static>>, accent: Color) {
    if body.is_empty() {
        out.lines.push(Line::from(Span::styled(
            "│ ",
            Style::default().fg(accent),
        )));
        return;
    }
    for line in body {
        let mut spans = Vec::with_capacity(line.spans.len() + 1);
        spans.push(Span::styled("│ ", Style::default().fg(accent)));
        spans.extend(line.spans);
        out.lines.push(Line::from(spans));
    }
}

fn marker_style(resolved: bool, selected: bool, theme: &TuiTheme) -> Style {
    if !resolved {
        return Style::default()
            .fg(theme.text_dim)
            .add_modifier(Modifier::DIM | Modifier::CROSSED_OUT);
    }
    let style = Style::default()
        .fg(theme.citation)
        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
    if selected {
        style.add_modifier(Modifier::REVERSED)
    } else {
        style
    }
}

/// Citation-aware body. Text is kept verbatim; newlines inside text
/// segments start new lines. Positions are relative to the body.
fn citation_lines(
    idx: usize,
    message: &Message,
    options: &RenderOptions,
) -> (Vec<Line<'static>>, Vec<MarkerPosition>) {
    let theme = &options.theme;
    let text_style = Style::default().fg(theme.text_base);
    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();
    let mut positions = Vec::new();
    let mut ordinal = 0usize;

    for segment in tokenize(message.content(), message.citation_index()) {
        match segment {
            Segment::Text(text) => {
                let pieces: Vec<&str> = text.split('\n').collect();
                let last = pieces.len() - 1;
                for (i, piece) in pieces.into_iter().enumerate() {
                    if i > 0 {
                        lines.push(Line::from(std::mem::take(&mut current)));
                    }
                    let piece = if i < last {
                        piece.strip_suffix('\r').unwrap_or(piece)
                    } else {
                        piece
                    };
                    if !piece.is_empty() {
                        current.push(Span::styled(piece.to_string(), text_style));
                    }
                }
            }
            Segment::CitationRef {
                number,
                literal,
                resolved,
            } => {
                let marker = MarkerRef {
                    message: idx,
                    ordinal,
                    number,
                };
                ordinal += 1;
                let is_resolved = resolved.is_some();
                if is_resolved {
                    positions.push(MarkerPosition {
                        marker,
                        line: lines.len(),
                    });
                }
                let selected = options.selected == Some(marker);
                current.push(Span::styled(
                    literal.to_string(),
                    marker_style(is_resolved, selected, theme),
                ));
            }
        }
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(Line::from(current));
    }
    (lines, positions)
}

/// Every resolved marker in transcript order.
pub fn resolved_markers(transcript: &Transcript) -> Vec<MarkerRef> {
    let mut markers = Vec::new();
    for (idx, message) in transcript.messages().iter().enumerate() {
        if message.role() != Role::Assistant || !message.has_citations() {
            continue;
        }
        let refs = tokenize(message.content(), message.citation_index())
            .into_iter()
            .filter_map(|segment| match segment {
                Segment::CitationRef {
                    number, resolved, ..
                } => Some((number, resolved.is_some())),
                Segment::Text(_) => None,
            });
        for (ordinal, (number, resolved)) in refs.enumerate() {
            if resolved {
                markers.push(MarkerRef {
                    message: idx,
                    ordinal,
                    number,
                });
            }
        }
    }
    markers
}
