//! Citation index and tokenizer.
//!
//! Assistant text refers to citation records with inline `[n]` markers. The
//! tokenizer splits the text into plain-text and citation-reference segments,
//! resolving each number against the `CitationIndex` of the same message.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::message::Citation;

static CITATION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(\d+)\]").expect("valid citation marker regex"));

/// Mapping from citation number to citation record for one assistant turn.
#[derive(Debug, Clone, Default)]
pub struct CitationIndex {
    by_number: HashMap<u32, Citation>,
}

impl CitationIndex {
    /// Build the index from a message's citations.
    ///
    /// When a number repeats, the later record wins.
    pub fn rebuild(citations: &[Citation]) -> Self {
        let mut by_number = HashMap::with_capacity(citations.len());
        for citation in citations {
            if by_number
                .insert(citation.citation_number, citation.clone())
                .is_some()
            {
                tracing::warn!(
                    number = citation.citation_number,
                    citation_id = %citation.citation_id,
                    "duplicate citation number in one message"
                );
            }
        }
        tracing::debug!(entries = by_number.len(), "citation index rebuilt");
        Self { by_number }
    }

    pub fn lookup(&self, number: u32) -> Option<&Citation> {
        self.by_number.get(&number)
    }

    pub fn len(&self) -> usize {
        self.by_number.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_number.is_empty()
    }
}

/// An atomic unit of citation-aware rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment<'a> {
    Text(&'a str),
    CitationRef {
        number: u32,
        /// The marker exactly as written, brackets included.
        literal: &'a str,
        resolved: Option<&'a Citation>,
    },
}

impl<'a> Segment<'a> {
    /// The source text this segment was cut from.
    pub fn as_source(&self) -> &'a str {
        match self {
            Segment::Text(text) => text,
            Segment::CitationRef { literal, .. } => literal,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(
            self,
            Segment::CitationRef {
                resolved: Some(_),
                ..
            }
        )
    }
}

/// Split `content` into text and citation-reference segments.
///
/// Missing numbers produce an unresolved reference rather than an error. A
/// digit run too large to be a citation number stays part of the text.
pub fn tokenize<'a>(content: &'a str, index: &'a CitationIndex) -> Vec<Segment<'a>> {
    let mut segments = Vec::new();
    let mut last_end = 0;

    for caps in CITATION_MARKER.captures_iter(content) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let Ok(number) = caps[1].parse::<u32>() else {
            continue;
        };
        if whole.start() > last_end {
            segments.push(Segment::Text(&content[last_end..whole.start()]));
        }
        segments.push(Segment::CitationRef {
            number,
            literal: whole.as_str(),
            resolved: index.lookup(number),
        });
        last_end = whole.end();
    }

    if last_end < content.len() {
        segments.push(Segment::Text(&content[last_end..]));
    }
    segments
}

/// Numbers referenced in `content` that have no record in `index`.
pub fn unresolved_numbers(content: &str, index: &CitationIndex) -> Vec<u32> {
    tokenize(content, index)
        .into_iter()
        .filter_map(|segment| match segment {
            Segment::CitationRef {
                number,
                resolved: None,
                ..
            } => Some(number),
            _ => None,
        })
        .collect()
}
