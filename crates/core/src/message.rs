//! Transcript data model — messages, citation records and result tables.
//!
//! A `Transcript` is append-only: messages are immutable once pushed and are
//! never reordered. Every assistant message owns the `CitationIndex` built
//! from its own citations at creation time, so older turns keep resolving
//! their markers after newer replies arrive.

use std::fmt;

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::citation::CitationIndex;
use crate::source::Source;

/// Content template for the synthetic assistant message appended when a
/// request to the backend fails.
pub const FAILURE_MESSAGE_PREFIX: &str = "Sorry, I encountered an error: ";

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Role::User => "You",
            Role::Assistant => "Assistant",
        }
    }
}

/// Kind of retrieval that produced a citation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CitationKind {
    Sql,
    Semantic,
    /// Any kind this client does not know about; kept verbatim.
    Other(String),
}

impl CitationKind {
    pub fn as_str(&self) -> &str {
        match self {
            CitationKind::Sql => "sql",
            CitationKind::Semantic => "semantic",
            CitationKind::Other(raw) => raw.as_str(),
        }
    }
}

impl From<String> for CitationKind {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "sql" => CitationKind::Sql,
            "semantic" => CitationKind::Semantic,
            _ => CitationKind::Other(value),
        }
    }
}

impl From<CitationKind> for String {
    fn from(kind: CitationKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for CitationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A provenance entry attached to an assistant turn, identifying the data
/// row that backs a claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub citation_id: String,
    #[serde(rename = "type")]
    pub kind: CitationKind,
    pub row_index: i64,
    #[serde(default)]
    pub row_data: Map<String, Value>,
    /// Positive and unique within one assistant message.
    pub citation_number: u32,
}

impl Citation {
    /// Look up a row field by name, ignoring ASCII case.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.row_data
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }
}

/// Render a JSON value the way a table cell or detail row displays it.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// One named tabular result set attached to an assistant message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub rows: Vec<Map<String, Value>>,
}

impl Table {
    pub fn new(name: impl Into<String>, rows: Vec<Map<String, Value>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// Column headers: the keys of the first row, in that row's order.
    pub fn columns(&self) -> Vec<&str> {
        self.rows
            .first()
            .map(|row| row.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A single turn of the conversation.
#[derive(Debug, Clone)]
pub struct Message {
    role: Role,
    content: String,
    citations: Vec<Citation>,
    tables: Vec<Table>,
    sources: Vec<Source>,
    explanation: Option<Value>,
    created_at: DateTime<Utc>,
    index: CitationIndex,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content.into(), Vec::new(), Vec::new())
    }

    pub fn assistant(
        content: impl Into<String>,
        citations: Vec<Citation>,
        tables: Vec<Table>,
    ) -> Self {
        Self::new(Role::Assistant, content.into(), citations, tables)
    }

    /// The synthetic assistant turn recorded when a request fails.
    pub fn failure(description: &str) -> Self {
        Self::assistant(
            format!("{FAILURE_MESSAGE_PREFIX}{description}"),
            Vec::new(),
            Vec::new(),
        )
    }

    fn new(role: Role, content: String, citations: Vec<Citation>, tables: Vec<Table>) -> Self {
        let index = CitationIndex::rebuild(&citations);
        Self {
            role,
            content,
            citations,
            tables,
            sources: Vec::new(),
            explanation: None,
            created_at: Utc::now(),
            index,
        }
    }

    pub fn with_sources(mut self, sources: Vec<Source>) -> Self {
        self.sources = sources;
        self
    }

    pub fn with_explanation(mut self, explanation: Value) -> Self {
        let empty = match &explanation {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            _ => false,
        };
        self.explanation = if empty { None } else { Some(explanation) };
        self
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn citations(&self) -> &[Citation] {
        &self.citations
    }

    pub fn has_citations(&self) -> bool {
        !self.citations.is_empty()
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// Sources reported by the backend for this turn; falls back to sources
    /// derived from the citations when the reply carried none.
    pub fn sources(&self) -> Vec<Source> {
        if !self.sources.is_empty() {
            return self.sources.clone();
        }
        self.citations.iter().map(Source::from_citation).collect()
    }

    pub fn explanation(&self) -> Option<&Value> {
        self.explanation.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Local wall-clock time the message was recorded, `HH:MM:SS`.
    pub fn time_label(&self) -> String {
        self.created_at
            .with_timezone(&Local)
            .format("%H:%M:%S")
            .to_string()
    }

    pub fn citation_index(&self) -> &CitationIndex {
        &self.index
    }
}

/// Append-only ordered sequence of messages.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        tracing::debug!(
            role = message.role().label(),
            citations = message.citations().len(),
            tables = message.tables().len(),
            "transcript append"
        );
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// The single "current" index: that of the most recent assistant message
    /// carrying citations. A newer reply without citations leaves the
    /// previous index in effect.
    pub fn latest_citation_index(&self) -> Option<&CitationIndex> {
        self.messages
            .iter()
            .rev()
            .filter(|m| m.role() == Role::Assistant)
            .find(|m| m.has_citations())
            .map(Message::citation_index)
    }

    /// Every source reported across assistant turns, in transcript order.
    pub fn collect_sources(&self) -> Vec<Source> {
        self.messages
            .iter()
            .filter(|m| m.role() == Role::Assistant)
            .flat_map(Message::sources)
            .collect()
    }
}
