//! Source records for the aggregate sources panel.
//!
//! Sources are coarser than citations and arrive possibly duplicated across
//! turns. They are free-form JSON objects; two sources are the same when
//! every field matches, regardless of field order.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::message::{Citation, CitationKind, display_value};

pub const SQL_SOURCE_TITLE: &str = "Database Query";
pub const SEMANTIC_SOURCE_TITLE: &str = "Semantic Search";
pub const DEFAULT_SQL_DATABASE: &str = "California Safe Cosmetics Database";
pub const DEFAULT_VECTOR_DATABASE: &str = "Pinecone Vector Database";
pub const SQL_SOURCE_DETAILS: &str = "Structured data query";
pub const DETAIL_SEPARATOR: &str = " • ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    Sql,
    Semantic,
    SemanticFiltered,
    Other(String),
}

impl SourceKind {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "sql" => SourceKind::Sql,
            "semantic" => SourceKind::Semantic,
            "semantic_filtered" => SourceKind::SemanticFiltered,
            other => SourceKind::Other(other.to_string()),
        }
    }
}

/// A panel-facing provenance record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Source {
    fields: Map<String, Value>,
}

impl Source {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Derive a source from a citation when the backend reported none.
    pub fn from_citation(citation: &Citation) -> Self {
        let kind = match &citation.kind {
            CitationKind::Sql => "sql",
            CitationKind::Semantic => "semantic",
            CitationKind::Other(raw) => raw.as_str(),
        };
        let mut fields = Map::new();
        fields.insert("type".into(), Value::String(kind.to_string()));
        for name in ["product", "company", "chemical"] {
            if let Some(value) = citation.field(name) {
                fields.insert(name.into(), Value::String(display_value(value)));
            }
        }
        Self { fields }
    }

    pub fn kind(&self) -> SourceKind {
        SourceKind::parse(self.field("type").unwrap_or_default())
    }

    /// A string-valued field; empty strings count as absent.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Serialization with object keys sorted at every depth.
    pub fn canonical_key(&self) -> String {
        canonicalize(&Value::Object(self.fields.clone())).to_string()
    }
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::new();
            for key in keys {
                sorted.insert(key.clone(), canonicalize(&map[key]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Drop structural duplicates, keeping the first occurrence of each source.
pub fn dedupe(sources: &[Source]) -> Vec<Source> {
    let mut seen = HashSet::with_capacity(sources.len());
    let unique: Vec<Source> = sources
        .iter()
        .filter(|source| seen.insert(source.canonical_key()))
        .cloned()
        .collect();
    tracing::debug!(
        total = sources.len(),
        unique = unique.len(),
        "sources deduplicated"
    );
    unique
}

/// Title/description/details triple shown for a source in the panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSummary {
    pub title: String,
    pub description: String,
    pub details: String,
}

/// Presentation for a source; `None` for kinds the panel does not show.
pub fn describe(source: &Source) -> Option<SourceSummary> {
    match source.kind() {
        SourceKind::Sql => Some(SourceSummary {
            title: SQL_SOURCE_TITLE.to_string(),
            description: source
                .field("source")
                .unwrap_or(DEFAULT_SQL_DATABASE)
                .to_string(),
            details: SQL_SOURCE_DETAILS.to_string(),
        }),
        SourceKind::Semantic | SourceKind::SemanticFiltered => Some(SourceSummary {
            title: SEMANTIC_SOURCE_TITLE.to_string(),
            description: source
                .field("source")
                .unwrap_or(DEFAULT_VECTOR_DATABASE)
                .to_string(),
            details: ["company", "chemical"]
                .iter()
                .filter_map(|name| source.field(name))
                .collect::<Vec<_>>()
                .join(DETAIL_SEPARATOR),
        }),
        SourceKind::Other(_) => None,
    }
}

/// Dedupe then describe, skipping kinds without a presentation.
pub fn summarize(sources: &[Source]) -> Vec<SourceSummary> {
    dedupe(sources).iter().filter_map(describe).collect()
}
