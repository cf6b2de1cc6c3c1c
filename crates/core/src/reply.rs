//! Wire types of the retrieval backend's HTTP API.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::message::{Citation, Message, Table};
use crate::source::Source;

/// Largest result count the backend honours per retrieval path.
pub const MAX_RESULTS: usize = 6;

pub const SQL_RESULTS_TABLE: &str = "SQL Results";
pub const SEMANTIC_RESULTS_TABLE: &str = "Semantic Results";

/// Body of `POST /query`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub question: String,
    #[serde(default)]
    pub stream: bool,
    #[serde(default = "default_limit_results")]
    pub limit_results: usize,
}

fn default_limit_results() -> usize {
    MAX_RESULTS
}

impl QueryRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            stream: false,
            limit_results: default_limit_results(),
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit_results = limit.clamp(1, MAX_RESULTS);
        self
    }
}

/// Response of `POST /query`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryReply {
    pub answer: String,
    #[serde(default)]
    pub sql_results: Option<Vec<Map<String, Value>>>,
    #[serde(default)]
    pub semantic_results: Option<Vec<Map<String, Value>>>,
    #[serde(default)]
    pub sql_query_used: Option<String>,
    #[serde(default)]
    pub sources: Option<Vec<Source>>,
    #[serde(default)]
    pub citations: Option<Vec<Citation>>,
    #[serde(default)]
    pub explanation: Value,
    #[serde(default)]
    pub intent: Value,
    #[serde(default)]
    pub routing: Value,
}

impl QueryReply {
    /// Non-empty result sets as named tables, SQL first.
    pub fn tables(&self) -> Vec<Table> {
        [
            (SQL_RESULTS_TABLE, &self.sql_results),
            (SEMANTIC_RESULTS_TABLE, &self.semantic_results),
        ]
        .into_iter()
        .filter_map(|(name, rows)| {
            rows.as_ref()
                .filter(|rows| !rows.is_empty())
                .map(|rows| Table::new(name, rows.clone()))
        })
        .collect()
    }

    /// The query type the backend's intent analysis chose, if reported.
    pub fn query_type(&self) -> Option<&str> {
        self.intent.get("query_type").and_then(Value::as_str)
    }

    /// Build the assistant message this reply is recorded as.
    pub fn into_message(self) -> Message {
        let tables = self.tables();
        let explanation = match (&self.explanation, &self.intent) {
            (Value::Object(e), _) if !e.is_empty() => self.explanation.clone(),
            (_, Value::Object(i)) if !i.is_empty() => {
                serde_json::json!({ "intent": self.intent.clone() })
            }
            _ => Value::Null,
        };
        Message::assistant(self.answer, self.citations.unwrap_or_default(), tables)
            .with_sources(self.sources.unwrap_or_default())
            .with_explanation(explanation)
    }
}

/// Response of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}
