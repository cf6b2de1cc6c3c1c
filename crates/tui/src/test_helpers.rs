//! Shared test helpers for TUI sub-module tests.

use std::sync::Mutex;

use async_trait::async_trait;
use ratatui::text::Line;
use serde_json::{Map, Value, json};

use citelens_core::{Citation, CitationKind, HealthStatus, Message, QueryReply, QueryRequest};

use super::*;

pub fn line_plain(line: &Line<'_>) -> String {
    line_text(line)
}

pub fn rendered_plain(rendered: &RenderedTranscript) -> Vec<String> {
    rendered.plain_lines()
}

pub fn row(fields: &[(&str, &str)]) -> Map<String, Value> {
    fields
        .iter()
        .map(|(k, v)| ((*k).to_string(), json!(v)))
        .collect()
}

pub fn sql_citation(number: u32, product: &str) -> Citation {
    Citation {
        citation_id: format!("sql-{number}"),
        kind: CitationKind::Sql,
        row_index: number as i64,
        row_data: row(&[("ProductName", product), ("CompanyName", "Acme")]),
        citation_number: number,
    }
}

pub fn cited_message(content: &str, numbers: &[u32]) -> Message {
    let citations = numbers
        .iter()
        .map(|n| sql_citation(*n, &format!("Product {n}")))
        .collect();
    Message::assistant(content, citations, Vec::new())
}

/// A backend reply whose citations cover `numbers`, one SQL source each.
pub fn cited_reply(answer: &str, numbers: &[u32]) -> QueryReply {
    let citations: Vec<Citation> = numbers
        .iter()
        .map(|n| sql_citation(*n, &format!("Product {n}")))
        .collect();
    let sources = numbers
        .iter()
        .map(|_| {
            serde_json::from_value(json!({
                "type": "sql",
                "source": "California Safe Cosmetics Database"
            }))
            .expect("valid source")
        })
        .collect();
    QueryReply {
        answer: answer.to_string(),
        sql_results: Some(vec![row(&[("ProductName", "Product 1")])]),
        sources: Some(sources),
        citations: Some(citations),
        intent: json!({"query_type": "SQL"}),
        ..QueryReply::default()
    }
}

/// In-memory backend that answers every question the same way.
pub struct MockBackend {
    outcome: Result<QueryReply, String>,
    questions: Mutex<Vec<String>>,
}

impl MockBackend {
    pub fn replying(reply: QueryReply) -> Self {
        Self {
            outcome: Ok(reply),
            questions: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            outcome: Err(message.to_string()),
            questions: Mutex::new(Vec::new()),
        }
    }

    pub fn questions(&self) -> Vec<String> {
        self.questions.lock().expect("questions lock").clone()
    }
}

#[async_trait]
impl QueryBackend for MockBackend {
    fn endpoint(&self) -> String {
        "mock://backend".to_string()
    }

    async fn query(&self, request: &QueryRequest) -> anyhow::Result<QueryReply> {
        self.questions
            .lock()
            .expect("questions lock")
            .push(request.question.clone());
        self.outcome.clone().map_err(|e| anyhow::anyhow!(e))
    }

    async fn health(&self) -> anyhow::Result<HealthStatus> {
        Ok(HealthStatus {
            status: "healthy".to_string(),
            timestamp: None,
            version: Some("1.0.0".to_string()),
        })
    }
}
