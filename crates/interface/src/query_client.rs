//! HTTP client for the retrieval backend (`POST /query`, `GET /health`).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use thiserror::Error;

use citelens_core::{CiteLensConfig, HealthStatus, QueryReply, QueryRequest};
use citelens_tui::QueryBackend;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("could not reach backend at {url}: {source}")]
    Network { url: String, source: reqwest::Error },

    #[error("backend returned {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("unexpected response from backend: {source}")]
    Decode { source: reqwest::Error },

    #[error("failed to build HTTP client: {source}")]
    Client { source: reqwest::Error },
}

/// Map a non-success response to `BackendError::Status`.
///
/// FastAPI reports errors as `{"detail": "..."}`, or as a list of
/// `{"msg": ...}` objects for validation failures.
pub fn status_error(status: StatusCode, body: &str) -> BackendError {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| match value.get("detail") {
            Some(Value::String(detail)) => Some(detail.clone()),
            Some(Value::Array(items)) => Some(
                items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(Value::as_str))
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
            _ => None,
        })
        .filter(|detail| !detail.is_empty())
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.chars().take(200).collect())
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
    BackendError::Status {
        status: status.as_u16(),
        detail,
    }
}

#[derive(Debug, Clone)]
pub struct QueryClient {
    client: Client,
    base_url: String,
}

impl QueryClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| BackendError::Client { source })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &CiteLensConfig) -> Result<Self, BackendError> {
        Self::new(
            config.backend_url(),
            Duration::from_secs(config.backend.timeout_secs.max(1)),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn check(response: Response) -> Result<Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, &body))
    }

    async fn post_query(&self, request: &QueryRequest) -> Result<Response, BackendError> {
        let url = self.url("query");
        tracing::debug!(url = %url, limit = request.limit_results, "POST query");
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|source| BackendError::Network { url, source })?;
        Self::check(response).await
    }

    pub async fn query(&self, request: &QueryRequest) -> Result<QueryReply, BackendError> {
        self.post_query(request)
            .await?
            .json::<QueryReply>()
            .await
            .map_err(|source| BackendError::Decode { source })
    }

    /// The reply body exactly as the backend sent it.
    pub async fn query_raw(&self, request: &QueryRequest) -> Result<Value, BackendError> {
        self.post_query(request)
            .await?
            .json::<Value>()
            .await
            .map_err(|source| BackendError::Decode { source })
    }

    pub async fn health(&self) -> Result<HealthStatus, BackendError> {
        let url = self.url("health");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| BackendError::Network { url, source })?;
        Self::check(response)
            .await?
            .json::<HealthStatus>()
            .await
            .map_err(|source| BackendError::Decode { source })
    }
}

#[async_trait]
impl QueryBackend for QueryClient {
    fn endpoint(&self) -> String {
        self.base_url.clone()
    }

    async fn query(&self, request: &QueryRequest) -> anyhow::Result<QueryReply> {
        Ok(QueryClient::query(self, request).await?)
    }

    async fn health(&self) -> anyhow::Result<HealthStatus> {
        Ok(QueryClient::health(self).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response and return the request that came in.
    async fn serve_once(status_line: &'static str, body: String) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&buf);
                if let Some(end) = text.find("\r\n\r\n") {
                    let length = text[..end]
                        .lines()
                        .find_map(|l| {
                            let (name, value) = l.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if buf.len() >= end + 4 + length {
                        break;
                    }
                }
            }
            let response = format!(
                "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&buf).to_string()
        });
        (format!("http://{addr}/"), handle)
    }

    #[test]
    fn test_status_error_reads_fastapi_detail() {
        let err = status_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"detail": "Error processing query: timeout"}"#,
        );
        assert_eq!(
            err.to_string(),
            "backend returned 500: Error processing query: timeout"
        );
    }

    #[test]
    fn test_status_error_validation_list() {
        let body = json!({"detail": [
            {"loc": ["body", "question"], "msg": "field required", "type": "value_error.missing"},
            {"loc": ["body", "limit_results"], "msg": "value is not a valid integer"}
        ]})
        .to_string();
        let err = status_error(StatusCode::UNPROCESSABLE_ENTITY, &body);
        assert!(matches!(
            err,
            BackendError::Status { status: 422, ref detail }
                if detail == "field required; value is not a valid integer"
        ));
    }

    #[test]
    fn test_status_error_fallbacks() {
        let err = status_error(StatusCode::BAD_GATEWAY, "upstream down\n");
        assert_eq!(err.to_string(), "backend returned 502: upstream down");
        let err = status_error(StatusCode::SERVICE_UNAVAILABLE, "");
        assert_eq!(err.to_string(), "backend returned 503: Service Unavailable");
    }

    #[test]
    fn test_url_joining() {
        let client = QueryClient::new("http://rag.local:8000/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "http://rag.local:8000");
        assert_eq!(client.url("query"), "http://rag.local:8000/query");
        assert_eq!(client.url("/health"), "http://rag.local:8000/health");
    }

    #[tokio::test]
    async fn test_query_round_trip_against_local_server() {
        let body = json!({
            "answer": "Shampoo A contains SLS [1].",
            "sql_results": [{"ProductName": "Shampoo A"}],
            "semantic_results": [],
            "sources": [{"type": "sql", "source": "California Safe Cosmetics Database"}],
            "citations": [{"citation_id": "sql-1", "type": "sql", "row_index": 1,
                           "citation_number": 1, "row_data": {"ProductName": "Shampoo A"}}],
            "explanation": {},
            "intent": {"query_type": "SQL"},
            "routing": {}
        })
        .to_string();
        let (url, server) = serve_once("HTTP/1.1 200 OK", body).await;
        let client = QueryClient::new(&url, Duration::from_secs(5)).unwrap();

        let reply = client
            .query(&QueryRequest::new("which shampoos contain SLS?"))
            .await
            .unwrap();
        assert_eq!(reply.citations.as_ref().unwrap().len(), 1);
        assert_eq!(reply.query_type(), Some("SQL"));

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /query "));
        assert!(request.contains(r#""question":"which shampoos contain SLS?""#));
        assert!(request.contains(r#""limit_results":6"#));
    }

    #[tokio::test]
    async fn test_query_maps_server_error() {
        let body = json!({"detail": "Error processing query: model offline"}).to_string();
        let (url, server) = serve_once("HTTP/1.1 500 Internal Server Error", body).await;
        let client = QueryClient::new(&url, Duration::from_secs(5)).unwrap();
        let err = client.query(&QueryRequest::new("q")).await.unwrap_err();
        server.await.unwrap();
        assert!(matches!(err, BackendError::Status { status: 500, .. }));
        assert!(err.to_string().contains("model offline"));
    }

    #[tokio::test]
    async fn test_health_through_trait() {
        let body = json!({"status": "healthy", "timestamp": "2024-01-01T00:00:00", "version": "1.0.0"})
            .to_string();
        let (url, server) = serve_once("HTTP/1.1 200 OK", body).await;
        let backend: Box<dyn QueryBackend> =
            Box::new(QueryClient::new(&url, Duration::from_secs(5)).unwrap());
        let health = backend.health().await.unwrap();
        assert!(health.is_healthy());
        let request = server.await.unwrap();
        assert!(request.starts_with("GET /health "));
    }
}
