//! QueryBackend trait — the retrieval service as the TUI sees it.
//!
//! This trait lives in `citelens-tui` so the TUI never depends on the HTTP
//! client. `citelens-interface` provides the concrete implementation.

use std::sync::Arc;

use async_trait::async_trait;
use citelens_core::{HealthStatus, QueryReply, QueryRequest};

/// Abstraction over the backend calls the TUI requires.
#[async_trait]
pub trait QueryBackend: Send + Sync {
    /// Human-readable location of the backend, shown in the title bar.
    fn endpoint(&self) -> String;

    async fn query(&self, request: &QueryRequest) -> anyhow::Result<QueryReply>;

    async fn health(&self) -> anyhow::Result<HealthStatus>;
}

/// Convenience type alias used throughout the TUI crate.
pub type DynQueryBackend = Arc<dyn QueryBackend>;
