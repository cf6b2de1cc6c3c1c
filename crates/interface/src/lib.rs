//! citelens interface
//!
//! - cli: command line entry (`tui`, `ask`, `health`)
//! - query_client: HTTP client for the retrieval backend
//! - logging: tracing subscriber setup

pub mod cli;
pub mod logging;
pub mod query_client;

pub use cli::{CliError, OutputFormat, run_cli};
pub use query_client::{BackendError, QueryClient};
