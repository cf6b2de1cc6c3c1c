//! citelens core — transcript model and the citation-linking pipeline.
//!
//! Contains:
//! - message: transcript, messages, citation records, result tables
//! - markup: assistant text to typed markup nodes
//! - citation: per-message citation index and `[n]` tokenizer
//! - source: source deduplication and panel presentation
//! - reply: backend wire types
//! - config: YAML + environment configuration

pub mod citation;
pub mod config;
pub mod markup;
pub mod message;
pub mod reply;
pub mod source;

pub use citation::{CitationIndex, Segment, tokenize, unresolved_numbers};
pub use config::{BackendConfig, CiteLensConfig, ConfigError, LogConfig, UiConfig};
pub use markup::{Inline, ListItem, ListKind, MarkupNode, transform};
pub use message::{
    Citation, CitationKind, FAILURE_MESSAGE_PREFIX, Message, Role, Table, Transcript,
    display_value,
};
pub use reply::{HealthStatus, QueryReply, QueryRequest};
pub use source::{Source, SourceKind, SourceSummary, dedupe, describe, summarize};
