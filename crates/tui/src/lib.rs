//! citelens TUI — terminal chat client over a retrieval backend.
//!
//! This crate renders the transcript (markup and citation markers), the
//! citation detail overlay and the sources panel, and runs the ratatui
//! event loop. It defines the `QueryBackend` trait that
//! `citelens-interface` implements.

mod app;
mod chat_renderer;
mod detail_view;
mod input_handler;
mod layout_manager;
mod markup_renderer;
pub mod query_backend;
mod session;
mod sources_panel;
mod table_renderer;
#[cfg(test)]
pub(crate) mod test_helpers;

pub use query_backend::{DynQueryBackend, QueryBackend};

pub use app::*;
pub use chat_renderer::*;
pub use detail_view::*;
pub use input_handler::*;
pub use layout_manager::*;
pub use markup_renderer::*;
pub use session::*;
pub use sources_panel::*;
pub use table_renderer::*;

use citelens_core::UiConfig;

// ── ViewState ───────────────────────────────────────────────────────

/// Display toggles and transient UI state that are not part of the chat.
#[derive(Debug, Clone)]
pub struct ViewState {
    pub show_sources_panel: bool,
    pub show_tables: bool,
    pub history_size: usize,
    pub sources_scroll_offset: usize,
    /// One-off text shown under the transcript (help, health checks).
    pub notice: Option<String>,
}

impl ViewState {
    pub fn from_config(ui: &UiConfig) -> Self {
        Self {
            show_sources_panel: ui.show_sources_panel,
            show_tables: ui.show_tables,
            history_size: ui.history_size.max(1),
            sources_scroll_offset: 0,
            notice: None,
        }
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::from_config(&UiConfig::default())
    }
}
