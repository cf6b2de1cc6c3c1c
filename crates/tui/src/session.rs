//! Chat session — transcript, pending flag, error banner, marker selection
//! and the open citation detail.
//!
//! All mutation happens on the UI loop. The backend call itself runs
//! elsewhere and reports back through `on_reply` / `on_failure`.

use citelens_core::{
    Message, QueryReply, QueryRequest, Segment, SourceSummary, Transcript, summarize, tokenize,
    unresolved_numbers,
};

use super::{
    CitationDetail, MarkerRef, QueryBackend, RenderOptions, RenderedTranscript, render_transcript,
    resolved_markers,
};

#[derive(Debug, Clone)]
pub struct ChatSession {
    transcript: Transcript,
    pending: bool,
    error: Option<String>,
    selected: Option<usize>,
    detail: Option<CitationDetail>,
    limit_results: usize,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new(citelens_core::reply::MAX_RESULTS)
    }
}

impl ChatSession {
    pub fn new(limit_results: usize) -> Self {
        Self {
            transcript: Transcript::new(),
            pending: false,
            error: None,
            selected: None,
            detail: None,
            limit_results,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Record the user's question and return the request to send.
    ///
    /// Returns `None`, changing nothing, while a request is outstanding or
    /// when the input is blank.
    pub fn submit(&mut self, input: &str) -> Option<QueryRequest> {
        let question = input.trim();
        if self.pending || question.is_empty() {
            return None;
        }
        self.error = None;
        self.transcript.push(Message::user(input));
        self.pending = true;
        tracing::info!(chars = question.len(), "question submitted");
        Some(QueryRequest::new(question).with_limit(self.limit_results))
    }

    pub fn on_reply(&mut self, reply: QueryReply) {
        tracing::info!(
            citations = reply.citations.as_ref().map_or(0, Vec::len),
            sources = reply.sources.as_ref().map_or(0, Vec::len),
            query_type = reply.query_type().unwrap_or("-"),
            "answer received"
        );
        let message = reply.into_message();
        if message.has_citations() {
            let unresolved = unresolved_numbers(message.content(), message.citation_index());
            if !unresolved.is_empty() {
                tracing::warn!(numbers = ?unresolved, "answer cites numbers without a record");
            }
        }
        self.transcript.push(message);
        self.pending = false;
    }

    pub fn on_failure(&mut self, description: &str) {
        tracing::warn!(error = description, "query failed");
        self.transcript.push(Message::failure(description));
        self.error = Some(description.to_string());
        self.pending = false;
    }

    /// Submit, query the backend and record the outcome in one step.
    pub async fn ask(&mut self, backend: &dyn QueryBackend, input: &str) -> bool {
        let Some(request) = self.submit(input) else {
            return false;
        };
        match backend.query(&request).await {
            Ok(reply) => self.on_reply(reply),
            Err(e) => self.on_failure(&format!("{e:#}")),
        }
        true
    }

    pub fn resolved_markers(&self) -> Vec<MarkerRef> {
        resolved_markers(&self.transcript)
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_marker(&self) -> Option<MarkerRef> {
        let index = self.selected?;
        self.resolved_markers().get(index).copied()
    }

    fn step_selection(&mut self, forward: bool) -> Option<MarkerRef> {
        let markers = self.resolved_markers();
        if markers.is_empty() {
            self.selected = None;
            return None;
        }
        let last = markers.len() - 1;
        let next = match (self.selected, forward) {
            (None, true) => 0,
            (None, false) => last,
            (Some(i), true) => (i + 1) % markers.len(),
            (Some(0), false) => last,
            (Some(i), false) => (i - 1).min(last),
        };
        self.selected = Some(next);
        markers.get(next).copied()
    }

    pub fn select_next(&mut self) -> Option<MarkerRef> {
        self.step_selection(true)
    }

    pub fn select_prev(&mut self) -> Option<MarkerRef> {
        self.step_selection(false)
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Open the detail view for the selected marker.
    pub fn activate(&mut self) -> bool {
        match self.selected_marker() {
            Some(marker) => self.activate_marker(marker),
            None => false,
        }
    }

    /// Open the detail view for `marker`. Unresolved or unknown markers
    /// are inert.
    pub fn activate_marker(&mut self, marker: MarkerRef) -> bool {
        let Some(message) = self.transcript.messages().get(marker.message) else {
            return false;
        };
        let citation = tokenize(message.content(), message.citation_index())
            .into_iter()
            .filter_map(|segment| match segment {
                Segment::CitationRef { resolved, .. } => Some(resolved),
                Segment::Text(_) => None,
            })
            .nth(marker.ordinal)
            .flatten();
        let Some(citation) = citation else {
            return false;
        };
        tracing::debug!(
            number = citation.citation_number,
            citation_id = %citation.citation_id,
            "citation opened"
        );
        self.detail = Some(CitationDetail {
            marker,
            citation: citation.clone(),
            explanation: message.explanation().cloned(),
        });
        true
    }

    pub fn dismiss(&mut self) -> bool {
        self.detail.take().is_some()
    }

    pub fn detail(&self) -> Option<&CitationDetail> {
        self.detail.as_ref()
    }

    pub fn render(&self, show_tables: bool) -> RenderedTranscript {
        let options = RenderOptions {
            show_tables,
            selected: self.selected_marker(),
            ..RenderOptions::default()
        };
        render_transcript(&self.transcript, self.pending, self.error(), &options)
    }

    /// Deduplicated sources of every assistant turn, ready for the panel.
    pub fn source_summaries(&self) -> Vec<SourceSummary> {
        summarize(&self.transcript.collect_sources())
    }
}
