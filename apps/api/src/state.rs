use std::sync::Arc;

use crate::config::Config;
use crate::extraction::TextExtractor;
use crate::llm_client::StructuredCompletion;
use crate::wizard::store::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Structured completion backend. Default: Anthropic `LlmClient`.
    pub llm: Arc<dyn StructuredCompletion>,
    /// Document text extraction. Default: `DocumentTextExtractor`.
    pub extractor: Arc<dyn TextExtractor>,
    pub sessions: SessionStore,
    pub config: Config,
}
