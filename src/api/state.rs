//! Application state for shared services

use std::sync::Arc;
use std::time::Duration;

use crate::domain::Retriever;
use crate::infrastructure::pipeline::AskPipeline;

/// Application state: the wired pipeline plus request-boundary settings.
///
/// Every adapter is injected at construction; there is no process-global
/// state behind this struct.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<AskPipeline>,
    pub retriever: Arc<dyn Retriever>,
    /// Shared secret checked against the `x-api-key` header
    pub api_key: String,
    /// Whole-request deadline
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(
        pipeline: Arc<AskPipeline>,
        retriever: Arc<dyn Retriever>,
        api_key: impl Into<String>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            pipeline,
            retriever,
            api_key: api_key.into(),
            request_timeout,
        }
    }
}
