//! Web search provider trait

use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::DomainError;

/// A single web search result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebSearchHit {
    /// Content snippet
    pub content: String,
    /// Source URL
    pub url: String,
}

impl WebSearchHit {
    pub fn new(content: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            url: url.into(),
        }
    }
}

/// Keyword web search used to supplement low-relevance retrieval.
#[async_trait]
pub trait WebSearchProvider: Send + Sync + Debug {
    /// Run a search query, returning content/URL pairs
    async fn search(&self, query: &str) -> Result<Vec<WebSearchHit>, DomainError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;
}
