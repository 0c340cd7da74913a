//! Tavily web search adapter

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::domain::{DomainError, WebSearchHit, WebSearchProvider};
use crate::infrastructure::llm::HttpClientTrait;

const DEFAULT_TAVILY_BASE_URL: &str = "https://api.tavily.com";

/// Tavily search API client
#[derive(Debug)]
pub struct TavilySearchProvider<C: HttpClientTrait> {
    client: C,
    api_key: String,
    base_url: String,
    max_results: usize,
}

impl<C: HttpClientTrait> TavilySearchProvider<C> {
    pub fn new(client: C, api_key: impl Into<String>) -> Self {
        Self::with_base_url(client, api_key, DEFAULT_TAVILY_BASE_URL)
    }

    pub fn with_base_url(
        client: C,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_results: 5,
        }
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.base_url)
    }
}

#[async_trait]
impl<C: HttpClientTrait> WebSearchProvider for TavilySearchProvider<C> {
    async fn search(&self, query: &str) -> Result<Vec<WebSearchHit>, DomainError> {
        let body = serde_json::json!({
            "api_key": self.api_key,
            "query": query,
            "max_results": self.max_results,
        });

        let json = self
            .client
            .post_json(
                &self.search_url(),
                vec![("Content-Type", "application/json")],
                &body,
            )
            .await?;

        let response: TavilyResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::provider("tavily", format!("Failed to parse search response: {}", e))
        })?;

        debug!(results = response.results.len(), "tavily search complete");

        Ok(response
            .results
            .into_iter()
            .filter(|r| !r.content.is_empty())
            .map(|r| WebSearchHit::new(r.content, r.url))
            .collect())
    }

    fn provider_name(&self) -> &'static str {
        "tavily"
    }
}

// Tavily API types

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    url: String,
    #[serde(default)]
    content: String,
}
