use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::DomainError;

/// Retry policy for transport-level failures.
///
/// Only connection errors and retryable statuses (429, 5xx) are retried;
/// malformed response bodies are never retried.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Additional attempts after the first request
    pub max_retries: u32,
    /// Base backoff, doubled per attempt
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_backoff: Duration::from_millis(250),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_backoff: Duration::ZERO,
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.base_backoff * 2u32.saturating_pow(attempt)
    }
}

/// Trait for HTTP client operations (for mocking)
#[async_trait]
pub trait HttpClientTrait: Send + Sync + std::fmt::Debug {
    async fn post_json(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, DomainError>;
}

/// Real HTTP client using reqwest
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl HttpClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to build HTTP client"),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn is_retryable_status(status: reqwest::StatusCode) -> bool {
        status.as_u16() == 429 || status.is_server_error()
    }

    async fn send_once(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &serde_json::Value,
    ) -> Result<reqwest::Response, DomainError> {
        let mut request = self.client.post(url);

        for (key, value) in headers {
            request = request.header(*key, *value);
        }

        request
            .json(body)
            .send()
            .await
            .map_err(|e| DomainError::provider("http", format!("Request failed: {}", e)))
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClientTrait for HttpClient {
    async fn post_json(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, DomainError> {
        let mut attempt = 0;

        let response = loop {
            match self.send_once(url, &headers, body).await {
                Ok(response) if Self::is_retryable_status(response.status()) => {
                    let status = response.status();
                    if attempt >= self.retry.max_retries {
                        let error_body = response.text().await.unwrap_or_default();
                        return Err(DomainError::provider(
                            "http",
                            format!("HTTP {}: {}", status, error_body),
                        ));
                    }
                    warn!(%url, %status, attempt, "retryable HTTP status, backing off");
                }
                Ok(response) if !response.status().is_success() => {
                    let status = response.status();
                    let error_body = response.text().await.unwrap_or_default();
                    return Err(DomainError::provider(
                        "http",
                        format!("HTTP {}: {}", status, error_body),
                    ));
                }
                Ok(response) => break response,
                Err(e) => {
                    if attempt >= self.retry.max_retries {
                        return Err(e);
                    }
                    warn!(%url, attempt, error = %e, "transport error, backing off");
                }
            }

            tokio::time::sleep(self.retry.backoff(attempt)).await;
            attempt += 1;
            debug!(%url, attempt, "retrying request");
        };

        response
            .json()
            .await
            .map_err(|e| DomainError::provider("http", format!("Failed to parse response: {}", e)))
    }
}
