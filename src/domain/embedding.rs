//! Embedding provider trait

use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::DomainError;

/// Produces dense vectors for texts; used by the retriever to embed queries.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync + Debug {
    /// Embed a batch of texts, one vector per input, in input order
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
pub mod mock {
    use super::*;

    /// Mock embedding provider returning fixed or hash-derived vectors
    #[derive(Debug)]
    pub struct MockEmbeddingProvider {
        fixed: Option<Vec<f32>>,
        error: Option<String>,
    }

    impl MockEmbeddingProvider {
        pub fn new() -> Self {
            Self {
                fixed: None,
                error: None,
            }
        }

        /// Return this vector for every input
        pub fn with_vector(mut self, vector: Vec<f32>) -> Self {
            self.fixed = Some(vector);
            self
        }

        pub fn with_error(mut self, error: impl Into<String>) -> Self {
            self.error = Some(error.into());
            self
        }
    }

    impl Default for MockEmbeddingProvider {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl EmbeddingProvider for MockEmbeddingProvider {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
            if let Some(ref error) = self.error {
                return Err(DomainError::provider("mock", error));
            }

            Ok(texts
                .iter()
                .map(|text| {
                    self.fixed.clone().unwrap_or_else(|| {
                        // Deterministic pseudo-embedding derived from bytes
                        let sum: u32 = text.bytes().map(u32::from).sum();
                        vec![(sum % 97) as f32, (sum % 13) as f32, 1.0]
                    })
                })
                .collect())
        }

        fn provider_name(&self) -> &'static str {
            "mock"
        }
    }
}
