//! Retriever trait: ordered candidate passages for a question

use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::document::Document;
use crate::domain::DomainError;

/// Read-only semantic retrieval over the local document collection.
#[async_trait]
pub trait Retriever: Send + Sync + Debug {
    /// Return candidate passages for a question, best match first
    async fn retrieve(&self, question: &str) -> Result<Vec<Document>, DomainError>;

    /// Total number of indexed passages (readiness probes)
    async fn document_count(&self) -> Result<usize, DomainError>;
}

#[cfg(test)]
pub mod mock {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Mock retriever returning fixed results
    #[derive(Debug)]
    pub struct MockRetriever {
        results: Vec<Document>,
        error: Option<String>,
        retrieve_count: AtomicUsize,
    }

    impl MockRetriever {
        pub fn new() -> Self {
            Self {
                results: Vec::new(),
                error: None,
                retrieve_count: AtomicUsize::new(0),
            }
        }

        pub fn with_results(mut self, results: Vec<Document>) -> Self {
            self.results = results;
            self
        }

        pub fn with_error(mut self, error: impl Into<String>) -> Self {
            self.error = Some(error.into());
            self
        }

        pub fn retrieve_count(&self) -> usize {
            self.retrieve_count.load(Ordering::SeqCst)
        }
    }

    impl Default for MockRetriever {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl Retriever for MockRetriever {
        async fn retrieve(&self, _question: &str) -> Result<Vec<Document>, DomainError> {
            self.retrieve_count.fetch_add(1, Ordering::SeqCst);

            if let Some(ref error) = self.error {
                return Err(DomainError::provider("mock", error));
            }

            Ok(self.results.clone())
        }

        async fn document_count(&self) -> Result<usize, DomainError> {
            Ok(self.results.len())
        }
    }
}
