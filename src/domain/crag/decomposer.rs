use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::request::AnswerMode;
use crate::domain::DomainError;

/// Result of query decomposition.
///
/// The original pipeline signalled "no decomposition" through a sentinel
/// sentence in the model output; that comparison is confined to the
/// decomposer implementation and surfaces here as an explicit variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecompositionOutcome {
    /// Answer the query as-is
    NoDecomposition,
    /// Self-contained sub-questions, in answer order
    Decomposed(Vec<String>),
}

impl DecompositionOutcome {
    /// Resolve into the list of questions to run, falling back to the query
    pub fn into_sub_questions(self, query: &str) -> Vec<String> {
        match self {
            Self::NoDecomposition => vec![query.to_string()],
            Self::Decomposed(questions) => questions,
        }
    }
}

/// Splits a user query into self-contained sub-questions.
///
/// Card mode must not invoke the language model: decomposition is a no-op
/// there by contract.
#[async_trait]
pub trait QueryDecomposer: Send + Sync + Debug {
    async fn decompose(
        &self,
        query: &str,
        mode: AnswerMode,
    ) -> Result<DecompositionOutcome, DomainError>;
}

#[cfg(test)]
pub mod mock {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Mock decomposer returning a fixed outcome
    #[derive(Debug)]
    pub struct MockQueryDecomposer {
        outcome: DecompositionOutcome,
        error: Option<String>,
        call_count: AtomicUsize,
    }

    impl MockQueryDecomposer {
        pub fn no_decomposition() -> Self {
            Self::with_outcome(DecompositionOutcome::NoDecomposition)
        }

        pub fn decomposed(questions: Vec<&str>) -> Self {
            Self::with_outcome(DecompositionOutcome::Decomposed(
                questions.into_iter().map(String::from).collect(),
            ))
        }

        pub fn with_outcome(outcome: DecompositionOutcome) -> Self {
            Self {
                outcome,
                error: None,
                call_count: AtomicUsize::new(0),
            }
        }

        pub fn with_error(mut self, error: impl Into<String>) -> Self {
            self.error = Some(error.into());
            self
        }

        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl QueryDecomposer for MockQueryDecomposer {
        async fn decompose(
            &self,
            _query: &str,
            _mode: AnswerMode,
        ) -> Result<DecompositionOutcome, DomainError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);

            if let Some(ref error) = self.error {
                return Err(DomainError::provider("mock", error));
            }

            Ok(self.outcome.clone())
        }
    }
}
