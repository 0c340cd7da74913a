use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::document::Document;
use crate::domain::request::RequestContext;
use crate::domain::DomainError;

/// A sub-question paired with the answer generated for it.
///
/// QAPairs are the consolidation context: the final answer is generated from
/// these rather than from raw documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QAPair {
    pub question: String,
    pub answer: String,
}

impl QAPair {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }

    /// Zip questions with answers positionally, truncating to the shorter
    /// list. Divergent lengths cannot arise from the sequential orchestrator
    /// (each sub-question yields exactly one answer or aborts the request);
    /// the truncation is a documented defensive policy, not an error.
    pub fn zip(questions: &[String], answers: &[String]) -> Vec<QAPair> {
        if questions.len() != answers.len() {
            warn!(
                questions = questions.len(),
                answers = answers.len(),
                "sub-question/answer count mismatch, truncating to shorter list"
            );
        }

        questions
            .iter()
            .zip(answers.iter())
            .map(|(q, a)| QAPair::new(q, a.trim()))
            .collect()
    }
}

/// Generates natural-language answers from supporting documents.
///
/// `answer` serves one sub-question inside a CRAG cycle; `consolidate` fuses
/// the collected QAPairs into the final response for the original query. The
/// two use distinct prompts by contract.
#[async_trait]
pub trait AnswerGenerator: Send + Sync + Debug {
    /// Answer one sub-question from its supporting documents
    async fn answer(
        &self,
        question: &str,
        documents: &[Document],
        ctx: &RequestContext,
    ) -> Result<String, DomainError>;

    /// Produce the consolidated answer for the original query
    async fn consolidate(
        &self,
        query: &str,
        qa_pairs: &[QAPair],
        ctx: &RequestContext,
    ) -> Result<String, DomainError>;
}

#[cfg(test)]
pub mod mock {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    /// Mock generator echoing questions into canned answers
    #[derive(Debug)]
    pub struct MockAnswerGenerator {
        consolidated: String,
        error: Option<String>,
        answer_count: AtomicUsize,
        consolidate_count: AtomicUsize,
        seen_documents: Mutex<Vec<Vec<Document>>>,
        seen_qa_pairs: Mutex<Vec<Vec<QAPair>>>,
    }

    impl MockAnswerGenerator {
        pub fn new() -> Self {
            Self {
                consolidated: "consolidated answer".to_string(),
                error: None,
                answer_count: AtomicUsize::new(0),
                consolidate_count: AtomicUsize::new(0),
                seen_documents: Mutex::new(Vec::new()),
                seen_qa_pairs: Mutex::new(Vec::new()),
            }
        }

        pub fn with_consolidated(mut self, text: impl Into<String>) -> Self {
            self.consolidated = text.into();
            self
        }

        pub fn with_error(mut self, error: impl Into<String>) -> Self {
            self.error = Some(error.into());
            self
        }

        pub fn answer_count(&self) -> usize {
            self.answer_count.load(Ordering::SeqCst)
        }

        pub fn consolidate_count(&self) -> usize {
            self.consolidate_count.load(Ordering::SeqCst)
        }

        /// Document sets passed to `answer`, in call order
        pub fn seen_documents(&self) -> Vec<Vec<Document>> {
            self.seen_documents.lock().unwrap().clone()
        }

        /// QAPair sets passed to `consolidate`, in call order
        pub fn seen_qa_pairs(&self) -> Vec<Vec<QAPair>> {
            self.seen_qa_pairs.lock().unwrap().clone()
        }
    }

    impl Default for MockAnswerGenerator {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl AnswerGenerator for MockAnswerGenerator {
        async fn answer(
            &self,
            question: &str,
            documents: &[Document],
            _ctx: &RequestContext,
        ) -> Result<String, DomainError> {
            self.answer_count.fetch_add(1, Ordering::SeqCst);
            self.seen_documents.lock().unwrap().push(documents.to_vec());

            if let Some(ref error) = self.error {
                return Err(DomainError::provider("mock", error));
            }

            Ok(format!("answer to: {}", question))
        }

        async fn consolidate(
            &self,
            _query: &str,
            qa_pairs: &[QAPair],
            _ctx: &RequestContext,
        ) -> Result<String, DomainError> {
            self.consolidate_count.fetch_add(1, Ordering::SeqCst);
            self.seen_qa_pairs.lock().unwrap().push(qa_pairs.to_vec());

            if let Some(ref error) = self.error {
                return Err(DomainError::provider("mock", error));
            }

            Ok(self.consolidated.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zip_equal_lengths() {
        let questions = vec!["q1".to_string(), "q2".to_string()];
        let answers = vec!["a1".to_string(), "a2 ".to_string()];

        let pairs = QAPair::zip(&questions, &answers);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[1], QAPair::new("q2", "a2"));
    }

    #[test]
    fn test_zip_truncates_to_shorter() {
        let questions = vec!["q1".to_string(), "q2".to_string(), "q3".to_string()];
        let answers = vec!["a1".to_string()];

        let pairs = QAPair::zip(&questions, &answers);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].question, "q1");

        let pairs = QAPair::zip(&answers, &questions);
        assert_eq!(pairs.len(), 1);
    }

    #[test]
    fn test_zip_empty() {
        assert!(QAPair::zip(&[], &[]).is_empty());
    }
}
