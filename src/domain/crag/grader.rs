use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::DomainError;

/// Binary relevance verdict for one (document, question) pair.
///
/// Verdicts are consumed during grading and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelevanceVerdict {
    Relevant,
    Irrelevant,
}

impl RelevanceVerdict {
    pub fn is_relevant(&self) -> bool {
        matches!(self, Self::Relevant)
    }
}

/// Classifies whether a retrieved passage helps answer a question.
///
/// A grading call that fails must surface its error; it is never coerced
/// into an `Irrelevant` verdict.
#[async_trait]
pub trait RelevanceGrader: Send + Sync + Debug {
    async fn grade(
        &self,
        question: &str,
        document: &str,
    ) -> Result<RelevanceVerdict, DomainError>;
}
