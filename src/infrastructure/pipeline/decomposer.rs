//! LLM-backed query decomposition

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::prompts;
use crate::domain::{
    AnswerMode, DecompositionOutcome, DomainError, LlmProvider, LlmRequest, QueryDecomposer,
};

/// Sentinel line the model emits for questions that need no decomposition.
/// It never leaves this module: callers see `DecompositionOutcome`.
const NO_DECOMPOSITION_SENTINEL: &str = "The question needs no decomposition";

/// Splits free-text queries into self-contained sub-questions, one per
/// output line. Card mode is a no-op by contract and makes no model call.
#[derive(Debug)]
pub struct LlmQueryDecomposer {
    provider: Arc<dyn LlmProvider>,
    model: String,
}

impl LlmQueryDecomposer {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    fn parse_output(&self, output: &str) -> DecompositionOutcome {
        // Blank lines and stray whitespace are dropped defensively; the
        // prompt forbids them but the model is not trusted to comply.
        let lines: Vec<String> = output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect();

        match lines.first() {
            None => DecompositionOutcome::NoDecomposition,
            Some(first) if first == NO_DECOMPOSITION_SENTINEL => {
                DecompositionOutcome::NoDecomposition
            }
            Some(_) => DecompositionOutcome::Decomposed(lines),
        }
    }
}

#[async_trait]
impl QueryDecomposer for LlmQueryDecomposer {
    async fn decompose(
        &self,
        query: &str,
        mode: AnswerMode,
    ) -> Result<DecompositionOutcome, DomainError> {
        if mode.is_card() {
            return Ok(DecompositionOutcome::NoDecomposition);
        }

        let request = LlmRequest::builder()
            .system(prompts::DECOMPOSER_SYSTEM)
            .user(format!("Question: {}", query))
            .temperature(0.0)
            .max_tokens(400)
            .build();

        let response = self.provider.chat(&self.model, request).await?;
        let outcome = self.parse_output(response.content());

        if let DecompositionOutcome::Decomposed(ref questions) = outcome {
            debug!(count = questions.len(), "decomposed query");
        }

        Ok(outcome)
    }
}
