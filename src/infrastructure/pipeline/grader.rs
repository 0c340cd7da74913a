//! LLM-backed binary relevance grading

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{extract_json, prompts};
use crate::domain::{
    DomainError, LlmProvider, LlmRequest, RelevanceGrader, RelevanceVerdict,
};

/// Grades one (document, question) pair per LLM call with a constrained
/// JSON verdict.
///
/// A response that cannot be parsed into a verdict is an error: grading
/// failures are never collapsed into "irrelevant".
#[derive(Debug)]
pub struct LlmRelevanceGrader {
    provider: Arc<dyn LlmProvider>,
    model: String,
}

/// Verdict payload: `{"score": "yes"}` / `{"score": "no"}`
#[derive(Debug, Deserialize)]
struct GraderResponse {
    score: String,
}

impl LlmRelevanceGrader {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    fn parse_verdict(&self, content: &str) -> Result<RelevanceVerdict, DomainError> {
        let json_str = extract_json(content).unwrap_or(content);

        let response: GraderResponse = serde_json::from_str(json_str).map_err(|e| {
            DomainError::validation(format!(
                "grader returned unparseable verdict ({}): {}",
                e, content
            ))
        })?;

        match response.score.trim().to_ascii_lowercase().as_str() {
            "yes" => Ok(RelevanceVerdict::Relevant),
            "no" => Ok(RelevanceVerdict::Irrelevant),
            other => Err(DomainError::validation(format!(
                "grader returned unknown score '{}'",
                other
            ))),
        }
    }
}

#[async_trait]
impl RelevanceGrader for LlmRelevanceGrader {
    async fn grade(
        &self,
        question: &str,
        document: &str,
    ) -> Result<RelevanceVerdict, DomainError> {
        let system = prompts::GRADER_SYSTEM.replace("${document}", document);

        let request = LlmRequest::builder()
            .system(system)
            .user(format!("Here is the user question: {}", question))
            .temperature(0.0)
            .max_tokens(50)
            .json_object()
            .build();

        let response = self.provider.chat(&self.model, request).await?;
        let verdict = self.parse_verdict(response.content())?;

        debug!(relevant = verdict.is_relevant(), "graded document");

        Ok(verdict)
    }
}
