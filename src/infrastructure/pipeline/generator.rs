//! LLM-backed answer generation: per-sub-question and consolidation

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::prompts;
use crate::domain::{
    AnswerGenerator, AnswerMode, Document, DomainError, LlmProvider, LlmRequest, QAPair,
    RequestContext,
};

/// Answer generator with two prompts: one answering a sub-question from its
/// documents, one consolidating QAPairs into the final response.
#[derive(Debug)]
pub struct LlmAnswerGenerator {
    provider: Arc<dyn LlmProvider>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl LlmAnswerGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: 1000,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn render_documents(documents: &[Document]) -> String {
        documents
            .iter()
            .map(|doc| match &doc.source {
                Some(source) => format!("- {} (source: {})", doc.content, source),
                None => format!("- {}", doc.content),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn render_location(ctx: &RequestContext) -> (String, String) {
        match ctx.location {
            Some(loc) => (loc.latitude.to_string(), loc.longitude.to_string()),
            None => ("null".to_string(), "null".to_string()),
        }
    }
}

#[async_trait]
impl AnswerGenerator for LlmAnswerGenerator {
    async fn answer(
        &self,
        question: &str,
        documents: &[Document],
        _ctx: &RequestContext,
    ) -> Result<String, DomainError> {
        let user = format!(
            "Documents:\n{}\n\nQuestion: {}",
            Self::render_documents(documents),
            question
        );

        let request = LlmRequest::builder()
            .system(prompts::SUB_ANSWER_SYSTEM)
            .user(user)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .build();

        let response = self.provider.chat(&self.model, request).await?;

        debug!(documents = documents.len(), "generated sub-answer");

        Ok(response.content().to_string())
    }

    async fn consolidate(
        &self,
        query: &str,
        qa_pairs: &[QAPair],
        ctx: &RequestContext,
    ) -> Result<String, DomainError> {
        let system = match ctx.mode {
            AnswerMode::Card => prompts::CONSOLIDATE_CARD_SYSTEM,
            AnswerMode::Markdown => prompts::CONSOLIDATE_MARKDOWN_SYSTEM,
        };

        let context = serde_json::to_string_pretty(qa_pairs)
            .map_err(|e| DomainError::internal(format!("Failed to render QA context: {}", e)))?;

        let (latitude, longitude) = Self::render_location(ctx);
        let user = format!(
            "Context: {}\nQuestion: {}\nLatitude: {}\nLongitude: {}",
            context, query, latitude, longitude
        );

        let request = LlmRequest::builder()
            .system(system)
            .user(user)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .build();

        let response = self.provider.chat(&self.model, request).await?;

        debug!(qa_pairs = qa_pairs.len(), mode = ?ctx.mode, "generated consolidated answer");

        Ok(response.content().to_string())
    }
}
