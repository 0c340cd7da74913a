//! LLM-backed card formatting with schema enforcement

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{extract_json, prompts};
use crate::domain::{
    AnswerCard, DomainError, LlmProvider, LlmRequest, ResponseFormatter,
};

/// Formats a consolidated answer into a validated `AnswerCard`.
///
/// The first attempt uses the standard formatting prompt; a parse or schema
/// failure triggers exactly one retry with a stricter prompt. A second
/// failure surfaces as a formatting error - malformed cards are never
/// forwarded.
#[derive(Debug)]
pub struct LlmCardFormatter {
    provider: Arc<dyn LlmProvider>,
    model: String,
}

impl LlmCardFormatter {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    async fn attempt(&self, system: &str, text: &str) -> Result<AnswerCard, DomainError> {
        let request = LlmRequest::builder()
            .system(system)
            .user(format!("Unstructured Answer:\n{}", text))
            .temperature(0.0)
            .max_tokens(1500)
            .json_object()
            .build();

        let response = self.provider.chat(&self.model, request).await?;
        let content = response.content();

        let json_str = extract_json(content)
            .ok_or_else(|| DomainError::formatting("card output contained no JSON object"))?;

        let raw: RawCard = serde_json::from_str(json_str).map_err(|e| {
            DomainError::formatting(format!("card output failed to parse: {}", e))
        })?;

        let card = raw.into_card();
        card.validate()?;

        Ok(card)
    }
}

#[async_trait]
impl ResponseFormatter for LlmCardFormatter {
    async fn format_card(&self, text: &str) -> Result<AnswerCard, DomainError> {
        match self.attempt(prompts::FORMATTER_SYSTEM, text).await {
            Ok(card) => Ok(card),
            // Provider failures are not formatting failures; no reformat retry
            Err(e @ DomainError::Provider { .. }) => Err(e),
            Err(first) => {
                warn!(error = %first, "card formatting failed, retrying with strict prompt");

                self.attempt(prompts::FORMATTER_STRICT_SYSTEM, text)
                    .await
                    .map_err(|second| {
                        DomainError::formatting(format!(
                            "card formatting failed twice: {}; then: {}",
                            first, second
                        ))
                    })
                    .inspect(|_| debug!("strict retry produced a valid card"))
            }
        }
    }
}

// Lenient wire shapes: the model was observed emitting recommendations both
// as plain strings and as {"text": ...} objects, and out-of-range ratings.

#[derive(Debug, Deserialize)]
struct RawCard {
    rating: f64,
    text: String,
    #[serde(default)]
    citations: Vec<String>,
    #[serde(default)]
    recommendations: Vec<RawRecommendation>,
    #[serde(default, alias = "suggested_questions", rename = "suggestedQuestions")]
    suggested_questions: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawRecommendation {
    Text(String),
    Object { text: String },
}

impl RawCard {
    fn into_card(self) -> AnswerCard {
        AnswerCard {
            // Formatter contract: rating is clamped, not rejected
            rating: self.rating.clamp(0.0, 100.0).round() as u8,
            text: self.text,
            citations: self.citations,
            recommendations: self
                .recommendations
                .into_iter()
                .map(|r| match r {
                    RawRecommendation::Text(text) => text,
                    RawRecommendation::Object { text } => text,
                })
                .collect(),
            suggested_questions: self.suggested_questions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::llm::MockLlmProvider;

    fn valid_json() -> String {
        serde_json::json!({
            "rating": 72,
            "text": "Plastic bottles carry a high footprint.",
            "citations": ["[unep](https://www.unep.org/r)"],
            "recommendations": ["Use a refillable bottle", "Recycle properly"],
            "suggestedQuestions": ["What about glass?"]
        })
        .to_string()
    }

    fn formatter(provider: Arc<MockLlmProvider>) -> LlmCardFormatter {
        LlmCardFormatter::new(provider, "model")
    }

    #[tokio::test]
    async fn test_valid_card_first_attempt() {
        let provider = Arc::new(MockLlmProvider::new("llm").with_text(valid_json()));
        let formatter = formatter(provider.clone());

        let card = formatter.format_card("raw answer").await.unwrap();

        assert_eq!(card.rating, 72);
        assert_eq!(card.citations.len(), 1);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_rating_is_clamped() {
        let json = serde_json::json!({
            "rating": 250,
            "text": "t",
            "citations": ["[a](https://a.org/b)"],
            "recommendations": ["x", "y"],
            "suggestedQuestions": []
        })
        .to_string();
        let provider = Arc::new(MockLlmProvider::new("llm").with_text(json));

        let card = formatter(provider).format_card("raw").await.unwrap();
        assert_eq!(card.rating, 100);
    }

    #[tokio::test]
    async fn test_object_recommendations_accepted() {
        let json = r#"{
            "rating": 40,
            "text": "t",
            "citations": ["[a](https://a.org/b)"],
            "recommendations": [{"text": "first"}, "second"],
            "suggestedQuestions": []
        }"#;
        let provider = Arc::new(MockLlmProvider::new("llm").with_text(json));

        let card = formatter(provider).format_card("raw").await.unwrap();
        assert_eq!(card.recommendations, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_retry_once_then_succeed() {
        let provider = Arc::new(
            MockLlmProvider::new("llm")
                .push_text("sorry, here is prose instead of JSON")
                .push_text(valid_json()),
        );
        let formatter = formatter(provider.clone());

        let card = formatter.format_card("raw").await.unwrap();

        assert_eq!(card.rating, 72);
        assert_eq!(provider.call_count(), 2);
        // Second attempt used the strict prompt
        let calls = provider.calls();
        assert!(calls[1].messages[0].content.starts_with("You are a JSON formatter"));
    }

    #[tokio::test]
    async fn test_two_failures_surface_error() {
        let provider = Arc::new(
            MockLlmProvider::new("llm")
                .push_text("not json")
                .push_text("{\"rating\": 10}"),
        );
        let formatter = formatter(provider.clone());

        let result = formatter.format_card("raw").await;

        assert!(matches!(result, Err(DomainError::Formatting { .. })));
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_schema_violation_triggers_retry() {
        // First attempt parses but has no citations; retry returns a valid card
        let no_citations = serde_json::json!({
            "rating": 10,
            "text": "t",
            "citations": [],
            "recommendations": ["a", "b"],
            "suggestedQuestions": []
        })
        .to_string();
        let provider = Arc::new(
            MockLlmProvider::new("llm")
                .push_text(no_citations)
                .push_text(valid_json()),
        );

        let card = formatter(provider.clone()).format_card("raw").await.unwrap();
        assert_eq!(provider.call_count(), 2);
        assert!(card.validate().is_ok());
    }

    #[tokio::test]
    async fn test_provider_failure_is_not_retried() {
        let provider = Arc::new(MockLlmProvider::new("llm").with_error("down"));
        let formatter = formatter(provider.clone());

        let result = formatter.format_card("raw").await;

        assert!(matches!(result, Err(DomainError::Provider { .. })));
        assert_eq!(provider.call_count(), 1);
    }
}
