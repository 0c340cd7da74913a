//! Final response types and the card formatting contract

use std::fmt::Debug;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::error::DomainError;

/// `[label](https://...)` — the citation shape the card contract requires
static MARKDOWN_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[^\]]+\]\(https?://[^\s)]+\)").expect("valid citation regex"));

/// Validation failures for a structured answer card
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CardValidationError {
    #[error("rating {0} is outside 0-100")]
    RatingOutOfRange(u16),

    #[error("card text is empty")]
    EmptyText,

    #[error("card must carry at least one citation")]
    NoCitations,

    #[error("citation {0} is blank")]
    BlankCitation(usize),

    #[error("no citation is a markdown link")]
    NoLinkedCitation,

    #[error("expected 2-3 recommendations, got {0}")]
    RecommendationCount(usize),
}

impl From<CardValidationError> for DomainError {
    fn from(err: CardValidationError) -> Self {
        DomainError::formatting(err.to_string())
    }
}

/// Structured answer card: rating, citations, recommendations and follow-ups.
///
/// Field names on the wire match the original card schema
/// (`suggestedQuestions`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerCard {
    /// Environmental impact rating, 0-100
    pub rating: u8,
    /// Comprehensive markdown answer
    pub text: String,
    /// Supporting sources as markdown links, at least one
    pub citations: Vec<String>,
    /// 2-3 actionable suggestions
    pub recommendations: Vec<String>,
    /// Related follow-up questions
    #[serde(rename = "suggestedQuestions")]
    pub suggested_questions: Vec<String>,
}

impl AnswerCard {
    /// Check the card against its schema contract
    pub fn validate(&self) -> Result<(), CardValidationError> {
        if self.rating > 100 {
            return Err(CardValidationError::RatingOutOfRange(self.rating as u16));
        }

        if self.text.trim().is_empty() {
            return Err(CardValidationError::EmptyText);
        }

        if self.citations.is_empty() {
            return Err(CardValidationError::NoCitations);
        }

        for (i, citation) in self.citations.iter().enumerate() {
            if citation.trim().is_empty() {
                return Err(CardValidationError::BlankCitation(i));
            }
        }

        if !self.citations.iter().any(|c| MARKDOWN_LINK.is_match(c)) {
            return Err(CardValidationError::NoLinkedCitation);
        }

        if !(2..=3).contains(&self.recommendations.len()) {
            return Err(CardValidationError::RecommendationCount(
                self.recommendations.len(),
            ));
        }

        Ok(())
    }
}

/// What the caller ultimately receives: a card in card mode, raw markdown
/// otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FinalResponse {
    Card(AnswerCard),
    Markdown(String),
}

/// Reshapes an unstructured consolidated answer into a validated card.
///
/// Only invoked in card mode, on the consolidated answer. Implementations
/// must never hand back an invalid card: schema violations are retried or
/// surfaced as a formatting error.
#[async_trait]
pub trait ResponseFormatter: Send + Sync + Debug {
    async fn format_card(&self, text: &str) -> Result<AnswerCard, DomainError>;
}
