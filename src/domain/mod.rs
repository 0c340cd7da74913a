//! Domain layer - Core types, collaborator traits and pure logic

pub mod answer;
pub mod crag;
pub mod document;
pub mod embedding;
pub mod error;
pub mod llm;
pub mod request;
pub mod retrieval;
pub mod search;

pub use answer::{AnswerCard, CardValidationError, FinalResponse, ResponseFormatter};
pub use crag::{
    AnswerGenerator, DecompositionOutcome, QAPair, QueryDecomposer, RelevanceGrader,
    RelevanceVerdict,
};
pub use document::{Document, Provenance};
pub use embedding::EmbeddingProvider;
pub use error::DomainError;
pub use llm::{
    FinishReason, LlmProvider, LlmRequest, LlmRequestBuilder, LlmResponse, LlmResponseFormat,
    Message, MessageRole, Usage,
};
pub use request::{AnswerMode, GeoPoint, RequestContext, TraceLog};
pub use retrieval::Retriever;
pub use search::{WebSearchHit, WebSearchProvider};
