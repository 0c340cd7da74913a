//! In-memory cosine-similarity index over a JSON snapshot
//!
//! The snapshot is produced offline together with its embeddings; at startup
//! it is loaded read-only and shared across requests.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::embedding::EmbeddingProvider;
use crate::domain::{Document, DomainError, Retriever};

/// One indexed passage with its precomputed embedding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedPassage {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub embedding: Vec<f32>,
}

/// On-disk snapshot format
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub passages: Vec<IndexedPassage>,
}

impl IndexSnapshot {
    /// Load a snapshot from disk; a missing file yields an empty index
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let path = path.as_ref();

        if !path.exists() {
            warn!(path = %path.display(), "index snapshot not found, starting with an empty index");
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|e| {
            DomainError::configuration(format!(
                "Failed to read index snapshot {}: {}",
                path.display(),
                e
            ))
        })?;

        let snapshot: Self = serde_json::from_str(&raw).map_err(|e| {
            DomainError::configuration(format!(
                "Failed to parse index snapshot {}: {}",
                path.display(),
                e
            ))
        })?;

        info!(
            path = %path.display(),
            passages = snapshot.passages.len(),
            "loaded index snapshot"
        );

        Ok(snapshot)
    }
}

/// Retrieval tuning
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// Number of passages to return
    pub top_k: usize,
    /// Minimum cosine similarity to count as a candidate
    pub similarity_threshold: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 4,
            similarity_threshold: 0.0,
        }
    }
}

/// Retriever ranking snapshot passages by cosine similarity to the embedded
/// question.
#[derive(Debug)]
pub struct VectorIndexRetriever {
    embedder: Arc<dyn EmbeddingProvider>,
    snapshot: IndexSnapshot,
    config: RetrievalConfig,
}

impl VectorIndexRetriever {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        snapshot: IndexSnapshot,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            embedder,
            snapshot,
            config,
        }
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

#[async_trait]
impl Retriever for VectorIndexRetriever {
    async fn retrieve(&self, question: &str) -> Result<Vec<Document>, DomainError> {
        if self.snapshot.passages.is_empty() {
            return Ok(Vec::new());
        }

        let query = vec![question.to_string()];
        let mut vectors = self.embedder.embed(&query).await?;
        let query_vector = vectors
            .pop()
            .ok_or_else(|| DomainError::provider("embedding", "No embedding returned for query"))?;

        let mut scored: Vec<(f32, &IndexedPassage)> = self
            .snapshot
            .passages
            .iter()
            .map(|p| (cosine_similarity(&query_vector, &p.embedding), p))
            .filter(|(score, _)| *score >= self.config.similarity_threshold)
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(self.config.top_k)
            .map(|(score, passage)| {
                let doc = Document::retrieved(&passage.content, score);
                match &passage.source {
                    Some(source) => doc.with_source(source),
                    None => doc,
                }
            })
            .collect())
    }

    async fn document_count(&self) -> Result<usize, DomainError> {
        Ok(self.snapshot.passages.len())
    }
}
