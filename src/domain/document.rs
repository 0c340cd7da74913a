//! Documents flowing through the CRAG cycle

use serde::{Deserialize, Serialize};

/// Where a document came from.
///
/// A document that reaches the generation step is either a retrieved passage
/// that survived grading, or a web search hit (ungraded by policy). Carrying
/// the provenance on the document itself keeps that distinction checkable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Provenance {
    /// Retrieved from the vector index with a similarity score
    Retrieved { score: f32 },
    /// Returned by the web search provider
    WebSearch,
}

/// A retrieved or searched passage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Passage text
    pub content: String,
    /// Source reference (URL for web hits, optional for index passages)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Origin of the passage
    pub provenance: Provenance,
}

impl Document {
    /// Create a document retrieved from the vector index
    pub fn retrieved(content: impl Into<String>, score: f32) -> Self {
        Self {
            content: content.into(),
            source: None,
            provenance: Provenance::Retrieved { score },
        }
    }

    /// Create a document sourced from web search
    pub fn from_web(content: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source: Some(url.into()),
            provenance: Provenance::WebSearch,
        }
    }

    /// Set the source reference
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Whether this document came from web search
    pub fn is_web_result(&self) -> bool {
        matches!(self.provenance, Provenance::WebSearch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retrieved_document() {
        let doc = Document::retrieved("Cotton production uses 2,700 liters of water per shirt", 0.87);
        assert_eq!(doc.provenance, Provenance::Retrieved { score: 0.87 });
        assert!(doc.source.is_none());
        assert!(!doc.is_web_result());
    }

    #[test]
    fn test_web_document_carries_url() {
        let doc = Document::from_web("IPCC summary", "https://www.ipcc.ch/report");
        assert!(doc.is_web_result());
        assert_eq!(doc.source.as_deref(), Some("https://www.ipcc.ch/report"));
    }

    #[test]
    fn test_with_source() {
        let doc = Document::retrieved("passage", 0.5).with_source("corpus/lca.md");
        assert_eq!(doc.source.as_deref(), Some("corpus/lca.md"));
    }
}
