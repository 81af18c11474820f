//! Storage seam over the vector collection.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::errors::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocType {
    Manual,
    Product,
    Qna,
    Review,
    LearnedCs,
    LearnedReview,
}

impl DocType {
    pub fn as_str(self) -> &'static str {
        match self {
            DocType::Manual => "manual",
            DocType::Product => "product",
            DocType::Qna => "qna",
            DocType::Review => "review",
            DocType::LearnedCs => "learned-cs",
            DocType::LearnedReview => "learned-review",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "manual" => Some(DocType::Manual),
            "product" => Some(DocType::Product),
            "qna" => Some(DocType::Qna),
            "review" => Some(DocType::Review),
            "learned-cs" => Some(DocType::LearnedCs),
            "learned-review" => Some(DocType::LearnedReview),
            _ => None,
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of retrievable knowledge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeDocument {
    /// Unique within the collection; re-adding an id replaces the document.
    pub id: String,
    pub text: String,
    pub doc_type: DocType,
    /// Free-form: domain, urgency, product reference, rating, answered flag.
    pub metadata: Value,
}

impl KnowledgeDocument {
    pub fn new(id: impl Into<String>, text: impl Into<String>, doc_type: DocType, metadata: Value) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            doc_type,
            metadata,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub document: KnowledgeDocument,
    /// Cosine similarity (higher = better).
    pub score: f32,
}

#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Insert or replace documents with their embeddings in one batch.
    async fn upsert_batch(&self, items: Vec<(KnowledgeDocument, Vec<f32>)>) -> Result<usize, ApiError>;

    /// Nearest neighbours by cosine similarity, best first.
    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<ScoredDocument>, ApiError>;

    async fn get(&self, id: &str) -> Result<Option<KnowledgeDocument>, ApiError>;

    /// Total documents, optionally restricted to one type.
    async fn count(&self, doc_type: Option<DocType>) -> Result<usize, ApiError>;
}
