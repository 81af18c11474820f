//! Knowledge retrieval.
//!
//! This module provides:
//! - `KnowledgeStore`: persistent vector collection (SQLite implementation)
//! - `KnowledgeBase`: embedding, similarity retrieval and batch ingest
//! - document builders for manuals, products, Q&A, reviews and learned fragments

pub mod documents;
mod error;
mod knowledge;
mod sqlite;
mod store;

pub use error::{EmbeddingError, KnowledgeError};
pub use knowledge::KnowledgeBase;
pub use sqlite::{cosine_similarity, SqliteKnowledgeStore};
pub use store::{DocType, KnowledgeDocument, KnowledgeStore, ScoredDocument};
