use std::sync::Arc;

use super::error::{EmbeddingError, KnowledgeError};
use super::store::{DocType, KnowledgeDocument, KnowledgeStore};
use crate::llm::LlmProvider;

pub const DEFAULT_EMBED_BATCH_SIZE: usize = 256;

/// Embedding-backed retrieval over the knowledge collection.
#[derive(Clone)]
pub struct KnowledgeBase {
    store: Arc<dyn KnowledgeStore>,
    llm: Arc<dyn LlmProvider>,
    embedding_model: String,
    top_k: usize,
    embed_batch_size: usize,
}

impl KnowledgeBase {
    pub fn new(
        store: Arc<dyn KnowledgeStore>,
        llm: Arc<dyn LlmProvider>,
        embedding_model: impl Into<String>,
        top_k: usize,
    ) -> Self {
        Self {
            store,
            llm,
            embedding_model: embedding_model.into(),
            top_k,
            embed_batch_size: DEFAULT_EMBED_BATCH_SIZE,
        }
    }

    /// Caps the number of inputs sent in one embedding request.
    pub fn with_embed_batch_size(mut self, size: usize) -> Self {
        self.embed_batch_size = size.max(1);
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn store(&self) -> &Arc<dyn KnowledgeStore> {
        &self.store
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors.pop().ok_or(EmbeddingError::CountMismatch {
            expected: 1,
            got: 0,
        })
    }

    async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let vectors = self.llm.embed(inputs, &self.embedding_model).await?;
        if vectors.len() != inputs.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: inputs.len(),
                got: vectors.len(),
            });
        }
        Ok(vectors)
    }

    /// Up to `k` document bodies, most similar first. Never fails: any embedding
    /// or store error yields an empty list.
    pub async fn retrieve(&self, query: &str, k: usize) -> Vec<String> {
        let embedding = match self.embed(query).await {
            Ok(embedding) => embedding,
            Err(e) => {
                tracing::warn!("Knowledge retrieval skipped, embedding failed: {}", e);
                return Vec::new();
            }
        };

        match self.store.search(&embedding, k).await {
            Ok(results) => results.into_iter().map(|r| r.document.text).collect(),
            Err(e) => {
                tracing::warn!("Knowledge retrieval failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Embeds in chunks of `embed_batch_size`, then upserts the whole batch in
    /// one transaction. Nothing is written unless every chunk embeds.
    pub async fn ingest(&self, documents: Vec<KnowledgeDocument>) -> Result<usize, KnowledgeError> {
        if documents.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = documents.iter().map(|d| d.text.clone()).collect();
        let mut embeddings = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.embed_batch_size) {
            embeddings.extend(self.embed_batch(chunk).await?);
        }
        tracing::debug!(
            "Embedded {} documents in {} requests",
            texts.len(),
            texts.len().div_ceil(self.embed_batch_size)
        );
        let items = documents.into_iter().zip(embeddings).collect();
        let count = self.store.upsert_batch(items).await?;

        tracing::info!("Ingested {} knowledge documents", count);
        Ok(count)
    }

    pub async fn count(&self, doc_type: Option<DocType>) -> Result<usize, KnowledgeError> {
        Ok(self.store.count(doc_type).await?)
    }

    pub async fn get(&self, id: &str) -> Result<Option<KnowledgeDocument>, KnowledgeError> {
        Ok(self.store.get(id).await?)
    }
}
