use thiserror::Error;

use crate::core::errors::ApiError;
use crate::llm::LlmError;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding request failed: {0}")]
    Provider(#[from] LlmError),
    #[error("embedding response has {got} vectors for {expected} inputs")]
    CountMismatch { expected: usize, got: usize },
}

#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
    #[error("knowledge store failure: {0}")]
    Store(#[from] ApiError),
}

impl From<KnowledgeError> for ApiError {
    fn from(err: KnowledgeError) -> Self {
        match err {
            KnowledgeError::Embedding(e) => ApiError::ServiceUnavailable(e.to_string()),
            KnowledgeError::Store(e) => e,
        }
    }
}
