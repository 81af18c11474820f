use thiserror::Error;

use crate::core::errors::ContentError;
use crate::llm::LlmError;
use crate::rag::KnowledgeError;

/// Why a single learning item was skipped. Never aborts a run.
#[derive(Debug, Error)]
pub enum LearningError {
    #[error(transparent)]
    Model(#[from] LlmError),
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error(transparent)]
    Knowledge(#[from] KnowledgeError),
}
