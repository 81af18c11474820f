use async_trait::async_trait;

use super::error::LlmError;
use super::types::{ChatRequest, ChatResponse};

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// return the provider name (e.g. "openai")
    fn name(&self) -> &str;

    /// chat completion (non-streaming), optionally with tool definitions attached
    async fn chat(&self, request: ChatRequest, model_id: &str) -> Result<ChatResponse, LlmError>;

    /// generate embeddings, one vector per input in input order
    async fn embed(&self, inputs: &[String], model_id: &str) -> Result<Vec<Vec<f32>>, LlmError>;
}
