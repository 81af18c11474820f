pub mod error;
pub mod openai;
pub mod provider;
pub mod structured;
pub mod tier;
pub mod types;

#[cfg(test)]
pub mod testing;

pub use error::LlmError;
pub use openai::OpenAiProvider;
pub use provider::LlmProvider;
pub use tier::{Complexity, ModelCatalog, ModelTier};
pub use types::{
    ChatMessage, ChatRequest, ChatResponse, ContentPart, ImageUrl, Role, ToolCall, ToolSpec,
};
