use thiserror::Error;

use crate::core::errors::ApiError;
use crate::llm::LlmError;

/// Startup failures. These are the only errors that stop the server.
#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("Failed to load configuration: {0}")]
    Config(#[source] ApiError),

    #[error("No model API key configured (set OPENAI_API_KEY or llm.api_key in secrets.yaml)")]
    MissingApiKey,

    #[error("Failed to initialize model client: {0}")]
    Llm(#[source] LlmError),

    #[error("Failed to open {store} database: {source}")]
    Database {
        store: &'static str,
        #[source]
        source: ApiError,
    },
}
