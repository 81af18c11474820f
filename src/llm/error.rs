use thiserror::Error;

use crate::core::errors::ApiError;

/// Failures talking to the hosted model API. All of them are infrastructure errors:
/// callers on the request path degrade instead of propagating.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("model API request failed: {0}")]
    Transport(String),
    #[error("model API returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected model API response: {0}")]
    Decode(String),
}

impl LlmError {
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, LlmError::Status { status: 401 | 403, .. })
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            LlmError::Decode(err.to_string())
        } else {
            LlmError::Transport(err.to_string())
        }
    }
}

impl From<LlmError> for ApiError {
    fn from(err: LlmError) -> Self {
        ApiError::ServiceUnavailable(err.to_string())
    }
}
