use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorCode {
    UnknownTool,
    InvalidArguments,
    MissingArguments,
    NotFound,
    LookupFailed,
    ModelFailed,
}

impl ToolErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ToolErrorCode::UnknownTool => "unknown_tool",
            ToolErrorCode::InvalidArguments => "invalid_arguments",
            ToolErrorCode::MissingArguments => "missing_arguments",
            ToolErrorCode::NotFound => "not_found",
            ToolErrorCode::LookupFailed => "lookup_failed",
            ToolErrorCode::ModelFailed => "model_failed",
        }
    }
}

/// What a tool hands back to the model: data, or an error it can reason about.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    Data(Value),
    Error { code: ToolErrorCode, message: String },
}

impl ToolOutput {
    pub fn error(code: ToolErrorCode, message: impl Into<String>) -> Self {
        ToolOutput::Error {
            code,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ToolOutput::Error { .. })
    }

    pub fn into_value(self) -> Value {
        match self {
            ToolOutput::Data(value) => value,
            ToolOutput::Error { code, message } => json!({ "error": message, "code": code.as_str() }),
        }
    }
}

/// One executed tool call within a turn.
#[derive(Debug, Clone, Serialize)]
pub struct ToolCallResult {
    pub tool_name: String,
    pub call_id: String,
    pub arguments: Value,
    pub output: Value,
}
