//! Tool bridge wire types.
//!
//! The error code strings are part of the external contract and must not change.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Built-in task ids
pub const GET_FIXED_DATA: &str = "get_fixed_data";
pub const REVERSE_TEXT: &str = "reverse_text";
pub const CALCULATOR: &str = "calculator";

/// A single tool invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpTask {
    /// Selects the built-in handler
    pub task_id: String,
    #[serde(default)]
    pub params: Value,
}

impl McpTask {
    pub fn new(task_id: impl Into<String>, params: Value) -> Self {
        Self {
            task_id: task_id.into(),
            params,
        }
    }

    /// Params as an object; anything else is treated as empty
    pub fn params_object(&self) -> Map<String, Value> {
        match &self.params {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum McpErrorCode {
    InvalidParameters,
    DivisionByZero,
    InvalidOperation,
    TaskNotFound,
    InternalMcpError,
}

impl McpErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            McpErrorCode::InvalidParameters => "INVALID_PARAMETERS",
            McpErrorCode::DivisionByZero => "DIVISION_BY_ZERO",
            McpErrorCode::InvalidOperation => "INVALID_OPERATION",
            McpErrorCode::TaskNotFound => "TASK_NOT_FOUND",
            McpErrorCode::InternalMcpError => "INTERNAL_MCP_ERROR",
        }
    }
}

impl std::fmt::Display for McpErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskError {
    pub code: McpErrorCode,
    pub message: String,
}

/// Outcome of a tool invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum McpResult {
    Success { data: Value },
    Error { error: TaskError },
}

impl McpResult {
    pub fn success(data: Value) -> Self {
        McpResult::Success { data }
    }

    pub fn error(code: McpErrorCode, message: impl Into<String>) -> Self {
        McpResult::Error {
            error: TaskError {
                code,
                message: message.into(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, McpResult::Success { .. })
    }

    pub fn error_code(&self) -> Option<McpErrorCode> {
        match self {
            McpResult::Success { .. } => None,
            McpResult::Error { error } => Some(error.code),
        }
    }
}
