//! Error types for agent registration, validation and execution

use axum::http::StatusCode;
use thiserror::Error;

use crate::store::StoreError;

/// Errors that can occur during agent operations
#[derive(Debug, Error)]
pub enum AgentError {
    /// Input rejected by the agent itself
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Parameter validation failed before execution
    #[error("Validation failed: {}", .0.join(" "))]
    Validation(Vec<String>),

    /// Candidate rejected by the registry
    #[error("Invalid agent definition '{candidate}': {reason}")]
    InvalidDefinition { candidate: String, reason: String },

    /// Agent execution failed
    #[error("Execution error: {0}")]
    Execution(String),

    /// Tool bridge call failed
    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    /// Conversation persistence failed
    #[error("Conversation store error: {0}")]
    Store(#[from] StoreError),
}

impl AgentError {
    /// Convert to HTTP status code for API responses
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Store(e) => e.status_code(),
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the message is safe and useful to show to the caller
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::Validation(_))
    }
}

/// Result type alias for agent operations
pub type AgentResult<T> = Result<T, AgentError>;
