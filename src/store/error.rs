//! Conversation store error types

use axum::http::StatusCode;
use thiserror::Error;

/// Errors that can occur in the conversation store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Item not found
    #[error("Item not found: {entity_type} with identifier '{identifier}'")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn conversation_not_found(id: &str) -> Self {
        Self::NotFound {
            entity_type: "conversation".to_string(),
            identifier: id.to_string(),
        }
    }

    pub fn message_not_found(id: &str) -> Self {
        Self::NotFound {
            entity_type: "message".to_string(),
            identifier: id.to_string(),
        }
    }

    /// Convert to HTTP status code for API responses
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
