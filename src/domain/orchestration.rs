//! Orchestration request and outcome types

use serde::{Deserialize, Serialize};

use super::parameter::{ParameterDefinition, ParameterMap};

/// One inbound turn
#[derive(Debug, Clone, Default)]
pub struct OrchestrationRequest {
    /// Free text to classify
    pub query: Option<String>,
    /// Direct agent invocation target (used together with `parameters`)
    pub agent_id: Option<String>,
    pub parameters: Option<ParameterMap>,
    pub user_id: Option<String>,
    /// Created or reused lazily when absent
    pub conversation_id: Option<String>,
}

impl OrchestrationRequest {
    pub fn query(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ..Default::default()
        }
    }

    pub fn agent(agent_id: impl Into<String>, parameters: ParameterMap) -> Self {
        Self {
            agent_id: Some(agent_id.into()),
            parameters: Some(parameters),
            ..Default::default()
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }
}

/// Outcome of one orchestration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum OrchestrationResponse {
    Success {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        conversation_id: Option<String>,
    },
    Error {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        conversation_id: Option<String>,
    },
    /// Pending sub-dialog; carries the agent's full parameter list and is never persisted
    NeedsParameters {
        agent_id: String,
        parameters: Vec<ParameterDefinition>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        conversation_id: Option<String>,
    },
}

impl OrchestrationResponse {
    pub fn success(message: impl Into<String>, conversation_id: Option<String>) -> Self {
        OrchestrationResponse::Success {
            message: message.into(),
            conversation_id,
        }
    }

    pub fn error(message: impl Into<String>, conversation_id: Option<String>) -> Self {
        OrchestrationResponse::Error {
            message: message.into(),
            conversation_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            OrchestrationResponse::Success { .. } => "success",
            OrchestrationResponse::Error { .. } => "error",
            OrchestrationResponse::NeedsParameters { .. } => "needs_parameters",
        }
    }

    /// Text to persist as the assistant turn, if this outcome is persisted at all
    pub fn turn_message(&self) -> Option<&str> {
        match self {
            OrchestrationResponse::Success { message, .. }
            | OrchestrationResponse::Error { message, .. } => Some(message),
            OrchestrationResponse::NeedsParameters { .. } => None,
        }
    }

    pub fn conversation_id(&self) -> Option<&str> {
        match self {
            OrchestrationResponse::Success { conversation_id, .. }
            | OrchestrationResponse::Error { conversation_id, .. }
            | OrchestrationResponse::NeedsParameters { conversation_id, .. } => {
                conversation_id.as_deref()
            }
        }
    }
}
