use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod arithmetic;
pub mod conversation;
pub mod mcp_types;
pub mod orchestration;
pub mod parameter;

pub use conversation::{Conversation, Message, Role};
pub use mcp_types::{McpErrorCode, McpResult, McpTask, TaskError};
pub use orchestration::{OrchestrationRequest, OrchestrationResponse};
pub use parameter::{ParameterDefinition, ParameterMap, ParameterType, ParameterValue};

/// Catalogue entry for a built-in tool
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Tool {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Counters the orchestrator reports to. Implemented by the metrics adapter.
pub trait OrchestrationMetrics: Send + Sync {
    /// `outcome` is the response kind (`success`, `error`, `needs_parameters`)
    fn record_orchestration(&self, outcome: &str);
    fn record_agent_execution(&self, agent_id: &str, succeeded: bool);
}

/// Tool bridge dispatch surface
#[async_trait]
pub trait ToolPort: Send + Sync {
    /// Run one task. Never fails: every failure is folded into [`McpResult::Error`].
    async fn execute_task(&self, task: McpTask) -> McpResult;
    async fn list_tools(&self) -> Vec<Tool>;
}
