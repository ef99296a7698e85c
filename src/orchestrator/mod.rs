//! Per-request orchestration
//!
//! One call resolves the conversation, persists the inbound turn, classifies
//! or dispatches, and persists the assistant turn. `NeedsParameters` outcomes
//! are never persisted. Failures past conversation resolution are contained:
//! the caller always gets an `OrchestrationResponse`.

pub mod intent;


use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::agents::builtin::REVERSE_AGENT_ID;
use crate::agents::{Agent, AgentError, AgentRegistry, AgentResult};
use crate::domain::mcp_types::GET_FIXED_DATA;
use crate::domain::parameter::{apply_defaults, missing_required, type_violations};
use crate::domain::{
    McpResult, McpTask, Message, OrchestrationMetrics, OrchestrationRequest,
    OrchestrationResponse, ParameterMap, ParameterValue, Role, ToolPort,
};
use crate::store::ConversationStore;
use intent::Intent;

pub const INVALID_REQUEST_MESSAGE: &str = "Invalid input: Missing query or agentId/parameters.";
pub const APOLOGY_MESSAGE: &str =
    "Sorry, something went wrong while processing your request. Please try again later.";

/// Response plus the assistant turn it produced, if one was persisted
#[derive(Debug, Clone)]
pub struct OrchestrationOutcome {
    pub response: OrchestrationResponse,
    pub assistant_message: Option<Message>,
}

/// Result of a synchronous message submission
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncTurn {
    pub user_message: Message,
    pub assistant_message: Option<Message>,
    pub response: OrchestrationResponse,
}

enum Prepared {
    Ready(ParameterMap),
    Respond(OrchestrationResponse),
}

#[derive(Clone)]
pub struct Orchestrator {
    registry: Arc<AgentRegistry>,
    store: Arc<dyn ConversationStore>,
    tools: Option<Arc<dyn ToolPort>>,
    metrics: Option<Arc<dyn OrchestrationMetrics>>,
}

impl Orchestrator {
    pub fn new(registry: Arc<AgentRegistry>, store: Arc<dyn ConversationStore>) -> Self {
        Self {
            registry,
            store,
            tools: None,
            metrics: None,
        }
    }

    pub fn with_tools(mut self, tools: Arc<dyn ToolPort>) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn OrchestrationMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Handle one turn end to end
    pub async fn orchestrate(&self, request: OrchestrationRequest) -> OrchestrationResponse {
        self.run(request, true).await.response
    }

    /// Persist the user's message and orchestrate the reply in the background.
    ///
    /// Returns once the user turn is stored; the assistant turn appears in the
    /// conversation later.
    pub async fn submit_message(
        &self,
        conversation_id: &str,
        content: &str,
        user_id: Option<String>,
    ) -> AgentResult<Message> {
        let user_message = self
            .store
            .add_message(conversation_id, content, Role::User)
            .await?;

        let request = follow_up_request(conversation_id, content, user_id);
        let orchestrator = self.clone();
        tokio::spawn(async move {
            let outcome = orchestrator.run(request, false).await;
            match &outcome.response {
                OrchestrationResponse::Error { message, conversation_id } => {
                    warn!(?conversation_id, %message, "Background orchestration ended in error");
                }
                other => debug!(outcome = other.kind(), "Background orchestration finished"),
            }
        });

        Ok(user_message)
    }

    /// Persist the user's message and wait for the assistant turn
    pub async fn submit_message_sync(
        &self,
        conversation_id: &str,
        content: &str,
        user_id: Option<String>,
    ) -> AgentResult<SyncTurn> {
        let user_message = self
            .store
            .add_message(conversation_id, content, Role::User)
            .await?;

        let request = follow_up_request(conversation_id, content, user_id);
        let outcome = self.run(request, false).await;

        Ok(SyncTurn {
            user_message,
            assistant_message: outcome.assistant_message,
            response: outcome.response,
        })
    }

    async fn run(&self, request: OrchestrationRequest, persist_inbound: bool) -> OrchestrationOutcome {
        let conversation_id = match self.resolve_conversation(&request).await {
            Ok(id) => id,
            Err(e) => return self.contain(e, None).await,
        };

        if persist_inbound {
            if let (Some(cid), Some(query)) = (&conversation_id, effective_query(&request)) {
                if let Err(e) = self.store.add_message(cid, query, Role::User).await {
                    return self.contain(e.into(), conversation_id).await;
                }
            }
        }

        let response = match self.dispatch(&request, conversation_id.clone()).await {
            Ok(response) => response,
            Err(e) => return self.contain(e, conversation_id).await,
        };

        let assistant_message = match (&conversation_id, response.turn_message()) {
            (Some(cid), Some(text)) => match self.store.add_message(cid, text, Role::Assistant).await {
                Ok(message) => Some(message),
                Err(e) => return self.contain(e.into(), conversation_id).await,
            },
            _ => None,
        };

        self.record_outcome(&response);
        OrchestrationOutcome {
            response,
            assistant_message,
        }
    }

    /// Explicit id wins; a known user gets their latest conversation; otherwise nothing is persisted
    async fn resolve_conversation(&self, request: &OrchestrationRequest) -> AgentResult<Option<String>> {
        if let Some(id) = &request.conversation_id {
            return Ok(Some(id.clone()));
        }
        match &request.user_id {
            Some(user_id) => Ok(Some(self.store.latest_or_create(user_id).await?.id)),
            None => Ok(None),
        }
    }

    async fn dispatch(
        &self,
        request: &OrchestrationRequest,
        conversation_id: Option<String>,
    ) -> AgentResult<OrchestrationResponse> {
        if let Some(query) = effective_query(request) {
            return self.handle_query(query, conversation_id).await;
        }
        if let (Some(agent_id), Some(parameters)) = (&request.agent_id, &request.parameters) {
            return self
                .handle_agent(agent_id, parameters.clone(), conversation_id)
                .await;
        }
        Ok(OrchestrationResponse::error(INVALID_REQUEST_MESSAGE, conversation_id))
    }

    async fn handle_query(
        &self,
        query: &str,
        conversation_id: Option<String>,
    ) -> AgentResult<OrchestrationResponse> {
        match intent::classify(query) {
            Intent::Reverse { text } => {
                let Some(agent) = self.registry.get_agent(REVERSE_AGENT_ID).await else {
                    return Ok(OrchestrationResponse::error(
                        format!("Agent '{}' is not available.", REVERSE_AGENT_ID),
                        conversation_id,
                    ));
                };

                let mut params = ParameterMap::new();
                if !text.is_empty() {
                    params.insert("text".to_string(), ParameterValue::String(text));
                }
                let params = match prepare(&agent, params, &conversation_id) {
                    Prepared::Ready(params) => params,
                    Prepared::Respond(response) => return Ok(response),
                };

                let value = self.execute_agent(&agent, params).await?;
                Ok(OrchestrationResponse::success(
                    format!("Reversed text: {}", display_value(&value)),
                    conversation_id,
                ))
            }
            Intent::FixedData => self.fixed_data(conversation_id).await,
            Intent::Unknown => Ok(OrchestrationResponse::success(
                format!(
                    "I'm not sure how to help with \"{}\". Try \"reverse <text>\" or ask for \"fixed data\".",
                    query.trim()
                ),
                conversation_id,
            )),
        }
    }

    async fn handle_agent(
        &self,
        agent_id: &str,
        params: ParameterMap,
        conversation_id: Option<String>,
    ) -> AgentResult<OrchestrationResponse> {
        let Some(agent) = self.registry.get_agent(agent_id).await else {
            return Ok(OrchestrationResponse::error(
                format!("Agent '{}' not found.", agent_id),
                conversation_id,
            ));
        };

        let params = match prepare(&agent, params, &conversation_id) {
            Prepared::Ready(params) => params,
            Prepared::Respond(response) => return Ok(response),
        };

        match self.execute_agent(&agent, params).await {
            Ok(value) => Ok(OrchestrationResponse::success(
                format!("Result from {}: {}", agent.name(), value),
                conversation_id,
            )),
            Err(e) if e.is_user_facing() => Ok(OrchestrationResponse::error(e.to_string(), conversation_id)),
            Err(e) => Err(e),
        }
    }

    async fn fixed_data(&self, conversation_id: Option<String>) -> AgentResult<OrchestrationResponse> {
        let Some(tools) = &self.tools else {
            return Ok(OrchestrationResponse::success(
                format!("Here is the fixed data: {}", json!({ "status": "unavailable" })),
                conversation_id,
            ));
        };

        match tools.execute_task(McpTask::new(GET_FIXED_DATA, json!({}))).await {
            McpResult::Success { data } => Ok(OrchestrationResponse::success(
                format!("Here is the fixed data: {}", data),
                conversation_id,
            )),
            McpResult::Error { error } => Err(AgentError::ToolExecution(format!(
                "{}: {}",
                error.code, error.message
            ))),
        }
    }

    async fn execute_agent(&self, agent: &Agent, params: ParameterMap) -> AgentResult<Value> {
        debug!(agent_id = %agent.id(), "Executing agent");
        let result = agent.execute(params).await;
        if let Some(metrics) = &self.metrics {
            metrics.record_agent_execution(agent.id(), result.is_ok());
        }
        result
    }

    /// Log the failure and try to leave an apology turn behind
    async fn contain(&self, err: AgentError, conversation_id: Option<String>) -> OrchestrationOutcome {
        error!(?conversation_id, error = %err, "Orchestration failed");

        let response = OrchestrationResponse::error(APOLOGY_MESSAGE, conversation_id.clone());
        let assistant_message = match &conversation_id {
            Some(cid) => match self.store.add_message(cid, APOLOGY_MESSAGE, Role::Assistant).await {
                Ok(message) => Some(message),
                Err(e) => {
                    error!(conversation_id = %cid, error = %e, "Failed to persist apology turn");
                    None
                }
            },
            None => None,
        };

        self.record_outcome(&response);
        OrchestrationOutcome {
            response,
            assistant_message,
        }
    }

    fn record_outcome(&self, response: &OrchestrationResponse) {
        info!(outcome = response.kind(), "Orchestration completed");
        if let Some(metrics) = &self.metrics {
            metrics.record_orchestration(response.kind());
        }
    }
}

fn follow_up_request(conversation_id: &str, content: &str, user_id: Option<String>) -> OrchestrationRequest {
    OrchestrationRequest {
        query: Some(content.to_string()),
        user_id,
        conversation_id: Some(conversation_id.to_string()),
        ..Default::default()
    }
}

fn effective_query(request: &OrchestrationRequest) -> Option<&str> {
    request.query.as_deref().filter(|q| !q.trim().is_empty())
}

/// Missing required parameters re-prompt with the full list; type mismatches are errors
fn prepare(agent: &Agent, mut params: ParameterMap, conversation_id: &Option<String>) -> Prepared {
    if !missing_required(agent.parameters(), &params).is_empty() {
        return Prepared::Respond(OrchestrationResponse::NeedsParameters {
            agent_id: agent.id().to_string(),
            parameters: agent.parameters().to_vec(),
            conversation_id: conversation_id.clone(),
        });
    }

    let violations = type_violations(agent.parameters(), &params);
    if !violations.is_empty() {
        return Prepared::Respond(OrchestrationResponse::error(
            format!("Invalid parameters for {}: {}", agent.name(), violations.join(" ")),
            conversation_id.clone(),
        ));
    }

    apply_defaults(agent.parameters(), &mut params);
    Prepared::Ready(params)
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
