//! REST API handlers
//!
//! Agents, orchestration and conversation CRUD. Every route under
//! [`user_id_middleware`] sees an `x-user-id`; one is minted when the caller
//! sends none and echoed back on the response.

use axum::{
    extract::{Path, Request, State},
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, error};

use crate::agents::{AgentError, AgentInfo, AgentRegistry};
use crate::domain::parameter::{apply_defaults, parameters_from_json, validate_parameters};
use crate::domain::{Conversation, Message, OrchestrationRequest, OrchestrationResponse};
use crate::orchestrator::{Orchestrator, SyncTurn};
use crate::store::{ConversationStore, StoreError};

pub const USER_ID_HEADER: &str = "x-user-id";

/// Shared application state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub registry: Arc<AgentRegistry>,
    pub orchestrator: Arc<Orchestrator>,
    pub store: Arc<dyn ConversationStore>,
}

/// Caller identity resolved by [`user_id_middleware`]
#[derive(Debug, Clone)]
pub struct UserId(pub String);

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    details: Vec<String>,
}

/// Error response: `{error, details?}` with a status code
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    details: Vec<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            details: Vec::new(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// 400 carrying one message per violation
    pub fn validation(details: Vec<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: "Invalid parameters".to_string(),
            details,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message,
            details: self.details,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => ApiError::not_found(err.to_string()),
            StoreError::Internal(_) => {
                error!(error = %err, "Conversation store failure");
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

impl From<AgentError> for ApiError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::Validation(details) => ApiError::validation(details),
            AgentError::Store(e) => e.into(),
            e if e.is_user_facing() => ApiError::new(e.status_code(), e.to_string()),
            e => {
                error!(error = %e, "Agent execution failed");
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Agent execution failed")
            }
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

// ============================================================================
// Middleware
// ============================================================================

/// Resolve the caller's user id, minting an anonymous one when absent
pub async fn user_id_middleware(mut req: Request, next: Next) -> Response {
    let supplied = req
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string);

    let user_id = supplied.unwrap_or_else(|| {
        let id = uuid::Uuid::new_v4().to_string();
        debug!(user_id = %id, "Minted anonymous user");
        id
    });

    req.extensions_mut().insert(UserId(user_id.clone()));
    let mut response = next.run(req).await;

    if let Ok(value) = HeaderValue::from_str(&user_id) {
        response.headers_mut().insert(USER_ID_HEADER, value);
    }
    response
}

// ============================================================================
// Agents
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RunAgentBody {
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

/// GET /agents - List agent metadata
pub async fn list_agents(State(state): State<ApiState>) -> Json<Vec<AgentInfo>> {
    Json(state.registry.list_agent_info().await)
}

/// GET /agents/:id - Single agent metadata
pub async fn get_agent(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<Json<AgentInfo>> {
    state
        .registry
        .agent_info(&id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Agent '{}' not found", id)))
}

/// POST /agents/:id - Validate parameters and run the agent directly
pub async fn run_agent(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(body): Json<RunAgentBody>,
) -> ApiResult<Json<Value>> {
    let agent = state
        .registry
        .get_agent(&id)
        .await
        .ok_or_else(|| ApiError::not_found(format!("Agent '{}' not found", id)))?;

    let mut params = parameters_from_json(&body.parameters).map_err(ApiError::validation)?;
    validate_parameters(agent.parameters(), &params).map_err(ApiError::validation)?;
    apply_defaults(agent.parameters(), &mut params);

    let result = agent.execute(params).await?;
    Ok(Json(json!({ "result": result })))
}

// ============================================================================
// Orchestration
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestrateBody {
    pub query: Option<String>,
    pub agent_id: Option<String>,
    pub parameters: Option<Map<String, Value>>,
    pub conversation_id: Option<String>,
}

/// POST /orchestrate - Handle one conversational turn
pub async fn orchestrate(
    State(state): State<ApiState>,
    Extension(UserId(user_id)): Extension<UserId>,
    Json(body): Json<OrchestrateBody>,
) -> ApiResult<Json<OrchestrationResponse>> {
    let parameters = body
        .parameters
        .as_ref()
        .map(parameters_from_json)
        .transpose()
        .map_err(ApiError::validation)?;

    if let Some(conversation_id) = &body.conversation_id {
        if state.store.get_conversation(conversation_id).await?.is_none() {
            return Err(StoreError::conversation_not_found(conversation_id).into());
        }
    }

    let request = OrchestrationRequest {
        query: body.query,
        agent_id: body.agent_id,
        parameters,
        user_id: Some(user_id),
        conversation_id: body.conversation_id,
    };

    Ok(Json(state.orchestrator.orchestrate(request).await))
}

// ============================================================================
// Conversations
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct CreateConversationBody {
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RenameConversationBody {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct PostMessageBody {
    pub content: String,
}

/// GET /conversations - The caller's conversations, most recent first
pub async fn list_conversations(
    State(state): State<ApiState>,
    Extension(UserId(user_id)): Extension<UserId>,
) -> ApiResult<Json<Vec<Conversation>>> {
    Ok(Json(state.store.list_conversations_for_user(&user_id).await?))
}

/// POST /conversations - Start a conversation
pub async fn create_conversation(
    State(state): State<ApiState>,
    Extension(UserId(user_id)): Extension<UserId>,
    body: Option<Json<CreateConversationBody>>,
) -> ApiResult<(StatusCode, Json<Conversation>)> {
    let title = body
        .and_then(|Json(b)| b.title)
        .filter(|t| !t.trim().is_empty());
    let conversation = state.store.create_conversation(&user_id, title).await?;
    Ok((StatusCode::CREATED, Json(conversation)))
}

/// GET /conversations/:id
pub async fn get_conversation(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Conversation>> {
    state
        .store
        .get_conversation(&id)
        .await?
        .map(Json)
        .ok_or_else(|| StoreError::conversation_not_found(&id).into())
}

/// PATCH /conversations/:id - Rename
pub async fn rename_conversation(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(body): Json<RenameConversationBody>,
) -> ApiResult<Json<Conversation>> {
    let title = body.title.trim();
    if title.is_empty() {
        return Err(ApiError::bad_request("Title must not be empty"));
    }
    Ok(Json(state.store.rename_conversation(&id, title.to_string()).await?))
}

/// DELETE /conversations/:id
pub async fn delete_conversation(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.store.delete_conversation(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /conversations/:id/messages - Turns in append order
pub async fn list_messages(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Message>>> {
    Ok(Json(state.store.list_messages(&id).await?))
}

/// POST /conversations/:id/messages - Store the user turn and reply in the background
pub async fn post_message(
    State(state): State<ApiState>,
    Extension(UserId(user_id)): Extension<UserId>,
    Path(id): Path<String>,
    Json(body): Json<PostMessageBody>,
) -> ApiResult<(StatusCode, Json<Message>)> {
    let content = non_empty_content(&body)?;
    let message = state
        .orchestrator
        .submit_message(&id, content, Some(user_id))
        .await?;
    Ok((StatusCode::ACCEPTED, Json(message)))
}

/// POST /conversations/:id/messages/sync - Store the user turn and wait for the reply
pub async fn post_message_sync(
    State(state): State<ApiState>,
    Extension(UserId(user_id)): Extension<UserId>,
    Path(id): Path<String>,
    Json(body): Json<PostMessageBody>,
) -> ApiResult<Json<SyncTurn>> {
    let content = non_empty_content(&body)?;
    let turn = state
        .orchestrator
        .submit_message_sync(&id, content, Some(user_id))
        .await?;
    debug!(conversation_id = %id, outcome = turn.response.kind(), "Synchronous turn completed");
    Ok(Json(turn))
}

/// DELETE /conversations/:id/messages/:message_id
pub async fn delete_message(
    State(state): State<ApiState>,
    Path((id, message_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    state.store.delete_message(&id, &message_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn non_empty_content(body: &PostMessageBody) -> ApiResult<&str> {
    let content = body.content.trim();
    if content.is_empty() {
        Err(ApiError::bad_request("Message content must not be empty"))
    } else {
        Ok(content)
    }
}
