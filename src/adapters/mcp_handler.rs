//! Tool bridge HTTP surface
//!
//! - `POST /mcp` - single-shot task dispatch, always answered with an `McpResult`
//! - `GET /mcp/sse` - opens a streaming session; the first event carries its id
//! - `POST /mcp/messages` - message for a live session; task-shaped messages are
//!   dispatched and their result is pushed to the session as a `result` event
//! - `DELETE /mcp/sessions/:id` - server-side close
//! - `GET /mcp/tools` - catalogue

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    Json,
};
use futures::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::adapters::session_manager::{SessionEvent, SessionManager};
use crate::domain::{McpErrorCode, McpResult, McpTask, Tool, ToolPort};

#[derive(Clone)]
pub struct McpState {
    pub tools: Arc<dyn ToolPort>,
    pub sessions: Arc<SessionManager>,
    pub keep_alive: Duration,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMessage {
    pub session_id: String,
    #[serde(default)]
    pub message: Value,
}

/// POST /mcp - Dispatch one task
pub async fn execute_task(
    State(state): State<McpState>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    match serde_json::from_value::<McpTask>(body) {
        Ok(task) => (StatusCode::OK, Json(state.tools.execute_task(task).await)),
        Err(e) => {
            debug!(error = %e, "Rejected malformed task body");
            (
                StatusCode::BAD_REQUEST,
                Json(McpResult::error(
                    McpErrorCode::InvalidParameters,
                    "Request body must be an object with a string 'task_id' and optional 'params'",
                )),
            )
        }
    }
}

/// GET /mcp/tools - Built-in tool catalogue
pub async fn list_tools(State(state): State<McpState>) -> Json<Vec<Tool>> {
    Json(state.tools.list_tools().await)
}

/// GET /mcp/sse - Open a streaming session
pub async fn open_stream(
    State(state): State<McpState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = state.sessions.open_session().map(|event| {
        Ok(Event::default()
            .event(event.event)
            .data(event.data.to_string()))
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(state.keep_alive).text("ping"))
}

/// POST /mcp/messages - Acknowledge a session message
pub async fn post_message(
    State(state): State<McpState>,
    Json(body): Json<SessionMessage>,
) -> impl IntoResponse {
    if !state.sessions.has_session(&body.session_id) {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("Session not found: {}", body.session_id) })),
        );
    }

    if let Ok(task) = serde_json::from_value::<McpTask>(body.message) {
        let session_id = body.session_id.clone();
        tokio::spawn(async move {
            let result = state.tools.execute_task(task).await;
            let event = SessionEvent::new("result", json!(result));
            if let Err(e) = state.sessions.send(&session_id, event).await {
                warn!(session_id = %session_id, error = %e, "Dropped result for closed session");
            }
        });
    }

    (
        StatusCode::ACCEPTED,
        Json(json!({ "status": "accepted", "sessionId": body.session_id })),
    )
}

/// DELETE /mcp/sessions/:id - Close a session
pub async fn close_session(
    State(state): State<McpState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    if state.sessions.close_session(&id) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}
