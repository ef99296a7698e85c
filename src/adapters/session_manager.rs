//! Streaming session registry for the tool bridge
//!
//! A session exists from stream-open until the stream is dropped (client
//! disconnect) or closed by the server. There is no resume: a closed session id
//! is never valid again.

use futures::{Stream, StreamExt};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info};

use crate::adapters::metrics_handler::MetricsCollector;

/// One outbound event on a session stream
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionEvent {
    pub event: String,
    pub data: Value,
}

impl SessionEvent {
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    /// First event of every stream
    pub fn session(session_id: &str) -> Self {
        Self::new("session", json!({ "sessionId": session_id }))
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(String),
}

impl SessionError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        match self {
            Self::NotFound(_) => axum::http::StatusCode::NOT_FOUND,
        }
    }
}

type SessionMap = Arc<Mutex<HashMap<String, mpsc::Sender<SessionEvent>>>>;

/// Registry of open streaming sessions
pub struct SessionManager {
    sessions: SessionMap,
    buffer: usize,
    metrics: Option<Arc<MetricsCollector>>,
}

impl SessionManager {
    /// `buffer` is the per-session outbound queue depth
    pub fn new(buffer: usize) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            buffer: buffer.max(1),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Open a session. The returned stream yields the session id event first.
    pub fn open_session(&self) -> SessionStream {
        let id = uuid::Uuid::new_v4().to_string();
        let (tx, rx) = mpsc::channel(self.buffer);

        // Capacity is at least one and the channel is empty, so this cannot fail
        let _ = tx.try_send(SessionEvent::session(&id));

        self.sessions.lock().insert(id.clone(), tx);
        if let Some(metrics) = &self.metrics {
            metrics.mcp_sessions_active.inc();
        }
        info!(session_id = %id, "Opened streaming session");

        SessionStream {
            id,
            inner: ReceiverStream::new(rx),
            sessions: self.sessions.clone(),
            metrics: self.metrics.clone(),
        }
    }

    /// Whether `id` names a live session
    pub fn has_session(&self, id: &str) -> bool {
        self.sessions
            .lock()
            .get(id)
            .map(|tx| !tx.is_closed())
            .unwrap_or(false)
    }

    /// Queue an event on a live session
    pub async fn send(&self, id: &str, event: SessionEvent) -> Result<(), SessionError> {
        let tx = self
            .sessions
            .lock()
            .get(id)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;

        tx.send(event)
            .await
            .map_err(|_| SessionError::NotFound(id.to_string()))
    }

    /// Close a session from the server side. Its stream ends after draining queued events.
    pub fn close_session(&self, id: &str) -> bool {
        let removed = self.sessions.lock().remove(id).is_some();
        if removed {
            info!(session_id = %id, "Closed streaming session");
        }
        removed
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().len()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(32)
    }
}

/// Receiving half of a session. Dropping it ends the session.
pub struct SessionStream {
    id: String,
    inner: ReceiverStream<SessionEvent>,
    sessions: SessionMap,
    metrics: Option<Arc<MetricsCollector>>,
}

impl SessionStream {
    pub fn session_id(&self) -> &str {
        &self.id
    }
}

impl Stream for SessionStream {
    type Item = SessionEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

impl Drop for SessionStream {
    fn drop(&mut self) {
        self.sessions.lock().remove(&self.id);
        if let Some(metrics) = &self.metrics {
            metrics.mcp_sessions_active.dec();
        }
        debug!(session_id = %self.id, "Session stream dropped");
    }
}
