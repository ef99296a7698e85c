use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::agents::AgentRegistry;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthChecks {
    pub registry: String,
    pub agents: usize,
}

pub struct HealthHandler {
    registry: Arc<AgentRegistry>,
    start_time: std::time::Instant,
}

impl HealthHandler {
    pub fn new(registry: Arc<AgentRegistry>) -> Self {
        Self {
            registry,
            start_time: std::time::Instant::now(),
        }
    }

    /// Always 200 while the process serves; `checks` reports agent discovery
    pub async fn health(&self) -> impl IntoResponse {
        let registry = match self.registry.is_initialized().await {
            true => "ok",
            false => "initializing",
        };

        let status = HealthStatus {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            checks: HealthChecks {
                registry: registry.to_string(),
                agents: self.registry.len().await,
            },
        };

        (StatusCode::OK, Json(status))
    }

    /// Readiness check - 503 until agent discovery has run
    pub async fn ready(&self) -> impl IntoResponse {
        if self.registry.is_initialized().await {
            (StatusCode::OK, Json(serde_json::json!({
                "status": "ready",
                "agents": self.registry.len().await
            })))
        } else {
            (StatusCode::SERVICE_UNAVAILABLE, Json(serde_json::json!({
                "status": "not_ready",
                "message": "Agent registry not initialized"
            })))
        }
    }

    pub async fn live(&self) -> impl IntoResponse {
        (StatusCode::OK, Json(serde_json::json!({ "status": "alive" })))
    }
}
