//! # Concierge - conversational agent orchestration
//!
//! Concierge routes a user's turn either to a registered agent or to a
//! keyword-classified intent, persists the conversation, and exposes a small
//! tool bridge (single-shot dispatch, SSE sessions and rmcp).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use concierge::config::Settings;
//! use concierge::AppContext;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let context = AppContext::new(Settings::new()?)?;
//!     context.registry.initialize().await;
//!     let app = concierge::create_app(&context);
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **Domain**: parameter model, orchestration and tool bridge types, ports
//! - **Agents**: agent definitions and the registry
//! - **Orchestrator**: intent classification and the per-turn state machine
//! - **Store**: conversation persistence
//! - **Adapters**: HTTP handlers, built-in tools, SSE sessions, rmcp server
//! - **Config**: layered settings and validation

pub mod adapters;
pub mod agents;
pub mod cli;
pub mod config;
pub mod domain;
pub mod orchestrator;
pub mod store;

use crate::adapters::api_handler::{self, ApiState};
use crate::adapters::health_handler::HealthHandler;
use crate::adapters::mcp_handler::{self, McpState};
use crate::adapters::metrics_handler::{MetricsCollector, MetricsHandler};
use crate::adapters::rmcp_server::ConciergeServer;
use crate::adapters::session_manager::SessionManager;
use crate::adapters::tool_handler::BuiltinToolHandler;
use crate::agents::builtin::builtin_candidates;
use crate::agents::AgentRegistry;
use crate::config::Settings;
use crate::domain::ToolPort;
use crate::orchestrator::Orchestrator;
use crate::store::{ConversationStore, InMemoryConversationStore};
use axum::{
    routing::{delete, get, post},
    Router,
};
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpServerConfig, StreamableHttpService,
};
use std::sync::Arc;
use std::time::Duration;

/// Everything the server owns, constructed once at startup
#[derive(Clone)]
pub struct AppContext {
    pub settings: Arc<Settings>,
    pub registry: Arc<AgentRegistry>,
    pub store: Arc<dyn ConversationStore>,
    pub tools: Arc<dyn ToolPort>,
    pub sessions: Arc<SessionManager>,
    pub orchestrator: Arc<Orchestrator>,
    pub metrics: Arc<MetricsCollector>,
}

impl AppContext {
    /// Wire up the built-in agents, tools and an in-memory store.
    ///
    /// The registry is not initialized here; call
    /// [`AgentRegistry::initialize`] before serving traffic.
    pub fn new(settings: Settings) -> anyhow::Result<Self> {
        let metrics = Arc::new(MetricsCollector::new()?);

        let registry = Arc::new(
            AgentRegistry::new(builtin_candidates()).with_disabled(settings.agents.disabled.clone()),
        );
        let store: Arc<dyn ConversationStore> = Arc::new(InMemoryConversationStore::new(
            settings.conversations.max_messages,
        ));
        let tools: Arc<dyn ToolPort> = Arc::new(BuiltinToolHandler::with_metrics(metrics.clone()));
        let sessions = Arc::new(
            SessionManager::new(settings.mcp.session_buffer).with_metrics(metrics.clone()),
        );
        let orchestrator = Arc::new(
            Orchestrator::new(registry.clone(), store.clone())
                .with_tools(tools.clone())
                .with_metrics(metrics.clone()),
        );

        Ok(Self {
            settings: Arc::new(settings),
            registry,
            store,
            tools,
            sessions,
            orchestrator,
            metrics,
        })
    }
}

/// Creates the Axum application router with all endpoints configured.
pub fn create_app(context: &AppContext) -> Router {
    let health_handler = Arc::new(HealthHandler::new(context.registry.clone()));
    let metrics_handler = Arc::new(MetricsHandler::new(context.metrics.clone()));

    // Create rmcp HTTP transport service
    let server = ConciergeServer::new(context.tools.clone());
    let session_manager = Arc::new(LocalSessionManager::default());
    let config = StreamableHttpServerConfig::default();
    let rmcp_service = StreamableHttpService::new(move || Ok(server.clone()), session_manager, config);

    let ops_router = Router::new()
        .route("/health", get({
            let handler = health_handler.clone();
            move || {
                let h = handler.clone();
                async move { h.health().await }
            }
        }))
        .route("/health/ready", get({
            let handler = health_handler.clone();
            move || {
                let h = handler.clone();
                async move { h.ready().await }
            }
        }))
        .route("/health/live", get({
            let handler = health_handler.clone();
            move || {
                let h = handler.clone();
                async move { h.live().await }
            }
        }))
        .route("/metrics", get({
            let handler = metrics_handler.clone();
            move || {
                let h = handler.clone();
                async move { h.metrics().await }
            }
        }));

    let api_state = ApiState {
        registry: context.registry.clone(),
        orchestrator: context.orchestrator.clone(),
        store: context.store.clone(),
    };

    let agents_router = Router::new()
        .route("/agents", get(api_handler::list_agents))
        .route("/agents/:id", get(api_handler::get_agent).post(api_handler::run_agent))
        .with_state(api_state.clone());

    // Routes that act on behalf of a user
    let user_router = Router::new()
        .route("/orchestrate", post(api_handler::orchestrate))
        .route("/conversations", get(api_handler::list_conversations).post(api_handler::create_conversation))
        .route(
            "/conversations/:id",
            get(api_handler::get_conversation)
                .patch(api_handler::rename_conversation)
                .delete(api_handler::delete_conversation),
        )
        .route("/conversations/:id/messages", get(api_handler::list_messages).post(api_handler::post_message))
        .route("/conversations/:id/messages/sync", post(api_handler::post_message_sync))
        .route("/conversations/:id/messages/:message_id", delete(api_handler::delete_message))
        .layer(axum::middleware::from_fn(api_handler::user_id_middleware))
        .with_state(api_state);

    let mcp_state = McpState {
        tools: context.tools.clone(),
        sessions: context.sessions.clone(),
        keep_alive: Duration::from_secs(context.settings.mcp.keep_alive_secs),
    };

    let mcp_router = Router::new()
        .route("/mcp", post(mcp_handler::execute_task))
        .route("/mcp/tools", get(mcp_handler::list_tools))
        .route("/mcp/sse", get(mcp_handler::open_stream))
        .route("/mcp/messages", post(mcp_handler::post_message))
        .route("/mcp/sessions/:id", delete(mcp_handler::close_session))
        .with_state(mcp_state)
        // MCP protocol endpoint using rmcp streamable HTTP transport
        .nest_service("/mcp/rpc", rmcp_service);

    ops_router
        .merge(agents_router)
        .merge(user_router)
        .merge(mcp_router)
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any)
                .expose_headers([axum::http::HeaderName::from_static(api_handler::USER_ID_HEADER)]),
        )
}
