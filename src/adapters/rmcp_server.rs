//! RMCP Server Adapter
//!
//! Exposes the built-in tool catalogue through the official rmcp SDK
//! (`tools/list`, `tools/call`). Dispatch goes through the same [`ToolPort`]
//! as `POST /mcp`, so both surfaces share error codes and metrics.

use crate::domain::{McpErrorCode, McpResult, McpTask, ToolPort};
use rmcp::{
    handler::server::ServerHandler,
    model::{
        CallToolRequestParam, CallToolResult, Content, Implementation, ListToolsResult,
        PaginatedRequestParam, ServerCapabilities, ServerInfo, Tool,
    },
    service::RequestContext,
    ErrorData as McpError, RoleServer,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

/// Concierge MCP Server
#[derive(Clone)]
pub struct ConciergeServer {
    tool_handler: Arc<dyn ToolPort>,
}

impl ConciergeServer {
    pub fn new(tool_handler: Arc<dyn ToolPort>) -> Self {
        Self { tool_handler }
    }
}

impl ServerHandler for ConciergeServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "concierge".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                website_url: None,
                icons: None,
            },
            instructions: Some(
                "Concierge tool bridge - fixed data lookup, text reversal and arithmetic".to_string(),
            ),
        }
    }

    fn ping(
        &self,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<(), McpError>> + Send + '_ {
        async move {
            info!("MCP ping received");
            Ok(())
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        let handler = self.tool_handler.clone();
        async move {
            let tools = handler
                .list_tools()
                .await
                .into_iter()
                .map(|t| {
                    // Input schema should be a JSON object
                    let schema = match t.input_schema {
                        serde_json::Value::Object(obj) => obj,
                        _ => serde_json::Map::new(),
                    };
                    Tool::new(t.name, t.description, schema)
                })
                .collect();

            Ok(ListToolsResult {
                tools,
                next_cursor: None,
            })
        }
    }

    fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        let handler = self.tool_handler.clone();
        async move {
            let params = request
                .arguments
                .map(serde_json::Value::Object)
                .unwrap_or_else(|| json!({}));
            let task = McpTask::new(request.name.as_ref(), params);
            debug!(task_id = %task.task_id, "MCP tools/call");

            match handler.execute_task(task).await {
                McpResult::Success { data } => {
                    Ok(CallToolResult::success(vec![Content::text(data.to_string())]))
                }
                McpResult::Error { error } if error.code == McpErrorCode::TaskNotFound => {
                    Err(McpError::invalid_params(
                        error.message,
                        Some(json!({ "code": error.code })),
                    ))
                }
                McpResult::Error { error } => Ok(CallToolResult::error(vec![Content::text(
                    json!({ "code": error.code, "message": error.message }).to_string(),
                )])),
            }
        }
    }
}
