pub mod api_handler;
pub mod health_handler;
pub mod mcp_handler;
pub mod metrics_handler;
pub mod rmcp_server;
pub mod session_manager;
pub mod tool_handler;
