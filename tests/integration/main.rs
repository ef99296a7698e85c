mod common;

mod conversation_test;
mod health_test;
mod mcp_session_test;
