//! Built-in tool catalogue for the tool bridge
//!
//! Add a tool by adding a task id to `domain::mcp_types`, a catalogue entry
//! and a match arm.

use crate::adapters::metrics_handler::MetricsCollector;
use crate::domain::arithmetic::{self, ArithmeticError};
use crate::domain::mcp_types::{CALCULATOR, GET_FIXED_DATA, REVERSE_TEXT};
use crate::domain::{McpErrorCode, McpResult, McpTask, Tool, ToolPort};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error};

pub struct BuiltinToolHandler {
    metrics: Option<Arc<MetricsCollector>>,
}

impl BuiltinToolHandler {
    pub fn new() -> Self {
        Self { metrics: None }
    }

    pub fn with_metrics(metrics: Arc<MetricsCollector>) -> Self {
        Self {
            metrics: Some(metrics),
        }
    }

    fn dispatch(task: &McpTask) -> McpResult {
        let params = task.params_object();
        match task.task_id.as_str() {
            GET_FIXED_DATA => fixed_data(),
            REVERSE_TEXT => reverse_text(&params),
            CALCULATOR => calculator(&params),
            other => McpResult::error(
                McpErrorCode::TaskNotFound,
                format!("Task '{}' not found", other),
            ),
        }
    }

    fn record(&self, task_id: &str, result: &McpResult) {
        if let Some(metrics) = &self.metrics {
            let status = match result.error_code() {
                None => "success",
                Some(code) => code.as_str(),
            };
            metrics
                .tool_calls_total
                .with_label_values(&[task_id, status])
                .inc();
        }
    }
}

impl Default for BuiltinToolHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn fixed_data() -> McpResult {
    McpResult::success(json!({
        "message": "Fixed data from the tool bridge",
        "items": [
            { "id": 1, "name": "alpha", "value": 10 },
            { "id": 2, "name": "beta", "value": 20 },
            { "id": 3, "name": "gamma", "value": 30 }
        ]
    }))
}

fn reverse_text(params: &Map<String, Value>) -> McpResult {
    match params.get("text").and_then(|v| v.as_str()) {
        Some(text) if !text.is_empty() => {
            let reversed: String = text.chars().rev().collect();
            McpResult::success(json!({ "original": text, "reversed": reversed }))
        }
        _ => McpResult::error(
            McpErrorCode::InvalidParameters,
            "'text' must be a non-empty string",
        ),
    }
}

fn calculator(params: &Map<String, Value>) -> McpResult {
    let operation = params.get("operation").and_then(|v| v.as_str());
    let a = params.get("a").and_then(|v| v.as_f64());
    let b = params.get("b").and_then(|v| v.as_f64());

    let (Some(operation), Some(a), Some(b)) = (operation, a, b) else {
        return McpResult::error(
            McpErrorCode::InvalidParameters,
            "'operation' must be a string and 'a' and 'b' must be numbers",
        );
    };

    match arithmetic::calculate(operation, a, b) {
        Ok(result) => McpResult::success(json!({ "result": result })),
        Err(e @ ArithmeticError::DivisionByZero) => {
            McpResult::error(McpErrorCode::DivisionByZero, e.to_string())
        }
        Err(e @ ArithmeticError::UnknownOperation(_)) => {
            McpResult::error(McpErrorCode::InvalidOperation, e.to_string())
        }
    }
}

#[async_trait]
impl ToolPort for BuiltinToolHandler {
    async fn execute_task(&self, task: McpTask) -> McpResult {
        debug!(task_id = %task.task_id, "Dispatching tool task");

        let result = match std::panic::catch_unwind(AssertUnwindSafe(|| Self::dispatch(&task))) {
            Ok(result) => result,
            Err(_) => {
                error!(task_id = %task.task_id, "Tool handler panicked");
                McpResult::error(
                    McpErrorCode::InternalMcpError,
                    "An internal error occurred while executing the task",
                )
            }
        };

        self.record(&task.task_id, &result);
        result
    }

    async fn list_tools(&self) -> Vec<Tool> {
        vec![
            Tool {
                name: GET_FIXED_DATA.to_string(),
                description: "Returns a constant payload; useful as a liveness probe".to_string(),
                input_schema: json!({ "type": "object", "properties": {} }),
            },
            Tool {
                name: REVERSE_TEXT.to_string(),
                description: "Reverses a non-empty string".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "text": { "type": "string", "description": "Text to reverse" }
                    },
                    "required": ["text"]
                }),
            },
            Tool {
                name: CALCULATOR.to_string(),
                description: "Adds, subtracts, multiplies or divides two numbers".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "operation": {
                            "type": "string",
                            "enum": ["add", "subtract", "multiply", "divide"]
                        },
                        "a": { "type": "number" },
                        "b": { "type": "number" }
                    },
                    "required": ["operation", "a", "b"]
                }),
            },
        ]
    }
}
