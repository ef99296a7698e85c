//! Built-in agent catalogue
//!
//! Source names follow the module naming convention and intentionally differ from
//! the declared agent ids; the registry keys by declared id.

use serde_json::{json, Value};

use crate::agents::agent::AgentDefinition;
use crate::agents::error::AgentError;
use crate::agents::registry::AgentCandidate;
use crate::domain::arithmetic::{self, ArithmeticError};
use crate::domain::{ParameterDefinition, ParameterMap, ParameterType};

pub const REVERSE_AGENT_ID: &str = "reverseString";
pub const CALCULATOR_AGENT_ID: &str = "calculator";
pub const WORD_COUNT_AGENT_ID: &str = "wordCount";

/// Every agent shipped with the service
pub fn builtin_candidates() -> Vec<AgentCandidate> {
    vec![
        AgentCandidate::new("reverse_string", || Ok(reverse_string())),
        AgentCandidate::new("calculator", || Ok(calculator())),
        AgentCandidate::new("word_count", || Ok(word_count())),
    ]
}

fn string_param<'a>(params: &'a ParameterMap, name: &str) -> Result<&'a str, AgentError> {
    params
        .get(name)
        .and_then(|v| v.as_str())
        .ok_or_else(|| AgentError::InvalidInput(format!("'{}' must be a string", name)))
}

fn number_param(params: &ParameterMap, name: &str) -> Result<f64, AgentError> {
    params
        .get(name)
        .and_then(|v| v.as_f64())
        .ok_or_else(|| AgentError::InvalidInput(format!("'{}' must be a number", name)))
}

pub fn reverse_string() -> AgentDefinition {
    AgentDefinition::new(REVERSE_AGENT_ID, "Reverse String")
        .description("Reverses the characters of a piece of text")
        .parameter(
            ParameterDefinition::required("text", ParameterType::String)
                .with_description("The text to reverse"),
        )
        .execute(|params: ParameterMap| async move {
            let text = string_param(&params, "text")?;
            if text.is_empty() {
                return Err(AgentError::InvalidInput("'text' must not be empty".to_string()));
            }
            Ok(Value::String(text.chars().rev().collect()))
        })
}

pub fn calculator() -> AgentDefinition {
    AgentDefinition::new(CALCULATOR_AGENT_ID, "Calculator")
        .description("Adds, subtracts, multiplies or divides two numbers")
        .parameter(
            ParameterDefinition::required("operation", ParameterType::String)
                .with_description("One of add, subtract, multiply, divide"),
        )
        .parameter(ParameterDefinition::required("a", ParameterType::Number).with_description("Left operand"))
        .parameter(ParameterDefinition::required("b", ParameterType::Number).with_description("Right operand"))
        .execute(|params: ParameterMap| async move {
            let operation = string_param(&params, "operation")?;
            let a = number_param(&params, "a")?;
            let b = number_param(&params, "b")?;

            arithmetic::calculate(operation, a, b)
                .map(|result| json!(result))
                .map_err(|e: ArithmeticError| AgentError::InvalidInput(e.to_string()))
        })
}

pub fn word_count() -> AgentDefinition {
    AgentDefinition::new(WORD_COUNT_AGENT_ID, "Word Count")
        .description("Counts the words in a piece of text")
        .parameter(
            ParameterDefinition::required("text", ParameterType::String)
                .with_description("The text to count"),
        )
        .parameter(
            ParameterDefinition::optional("unique", ParameterType::Boolean)
                .with_description("Count distinct words only (case-insensitive)")
                .with_default(false),
        )
        .execute(|params: ParameterMap| async move {
            let text = string_param(&params, "text")?;
            let unique = params.get("unique").and_then(|v| v.as_bool()).unwrap_or(false);

            let count = if unique {
                text.split_whitespace()
                    .map(str::to_lowercase)
                    .collect::<std::collections::HashSet<_>>()
                    .len()
            } else {
                text.split_whitespace().count()
            };
            Ok::<_, AgentError>(json!(count))
        })
}
