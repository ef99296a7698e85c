//! Agent definitions and the validated, registered form

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::agents::error::{AgentError, AgentResult};
use crate::domain::{ParameterDefinition, ParameterMap};

/// Boxed execution closure owned by the agent module
pub type ExecuteFn = Arc<dyn Fn(ParameterMap) -> BoxFuture<'static, AgentResult<Value>> + Send + Sync>;

/// Agent metadata as exposed over HTTP. Never carries the execution closure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParameterDefinition>,
}

/// What a candidate module declares. `id` and `execute` are checked by the registry.
#[derive(Clone, Default)]
pub struct AgentDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParameterDefinition>,
    pub execute: Option<ExecuteFn>,
}

impl AgentDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn parameter(mut self, parameter: ParameterDefinition) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn execute<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(ParameterMap) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AgentResult<Value>> + Send + 'static,
    {
        let execute: ExecuteFn = Arc::new(move |params: ParameterMap| f(params).boxed());
        self.execute = Some(execute);
        self
    }
}

impl std::fmt::Debug for AgentDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentDefinition")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("execute", &self.execute.is_some())
            .finish()
    }
}

/// A registered agent. Immutable once built.
#[derive(Clone)]
pub struct Agent {
    info: AgentInfo,
    execute: ExecuteFn,
}

impl Agent {
    /// Validate a definition's shape. `candidate` names the source for error messages.
    pub fn from_definition(candidate: &str, definition: AgentDefinition) -> AgentResult<Self> {
        if definition.id.trim().is_empty() {
            return Err(AgentError::InvalidDefinition {
                candidate: candidate.to_string(),
                reason: "missing id".to_string(),
            });
        }
        let execute = definition.execute.ok_or_else(|| AgentError::InvalidDefinition {
            candidate: candidate.to_string(),
            reason: "missing execute function".to_string(),
        })?;

        let mut seen = std::collections::HashSet::new();
        for parameter in &definition.parameters {
            if !seen.insert(parameter.name.as_str()) {
                return Err(AgentError::InvalidDefinition {
                    candidate: candidate.to_string(),
                    reason: format!("duplicate parameter '{}'", parameter.name),
                });
            }
        }

        let name = if definition.name.is_empty() {
            definition.id.clone()
        } else {
            definition.name
        };

        Ok(Self {
            info: AgentInfo {
                id: definition.id,
                name,
                description: definition.description,
                parameters: definition.parameters,
            },
            execute,
        })
    }

    pub fn id(&self) -> &str {
        &self.info.id
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn parameters(&self) -> &[ParameterDefinition] {
        &self.info.parameters
    }

    pub fn info(&self) -> &AgentInfo {
        &self.info
    }

    /// Run the agent. A panic inside the closure is reported as an execution error.
    pub async fn execute(&self, params: ParameterMap) -> AgentResult<Value> {
        match AssertUnwindSafe((self.execute)(params)).catch_unwind().await {
            Ok(result) => result,
            Err(_) => Err(AgentError::Execution(format!(
                "agent '{}' panicked during execution",
                self.info.id
            ))),
        }
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent").field("info", &self.info).finish()
    }
}
