//! Agent registry
//!
//! Agents are discovered from a static table of [`AgentCandidate`]s at startup.
//! Each candidate is loaded and validated independently: a candidate that fails
//! to load or lacks an `id`/`execute` is logged and skipped, never fatal.
//! Entries are keyed by the agent's declared id, not by the candidate's source name.

use std::collections::{HashMap, HashSet};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::agents::agent::{Agent, AgentDefinition, AgentInfo};
use crate::agents::error::AgentResult;

type Loader = Box<dyn Fn() -> anyhow::Result<AgentDefinition> + Send + Sync>;

/// One discoverable agent module
pub struct AgentCandidate {
    source: String,
    loader: Loader,
}

impl AgentCandidate {
    pub fn new<F>(source: impl Into<String>, loader: F) -> Self
    where
        F: Fn() -> anyhow::Result<AgentDefinition> + Send + Sync + 'static,
    {
        Self {
            source: source.into(),
            loader: Box::new(loader),
        }
    }

    /// Candidate that always yields the given definition
    pub fn from_definition(source: impl Into<String>, definition: AgentDefinition) -> Self {
        Self::new(source, move || Ok(definition.clone()))
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    fn load(&self) -> anyhow::Result<AgentDefinition> {
        match std::panic::catch_unwind(AssertUnwindSafe(|| (self.loader)())) {
            Ok(result) => result,
            Err(_) => Err(anyhow::anyhow!("loader panicked")),
        }
    }
}

/// Outcome of one discovery pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InitializationReport {
    /// Agents inserted into the registry
    pub loaded: usize,
    /// Candidates rejected for structural reasons (missing id/execute, duplicate id)
    pub skipped: usize,
    /// Candidates whose loader returned an error
    pub failed: usize,
    /// Candidates excluded by configuration
    pub disabled: usize,
}

#[derive(Default)]
struct RegistryState {
    agents: HashMap<String, Arc<Agent>>,
    report: Option<InitializationReport>,
}

/// Registry of agents keyed by id
///
/// Discovery builds a fresh map off to the side and swaps it in when done, so
/// lookups during a pass see the previous contents (empty before the first pass)
/// and never wait on candidate loaders.
pub struct AgentRegistry {
    candidates: Arc<Vec<AgentCandidate>>,
    disabled: Arc<HashSet<String>>,
    state: RwLock<RegistryState>,
    init_gate: Mutex<()>,
}

impl AgentRegistry {
    pub fn new(candidates: Vec<AgentCandidate>) -> Self {
        Self {
            candidates: Arc::new(candidates),
            disabled: Arc::new(HashSet::new()),
            state: RwLock::new(RegistryState::default()),
            init_gate: Mutex::new(()),
        }
    }

    /// Agent ids that discovery must skip
    pub fn with_disabled<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.disabled = Arc::new(ids.into_iter().map(Into::into).collect());
        self
    }

    /// Populate the registry from the candidate table.
    ///
    /// Idempotent: after the first pass, later calls return the first report
    /// without touching the registry. Use [`AgentRegistry::reinitialize`] to rebuild.
    pub async fn initialize(&self) -> InitializationReport {
        let _gate = self.init_gate.lock().await;
        if let Some(report) = &self.state.read().await.report {
            debug!("Agent registry already initialized");
            return report.clone();
        }
        self.rebuild().await
    }

    /// Run discovery again and replace the registry contents in one step
    pub async fn reinitialize(&self) -> InitializationReport {
        let _gate = self.init_gate.lock().await;
        self.rebuild().await
    }

    async fn rebuild(&self) -> InitializationReport {
        let candidates = self.candidates.clone();
        let disabled = self.disabled.clone();

        // Loaders are arbitrary synchronous code
        let (agents, report) =
            match tokio::task::spawn_blocking(move || discover(&candidates, &disabled)).await {
                Ok(discovered) => discovered,
                Err(e) => {
                    error!("Agent discovery task failed: {}", e);
                    let report = InitializationReport {
                        failed: self.candidates.len(),
                        ..Default::default()
                    };
                    (HashMap::new(), report)
                }
            };

        let mut state = self.state.write().await;
        state.agents = agents;
        state.report = Some(report.clone());
        report
    }

    /// Register an agent explicitly. Replaces any agent with the same id.
    pub async fn register(&self, definition: AgentDefinition) -> AgentResult<()> {
        let source = definition.id.clone();
        let agent = Agent::from_definition(&source, definition)?;
        let mut state = self.state.write().await;
        if state
            .agents
            .insert(agent.id().to_string(), Arc::new(agent))
            .is_some()
        {
            warn!(agent_id = %source, "Replaced existing agent registration");
        } else {
            info!(agent_id = %source, "Registered agent");
        }
        Ok(())
    }

    /// Remove an agent. Returns whether it was registered.
    pub async fn unregister(&self, id: &str) -> bool {
        let removed = self.state.write().await.agents.remove(id).is_some();
        if removed {
            info!(agent_id = %id, "Unregistered agent");
        }
        removed
    }

    /// Full agent, including its execution closure. Internal callers only.
    pub async fn get_agent(&self, id: &str) -> Option<Arc<Agent>> {
        self.state.read().await.agents.get(id).cloned()
    }

    /// All registered agents, ordered by id
    pub async fn list_agents(&self) -> Vec<Arc<Agent>> {
        let state = self.state.read().await;
        let mut agents: Vec<Arc<Agent>> = state.agents.values().cloned().collect();
        agents.sort_by(|a, b| a.id().cmp(b.id()));
        agents
    }

    /// Metadata for one agent, safe to serialize
    pub async fn agent_info(&self, id: &str) -> Option<AgentInfo> {
        self.get_agent(id).await.map(|a| a.info().clone())
    }

    /// Metadata for every agent, safe to serialize
    pub async fn list_agent_info(&self) -> Vec<AgentInfo> {
        self.list_agents()
            .await
            .iter()
            .map(|a| a.info().clone())
            .collect()
    }

    pub async fn is_initialized(&self) -> bool {
        self.state.read().await.report.is_some()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.agents.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn discover(
    candidates: &[AgentCandidate],
    disabled: &HashSet<String>,
) -> (HashMap<String, Arc<Agent>>, InitializationReport) {
    let mut agents: HashMap<String, Arc<Agent>> = HashMap::new();
    let mut report = InitializationReport::default();

    if candidates.is_empty() {
        warn!("No agent candidates found; registry is empty");
    }

    for candidate in candidates {
        let definition = match candidate.load() {
            Ok(definition) => definition,
            Err(e) => {
                warn!(source = %candidate.source, "Failed to load agent candidate: {}", e);
                report.failed += 1;
                continue;
            }
        };

        if disabled.contains(&definition.id) {
            info!(agent_id = %definition.id, "Agent disabled by configuration");
            report.disabled += 1;
            continue;
        }

        let agent = match Agent::from_definition(&candidate.source, definition) {
            Ok(agent) => agent,
            Err(e) => {
                warn!(source = %candidate.source, "Skipping agent candidate: {}", e);
                report.skipped += 1;
                continue;
            }
        };

        if agents.contains_key(agent.id()) {
            warn!(
                source = %candidate.source,
                agent_id = %agent.id(),
                "Skipping agent candidate: id already registered"
            );
            report.skipped += 1;
            continue;
        }

        if agent.id() != candidate.source {
            debug!(
                source = %candidate.source,
                agent_id = %agent.id(),
                "Registering agent under its declared id"
            );
        }

        agents.insert(agent.id().to_string(), Arc::new(agent));
        report.loaded += 1;
    }

    info!(
        loaded = report.loaded,
        skipped = report.skipped,
        failed = report.failed,
        disabled = report.disabled,
        "Agent registry initialized"
    );

    (agents, report)
}
