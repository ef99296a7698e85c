use prometheus::{CounterVec, Encoder, IntGauge, Opts, Registry, TextEncoder};
use std::sync::Arc;

use crate::domain::OrchestrationMetrics;

pub struct MetricsCollector {
    registry: Registry,

    // Orchestrator metrics
    pub orchestrations_total: CounterVec,
    pub agent_executions_total: CounterVec,

    // Tool bridge metrics
    pub tool_calls_total: CounterVec,
    pub mcp_sessions_active: IntGauge,
}

impl MetricsCollector {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let orchestrations_total = CounterVec::new(
            Opts::new("concierge_orchestrations_total", "Total orchestrated turns by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(orchestrations_total.clone()))?;

        let agent_executions_total = CounterVec::new(
            Opts::new("concierge_agent_executions_total", "Total agent executions"),
            &["agent", "status"],
        )?;
        registry.register(Box::new(agent_executions_total.clone()))?;

        let tool_calls_total = CounterVec::new(
            Opts::new("concierge_tool_calls_total", "Total tool bridge task dispatches"),
            &["task", "status"],
        )?;
        registry.register(Box::new(tool_calls_total.clone()))?;

        let mcp_sessions_active = IntGauge::new(
            "concierge_mcp_sessions_active",
            "Number of open tool bridge streaming sessions",
        )?;
        registry.register(Box::new(mcp_sessions_active.clone()))?;

        Ok(Self {
            registry,
            orchestrations_total,
            agent_executions_total,
            tool_calls_total,
            mcp_sessions_active,
        })
    }

    pub fn encode(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

impl OrchestrationMetrics for MetricsCollector {
    fn record_orchestration(&self, outcome: &str) {
        self.orchestrations_total.with_label_values(&[outcome]).inc();
    }

    fn record_agent_execution(&self, agent_id: &str, succeeded: bool) {
        let status = if succeeded { "success" } else { "error" };
        self.agent_executions_total
            .with_label_values(&[agent_id, status])
            .inc();
    }
}

pub struct MetricsHandler {
    collector: Arc<MetricsCollector>,
}

impl MetricsHandler {
    pub fn new(collector: Arc<MetricsCollector>) -> Self {
        Self { collector }
    }

    pub async fn metrics(&self) -> String {
        self.collector.encode().unwrap_or_else(|e| {
            tracing::error!("Failed to encode metrics: {}", e);
            String::from("# Error encoding metrics\n")
        })
    }
}
