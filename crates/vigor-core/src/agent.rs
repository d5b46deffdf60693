//! Agent abstraction: the closed agent variant set and the capability
//! contract each variant implements.

use crate::memory::MemoryContext;
use crate::registry::ToolRegistry;
use crate::tool::ToolKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// The closed set of agents known to the engine.
///
/// Adding a new agent means adding one variant plus a registry entry; the
/// engine dispatches via name lookup into a variant table and never grows
/// open-ended subclassing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentName {
    /// Real-time exercise form analysis and correction.
    Pose,
    /// Food classification and nutrition estimation.
    Nutrition,
    /// Mindfulness coaching and grit micro-lessons.
    Mindfulness,
}

impl AgentName {
    /// Get the agent name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            AgentName::Pose => "pose",
            AgentName::Nutrition => "nutrition",
            AgentName::Mindfulness => "mindfulness",
        }
    }

    /// Try to parse an agent name string.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "pose" => Some(AgentName::Pose),
            "nutrition" => Some(AgentName::Nutrition),
            "mindfulness" => Some(AgentName::Mindfulness),
            _ => None,
        }
    }

    /// All agents in the closed set.
    pub fn all() -> &'static [AgentName] {
        &[AgentName::Pose, AgentName::Nutrition, AgentName::Mindfulness]
    }
}

impl std::fmt::Display for AgentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Result of one agent execution.
///
/// A failed pipeline step aborts the remaining steps and yields
/// `success == false` with the last good partial payload attached. Partial
/// results are valid-but-incomplete data, not exceptions to discard.
#[derive(Debug, Clone, Serialize)]
pub struct AgentOutput {
    pub agent: AgentName,
    pub success: bool,
    pub payload: Value,
    pub error: Option<String>,
    pub tools_used: Vec<ToolKind>,
    pub latency: Duration,
}

impl AgentOutput {
    pub fn success(
        agent: AgentName,
        payload: Value,
        tools_used: Vec<ToolKind>,
        latency: Duration,
    ) -> Self {
        Self {
            agent,
            success: true,
            payload,
            error: None,
            tools_used,
            latency,
        }
    }

    /// A failed execution carrying whatever partial payload was assembled
    /// before the failing step.
    pub fn failure(
        agent: AgentName,
        partial: Value,
        error: impl Into<String>,
        tools_used: Vec<ToolKind>,
        latency: Duration,
    ) -> Self {
        Self {
            agent,
            success: false,
            payload: partial,
            error: Some(error.into()),
            tools_used,
            latency,
        }
    }
}

/// The capability contract every agent variant implements.
///
/// One entry point accepts a typed request and returns a typed result by
/// internally sequencing calls into the agent's bound tool subset. Agents
/// never touch guardrails, sessions, or user profiles directly; the engine
/// sequences those around this call.
#[async_trait::async_trait]
pub trait AgentHandler: Send + Sync {
    /// Which variant this handler implements.
    fn name(&self) -> AgentName;

    /// The fixed tool subset this agent is bound to.
    fn tools(&self) -> &'static [ToolKind];

    /// Execute the agent's pipeline against a request payload.
    ///
    /// `context` is the read-only memory projection loaded by the engine;
    /// `registry` enforces capability isolation, parameter validation, and
    /// the per-step timeout.
    async fn execute(
        &self,
        request: &Value,
        context: &MemoryContext,
        registry: &ToolRegistry,
    ) -> AgentOutput;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_names_round_trip() {
        for agent in AgentName::all() {
            assert_eq!(AgentName::from_name(agent.name()), Some(*agent));
        }
        assert_eq!(AgentName::from_name("coordinator"), None);
    }

    #[test]
    fn failure_keeps_partial_payload() {
        let out = AgentOutput::failure(
            AgentName::Nutrition,
            serde_json::json!({"classification": {"top_class": "rice"}}),
            "portion estimation failed",
            vec![ToolKind::ClassifyFood],
            Duration::from_millis(12),
        );
        assert!(!out.success);
        assert_eq!(out.payload["classification"]["top_class"], "rice");
        assert_eq!(out.tools_used, vec![ToolKind::ClassifyFood]);
    }
}
