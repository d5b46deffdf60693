//! Tool registry: immutable-after-init tool table with per-tool execution
//! accounting, capability enforcement, and a bounded-duration guarantee
//! around every invocation.

use crate::agent::AgentName;
use crate::error::ToolError;
use crate::tool::{ToolKind, ToolOutcome, ToolRuntime};
use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default bound on a single tool execution.
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(5);

/// Per-tool execution accounting.
///
/// Mutated only during that tool's own invocation; read for status
/// reporting.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecutionRecord {
    /// Monotonically increasing count of execution attempts.
    pub invocations: u64,
    /// Total wall time spent inside this tool.
    pub cumulative_latency: Duration,
    /// Message of the most recent failure, cleared by the next success.
    pub last_error: Option<String>,
}

/// Introspection entry for one registered tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolStatus {
    pub name: &'static str,
    pub owning_agent: AgentName,
    pub execution_count: u64,
}

/// Registry of executable tools grouped by owning agent.
///
/// Built once at process start with the [`ToolRegistry::with_tool`] builder
/// and immutable afterward, with no dynamic hot-swap. Passed by reference into
/// the engine's constructor rather than living as ambient global state.
pub struct ToolRegistry {
    tools: HashMap<ToolKind, Arc<dyn ToolRuntime>>,
    records: DashMap<ToolKind, ExecutionRecord>,
    timeout: Duration,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    /// Create a new empty registry with the default execution timeout.
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            records: DashMap::new(),
            timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }

    /// Add a tool using the builder pattern.
    pub fn with_tool(mut self, tool: Arc<dyn ToolRuntime>) -> Self {
        self.tools.insert(tool.kind(), tool);
        self
    }

    /// Set the per-invocation execution timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether a tool is registered.
    pub fn contains(&self, kind: ToolKind) -> bool {
        self.tools.contains_key(&kind)
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Snapshot of one tool's execution record, if it has ever run.
    pub fn record(&self, kind: ToolKind) -> Option<ExecutionRecord> {
        self.records.get(&kind).map(|r| r.clone())
    }

    /// Introspection listing of every registered tool.
    pub fn status(&self) -> Vec<ToolStatus> {
        ToolKind::all()
            .iter()
            .filter(|kind| self.tools.contains_key(kind))
            .map(|kind| ToolStatus {
                name: kind.name(),
                owning_agent: kind.owner(),
                execution_count: self
                    .records
                    .get(kind)
                    .map(|r| r.invocations)
                    .unwrap_or(0),
            })
            .collect()
    }

    /// Invoke a tool on behalf of an agent.
    ///
    /// Precondition failures (ownership violation, unknown tool, schema
    /// violation) fail fast with `Err` before any execution and leave the
    /// execution record untouched. Execution failures and timeouts come
    /// back as `Ok` outcomes with `success == false` so the caller can
    /// decide pipeline continuation.
    pub async fn invoke(
        &self,
        caller: AgentName,
        kind: ToolKind,
        params: &Value,
    ) -> Result<ToolOutcome, ToolError> {
        if kind.owner() != caller {
            return Err(ToolError::ForeignTool {
                tool: kind,
                owner: kind.owner(),
                caller,
            });
        }
        let tool = self
            .tools
            .get(&kind)
            .ok_or(ToolError::NotFound { tool: kind })?;
        tool.schema()
            .validate(params)
            .map_err(|reason| ToolError::InvalidParameters { tool: kind, reason })?;

        let started = Instant::now();
        let outcome = match tokio::time::timeout(self.timeout, tool.run(params)).await {
            Ok(Ok(value)) => ToolOutcome::success(kind, value, started.elapsed()),
            Ok(Err(err)) => {
                tracing::warn!(tool = %kind, error = %err, "tool execution failed");
                ToolOutcome::failure(kind, err, started.elapsed())
            }
            Err(_) => {
                tracing::warn!(tool = %kind, timeout_ms = self.timeout.as_millis() as u64,
                    "tool execution timed out");
                ToolOutcome::failure(
                    kind,
                    ToolError::Timeout {
                        tool: kind,
                        timeout_ms: self.timeout.as_millis() as u64,
                    },
                    started.elapsed(),
                )
            }
        };

        let mut record = self.records.entry(kind).or_default();
        record.invocations += 1;
        record.cumulative_latency += outcome.latency;
        record.last_error = outcome.error.as_ref().map(|e| e.to_string());
        drop(record);

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::{ParamKind, ParamSchema};
    use serde_json::json;

    struct EchoMood;

    #[async_trait::async_trait]
    impl ToolRuntime for EchoMood {
        fn kind(&self) -> ToolKind {
            ToolKind::AnalyzeMood
        }

        fn schema(&self) -> ParamSchema {
            ParamSchema::new().required("mood_hint", ParamKind::String)
        }

        async fn run(&self, params: &Value) -> Result<Value, ToolError> {
            Ok(json!({"mood": params["mood_hint"]}))
        }
    }

    struct SlowTool;

    #[async_trait::async_trait]
    impl ToolRuntime for SlowTool {
        fn kind(&self) -> ToolKind {
            ToolKind::GenerateLesson
        }

        fn schema(&self) -> ParamSchema {
            ParamSchema::new()
        }

        async fn run(&self, _params: &Value) -> Result<Value, ToolError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Value::Null)
        }
    }

    fn registry() -> ToolRegistry {
        ToolRegistry::new()
            .with_tool(Arc::new(EchoMood))
            .with_tool(Arc::new(SlowTool))
            .with_timeout(Duration::from_millis(50))
    }

    #[tokio::test]
    async fn invoke_validates_then_executes() {
        let registry = registry();
        let outcome = registry
            .invoke(
                AgentName::Mindfulness,
                ToolKind::AnalyzeMood,
                &json!({"mood_hint": "tired"}),
            )
            .await
            .unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.value["mood"], "tired");

        let record = registry.record(ToolKind::AnalyzeMood).unwrap();
        assert_eq!(record.invocations, 1);
        assert!(record.last_error.is_none());
    }

    #[tokio::test]
    async fn foreign_tool_is_rejected_without_execution() {
        let registry = registry();
        let err = registry
            .invoke(
                AgentName::Pose,
                ToolKind::AnalyzeMood,
                &json!({"mood_hint": "tired"}),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::ForeignTool { .. }));
        assert!(registry.record(ToolKind::AnalyzeMood).is_none());
    }

    #[tokio::test]
    async fn invalid_parameters_fail_fast() {
        let registry = registry();
        let err = registry
            .invoke(AgentName::Mindfulness, ToolKind::AnalyzeMood, &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidParameters { .. }));
        assert!(registry.record(ToolKind::AnalyzeMood).is_none());
    }

    #[tokio::test]
    async fn slow_tools_time_out_in_band() {
        let registry = registry();
        let outcome = registry
            .invoke(AgentName::Mindfulness, ToolKind::GenerateLesson, &json!({}))
            .await
            .unwrap();
        assert!(!outcome.success);
        assert!(outcome.is_timeout());

        let record = registry.record(ToolKind::GenerateLesson).unwrap();
        assert_eq!(record.invocations, 1);
        assert!(record.last_error.is_some());
    }

    #[tokio::test]
    async fn unknown_tool_reports_not_found() {
        let registry = ToolRegistry::new();
        let err = registry
            .invoke(AgentName::Pose, ToolKind::CountReps, &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NotFound { .. }));
    }
}
