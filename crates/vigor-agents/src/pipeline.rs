//! Shared pipeline-step plumbing for agent implementations.

use serde_json::Value;
use vigor_core::{AgentName, ToolKind, ToolRegistry};

/// Run one pipeline step through the registry.
///
/// A step that executed but failed (including timeouts) is still
/// recorded in `tools_used`; precondition failures never reached the
/// tool and are not. Either way the error string aborts the pipeline
/// and the caller attaches the partial payload assembled so far.
pub(crate) async fn run_step(
    registry: &ToolRegistry,
    caller: AgentName,
    kind: ToolKind,
    params: Value,
    tools_used: &mut Vec<ToolKind>,
) -> Result<Value, String> {
    match registry.invoke(caller, kind, &params).await {
        Ok(outcome) => {
            tools_used.push(kind);
            if outcome.success {
                Ok(outcome.value)
            } else {
                Err(outcome
                    .error
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| format!("tool '{kind}' failed")))
            }
        }
        Err(err) => Err(err.to_string()),
    }
}
