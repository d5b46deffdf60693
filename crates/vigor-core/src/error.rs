//! Tool-level error types.
//!
//! Errors are split by phase: precondition failures (unknown tool,
//! capability violation, invalid parameters) fail fast before any execution,
//! while execution failures and timeouts are carried inside
//! [`crate::tool::ToolOutcome`] so the owning agent can decide pipeline
//! continuation.

use crate::agent::AgentName;
use crate::tool::ToolKind;
use serde::Serialize;

/// Errors that can occur during tool dispatch and execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolError {
    /// Tool was not found in the registry.
    #[error("tool '{tool}' is not registered")]
    NotFound { tool: ToolKind },

    /// An agent attempted to invoke a tool it does not own.
    #[error("tool '{tool}' belongs to agent '{owner}', not '{caller}'")]
    ForeignTool {
        tool: ToolKind,
        owner: AgentName,
        caller: AgentName,
    },

    /// The parameter payload did not satisfy the tool's schema.
    #[error("tool '{tool}' received invalid parameters: {reason}")]
    InvalidParameters { tool: ToolKind, reason: String },

    /// Execution exceeded the configured bound.
    #[error("tool '{tool}' timed out after {timeout_ms}ms")]
    Timeout { tool: ToolKind, timeout_ms: u64 },

    /// The tool itself reported a failure.
    #[error("tool '{tool}' execution failed: {message}")]
    ExecutionFailed { tool: ToolKind, message: String },
}

impl ToolError {
    /// The tool this error relates to.
    pub fn tool(&self) -> ToolKind {
        match self {
            ToolError::NotFound { tool }
            | ToolError::ForeignTool { tool, .. }
            | ToolError::InvalidParameters { tool, .. }
            | ToolError::Timeout { tool, .. }
            | ToolError::ExecutionFailed { tool, .. } => *tool,
        }
    }

    /// Whether this error occurred before any execution started.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            ToolError::NotFound { .. }
                | ToolError::ForeignTool { .. }
                | ToolError::InvalidParameters { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_name_the_tool() {
        let err = ToolError::Timeout {
            tool: ToolKind::ClassifyFood,
            timeout_ms: 5000,
        };
        assert!(err.to_string().contains("classify_food"));
        assert!(err.to_string().contains("5000ms"));
        assert!(!err.is_precondition());

        let err = ToolError::ForeignTool {
            tool: ToolKind::AnalyzeMood,
            owner: AgentName::Mindfulness,
            caller: AgentName::Pose,
        };
        assert!(err.to_string().contains("mindfulness"));
        assert!(err.is_precondition());
    }
}
