//! Engine error taxonomy.
//!
//! Nothing here is fatal to the process: every failure is scoped to one
//! dispatch. Partial-failure variants carry the recorded result so
//! callers never lose the work that did complete.

use crate::engine::DispatchResult;
use vigor_core::{AgentName, InteractionId, MemoryError, SessionId};

/// Errors surfaced by engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The requested agent name is not registered.
    #[error("unknown agent '{name}'")]
    UnknownAgent { name: String },

    /// Input validation blocked the request; no agent executed.
    #[error("request blocked by guardrails: {reason}")]
    GuardrailBlocked { reason: String },

    /// Token bucket exhausted for this session. Non-fatal, back off.
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// The agent pipeline aborted partway. The recorded partial result
    /// rides along, valid-but-incomplete.
    #[error("agent '{agent}' failed: {message}")]
    AgentExecution {
        agent: AgentName,
        message: String,
        result: Box<DispatchResult>,
    },

    /// A workflow rule would exceed the hop cap for one originating
    /// request.
    #[error("chain depth cap of {cap} hops exceeded")]
    ChainDepthExceeded { cap: u32 },

    /// Dispatch against a closed (or idle-expired) session.
    #[error("session '{session}' is closed")]
    SessionClosed { session: SessionId },

    /// The session does not exist and auto-creation is disabled.
    #[error("session '{session}' not found")]
    SessionNotFound { session: SessionId },

    /// Re-delivery of an already recorded interaction.
    #[error("interaction '{id}' was already recorded")]
    DuplicateInteraction { id: InteractionId },

    /// The memory backend could not serve the request.
    #[error("memory error: {0}")]
    Memory(MemoryError),
}

impl From<MemoryError> for EngineError {
    fn from(err: MemoryError) -> Self {
        match err {
            MemoryError::DuplicateInteraction { id } => EngineError::DuplicateInteraction { id },
            other => EngineError::Memory(other),
        }
    }
}

impl EngineError {
    /// Whether the caller may retry after backing off.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::RateLimited { .. })
    }
}
