//! # Vigor
//!
//! Vigor is an agent orchestration engine for wellness coaching
//! pipelines. A central [`Engine`] routes typed requests to specialist
//! agents (pose analysis, nutrition estimation, mindfulness coaching),
//! enforces safety guardrails on the way in and out, and maintains
//! short-term session logs plus long-term user pattern aggregates.
//!
//! ## Core Components
//!
//! - **[`Engine`]**: dispatch pipeline, session lifecycle, and workflow
//!   chaining
//! - **[`AgentHandler`]**: trait implemented by each specialist agent
//! - **[`ToolRegistry`]**: owned-tool invocation with timeouts and
//!   execution records
//! - **[`GuardrailValidator`]**: ordered rule evaluation with keyword
//!   scrubbing and rate gating
//! - **[`MemoryManager`]**: session recall windows and user pattern
//!   summaries
//!
//! ## Quick Start
//!
//! ```rust
//! use serde_json::json;
//! use vigor::{EngineConfig, standard_engine};
//!
//! let engine = standard_engine(EngineConfig::default());
//! let session = engine.open_session(None);
//!
//! let rt = tokio::runtime::Builder::new_current_thread()
//!     .enable_time()
//!     .build()
//!     .unwrap();
//! let result = rt.block_on(engine.dispatch(
//!     &session,
//!     "mindfulness",
//!     json!({"mood_hint": "motivated"}),
//!     None,
//! ));
//! assert!(result.is_ok());
//! ```

use std::sync::Arc;

pub use vigor_agents::{standard_agents, standard_registry};
pub use vigor_core::{
    AgentHandler, AgentName, AgentOutput, Interaction, InteractionId, MemoryBackend,
    MemoryContext, MemoryError, ParamKind, ParamSchema, PatternSummary, SessionId, ToolError,
    ToolKind, ToolOutcome, ToolRegistry, ToolRuntime, UserId, Verdict,
};
pub use vigor_engine::{
    ChainRule, ChainedDispatch, DispatchResult, Engine, EngineConfig, EngineError, FollowUp,
    SessionSummary,
};
pub use vigor_guardrails::{
    GuardrailPolicy, GuardrailRule, GuardrailValidator, Matcher, OutputPolicy, RateConfig,
    RuleAction, RuleScope, Stage,
};
pub use vigor_memory::{InMemoryBackend, MemoryManager};

/// Assemble an engine with the standard agents, tools, guardrail
/// policy, and an in-memory backend.
pub fn standard_engine(config: EngineConfig) -> Engine {
    Engine::new(
        standard_agents(),
        standard_registry(),
        GuardrailPolicy::standard(),
        Arc::new(InMemoryBackend::new()),
        config,
    )
}
