//! Orchestration engine for the coaching runtime.
//!
//! The [`Engine`] is the single entry point for request handling: it
//! resolves the session, runs input guardrails, loads memory context,
//! executes the agent, runs output guardrails, records the interaction,
//! and evaluates workflow chaining rules. Requests within one session
//! are serialized; different sessions run concurrently.

pub mod chain;
pub mod config;
pub mod engine;
pub mod error;
pub mod session;

pub use chain::{ChainRule, FollowUp, standard_rules};
pub use config::EngineConfig;
pub use engine::{AgentStatus, ChainedDispatch, DispatchResult, Engine, SessionSummary};
pub use error::EngineError;
pub use session::{Session, SessionHandle, SessionStore};
