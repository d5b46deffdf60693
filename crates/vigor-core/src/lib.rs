//! # Vigor Core
//!
//! Core traits and types for the Vigor orchestration engine.
//! This crate provides the building blocks shared by every other crate in
//! the workspace: validated identifiers, the agent and tool abstractions,
//! the immutable interaction record, and the tool registry.

pub mod agent;
pub mod error;
pub mod identifiers;
pub mod interaction;
pub mod memory;
pub mod registry;
pub mod tool;

pub use agent::{AgentHandler, AgentName, AgentOutput};
pub use error::ToolError;
pub use identifiers::{IdError, InteractionId, SessionId, UserId};
pub use interaction::{Interaction, Verdict};
pub use memory::{MemoryBackend, MemoryContext, MemoryError, PatternSummary, ScorePoint, UserProfile};
pub use registry::{ExecutionRecord, ToolRegistry, ToolStatus};
pub use tool::{ParamKind, ParamSchema, ParamSpec, ToolKind, ToolOutcome, ToolRuntime};
