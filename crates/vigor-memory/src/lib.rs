//! # Vigor Memory
//!
//! Storage and aggregation behind the orchestration engine: per-session
//! interaction logs (short-term), per-user aggregated profiles
//! (long-term), and the on-demand pattern projection agents receive as
//! context.
//!
//! The [`MemoryManager`] is the only writer of profile aggregates; the
//! storage engine behind it is any [`vigor_core::MemoryBackend`].
//! [`InMemoryBackend`] is the transient default, suitable for development
//! and testing where persistence across restarts is not required.

pub mod in_memory;
pub mod manager;
pub mod patterns;

pub use in_memory::InMemoryBackend;
pub use manager::MemoryManager;
pub use patterns::compute_patterns;
