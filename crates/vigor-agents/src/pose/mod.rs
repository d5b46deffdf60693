//! Real-time exercise form analysis.

pub mod agent;
pub mod tools;

pub use agent::PoseAgent;

/// Rep count at which a workout counts as complete.
pub const REP_COMPLETE_THRESHOLD: u64 = 30;
