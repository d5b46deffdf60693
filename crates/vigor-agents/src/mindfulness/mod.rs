//! Mindfulness coaching and grit micro-lessons.

pub mod agent;
pub mod tools;

pub use agent::MindfulnessAgent;
