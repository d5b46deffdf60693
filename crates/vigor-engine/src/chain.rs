//! Workflow chaining rules.
//!
//! A chain rule inspects a completed dispatch result and may synthesize
//! a follow-up request to another agent. Rules are evaluated in
//! registration order; the first match wins. Chaining is single-hop per
//! evaluation; the engine's hop counter bounds total cascades.

use crate::engine::DispatchResult;
use serde_json::json;
use vigor_core::AgentName;

/// A synthesized follow-up invocation.
#[derive(Debug, Clone)]
pub struct FollowUp {
    pub agent: AgentName,
    pub request: serde_json::Value,
}

type Trigger = Box<dyn Fn(&DispatchResult) -> Option<FollowUp> + Send + Sync>;

/// One workflow rule: a named trigger over completed results.
pub struct ChainRule {
    pub id: String,
    trigger: Trigger,
}

impl ChainRule {
    pub fn new(
        id: impl Into<String>,
        trigger: impl Fn(&DispatchResult) -> Option<FollowUp> + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            trigger: Box::new(trigger),
        }
    }

    pub fn evaluate(&self, result: &DispatchResult) -> Option<FollowUp> {
        (self.trigger)(result)
    }
}

impl std::fmt::Debug for ChainRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainRule").field("id", &self.id).finish()
    }
}

/// The standard workflow rules.
///
/// One rule ships by default: a completed workout triggers post-workout
/// mindfulness coaching, seeded with the workout summary.
pub fn standard_rules() -> Vec<ChainRule> {
    vec![ChainRule::new("post-workout-coaching", |result| {
        if result.agent != AgentName::Pose || !result.success {
            return None;
        }
        if result.payload["workout_complete"] != json!(true) {
            return None;
        }
        Some(FollowUp {
            agent: AgentName::Mindfulness,
            request: json!({
                "context": "post_workout",
                "workout_summary": result.payload["summary"],
            }),
        })
    })]
}
