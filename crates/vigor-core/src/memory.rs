//! Memory data model and the persistence backend contract.
//!
//! The core defines what memory looks like (the session log contract, the
//! aggregated user profile, and the context projection handed to agents)
//! while the storage engine behind it stays a replaceable collaborator
//! implementing [`MemoryBackend`].

use crate::agent::AgentName;
use crate::identifiers::{InteractionId, SessionId, UserId};
use crate::interaction::Interaction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Errors produced by memory operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MemoryError {
    /// Re-delivery of an already recorded interaction identifier.
    #[error("interaction '{id}' was already recorded")]
    DuplicateInteraction { id: InteractionId },

    /// The backing store could not serve the request.
    #[error("memory backend unavailable: {reason}")]
    Unavailable { reason: String },
}

/// One (timestamp, score) observation in a user's historical trend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScorePoint {
    pub timestamp: DateTime<Utc>,
    pub score: f64,
}

/// Aggregated long-lived profile for one user.
///
/// Mutated only by the memory manager in response to completed
/// interactions; agents never write here. Holds only content that already
/// passed the output guardrail stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: UserId,
    /// Completed interactions per agent name.
    pub interactions_per_agent: BTreeMap<String, u64>,
    /// How often each exercise type was trained.
    pub exercise_frequency: BTreeMap<String, u32>,
    /// Historical form-score observations, oldest first, bounded window.
    pub score_trend: Vec<ScorePoint>,
    /// How often each detected mood label occurred.
    pub mood_counts: BTreeMap<String, u32>,
    pub last_seen: DateTime<Utc>,
}

impl UserProfile {
    /// Bound on the retained score trend.
    pub const SCORE_TREND_CAP: usize = 100;

    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            interactions_per_agent: BTreeMap::new(),
            exercise_frequency: BTreeMap::new(),
            score_trend: Vec::new(),
            mood_counts: BTreeMap::new(),
            last_seen: Utc::now(),
        }
    }

    /// Total completed interactions across all agents.
    pub fn total_interactions(&self) -> u64 {
        self.interactions_per_agent.values().sum()
    }

    /// Record a score observation, evicting the oldest past the cap.
    pub fn push_score(&mut self, point: ScorePoint) {
        self.score_trend.push(point);
        if self.score_trend.len() > Self::SCORE_TREND_CAP {
            let excess = self.score_trend.len() - Self::SCORE_TREND_CAP;
            self.score_trend.drain(..excess);
        }
    }
}

/// On-demand pattern projection over a user profile.
///
/// Recomputed from the aggregate each time it is requested, never stored,
/// so it cannot go stale.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatternSummary {
    pub total_interactions: u64,
    pub exercise_frequency: BTreeMap<String, u32>,
    /// Most frequently trained exercise, if any.
    pub favorite_exercise: Option<String>,
    /// Simple moving average of the most recent form scores.
    pub score_trend: Option<f64>,
    /// Most frequently observed mood label, if any.
    pub common_mood: Option<String>,
}

/// Read-only context projection loaded before each agent execution.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MemoryContext {
    /// Bounded window over the session log, most-recent-last.
    pub recent_interactions: Vec<Interaction>,
    /// Pattern summary for the requesting user, when known.
    pub user_patterns: Option<PatternSummary>,
}

impl MemoryContext {
    /// An empty context for sessions with no history.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Interactions in this session previously handled by `agent`.
    pub fn interactions_by(&self, agent: AgentName) -> impl Iterator<Item = &Interaction> {
        self.recent_interactions
            .iter()
            .filter(move |i| i.agent == agent)
    }
}

/// Append/read contract the memory manager requires from a storage engine.
///
/// Implementations must keep per-session appends atomic and ordered while
/// allowing appends to distinct sessions to proceed concurrently.
pub trait MemoryBackend: Send + Sync {
    /// Append one interaction to its session log.
    ///
    /// Re-delivery of an already seen interaction id must be rejected with
    /// [`MemoryError::DuplicateInteraction`].
    fn append(&self, interaction: Interaction) -> Result<(), MemoryError>;

    /// The most recent `limit` interactions of a session, oldest first.
    fn recent(&self, session: &SessionId, limit: usize) -> Result<Vec<Interaction>, MemoryError>;

    /// Number of interactions recorded for a session.
    fn session_len(&self, session: &SessionId) -> usize;

    /// Load a user profile, if one exists.
    fn profile(&self, user: &UserId) -> Option<UserProfile>;

    /// Atomically update (creating if absent) a user profile.
    fn update_profile(
        &self,
        user: &UserId,
        apply: &mut dyn FnMut(&mut UserProfile),
    ) -> Result<(), MemoryError>;

    /// Drop all memory for a session.
    fn clear_session(&self, session: &SessionId);

    /// Drop a user's aggregated profile.
    fn clear_user(&self, user: &UserId);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_trend_is_bounded() {
        let mut profile = UserProfile::new(UserId::parse("u1").unwrap());
        for i in 0..(UserProfile::SCORE_TREND_CAP + 20) {
            profile.push_score(ScorePoint {
                timestamp: Utc::now(),
                score: i as f64,
            });
        }
        assert_eq!(profile.score_trend.len(), UserProfile::SCORE_TREND_CAP);
        // Oldest observations were evicted, newest kept.
        assert_eq!(
            profile.score_trend.last().map(|p| p.score),
            Some((UserProfile::SCORE_TREND_CAP + 19) as f64)
        );
    }

    #[test]
    fn total_interactions_sums_all_agents() {
        let mut profile = UserProfile::new(UserId::parse("u2").unwrap());
        profile.interactions_per_agent.insert("pose".into(), 3);
        profile.interactions_per_agent.insert("nutrition".into(), 2);
        assert_eq!(profile.total_interactions(), 5);
    }
}
