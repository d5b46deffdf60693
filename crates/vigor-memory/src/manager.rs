//! The memory manager: the single writer of long-term aggregates.
//!
//! Every completed interaction lands in its session log verbatim,
//! including blocked ones (the log is an audit trail). Profile aggregates
//! only ever absorb interactions that passed the output guardrail stage,
//! so nothing blocked can leak back out through recalled context.

use crate::patterns::compute_patterns;
use serde_json::Value;
use std::sync::Arc;
use vigor_core::{
    AgentName, Interaction, MemoryBackend, MemoryContext, MemoryError, PatternSummary, ScorePoint,
    SessionId, UserId, UserProfile,
};

/// Default bound on the recent-interaction window handed to agents.
pub const DEFAULT_CONTEXT_WINDOW: usize = 20;
/// Default number of newest form scores feeding the trend average.
pub const DEFAULT_TREND_WINDOW: usize = 10;

/// Coordinates short-term session logs and long-term user profiles over a
/// pluggable storage backend.
#[derive(Clone)]
pub struct MemoryManager {
    backend: Arc<dyn MemoryBackend>,
    context_window: usize,
    trend_window: usize,
}

impl MemoryManager {
    pub fn new(backend: Arc<dyn MemoryBackend>) -> Self {
        Self {
            backend,
            context_window: DEFAULT_CONTEXT_WINDOW,
            trend_window: DEFAULT_TREND_WINDOW,
        }
    }

    pub fn with_context_window(mut self, window: usize) -> Self {
        self.context_window = window;
        self
    }

    pub fn with_trend_window(mut self, window: usize) -> Self {
        self.trend_window = window;
        self
    }

    /// Project the context an agent sees before executing: the newest
    /// slice of the session log plus, when the user is known, their
    /// recomputed pattern summary.
    pub fn load_context(
        &self,
        session: &SessionId,
        user: Option<&UserId>,
    ) -> Result<MemoryContext, MemoryError> {
        let recent_interactions = self.backend.recent(session, self.context_window)?;
        let user_patterns = user
            .and_then(|u| self.backend.profile(u))
            .map(|profile| compute_patterns(&profile, self.trend_window));
        Ok(MemoryContext {
            recent_interactions,
            user_patterns,
        })
    }

    /// Record a completed interaction and fold it into the user's
    /// aggregates.
    ///
    /// The append happens first; if the id was already recorded the
    /// aggregates stay untouched, so retries cannot double-count.
    pub fn store_interaction(&self, interaction: Interaction) -> Result<(), MemoryError> {
        let blocked = interaction.verdict.is_blocked();
        let user = interaction.user_id.clone();
        let agent = interaction.agent;
        let output = interaction.output.clone();
        let timestamp = interaction.timestamp;

        self.backend.append(interaction)?;
        tracing::debug!(%agent, blocked, "interaction recorded");

        if blocked {
            return Ok(());
        }
        let Some(user) = user else { return Ok(()) };
        self.backend.update_profile(&user, &mut |profile| {
            fold_into_profile(profile, agent, &output, timestamp);
        })
    }

    /// Recompute the pattern summary for a user, if they have a profile.
    pub fn patterns_for(&self, user: &UserId) -> Option<PatternSummary> {
        self.backend
            .profile(user)
            .map(|profile| compute_patterns(&profile, self.trend_window))
    }

    pub fn session_len(&self, session: &SessionId) -> usize {
        self.backend.session_len(session)
    }

    pub fn recent(
        &self,
        session: &SessionId,
        limit: usize,
    ) -> Result<Vec<Interaction>, MemoryError> {
        self.backend.recent(session, limit)
    }

    pub fn clear_session(&self, session: &SessionId) {
        self.backend.clear_session(session);
    }

    pub fn clear_user(&self, user: &UserId) {
        self.backend.clear_user(user);
    }
}

/// Fold one passed interaction into the long-term aggregate.
fn fold_into_profile(
    profile: &mut UserProfile,
    agent: AgentName,
    output: &Value,
    timestamp: chrono::DateTime<chrono::Utc>,
) {
    *profile
        .interactions_per_agent
        .entry(agent.name().to_string())
        .or_default() += 1;
    profile.last_seen = timestamp;

    if let Some(exercise) = output.get("exercise_type").and_then(Value::as_str) {
        *profile
            .exercise_frequency
            .entry(exercise.to_string())
            .or_default() += 1;
    }
    if let Some(score) = output
        .get("form_score")
        .and_then(|s| s.get("overall_score"))
        .and_then(Value::as_f64)
    {
        profile.push_score(ScorePoint { timestamp, score });
    }
    if let Some(mood) = mood_label(output) {
        *profile.mood_counts.entry(mood.to_string()).or_default() += 1;
    }
}

/// Mood label from either the structured mood object or a bare string.
fn mood_label(output: &Value) -> Option<&str> {
    let mood = output.get("mood")?;
    mood.get("label")
        .and_then(Value::as_str)
        .or_else(|| mood.as_str())
}
