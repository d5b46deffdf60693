//! Fast, transient backend over concurrent hash maps.
//!
//! Per-session logs live in their own map shards, so appends to distinct
//! sessions never contend. Within one session the shard lock makes the
//! duplicate check and the append a single atomic step. All data is lost
//! when the process terminates.

use dashmap::DashMap;
use std::collections::HashSet;
use vigor_core::{
    Interaction, InteractionId, MemoryBackend, MemoryError, SessionId, UserId, UserProfile,
};

#[derive(Debug, Default)]
struct SessionLog {
    entries: Vec<Interaction>,
    seen: HashSet<InteractionId>,
}

/// In-process [`MemoryBackend`] with no persistence.
#[derive(Default)]
pub struct InMemoryBackend {
    sessions: DashMap<SessionId, SessionLog>,
    profiles: DashMap<UserId, UserProfile>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions currently holding at least one interaction.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

impl MemoryBackend for InMemoryBackend {
    fn append(&self, interaction: Interaction) -> Result<(), MemoryError> {
        let mut log = self.sessions.entry(interaction.session_id.clone()).or_default();
        if !log.seen.insert(interaction.id) {
            return Err(MemoryError::DuplicateInteraction { id: interaction.id });
        }
        log.entries.push(interaction);
        Ok(())
    }

    fn recent(&self, session: &SessionId, limit: usize) -> Result<Vec<Interaction>, MemoryError> {
        Ok(self
            .sessions
            .get(session)
            .map(|log| {
                let start = log.entries.len().saturating_sub(limit);
                log.entries[start..].to_vec()
            })
            .unwrap_or_default())
    }

    fn session_len(&self, session: &SessionId) -> usize {
        self.sessions.get(session).map_or(0, |log| log.entries.len())
    }

    fn profile(&self, user: &UserId) -> Option<UserProfile> {
        self.profiles.get(user).map(|p| p.clone())
    }

    fn update_profile(
        &self,
        user: &UserId,
        apply: &mut dyn FnMut(&mut UserProfile),
    ) -> Result<(), MemoryError> {
        let mut profile = self
            .profiles
            .entry(user.clone())
            .or_insert_with(|| UserProfile::new(user.clone()));
        apply(&mut profile);
        Ok(())
    }

    fn clear_session(&self, session: &SessionId) {
        self.sessions.remove(session);
    }

    fn clear_user(&self, user: &UserId) {
        self.profiles.remove(user);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use std::time::Duration;
    use vigor_core::{AgentName, Verdict};

    fn interaction(session: &str, id: InteractionId) -> Interaction {
        Interaction {
            id,
            session_id: SessionId::parse(session).unwrap(),
            user_id: None,
            agent: AgentName::Pose,
            tools_used: Vec::new(),
            input_digest: "frames".into(),
            output: json!({"rep_count": 5}),
            verdict: Verdict::Allowed,
            timestamp: Utc::now(),
            latency: Duration::from_millis(3),
        }
    }

    #[test]
    fn append_then_recent_reads_back_in_order() {
        let backend = InMemoryBackend::new();
        let first = InteractionId::new();
        let second = InteractionId::new();
        backend.append(interaction("s1", first)).unwrap();
        backend.append(interaction("s1", second)).unwrap();

        let session = SessionId::parse("s1").unwrap();
        let recent = backend.recent(&session, 10).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].id, first);
        assert_eq!(recent[1].id, second);
        assert_eq!(backend.session_len(&session), 2);
    }

    #[test]
    fn recent_returns_newest_window_oldest_first() {
        let backend = InMemoryBackend::new();
        let ids: Vec<_> = (0..5).map(|_| InteractionId::new()).collect();
        for id in &ids {
            backend.append(interaction("s1", *id)).unwrap();
        }
        let recent = backend
            .recent(&SessionId::parse("s1").unwrap(), 2)
            .unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].id, ids[3]);
        assert_eq!(recent[1].id, ids[4]);
    }

    #[test]
    fn duplicate_interaction_id_is_rejected() {
        let backend = InMemoryBackend::new();
        let id = InteractionId::new();
        backend.append(interaction("s1", id)).unwrap();
        let err = backend.append(interaction("s1", id)).unwrap_err();
        assert_eq!(err, MemoryError::DuplicateInteraction { id });
        assert_eq!(backend.session_len(&SessionId::parse("s1").unwrap()), 1);
    }

    #[test]
    fn clear_session_drops_the_log() {
        let backend = InMemoryBackend::new();
        backend.append(interaction("s1", InteractionId::new())).unwrap();
        let session = SessionId::parse("s1").unwrap();
        backend.clear_session(&session);
        assert_eq!(backend.session_len(&session), 0);
        assert!(backend.recent(&session, 10).unwrap().is_empty());
    }

    #[test]
    fn update_profile_creates_on_first_touch() {
        let backend = InMemoryBackend::new();
        let user = UserId::parse("u1").unwrap();
        backend
            .update_profile(&user, &mut |profile| {
                *profile.interactions_per_agent.entry("pose".into()).or_default() += 1;
            })
            .unwrap();
        let profile = backend.profile(&user).unwrap();
        assert_eq!(profile.total_interactions(), 1);

        backend.clear_user(&user);
        assert!(backend.profile(&user).is_none());
    }
}
