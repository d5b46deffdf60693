//! Session lifecycle state.
//!
//! The engine owns sessions exclusively. Each live session carries two
//! locks: an async gate that serializes dispatches within the session
//! (giving the interaction log a single total order) and a small sync
//! mutex over the bookkeeping metadata. Sessions for distinct ids never
//! share either lock, so cross-session dispatches run fully in parallel.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use vigor_core::{AgentName, SessionId, UserId};

/// Bookkeeping for one session.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub user_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    /// Completed agent executions per agent name.
    pub executions_per_agent: BTreeMap<String, u64>,
    /// Cumulative latency of completed executions.
    pub total_latency: std::time::Duration,
    pub closed: bool,
}

impl Session {
    fn new(id: SessionId, user_id: Option<UserId>) -> Self {
        let now = Utc::now();
        Self {
            id,
            user_id,
            created_at: now,
            last_activity: now,
            executions_per_agent: BTreeMap::new(),
            total_latency: std::time::Duration::ZERO,
            closed: false,
        }
    }

    pub fn record_execution(&mut self, agent: AgentName, latency: std::time::Duration) {
        *self
            .executions_per_agent
            .entry(agent.name().to_string())
            .or_default() += 1;
        self.total_latency += latency;
        self.last_activity = Utc::now();
    }

    pub fn total_executions(&self) -> u64 {
        self.executions_per_agent.values().sum()
    }
}

/// One live session: the dispatch gate plus guarded metadata.
pub struct SessionHandle {
    gate: tokio::sync::Mutex<()>,
    meta: std::sync::Mutex<Session>,
}

impl SessionHandle {
    fn new(session: Session) -> Self {
        Self {
            gate: tokio::sync::Mutex::new(()),
            meta: std::sync::Mutex::new(session),
        }
    }

    /// Acquire the dispatch gate, serializing with other dispatches on
    /// this session.
    pub async fn acquire(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.gate.lock().await
    }

    /// Run a closure over the metadata under the sync lock.
    pub fn with_meta<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut meta = self.meta.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut meta)
    }

    pub fn snapshot(&self) -> Session {
        self.with_meta(|meta| meta.clone())
    }
}

/// Concurrent map of live sessions.
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<SessionId, Arc<SessionHandle>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session under a fresh generated id.
    pub fn create(&self, user_id: Option<UserId>) -> SessionId {
        let id = SessionId::generate();
        self.sessions.insert(
            id.clone(),
            Arc::new(SessionHandle::new(Session::new(id.clone(), user_id))),
        );
        id
    }

    /// Create a session under a caller-provided id, returning the
    /// existing handle if one is already live.
    pub fn create_with_id(
        &self,
        id: &SessionId,
        user_id: Option<UserId>,
    ) -> Arc<SessionHandle> {
        self.sessions
            .entry(id.clone())
            .or_insert_with(|| Arc::new(SessionHandle::new(Session::new(id.clone(), user_id))))
            .clone()
    }

    pub fn get(&self, id: &SessionId) -> Option<Arc<SessionHandle>> {
        self.sessions.get(id).map(|h| h.clone())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
