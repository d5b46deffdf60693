//! The orchestration engine: the only component that sequences
//! guardrails, memory, and agent execution.
//!
//! Every dispatch runs the same pipeline regardless of agent: resolve
//! session, input gate, load context, execute, output gate, record.
//! The input gate runs before any tool can execute and the output gate
//! before anything is persisted, so the safety invariant is centralized
//! here instead of duplicated per agent.

use crate::chain::{ChainRule, FollowUp, standard_rules};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::session::{SessionHandle, SessionStore};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};
use vigor_core::{
    AgentHandler, AgentName, Interaction, InteractionId, MemoryBackend, SessionId, ToolKind,
    ToolRegistry, ToolStatus, UserId, Verdict,
};
use vigor_guardrails::{
    BlockReason, GuardrailRule, GuardrailValidator, InputDecision, OutputDecision, RateGate,
};
use vigor_memory::MemoryManager;

/// Result of one dispatched agent invocation.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchResult {
    pub session_id: SessionId,
    pub agent: AgentName,
    pub interaction_id: InteractionId,
    pub success: bool,
    /// Sanitized output payload, as recorded.
    pub payload: Value,
    pub verdict: Verdict,
    /// Notes from input sanitization plus output disclaimers, in order.
    pub guardrail_notes: Vec<String>,
    pub tools_used: Vec<ToolKind>,
    pub latency: Duration,
}

/// A dispatch together with any workflow follow-ups it triggered.
#[derive(Debug, Clone)]
pub struct ChainedDispatch {
    pub primary: DispatchResult,
    pub follow_ups: Vec<DispatchResult>,
}

/// Read-only aggregate over one session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub user_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub closed: bool,
    pub interactions: usize,
    pub executions_per_agent: BTreeMap<String, u64>,
    pub total_latency: Duration,
    /// Guardrail decisions of the most recent interactions, oldest
    /// first.
    pub recent_verdicts: Vec<Verdict>,
}

/// Introspection entry for one registered agent.
#[derive(Debug, Clone, Serialize)]
pub struct AgentStatus {
    pub name: AgentName,
    pub initialized: bool,
    pub execution_count: u64,
    pub tool_names: Vec<&'static str>,
}

const RECENT_VERDICTS: usize = 5;

/// Top-level coordinator over agents, guardrails, memory, and sessions.
pub struct Engine {
    agents: HashMap<AgentName, Arc<dyn AgentHandler>>,
    registry: ToolRegistry,
    validator: GuardrailValidator,
    memory: MemoryManager,
    sessions: SessionStore,
    chain_rules: Vec<ChainRule>,
    agent_executions: DashMap<AgentName, u64>,
    config: EngineConfig,
}

impl Engine {
    /// Assemble an engine from its collaborators.
    ///
    /// The registry timeout and memory windows are taken from `config`;
    /// the standard workflow rules are installed (see
    /// [`crate::chain::standard_rules`]).
    ///
    /// # Panics
    ///
    /// Panics if `config.rate` has a zero capacity or refill rate.
    pub fn new(
        agents: Vec<Arc<dyn AgentHandler>>,
        registry: ToolRegistry,
        rules: Vec<GuardrailRule>,
        backend: Arc<dyn MemoryBackend>,
        config: EngineConfig,
    ) -> Self {
        let validator = GuardrailValidator::new(rules, RateGate::new(config.rate.clone()))
            .with_output_policy(config.output_policy);
        let memory = MemoryManager::new(backend)
            .with_context_window(config.context_window)
            .with_trend_window(config.trend_window);
        Self {
            agents: agents.into_iter().map(|a| (a.name(), a)).collect(),
            registry: registry.with_timeout(config.tool_timeout),
            validator,
            memory,
            sessions: SessionStore::new(),
            chain_rules: standard_rules(),
            agent_executions: DashMap::new(),
            config,
        }
    }

    /// Replace the workflow rule set.
    pub fn with_chain_rules(mut self, rules: Vec<ChainRule>) -> Self {
        self.chain_rules = rules;
        self
    }

    /// Create a new session, optionally bound to a user.
    pub fn open_session(&self, user: Option<UserId>) -> SessionId {
        let id = self.sessions.create(user);
        tracing::info!(session = %id, "session opened");
        id
    }

    /// Close a session. An in-flight dispatch completes and records its
    /// interaction; subsequent dispatches fail with `SessionClosed`.
    pub fn close_session(&self, session_id: &SessionId) -> Result<(), EngineError> {
        let handle = self
            .sessions
            .get(session_id)
            .ok_or_else(|| EngineError::SessionNotFound {
                session: session_id.clone(),
            })?;
        handle.with_meta(|meta| meta.closed = true);
        tracing::info!(session = %session_id, "session closed");
        Ok(())
    }

    /// Run the full dispatch pipeline for one request.
    pub async fn dispatch(
        &self,
        session_id: &SessionId,
        agent_name: &str,
        request: Value,
        user: Option<&UserId>,
    ) -> Result<DispatchResult, EngineError> {
        let agent = AgentName::from_name(agent_name).ok_or_else(|| EngineError::UnknownAgent {
            name: agent_name.to_string(),
        })?;
        let handler = self
            .agents
            .get(&agent)
            .ok_or_else(|| EngineError::UnknownAgent {
                name: agent_name.to_string(),
            })?
            .clone();

        let handle = self.resolve(session_id, user)?;
        let _gate = handle.acquire().await;
        // The session may have been closed while we waited on the gate.
        if handle.with_meta(|meta| meta.closed) {
            return Err(EngineError::SessionClosed {
                session: session_id.clone(),
            });
        }
        let user_id = user
            .cloned()
            .or_else(|| handle.with_meta(|meta| meta.user_id.clone()));

        let started = Instant::now();
        let input_digest = Interaction::digest_of(&request);

        // Buckets follow the user across sessions; anonymous traffic is
        // keyed by session instead.
        let rate_key = user_id
            .as_ref()
            .map(UserId::as_str)
            .unwrap_or_else(|| session_id.as_str());

        let (payload, mut notes) =
            match self.validator.validate_input(agent, request, rate_key) {
                InputDecision::Allow { payload, notes } => (payload, notes),
                InputDecision::Block {
                    reason: BlockReason::RateLimited { retry_after_secs },
                } => return Err(EngineError::RateLimited { retry_after_secs }),
                InputDecision::Block { reason } => {
                    return Err(self.record_blocked(
                        &handle,
                        session_id,
                        user_id,
                        agent,
                        Vec::new(),
                        input_digest,
                        reason.to_string(),
                        started.elapsed(),
                    )?);
                }
            };

        let context = self.memory.load_context(session_id, user_id.as_ref())?;
        let output = handler.execute(&payload, &context, &self.registry).await;
        let agent_success = output.success;
        let agent_error = output.error;
        let tools_used = output.tools_used;

        // The output gate runs even for failed pipelines; the partial
        // payload is wrapped in a standardized error envelope first.
        let outward = if agent_success {
            output.payload
        } else {
            json!({"error": agent_error.clone(), "partial": output.payload})
        };

        match self.validator.validate_output(agent, outward) {
            OutputDecision::Pass { payload, verdict } => {
                if let Verdict::Sanitized { disclaimers } = &verdict {
                    notes.extend(disclaimers.iter().cloned());
                }
                let latency = started.elapsed();
                let interaction_id = InteractionId::new();
                self.memory.store_interaction(Interaction {
                    id: interaction_id,
                    session_id: session_id.clone(),
                    user_id,
                    agent,
                    tools_used: tools_used.clone(),
                    input_digest,
                    output: payload.clone(),
                    verdict: verdict.clone(),
                    timestamp: Utc::now(),
                    latency,
                })?;
                handle.with_meta(|meta| meta.record_execution(agent, latency));
                *self.agent_executions.entry(agent).or_default() += 1;
                tracing::info!(
                    session = %session_id,
                    %agent,
                    success = agent_success,
                    latency_ms = latency.as_millis() as u64,
                    "dispatch completed"
                );

                let result = DispatchResult {
                    session_id: session_id.clone(),
                    agent,
                    interaction_id,
                    success: agent_success,
                    payload,
                    verdict,
                    guardrail_notes: notes,
                    tools_used,
                    latency,
                };
                if result.success {
                    Ok(result)
                } else {
                    Err(EngineError::AgentExecution {
                        agent,
                        message: agent_error.unwrap_or_else(|| "agent failed".to_string()),
                        result: Box::new(result),
                    })
                }
            }
            OutputDecision::Block { reason } => Err(self.record_blocked(
                &handle,
                session_id,
                user_id,
                agent,
                tools_used,
                input_digest,
                reason.to_string(),
                started.elapsed(),
            )?),
        }
    }

    /// Dispatch, then follow workflow rules until none match or the hop
    /// cap would be exceeded.
    pub async fn dispatch_with_chain(
        &self,
        session_id: &SessionId,
        agent_name: &str,
        request: Value,
        user: Option<&UserId>,
    ) -> Result<ChainedDispatch, EngineError> {
        let primary = self.dispatch(session_id, agent_name, request, user).await?;
        let mut follow_ups = Vec::new();
        let mut hops = 1u32;
        let mut current = primary.clone();

        while let Some(follow_up) = self.first_follow_up(&current) {
            if hops >= self.config.chain_depth_cap {
                tracing::warn!(
                    session = %session_id,
                    cap = self.config.chain_depth_cap,
                    "chain depth cap reached"
                );
                return Err(EngineError::ChainDepthExceeded {
                    cap: self.config.chain_depth_cap,
                });
            }
            let result = self
                .dispatch(session_id, follow_up.agent.name(), follow_up.request, user)
                .await?;
            hops += 1;
            current = result.clone();
            follow_ups.push(result);
        }
        Ok(ChainedDispatch {
            primary,
            follow_ups,
        })
    }

    /// Evaluate workflow rules against a completed result, dispatching
    /// the first matching follow-up. Single-hop; returns `None` when no
    /// rule matches.
    pub async fn chain(
        &self,
        session_id: &SessionId,
        trigger: &DispatchResult,
        user: Option<&UserId>,
    ) -> Result<Option<DispatchResult>, EngineError> {
        let Some(follow_up) = self.first_follow_up(trigger) else {
            return Ok(None);
        };
        self.dispatch(session_id, follow_up.agent.name(), follow_up.request, user)
            .await
            .map(Some)
    }

    /// Read-only aggregate over one session. No side effects.
    pub fn session_summary(&self, session_id: &SessionId) -> Result<SessionSummary, EngineError> {
        let handle = self
            .sessions
            .get(session_id)
            .ok_or_else(|| EngineError::SessionNotFound {
                session: session_id.clone(),
            })?;
        let meta = handle.snapshot();
        let recent_verdicts = self
            .memory
            .recent(session_id, RECENT_VERDICTS)?
            .into_iter()
            .map(|i| i.verdict)
            .collect();
        Ok(SessionSummary {
            session_id: meta.id,
            user_id: meta.user_id,
            created_at: meta.created_at,
            last_activity: meta.last_activity,
            closed: meta.closed,
            interactions: self.memory.session_len(session_id),
            executions_per_agent: meta.executions_per_agent,
            total_latency: meta.total_latency,
            recent_verdicts,
        })
    }

    /// Status of every registered agent, for introspection endpoints.
    pub fn list_agents(&self) -> Vec<AgentStatus> {
        let mut statuses: Vec<AgentStatus> = self
            .agents
            .values()
            .map(|handler| AgentStatus {
                name: handler.name(),
                initialized: true,
                execution_count: self
                    .agent_executions
                    .get(&handler.name())
                    .map_or(0, |c| *c),
                tool_names: handler.tools().iter().map(|t| t.name()).collect(),
            })
            .collect();
        statuses.sort_by_key(|s| s.name);
        statuses
    }

    /// Status of every registered tool.
    pub fn list_tools(&self) -> Vec<ToolStatus> {
        self.registry.status()
    }

    fn first_follow_up(&self, result: &DispatchResult) -> Option<FollowUp> {
        self.chain_rules
            .iter()
            .find_map(|rule| rule.evaluate(result))
    }

    /// Resolve a session handle, honoring auto-creation, closure, and
    /// lazy idle expiry.
    fn resolve(
        &self,
        session_id: &SessionId,
        user: Option<&UserId>,
    ) -> Result<Arc<SessionHandle>, EngineError> {
        let handle = match self.sessions.get(session_id) {
            Some(handle) => handle,
            None if self.config.auto_create_sessions => {
                tracing::debug!(session = %session_id, "session auto-created");
                self.sessions.create_with_id(session_id, user.cloned())
            }
            None => {
                return Err(EngineError::SessionNotFound {
                    session: session_id.clone(),
                });
            }
        };

        let unavailable = handle.with_meta(|meta| {
            if meta.closed {
                return true;
            }
            let idle = (Utc::now() - meta.last_activity).to_std().unwrap_or_default();
            if idle > self.config.session_idle_timeout {
                meta.closed = true;
                tracing::info!(session = %meta.id, "session expired after idle timeout");
                return true;
            }
            false
        });
        if unavailable {
            return Err(EngineError::SessionClosed {
                session: session_id.clone(),
            });
        }
        Ok(handle)
    }

    #[allow(clippy::too_many_arguments)]
    fn record_blocked(
        &self,
        handle: &SessionHandle,
        session_id: &SessionId,
        user_id: Option<UserId>,
        agent: AgentName,
        tools_used: Vec<ToolKind>,
        input_digest: String,
        reason: String,
        latency: Duration,
    ) -> Result<EngineError, EngineError> {
        self.memory.store_interaction(Interaction {
            id: InteractionId::new(),
            session_id: session_id.clone(),
            user_id,
            agent,
            tools_used,
            input_digest,
            output: json!({}),
            verdict: Verdict::Blocked {
                reason: reason.clone(),
            },
            timestamp: Utc::now(),
            latency,
        })?;
        handle.with_meta(|meta| meta.last_activity = Utc::now());
        tracing::warn!(session = %session_id, %agent, %reason, "dispatch blocked");
        Ok(EngineError::GuardrailBlocked { reason })
    }
}
