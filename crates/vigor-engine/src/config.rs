//! Engine configuration.

use std::time::Duration;
use vigor_guardrails::{OutputPolicy, RateConfig};

/// Tunable knobs for the orchestration engine.
///
/// The defaults are the production settings; tests shrink the windows
/// and timeouts to keep runs fast.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Upper bound on one tool execution.
    pub tool_timeout: Duration,
    /// Recent-interaction window handed to agents as context.
    pub context_window: usize,
    /// Newest form scores feeding the trend moving average.
    pub trend_window: usize,
    /// Total agent hops allowed per originating request.
    pub chain_depth_cap: u32,
    /// Whether `dispatch` against an unknown session id creates one.
    pub auto_create_sessions: bool,
    /// Idle time after which a session is treated as closed.
    pub session_idle_timeout: Duration,
    /// Token bucket applied per session key at the input gate.
    pub rate: RateConfig,
    /// How output-scope blocking rules are treated.
    pub output_policy: OutputPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tool_timeout: Duration::from_secs(5),
            context_window: 20,
            trend_window: 10,
            chain_depth_cap: 3,
            auto_create_sessions: true,
            session_idle_timeout: Duration::from_secs(30 * 60),
            rate: RateConfig::default(),
            output_policy: OutputPolicy::default(),
        }
    }
}
