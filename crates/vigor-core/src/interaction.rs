//! The immutable interaction record and the guardrail verdict it carries.

use crate::agent::AgentName;
use crate::identifiers::{InteractionId, SessionId, UserId};
use crate::tool::ToolKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Maximum length of the recorded input digest.
pub const DIGEST_LEN: usize = 120;

/// The guardrail decision attached to every recorded interaction.
///
/// Every interaction carries a verdict; there is no "unchecked" state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    /// Payload passed both gates unchanged.
    Allowed,
    /// Output was rewritten; one disclaimer per rewrite, in rule order.
    Sanitized { disclaimers: Vec<String> },
    /// Input was rejected before any execution.
    Blocked { reason: String },
}

impl Verdict {
    pub fn is_blocked(&self) -> bool {
        matches!(self, Verdict::Blocked { .. })
    }
}

/// One immutable record of a completed dispatch.
///
/// Appended to the session log and folded into the user profile; never
/// mutated after recording. The output payload has already passed the
/// output guardrail stage, so memory never holds unsanitized content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    pub id: InteractionId,
    pub session_id: SessionId,
    pub user_id: Option<UserId>,
    pub agent: AgentName,
    pub tools_used: Vec<ToolKind>,
    pub input_digest: String,
    pub output: Value,
    pub verdict: Verdict,
    pub timestamp: DateTime<Utc>,
    pub latency: Duration,
}

impl Interaction {
    /// Truncated compact-JSON echo of a request payload.
    ///
    /// Recorded for every dispatch, including blocked ones, so the audit
    /// trail keeps a bounded trace of what was asked.
    pub fn digest_of(payload: &Value) -> String {
        let compact = payload.to_string();
        if compact.len() > DIGEST_LEN {
            let mut cut = DIGEST_LEN;
            while !compact.is_char_boundary(cut) {
                cut -= 1;
            }
            format!("{}...", &compact[..cut])
        } else {
            compact
        }
    }
}
