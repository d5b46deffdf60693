//! Guardrail rule model: scope, action, and payload matching.

use crate::sanitize::payload_text;
use regex::Regex;
use serde_json::Value;
use std::fmt;
use vigor_core::AgentName;

/// Which boundary a payload is being checked at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Input,
    Output,
}

/// Which boundaries a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleScope {
    Input,
    Output,
    Both,
}

impl RuleScope {
    pub fn applies_to(&self, stage: Stage) -> bool {
        matches!(
            (self, stage),
            (RuleScope::Input, Stage::Input)
                | (RuleScope::Output, Stage::Output)
                | (RuleScope::Both, _)
        )
    }
}

/// What happens when a rule matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleAction {
    /// Reject the payload. First blocking match short-circuits evaluation.
    Block,
    /// Rewrite the flagged spans and continue, appending a disclaimer.
    Sanitize,
    /// Leave the payload intact but attach a disclaimer.
    Annotate,
}

/// A rule predicate failed to evaluate.
///
/// Treated as a blocking match by the validator, failing closed rather than
/// silently ignored.
#[derive(Debug, Clone, thiserror::Error)]
#[error("rule predicate failed: {message}")]
pub struct MatchError {
    pub message: String,
}

type Predicate = dyn Fn(&Value) -> Result<bool, MatchError> + Send + Sync;

/// How a rule decides whether a payload is in scope.
pub enum Matcher {
    /// Case-insensitive substring match over the flattened payload text.
    Keywords(Vec<String>),
    /// Regex match over the flattened payload text.
    Pattern(Regex),
    /// Arbitrary predicate over the structured payload.
    Custom(Box<Predicate>),
}

impl Matcher {
    /// Build a keyword matcher, normalizing to lowercase.
    pub fn keywords<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Matcher::Keywords(words.into_iter().map(|w| w.into().to_lowercase()).collect())
    }

    /// Evaluate the matcher against a payload.
    pub fn matches(&self, payload: &Value) -> Result<bool, MatchError> {
        match self {
            Matcher::Keywords(words) => {
                let text = payload_text(payload);
                Ok(words.iter().any(|w| text.contains(w.as_str())))
            }
            Matcher::Pattern(regex) => Ok(regex.is_match(&payload_text(payload))),
            Matcher::Custom(predicate) => predicate(payload),
        }
    }

    /// The keyword list, when this is a keyword matcher.
    ///
    /// Sanitize-action rules use this to locate the spans to rewrite.
    pub fn keyword_list(&self) -> Option<&[String]> {
        match self {
            Matcher::Keywords(words) => Some(words),
            _ => None,
        }
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Keywords(words) => f.debug_tuple("Keywords").field(words).finish(),
            Matcher::Pattern(regex) => f.debug_tuple("Pattern").field(&regex.as_str()).finish(),
            Matcher::Custom(_) => f.debug_tuple("Custom").field(&"<predicate>").finish(),
        }
    }
}

/// One ordered guardrail rule.
///
/// Rules are evaluated in registration order; the first blocking match
/// stops evaluation.
#[derive(Debug)]
pub struct GuardrailRule {
    pub id: String,
    pub scope: RuleScope,
    pub action: RuleAction,
    /// Reason surfaced when this rule blocks or rewrites.
    pub reason: String,
    /// Disclaimer appended when this rule sanitizes or annotates.
    pub disclaimer: Option<String>,
    /// Agents this rule applies to; empty means all agents.
    pub agents: Vec<AgentName>,
    matcher: Matcher,
}

impl GuardrailRule {
    pub fn new(
        id: impl Into<String>,
        scope: RuleScope,
        action: RuleAction,
        matcher: Matcher,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            scope,
            action,
            reason: reason.into(),
            disclaimer: None,
            agents: Vec::new(),
            matcher,
        }
    }

    /// Attach the disclaimer appended on sanitize/annotate.
    pub fn with_disclaimer(mut self, disclaimer: impl Into<String>) -> Self {
        self.disclaimer = Some(disclaimer.into());
        self
    }

    /// Restrict the rule to specific agents.
    pub fn for_agents(mut self, agents: impl IntoIterator<Item = AgentName>) -> Self {
        self.agents = agents.into_iter().collect();
        self
    }

    /// Whether this rule participates in a check at `stage` for `agent`.
    pub fn applies(&self, stage: Stage, agent: AgentName) -> bool {
        self.scope.applies_to(stage) && (self.agents.is_empty() || self.agents.contains(&agent))
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keyword_matcher_is_case_insensitive() {
        let matcher = Matcher::keywords(["Push Through Injury"]);
        let payload = json!({"note": "just PUSH THROUGH INJURY and keep going"});
        assert!(matcher.matches(&payload).unwrap());
        assert!(!matcher.matches(&json!({"note": "rest today"})).unwrap());
    }

    #[test]
    fn keyword_matcher_sees_nested_values() {
        let matcher = Matcher::keywords(["diagnose"]);
        let payload = json!({"result": {"advice": ["we can Diagnose this"]}});
        assert!(matcher.matches(&payload).unwrap());
    }

    #[test]
    fn custom_predicate_errors_propagate() {
        let matcher = Matcher::Custom(Box::new(|_| {
            Err(MatchError {
                message: "backing service down".into(),
            })
        }));
        assert!(matcher.matches(&json!({})).is_err());
    }

    #[test]
    fn scope_and_agent_filtering() {
        let rule = GuardrailRule::new(
            "output-only",
            RuleScope::Output,
            RuleAction::Annotate,
            Matcher::keywords(["lesson"]),
            "adds disclaimer",
        )
        .for_agents([AgentName::Mindfulness]);

        assert!(rule.applies(Stage::Output, AgentName::Mindfulness));
        assert!(!rule.applies(Stage::Input, AgentName::Mindfulness));
        assert!(!rule.applies(Stage::Output, AgentName::Pose));

        let both = GuardrailRule::new(
            "everywhere",
            RuleScope::Both,
            RuleAction::Block,
            Matcher::keywords(["x"]),
            "blocks",
        );
        assert!(both.applies(Stage::Input, AgentName::Pose));
        assert!(both.applies(Stage::Output, AgentName::Nutrition));
    }
}
