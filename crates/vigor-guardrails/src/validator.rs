//! The guardrail validator: ordered rule evaluation at the input and
//! output boundaries of every agent invocation.
//!
//! Evaluation is synchronous and side-effect-free apart from the rate
//! gate. Input rules may block; output rules sanitize and annotate but
//! never discard an already-computed result under the default policy;
//! post-hoc blocking throws away paid-for compute, so it is opt-in via
//! [`OutputPolicy::Strict`].

use crate::rate_limit::RateGate;
use crate::rule::{GuardrailRule, RuleAction, Stage};
use crate::sanitize::{scrub_value, DISCLAIMERS_FIELD};
use serde_json::Value;
use std::fmt;
use vigor_core::{AgentName, Verdict};

/// How output-scope `Block` rules are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputPolicy {
    /// Output-side blocking rules degrade to sanitization (default).
    #[default]
    SanitizeOnly,
    /// Output-side blocking rules reject the result outright.
    Strict,
}

/// Why an input payload was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockReason {
    /// Token bucket exhausted; non-fatal, caller should back off.
    RateLimited { retry_after_secs: u64 },
    /// An ordered rule matched with a blocking action.
    Rule { id: String, reason: String },
    /// A rule predicate failed to evaluate; treated as a block.
    PredicateFailure { id: String, message: String },
}

impl BlockReason {
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, BlockReason::RateLimited { .. })
    }
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockReason::RateLimited { retry_after_secs } => {
                write!(f, "rate limit exceeded, retry after {retry_after_secs}s")
            }
            BlockReason::Rule { id, reason } => write!(f, "rule '{id}': {reason}"),
            BlockReason::PredicateFailure { id, message } => {
                write!(f, "rule '{id}' predicate failed: {message}")
            }
        }
    }
}

/// Decision for a payload entering the pipeline.
#[derive(Debug)]
pub enum InputDecision {
    /// Proceed; payload may have been rewritten by input-scope sanitize
    /// rules, with one note per rewrite.
    Allow { payload: Value, notes: Vec<String> },
    /// Reject; the payload never reaches the agent.
    Block { reason: BlockReason },
}

/// Decision for a payload leaving the pipeline.
#[derive(Debug)]
pub enum OutputDecision {
    /// Deliver the (possibly rewritten) payload with its verdict.
    Pass { payload: Value, verdict: Verdict },
    /// Reject the result. Only happens under [`OutputPolicy::Strict`] or on a
    /// failed predicate.
    Block { reason: BlockReason },
}

/// Ordered-rule policy evaluator wrapped around every agent call.
pub struct GuardrailValidator {
    rules: Vec<GuardrailRule>,
    gate: RateGate,
    output_policy: OutputPolicy,
}

impl GuardrailValidator {
    /// Build a validator over rules in registration order.
    pub fn new(rules: Vec<GuardrailRule>, gate: RateGate) -> Self {
        Self {
            rules,
            gate,
            output_policy: OutputPolicy::default(),
        }
    }

    pub fn with_output_policy(mut self, policy: OutputPolicy) -> Self {
        self.output_policy = policy;
        self
    }

    /// Validate a request payload before dispatch.
    ///
    /// The rate gate is checked first; then input-scope rules run in
    /// registration order. The first blocking match short-circuits; an
    /// erroring predicate blocks (fail closed). No match returns the
    /// payload unchanged.
    pub fn validate_input(
        &self,
        agent: AgentName,
        mut payload: Value,
        rate_key: &str,
    ) -> InputDecision {
        if let Err(retry_after_secs) = self.gate.check(rate_key) {
            tracing::warn!(%agent, rate_key, "request rate limited");
            return InputDecision::Block {
                reason: BlockReason::RateLimited { retry_after_secs },
            };
        }

        let mut notes = Vec::new();
        for rule in self.applicable(Stage::Input, agent) {
            let matched = match rule.matcher().matches(&payload) {
                Ok(matched) => matched,
                Err(err) => {
                    tracing::warn!(%agent, rule = %rule.id, error = %err,
                        "input rule predicate failed, blocking");
                    return InputDecision::Block {
                        reason: BlockReason::PredicateFailure {
                            id: rule.id.clone(),
                            message: err.message,
                        },
                    };
                }
            };
            if !matched {
                continue;
            }
            match rule.action {
                RuleAction::Block => {
                    tracing::warn!(%agent, rule = %rule.id, "input blocked by guardrail");
                    return InputDecision::Block {
                        reason: BlockReason::Rule {
                            id: rule.id.clone(),
                            reason: rule.reason.clone(),
                        },
                    };
                }
                RuleAction::Sanitize => {
                    if let Some(keywords) = rule.matcher().keyword_list() {
                        let (scrubbed, changed) = scrub_value(&payload, keywords);
                        if changed {
                            payload = scrubbed;
                            notes.push(rule.note());
                        }
                    }
                }
                RuleAction::Annotate => notes.push(rule.note()),
            }
        }
        InputDecision::Allow { payload, notes }
    }

    /// Validate an agent result before persistence and delivery.
    ///
    /// Sanitize rules rewrite flagged spans and append a disclaimer per
    /// rewrite; content is rewritten, never silently dropped. Annotate
    /// rules attach a disclaimer without touching the payload body.
    pub fn validate_output(&self, agent: AgentName, mut payload: Value) -> OutputDecision {
        let mut disclaimers: Vec<String> = Vec::new();

        for rule in self.applicable(Stage::Output, agent) {
            let matched = match rule.matcher().matches(&payload) {
                Ok(matched) => matched,
                Err(err) => {
                    tracing::warn!(%agent, rule = %rule.id, error = %err,
                        "output rule predicate failed, blocking");
                    return OutputDecision::Block {
                        reason: BlockReason::PredicateFailure {
                            id: rule.id.clone(),
                            message: err.message,
                        },
                    };
                }
            };
            if !matched {
                continue;
            }
            match rule.action {
                RuleAction::Block if self.output_policy == OutputPolicy::Strict => {
                    tracing::warn!(%agent, rule = %rule.id, "output blocked by guardrail (strict)");
                    return OutputDecision::Block {
                        reason: BlockReason::Rule {
                            id: rule.id.clone(),
                            reason: rule.reason.clone(),
                        },
                    };
                }
                // Under the default policy a blocking rule on the output
                // side degrades to sanitization.
                RuleAction::Block | RuleAction::Sanitize => {
                    if let Some(keywords) = rule.matcher().keyword_list() {
                        let (scrubbed, changed) = scrub_value(&payload, keywords);
                        if changed {
                            tracing::debug!(%agent, rule = %rule.id, "output sanitized");
                            payload = scrubbed;
                            disclaimers.push(rule.note());
                        }
                    } else {
                        disclaimers.push(rule.note());
                    }
                }
                RuleAction::Annotate => disclaimers.push(rule.note()),
            }
        }

        let verdict = if disclaimers.is_empty() {
            Verdict::Allowed
        } else {
            attach_disclaimers(&mut payload, &disclaimers);
            Verdict::Sanitized {
                disclaimers: disclaimers.clone(),
            }
        };
        OutputDecision::Pass { payload, verdict }
    }

    fn applicable(
        &self,
        stage: Stage,
        agent: AgentName,
    ) -> impl Iterator<Item = &GuardrailRule> {
        self.rules.iter().filter(move |r| r.applies(stage, agent))
    }
}

impl GuardrailRule {
    /// The note surfaced when this rule rewrites or annotates: the
    /// disclaimer when one is attached, the rule reason otherwise.
    fn note(&self) -> String {
        self.disclaimer.clone().unwrap_or_else(|| self.reason.clone())
    }
}

fn attach_disclaimers(payload: &mut Value, disclaimers: &[String]) {
    if let Value::Object(fields) = payload {
        let list = fields
            .entry(DISCLAIMERS_FIELD)
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(items) = list {
            for disclaimer in disclaimers {
                let entry = Value::String(disclaimer.clone());
                if !items.contains(&entry) {
                    items.push(entry);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_limit::{RateConfig, RateGate};
    use crate::rule::{Matcher, RuleScope};
    use serde_json::json;

    fn validator(rules: Vec<GuardrailRule>) -> GuardrailValidator {
        GuardrailValidator::new(
            rules,
            RateGate::new(RateConfig {
                per_minute: 6000,
                burst: 100,
            }),
        )
    }

    fn block_rule(id: &str, word: &str) -> GuardrailRule {
        GuardrailRule::new(
            id,
            RuleScope::Input,
            RuleAction::Block,
            Matcher::keywords([word]),
            format!("{word} content detected"),
        )
    }

    #[test]
    fn first_blocking_rule_short_circuits() {
        let validator = validator(vec![
            block_rule("first", "push through injury"),
            block_rule("second", "push through"),
        ]);
        let decision = validator.validate_input(
            AgentName::Pose,
            json!({"note": "just push through injury"}),
            "s1",
        );
        match decision {
            InputDecision::Block {
                reason: BlockReason::Rule { id, .. },
            } => assert_eq!(id, "first"),
            other => panic!("expected block, got {other:?}"),
        }
    }

    #[test]
    fn clean_input_passes_unchanged() {
        let validator = validator(vec![block_rule("danger", "ignore pain")]);
        let payload = json!({"exercise_type": "squat", "frames": [{}]});
        match validator.validate_input(AgentName::Pose, payload.clone(), "s1") {
            InputDecision::Allow {
                payload: out,
                notes,
            } => {
                assert_eq!(out, payload);
                assert!(notes.is_empty());
            }
            other => panic!("expected allow, got {other:?}"),
        }
    }

    #[test]
    fn erroring_predicate_blocks_input() {
        let failing = GuardrailRule::new(
            "flaky",
            RuleScope::Input,
            RuleAction::Annotate,
            Matcher::Custom(Box::new(|_| {
                Err(crate::rule::MatchError {
                    message: "boom".into(),
                })
            })),
            "never evaluated",
        );
        let validator = validator(vec![failing]);
        match validator.validate_input(AgentName::Pose, json!({}), "s1") {
            InputDecision::Block {
                reason: BlockReason::PredicateFailure { id, .. },
            } => assert_eq!(id, "flaky"),
            other => panic!("expected predicate block, got {other:?}"),
        }
    }

    #[test]
    fn rate_gate_blocks_before_rules() {
        let validator = GuardrailValidator::new(
            vec![],
            RateGate::new(RateConfig {
                per_minute: 60,
                burst: 1,
            }),
        );
        assert!(matches!(
            validator.validate_input(AgentName::Pose, json!({}), "same-key"),
            InputDecision::Allow { .. }
        ));
        match validator.validate_input(AgentName::Pose, json!({}), "same-key") {
            InputDecision::Block { reason } => assert!(reason.is_rate_limit()),
            other => panic!("expected rate limit, got {other:?}"),
        }
    }

    #[test]
    fn output_sanitize_rewrites_and_discloses() {
        let rule = GuardrailRule::new(
            "medical",
            RuleScope::Output,
            RuleAction::Sanitize,
            Matcher::keywords(["diagnose"]),
            "medical advice detected and removed",
        )
        .with_disclaimer("This is for educational purposes only and not medical advice.");
        let validator = validator(vec![rule]);

        let payload = json!({"text": "Nice work. We can diagnose your pain."});
        match validator.validate_output(AgentName::Nutrition, payload) {
            OutputDecision::Pass { payload, verdict } => {
                assert!(!payload["text"].as_str().unwrap().contains("diagnose"));
                assert_eq!(payload["disclaimers"][0], json!(
                    "This is for educational purposes only and not medical advice."
                ));
                assert!(matches!(verdict, Verdict::Sanitized { .. }));
            }
            other => panic!("expected pass, got {other:?}"),
        }
    }

    #[test]
    fn output_block_degrades_to_sanitize_by_default() {
        let rule = GuardrailRule::new(
            "self-harm",
            RuleScope::Both,
            RuleAction::Block,
            Matcher::keywords(["hurt yourself"]),
            "self-harm content detected",
        );
        let validator = validator(vec![rule]);
        match validator.validate_output(
            AgentName::Mindfulness,
            json!({"text": "Do not hurt yourself. Rest well."}),
        ) {
            OutputDecision::Pass { payload, verdict } => {
                assert!(!payload["text"].as_str().unwrap().contains("hurt yourself"));
                assert!(matches!(verdict, Verdict::Sanitized { .. }));
            }
            other => panic!("expected pass, got {other:?}"),
        }
    }

    #[test]
    fn strict_policy_blocks_output() {
        let rule = GuardrailRule::new(
            "self-harm",
            RuleScope::Both,
            RuleAction::Block,
            Matcher::keywords(["hurt yourself"]),
            "self-harm content detected",
        );
        let validator = validator(vec![rule]).with_output_policy(OutputPolicy::Strict);
        assert!(matches!(
            validator.validate_output(
                AgentName::Mindfulness,
                json!({"text": "hurt yourself"}),
            ),
            OutputDecision::Block { .. }
        ));
    }

    #[test]
    fn clean_output_is_allowed_verbatim() {
        let validator = validator(vec![]);
        let payload = json!({"rep_count": 10});
        match validator.validate_output(AgentName::Pose, payload.clone()) {
            OutputDecision::Pass {
                payload: out,
                verdict,
            } => {
                assert_eq!(out, payload);
                assert_eq!(verdict, Verdict::Allowed);
            }
            other => panic!("expected pass, got {other:?}"),
        }
    }
}
