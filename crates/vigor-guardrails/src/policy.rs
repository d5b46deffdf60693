//! The standard guardrail policy shipped with the engine.
//!
//! Four rules, evaluated in registration order: dangerous exercise
//! advice and self-harm content block at the input boundary, medical
//! advice is scrubbed from outputs, and mindfulness content carries an
//! educational disclaimer.

use crate::rule::{GuardrailRule, Matcher, MatchError, RuleAction, RuleScope};
use serde_json::Value;
use vigor_core::AgentName;

/// Disclaimer attached whenever coaching output brushes against
/// medical territory.
pub const EDUCATIONAL_DISCLAIMER: &str =
    "This is for educational purposes only and not medical advice.";

const DANGEROUS_EXERCISE: &[&str] = &[
    "ignore pain",
    "push through injury",
    "ignore doctor",
    "ignore medical advice",
];

const SELF_HARM: &[&str] = &[
    "suicide",
    "self-harm",
    "hurt yourself",
    "end your life",
];

const MEDICAL_ADVICE: &[&str] = &[
    "diagnose",
    "diagnosis",
    "prescribe",
    "prescription",
    "treatment",
    "cure",
    "disease",
    "illness",
    "symptom",
    "medical condition",
    "see a doctor",
    "consult a physician",
    "medical professional",
];

/// Builder for the standard rule set.
pub struct GuardrailPolicy;

impl GuardrailPolicy {
    /// The standard wellness-coaching rules, in evaluation order.
    pub fn standard() -> Vec<GuardrailRule> {
        vec![
            GuardrailRule::new(
                "dangerous-exercise",
                RuleScope::Input,
                RuleAction::Block,
                Matcher::keywords(DANGEROUS_EXERCISE.iter().copied()),
                "request encourages unsafe exercise behavior",
            ),
            GuardrailRule::new(
                "self-harm",
                RuleScope::Both,
                RuleAction::Block,
                Matcher::keywords(SELF_HARM.iter().copied()),
                "self-harm content detected",
            ),
            GuardrailRule::new(
                "medical-advice",
                RuleScope::Output,
                RuleAction::Sanitize,
                Matcher::keywords(MEDICAL_ADVICE.iter().copied()),
                "medical advice removed from coaching output",
            )
            .with_disclaimer(EDUCATIONAL_DISCLAIMER),
            GuardrailRule::new(
                "mindfulness-disclaimer",
                RuleScope::Output,
                RuleAction::Annotate,
                Matcher::Custom(Box::new(missing_disclaimer)),
                "mindfulness guidance carries an educational disclaimer",
            )
            .with_disclaimer(EDUCATIONAL_DISCLAIMER)
            .for_agents([AgentName::Mindfulness]),
        ]
    }
}

/// Matches when the payload does not already carry the educational
/// disclaimer, so annotation stays idempotent.
fn missing_disclaimer(payload: &Value) -> Result<bool, MatchError> {
    let already_present = payload
        .get("disclaimers")
        .and_then(Value::as_array)
        .is_some_and(|items| {
            items
                .iter()
                .any(|item| item.as_str() == Some(EDUCATIONAL_DISCLAIMER))
        });
    Ok(!already_present)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_limit::{RateConfig, RateGate};
    use crate::validator::{GuardrailValidator, InputDecision, OutputDecision};
    use serde_json::json;
    use vigor_core::Verdict;

    fn standard_validator() -> GuardrailValidator {
        GuardrailValidator::new(GuardrailPolicy::standard(), RateGate::new(RateConfig::default()))
    }

    #[test]
    fn dangerous_exercise_request_is_blocked() {
        let validator = standard_validator();
        let decision = validator.validate_input(
            AgentName::Pose,
            json!({"note": "I want to push through injury today"}),
            "session",
        );
        assert!(matches!(decision, InputDecision::Block { .. }));
    }

    #[test]
    fn medical_language_is_scrubbed_with_disclaimer() {
        let validator = standard_validator();
        let payload = json!({
            "suggestions": "Swap fries for roasted sweet potato. This could cure your fatigue."
        });
        match validator.validate_output(AgentName::Nutrition, payload) {
            OutputDecision::Pass { payload, verdict } => {
                assert!(!payload["suggestions"].as_str().unwrap().contains("cure"));
                assert!(matches!(verdict, Verdict::Sanitized { .. }));
                assert_eq!(payload["disclaimers"][0], json!(EDUCATIONAL_DISCLAIMER));
            }
            other => panic!("expected pass, got {other:?}"),
        }
    }

    #[test]
    fn mindfulness_output_is_annotated_once() {
        let validator = standard_validator();
        let first = match validator.validate_output(
            AgentName::Mindfulness,
            json!({"lesson": "Notice your breath for two minutes."}),
        ) {
            OutputDecision::Pass { payload, .. } => payload,
            other => panic!("expected pass, got {other:?}"),
        };
        assert_eq!(first["disclaimers"][0], json!(EDUCATIONAL_DISCLAIMER));

        // Re-validating already-annotated output must not duplicate it.
        match validator.validate_output(AgentName::Mindfulness, first) {
            OutputDecision::Pass { payload, .. } => {
                let items = payload["disclaimers"].as_array().unwrap();
                assert_eq!(items.len(), 1);
            }
            other => panic!("expected pass, got {other:?}"),
        }
    }

    #[test]
    fn pose_output_gets_no_mindfulness_disclaimer() {
        let validator = standard_validator();
        match validator.validate_output(AgentName::Pose, json!({"rep_count": 12})) {
            OutputDecision::Pass { payload, verdict } => {
                assert_eq!(verdict, Verdict::Allowed);
                assert!(payload.get("disclaimers").is_none());
            }
            other => panic!("expected pass, got {other:?}"),
        }
    }
}
