//! Tool abstraction: the closed tool set, parameter schemas, and the
//! execution contract.
//!
//! Tools are the leaf executable units of the system. Each tool is a named,
//! parameter-validated unit owned by exactly one agent; the perception and
//! generation logic (pose models, food classifiers, text generation) lives
//! behind the single [`ToolRuntime::run`] call, so the orchestration core
//! only ever sees a structured result.

use crate::agent::AgentName;
use crate::error::ToolError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// The closed set of tools known to the system.
///
/// Encoding the owning agent in the type gives compile-time capability
/// isolation: an agent can only be granted tools that belong to it, and the
/// registry enforces ownership on every invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    // Pose analysis tools
    ExtractKeypoints,
    DetectFormErrors,
    CountReps,
    ScoreForm,

    // Nutrition tools
    ClassifyFood,
    EstimatePortion,
    ComputeNutrition,
    SuggestImprovements,

    // Mindfulness tools
    AnalyzeMood,
    GenerateLesson,
    GenerateBreathingGuide,
    CreateJournalPrompt,
}

impl ToolKind {
    /// Get the tool name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::ExtractKeypoints => "extract_keypoints",
            ToolKind::DetectFormErrors => "detect_form_errors",
            ToolKind::CountReps => "count_reps",
            ToolKind::ScoreForm => "score_form",
            ToolKind::ClassifyFood => "classify_food",
            ToolKind::EstimatePortion => "estimate_portion",
            ToolKind::ComputeNutrition => "compute_nutrition",
            ToolKind::SuggestImprovements => "suggest_improvements",
            ToolKind::AnalyzeMood => "analyze_mood",
            ToolKind::GenerateLesson => "generate_lesson",
            ToolKind::GenerateBreathingGuide => "generate_breathing_guide",
            ToolKind::CreateJournalPrompt => "create_journal_prompt",
        }
    }

    /// Try to parse a tool name string into a `ToolKind`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "extract_keypoints" => Some(ToolKind::ExtractKeypoints),
            "detect_form_errors" => Some(ToolKind::DetectFormErrors),
            "count_reps" => Some(ToolKind::CountReps),
            "score_form" => Some(ToolKind::ScoreForm),
            "classify_food" => Some(ToolKind::ClassifyFood),
            "estimate_portion" => Some(ToolKind::EstimatePortion),
            "compute_nutrition" => Some(ToolKind::ComputeNutrition),
            "suggest_improvements" => Some(ToolKind::SuggestImprovements),
            "analyze_mood" => Some(ToolKind::AnalyzeMood),
            "generate_lesson" => Some(ToolKind::GenerateLesson),
            "generate_breathing_guide" => Some(ToolKind::GenerateBreathingGuide),
            "create_journal_prompt" => Some(ToolKind::CreateJournalPrompt),
            _ => None,
        }
    }

    /// The agent this tool is registered under.
    pub fn owner(&self) -> AgentName {
        match self {
            ToolKind::ExtractKeypoints
            | ToolKind::DetectFormErrors
            | ToolKind::CountReps
            | ToolKind::ScoreForm => AgentName::Pose,
            ToolKind::ClassifyFood
            | ToolKind::EstimatePortion
            | ToolKind::ComputeNutrition
            | ToolKind::SuggestImprovements => AgentName::Nutrition,
            ToolKind::AnalyzeMood
            | ToolKind::GenerateLesson
            | ToolKind::GenerateBreathingGuide
            | ToolKind::CreateJournalPrompt => AgentName::Mindfulness,
        }
    }

    /// All tools in the closed set.
    pub fn all() -> &'static [ToolKind] {
        &[
            ToolKind::ExtractKeypoints,
            ToolKind::DetectFormErrors,
            ToolKind::CountReps,
            ToolKind::ScoreForm,
            ToolKind::ClassifyFood,
            ToolKind::EstimatePortion,
            ToolKind::ComputeNutrition,
            ToolKind::SuggestImprovements,
            ToolKind::AnalyzeMood,
            ToolKind::GenerateLesson,
            ToolKind::GenerateBreathingGuide,
            ToolKind::CreateJournalPrompt,
        ]
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Expected JSON type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    String,
    Number,
    Integer,
    Bool,
    Object,
    Array,
}

impl ParamKind {
    /// Check whether a JSON value satisfies this kind.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ParamKind::String => value.is_string(),
            ParamKind::Number => value.is_number(),
            ParamKind::Integer => value.is_i64() || value.is_u64(),
            ParamKind::Bool => value.is_boolean(),
            ParamKind::Object => value.is_object(),
            ParamKind::Array => value.is_array(),
        }
    }
}

/// One named parameter in a tool's contract.
#[derive(Debug, Clone, Serialize)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
}

/// A tool's parameter contract: named, typed parameters that are validated
/// before execution. Unknown extra fields are tolerated so callers can pass
/// contextual data through without every tool declaring it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParamSchema {
    params: Vec<ParamSpec>,
}

impl ParamSchema {
    pub fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// Declare a required parameter.
    pub fn required(mut self, name: &'static str, kind: ParamKind) -> Self {
        self.params.push(ParamSpec {
            name,
            kind,
            required: true,
        });
        self
    }

    /// Declare an optional parameter.
    pub fn optional(mut self, name: &'static str, kind: ParamKind) -> Self {
        self.params.push(ParamSpec {
            name,
            kind,
            required: false,
        });
        self
    }

    /// The declared parameters, in declaration order.
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Validate a parameter payload against this schema.
    ///
    /// Returns a human-readable description of the first violation found.
    pub fn validate(&self, payload: &Value) -> Result<(), String> {
        let Some(map) = payload.as_object() else {
            return Err("parameters must be a JSON object".to_string());
        };
        for spec in &self.params {
            match map.get(spec.name) {
                None | Some(Value::Null) => {
                    if spec.required {
                        return Err(format!("missing required parameter '{}'", spec.name));
                    }
                }
                Some(value) => {
                    if !spec.kind.accepts(value) {
                        return Err(format!(
                            "parameter '{}' has wrong type (expected {:?})",
                            spec.name, spec.kind
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Structured result of one tool invocation, as returned by the registry.
///
/// Execution failures and timeouts are carried in-band (`success == false`,
/// `error` set) so the owning agent can decide whether to continue its
/// pipeline; only precondition failures (unknown tool, ownership violation,
/// invalid parameters) are surfaced as hard errors.
#[derive(Debug, Clone, Serialize)]
pub struct ToolOutcome {
    pub tool: ToolKind,
    pub success: bool,
    pub value: Value,
    pub error: Option<ToolError>,
    pub latency: Duration,
}

impl ToolOutcome {
    pub fn success(tool: ToolKind, value: Value, latency: Duration) -> Self {
        Self {
            tool,
            success: true,
            value,
            error: None,
            latency,
        }
    }

    pub fn failure(tool: ToolKind, error: ToolError, latency: Duration) -> Self {
        Self {
            tool,
            success: false,
            value: Value::Null,
            error: Some(error),
            latency,
        }
    }

    /// Whether this outcome is a timeout failure.
    pub fn is_timeout(&self) -> bool {
        matches!(self.error, Some(ToolError::Timeout { .. }))
    }
}

/// The execution contract every tool implements.
///
/// Same input maps to the same output class; values may vary for stochastic
/// tools (template selection, classifier jitter). Execution must be bounded
/// in duration; the registry enforces a timeout around `run`.
#[async_trait::async_trait]
pub trait ToolRuntime: Send + Sync {
    /// Which member of the closed tool set this runtime implements.
    fn kind(&self) -> ToolKind;

    /// The parameter contract validated before every execution.
    fn schema(&self) -> ParamSchema;

    /// Execute the tool. Errors are returned, never panicked.
    async fn run(&self, params: &Value) -> Result<Value, ToolError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_names_round_trip() {
        for kind in ToolKind::all() {
            assert_eq!(ToolKind::from_name(kind.name()), Some(*kind));
        }
        assert_eq!(ToolKind::from_name("no_such_tool"), None);
    }

    #[test]
    fn every_tool_has_an_owner_with_four_tools() {
        for agent in AgentName::all() {
            let owned: Vec<_> = ToolKind::all()
                .iter()
                .filter(|t| t.owner() == *agent)
                .collect();
            assert_eq!(owned.len(), 4, "agent {agent} should own four tools");
        }
    }

    #[test]
    fn schema_accepts_valid_payload() {
        let schema = ParamSchema::new()
            .required("frames", ParamKind::Array)
            .required("exercise_type", ParamKind::String)
            .optional("mode", ParamKind::String);

        let payload = json!({
            "frames": [{}],
            "exercise_type": "squat",
            "extra_context": {"ignored": true},
        });
        assert!(schema.validate(&payload).is_ok());
    }

    #[test]
    fn schema_rejects_missing_and_mistyped() {
        let schema = ParamSchema::new()
            .required("portion_grams", ParamKind::Number)
            .optional("size_hint", ParamKind::String);

        let err = schema.validate(&json!({})).unwrap_err();
        assert!(err.contains("portion_grams"));

        let err = schema
            .validate(&json!({"portion_grams": "two hundred"}))
            .unwrap_err();
        assert!(err.contains("wrong type"));

        assert!(schema.validate(&json!([1, 2])).is_err());
    }

    #[test]
    fn null_counts_as_absent() {
        let schema = ParamSchema::new().optional("mood_hint", ParamKind::String);
        assert!(schema.validate(&json!({"mood_hint": null})).is_ok());
    }

    #[test]
    fn schema_serializes_for_introspection() {
        let schema = ParamSchema::new()
            .required("frames", ParamKind::Array)
            .optional("mode", ParamKind::String);
        let value = serde_json::to_value(&schema).unwrap();
        assert_eq!(value["params"][0]["name"], "frames");
        assert_eq!(value["params"][0]["required"], json!(true));
        assert_eq!(value["params"][1]["kind"], "string");
    }
}
