//! The mindfulness agent pipeline: analyze mood, generate a
//! micro-lesson, a breathing guide, and a journaling prompt.

use crate::pipeline::run_step;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::time::Instant;
use vigor_core::{AgentHandler, AgentName, AgentOutput, MemoryContext, ToolKind, ToolRegistry};

/// Mindfulness coaching and grit micro-lessons.
///
/// When the request carries no mood hint, the user's most common
/// historical mood (from the pattern summary) stands in, so returning
/// users get coaching tuned to how they usually arrive. With neither a
/// hint nor history, mood analysis is skipped entirely and the package
/// is built from the coaching context alone.
pub struct MindfulnessAgent;

const TOOLS: &[ToolKind] = &[
    ToolKind::AnalyzeMood,
    ToolKind::GenerateLesson,
    ToolKind::GenerateBreathingGuide,
    ToolKind::CreateJournalPrompt,
];

const LESSON_DURATION_SECONDS: u64 = 60;

#[async_trait]
impl AgentHandler for MindfulnessAgent {
    fn name(&self) -> AgentName {
        AgentName::Mindfulness
    }

    fn tools(&self) -> &'static [ToolKind] {
        TOOLS
    }

    async fn execute(
        &self,
        request: &Value,
        context: &MemoryContext,
        registry: &ToolRegistry,
    ) -> AgentOutput {
        let started = Instant::now();
        let mut tools_used = Vec::new();

        let coaching_context = request
            .get("context")
            .and_then(Value::as_str)
            .unwrap_or("general")
            .to_string();
        let mood_hint = request
            .get("mood_hint")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| {
                context
                    .user_patterns
                    .as_ref()
                    .and_then(|p| p.common_mood.clone())
            });
        let workout_summary = request
            .get("workout_summary")
            .cloned()
            .unwrap_or_else(|| json!({}));

        let mut partial = json!({"context": coaching_context});
        macro_rules! step {
            ($kind:expr, $params:expr) => {
                match run_step(registry, self.name(), $kind, $params, &mut tools_used).await {
                    Ok(value) => value,
                    Err(error) => {
                        return AgentOutput::failure(
                            self.name(),
                            partial,
                            error,
                            tools_used,
                            started.elapsed(),
                        );
                    }
                }
            };
        }

        let mood_analysis = match mood_hint {
            Some(hint) => {
                let analysis = step!(
                    ToolKind::AnalyzeMood,
                    json!({
                        "mood_hint": hint,
                        "context": coaching_context,
                        "workout_summary": workout_summary,
                    })
                );
                partial["mood_analysis"] = analysis.clone();
                partial["mood"] = analysis["mood"].clone();
                analysis
            }
            None => json!({}),
        };

        let micro_lesson = step!(
            ToolKind::GenerateLesson,
            json!({
                "context": coaching_context,
                "mood_analysis": mood_analysis,
                "workout_summary": workout_summary,
                "duration_seconds": LESSON_DURATION_SECONDS,
            })
        );
        partial["micro_lesson"] = micro_lesson;

        let breathing_guide = step!(
            ToolKind::GenerateBreathingGuide,
            json!({
                "context": coaching_context,
                "duration_seconds": LESSON_DURATION_SECONDS,
            })
        );
        partial["breathing_guide"] = breathing_guide;

        let journal_prompt = step!(
            ToolKind::CreateJournalPrompt,
            json!({
                "context": coaching_context,
                "workout_summary": workout_summary,
                "mood_analysis": mood_analysis,
            })
        );
        partial["journal_prompt"] = journal_prompt;

        AgentOutput::success(self.name(), partial, tools_used, started.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::standard_registry;
    use vigor_core::PatternSummary;

    #[tokio::test]
    async fn full_pipeline_assembles_a_coaching_package() {
        let registry = standard_registry();
        let request = json!({
            "context": "post_workout",
            "mood_hint": "tired",
            "workout_summary": {"form_score": 92.0},
        });
        let out = MindfulnessAgent
            .execute(&request, &MemoryContext::empty(), &registry)
            .await;

        assert!(out.success);
        assert_eq!(out.payload["mood"], json!("Tired"));
        assert_eq!(out.payload["mood_analysis"]["mood"], json!("Tired"));
        assert!(out.payload["micro_lesson"]["lesson_text"].is_string());
        assert!(out.payload["breathing_guide"]["cycles"].as_u64().unwrap() >= 1);
        assert_eq!(out.payload["journal_prompt"]["max_words"], json!(50));
        assert_eq!(out.tools_used, TOOLS);
    }

    #[tokio::test]
    async fn missing_hint_and_history_skips_mood_analysis() {
        let registry = standard_registry();
        let out = MindfulnessAgent
            .execute(&json!({}), &MemoryContext::empty(), &registry)
            .await;
        assert!(out.success);
        assert!(out.payload.get("mood").is_none());
        assert!(out.payload.get("mood_analysis").is_none());
        assert_eq!(out.payload["context"], json!("general"));
        assert!(!out.tools_used.contains(&ToolKind::AnalyzeMood));
        assert_eq!(
            out.tools_used,
            vec![
                ToolKind::GenerateLesson,
                ToolKind::GenerateBreathingGuide,
                ToolKind::CreateJournalPrompt,
            ]
        );
    }

    #[tokio::test]
    async fn common_mood_from_history_stands_in_for_a_hint() {
        let registry = standard_registry();
        let context = MemoryContext {
            recent_interactions: Vec::new(),
            user_patterns: Some(PatternSummary {
                common_mood: Some("Motivated".to_string()),
                ..PatternSummary::default()
            }),
        };
        let out = MindfulnessAgent
            .execute(&json!({"context": "general"}), &context, &registry)
            .await;
        assert!(out.success);
        assert_eq!(out.payload["mood"], json!("Motivated"));
        assert!(out.tools_used.contains(&ToolKind::AnalyzeMood));
    }
}
