//! Mindfulness tool suite: mood analysis, template-based micro-lessons,
//! breathing guides, and journaling prompts.
//!
//! Text generation is template selection standing in for an LLM behind
//! the same contract. Templates are keyed by coaching context
//! (`post_workout`, `pre_workout`, `general`), with unknown contexts
//! falling back to `general`.

use async_trait::async_trait;
use rand::seq::IndexedRandom;
use serde_json::{Value, json};
use vigor_core::{ParamKind, ParamSchema, ToolError, ToolKind, ToolRuntime};

const POST_WORKOUT_LESSONS: &[&str] = &[
    "Breathe in for 4 counts, hold for 2, out for 6. Repeat 6 times. You built consistency today — that compounds. Remember one progress point.",
    "Take 5 deep breaths. Each rep you completed is a step toward your goal. Progress isn't always linear, but you showed up. That's what matters.",
    "Inhale strength, exhale doubt. You pushed through today. Notice how your body feels — acknowledge the effort you just made.",
];

const PRE_WORKOUT_LESSONS: &[&str] = &[
    "Take 3 deep breaths. Set your intention: what do you want to accomplish today? Visualize success.",
    "Breathe in confidence, out any hesitation. You're prepared. Trust your training and give your best effort.",
];

const GENERAL_LESSONS: &[&str] = &[
    "Breathe in for 4, hold 2, out 6. This moment is yours. What's one thing you're grateful for today?",
    "Take a moment. Inhale presence, exhale distraction. You're exactly where you need to be right now.",
];

const POST_WORKOUT_PROMPTS: &[&str] = &[
    "What did you push through just now?",
    "What's one thing you learned about yourself during this workout?",
    "How did your body feel during the hardest part?",
    "What progress did you notice today, even if small?",
];

const PRE_WORKOUT_PROMPTS: &[&str] = &[
    "What's your intention for today's session?",
    "What are you hoping to achieve or improve?",
];

const GENERAL_PROMPTS: &[&str] = &[
    "What's one thing you're grateful for today?",
    "What challenge did you overcome recently?",
    "How are you feeling right now, and why?",
];

struct BreathingPattern {
    name: &'static str,
    pattern: &'static str,
    description: &'static str,
    cycle_seconds: u64,
}

const BREATHING_PATTERNS: &[BreathingPattern] = &[
    BreathingPattern {
        name: "Box Breathing",
        pattern: "4-4-4-4",
        description: "Inhale 4, hold 4, exhale 4, hold 4",
        cycle_seconds: 16,
    },
    BreathingPattern {
        name: "4-7-8 Breathing",
        pattern: "4-7-8",
        description: "Inhale 4, hold 7, exhale 8",
        cycle_seconds: 19,
    },
    BreathingPattern {
        name: "Equal Breathing",
        pattern: "4-4",
        description: "Inhale 4, exhale 4",
        cycle_seconds: 8,
    },
];

fn lessons_for(context: &str) -> &'static [&'static str] {
    match context {
        "post_workout" => POST_WORKOUT_LESSONS,
        "pre_workout" => PRE_WORKOUT_LESSONS,
        _ => GENERAL_LESSONS,
    }
}

fn prompts_for(context: &str) -> &'static [&'static str] {
    match context {
        "post_workout" => POST_WORKOUT_PROMPTS,
        "pre_workout" => PRE_WORKOUT_PROMPTS,
        _ => GENERAL_PROMPTS,
    }
}

fn workout_form_score(params: &Value) -> Option<f64> {
    params
        .get("workout_summary")
        .and_then(|s| s.get("form_score"))
        .and_then(Value::as_f64)
}

/// Analyze the user's mood from their hint and workout performance.
pub struct AnalyzeMoodTool;

#[async_trait]
impl ToolRuntime for AnalyzeMoodTool {
    fn kind(&self) -> ToolKind {
        ToolKind::AnalyzeMood
    }

    fn schema(&self) -> ParamSchema {
        ParamSchema::new()
            .optional("mood_hint", ParamKind::String)
            .optional("context", ParamKind::String)
            .optional("workout_summary", ParamKind::Object)
    }

    async fn run(&self, params: &Value) -> Result<Value, ToolError> {
        let hint = params
            .get("mood_hint")
            .and_then(Value::as_str)
            .unwrap_or("neutral")
            .to_lowercase();
        let context = params
            .get("context")
            .and_then(Value::as_str)
            .unwrap_or("general");

        let (mut valence, energy, label) = match hint.as_str() {
            "frustrated" => (-0.5, 0.3, "Frustrated"),
            "tired" => (-0.2, -0.5, "Tired"),
            "motivated" => (0.7, 0.8, "Motivated"),
            _ => (0.0, 0.0, "Neutral"),
        };

        // A strong session lifts valence a little; a rough one dents it.
        if let Some(score) = workout_form_score(params) {
            if score >= 90.0 {
                valence += 0.2;
            } else if score < 60.0 {
                valence -= 0.1;
            }
        }

        let recommendations: &[&str] = match label {
            "Frustrated" => &[
                "Focus on one small win",
                "Take a moment to breathe",
                "Remember progress takes time",
            ],
            "Tired" => &[
                "Listen to your body",
                "Consider a lighter session",
                "Rest is part of training",
            ],
            "Motivated" => &[
                "Channel this energy",
                "Set a challenging but achievable goal",
                "Enjoy the momentum",
            ],
            _ => &["Stay present", "Focus on the process"],
        };

        Ok(json!({
            "mood": label,
            "valence": valence,
            "energy": energy,
            "context": context,
            "recommendations": recommendations,
        }))
    }
}

/// Generate a short mindfulness or grit micro-lesson.
pub struct GenerateLessonTool;

#[async_trait]
impl ToolRuntime for GenerateLessonTool {
    fn kind(&self) -> ToolKind {
        ToolKind::GenerateLesson
    }

    fn schema(&self) -> ParamSchema {
        ParamSchema::new()
            .optional("context", ParamKind::String)
            .optional("mood_analysis", ParamKind::Object)
            .optional("workout_summary", ParamKind::Object)
            .optional("duration_seconds", ParamKind::Integer)
    }

    async fn run(&self, params: &Value) -> Result<Value, ToolError> {
        let context = params
            .get("context")
            .and_then(Value::as_str)
            .unwrap_or("general");
        let duration_seconds = params
            .get("duration_seconds")
            .and_then(Value::as_u64)
            .unwrap_or(60);

        let templates = lessons_for(context);
        let mut lesson_text = templates
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or(GENERAL_LESSONS[0])
            .to_string();

        if let Some(score) = workout_form_score(params) {
            if score >= 90.0 {
                lesson_text.push_str(" Excellent form today!");
            } else if score >= 75.0 {
                lesson_text.push_str(" Good effort — keep refining.");
            }
        }

        Ok(json!({
            "lesson_text": lesson_text,
            "context": context,
            "duration_seconds": duration_seconds,
            "type": "micro_lesson",
        }))
    }
}

/// Generate a guided breathing exercise sized to a duration.
pub struct GenerateBreathingGuideTool;

#[async_trait]
impl ToolRuntime for GenerateBreathingGuideTool {
    fn kind(&self) -> ToolKind {
        ToolKind::GenerateBreathingGuide
    }

    fn schema(&self) -> ParamSchema {
        ParamSchema::new()
            .optional("context", ParamKind::String)
            .optional("duration_seconds", ParamKind::Integer)
    }

    async fn run(&self, params: &Value) -> Result<Value, ToolError> {
        let duration_seconds = params
            .get("duration_seconds")
            .and_then(Value::as_u64)
            .unwrap_or(60);

        let pattern = BREATHING_PATTERNS
            .choose(&mut rand::rng())
            .unwrap_or(&BREATHING_PATTERNS[0]);
        let cycles = (duration_seconds / pattern.cycle_seconds).max(1);

        Ok(json!({
            "pattern_name": pattern.name,
            "pattern": pattern.pattern,
            "description": pattern.description,
            "cycles": cycles,
            "duration_seconds": duration_seconds,
            "instructions": format!("Repeat {cycles} cycles of {}", pattern.description),
        }))
    }
}

/// Create a short journaling prompt for reflection.
pub struct CreateJournalPromptTool;

#[async_trait]
impl ToolRuntime for CreateJournalPromptTool {
    fn kind(&self) -> ToolKind {
        ToolKind::CreateJournalPrompt
    }

    fn schema(&self) -> ParamSchema {
        ParamSchema::new()
            .optional("context", ParamKind::String)
            .optional("workout_summary", ParamKind::Object)
            .optional("mood_analysis", ParamKind::Object)
    }

    async fn run(&self, params: &Value) -> Result<Value, ToolError> {
        let context = params
            .get("context")
            .and_then(Value::as_str)
            .unwrap_or("general");

        let prompt = prompts_for(context)
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or(GENERAL_PROMPTS[0]);

        Ok(json!({
            "prompt": prompt,
            "context": context,
            "max_words": 50,
            "type": "journal_prompt",
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mood_map_covers_the_known_hints() {
        for (hint, label, valence) in [
            ("frustrated", "Frustrated", -0.5),
            ("tired", "Tired", -0.2),
            ("motivated", "Motivated", 0.7),
            ("neutral", "Neutral", 0.0),
            ("confused", "Neutral", 0.0),
        ] {
            let out = AnalyzeMoodTool
                .run(&json!({"mood_hint": hint}))
                .await
                .unwrap();
            assert_eq!(out["mood"], json!(label), "hint {hint}");
            assert_eq!(out["valence"], json!(valence));
            assert!(!out["recommendations"].as_array().unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn strong_workout_lifts_valence() {
        let out = AnalyzeMoodTool
            .run(&json!({
                "mood_hint": "tired",
                "workout_summary": {"form_score": 95.0},
            }))
            .await
            .unwrap();
        // -0.2 base plus the high-score lift.
        assert!((out["valence"].as_f64().unwrap() - 0.0).abs() < 1e-9);

        let out = AnalyzeMoodTool
            .run(&json!({
                "mood_hint": "neutral",
                "workout_summary": {"form_score": 50.0},
            }))
            .await
            .unwrap();
        assert!((out["valence"].as_f64().unwrap() + 0.1).abs() < 1e-9);
    }

    #[tokio::test]
    async fn lesson_comes_from_the_context_templates() {
        let out = GenerateLessonTool
            .run(&json!({"context": "post_workout"}))
            .await
            .unwrap();
        let text = out["lesson_text"].as_str().unwrap();
        assert!(POST_WORKOUT_LESSONS.contains(&text));
        assert_eq!(out["type"], json!("micro_lesson"));
    }

    #[tokio::test]
    async fn lesson_appends_praise_for_good_form() {
        let out = GenerateLessonTool
            .run(&json!({
                "context": "post_workout",
                "workout_summary": {"form_score": 92.0},
            }))
            .await
            .unwrap();
        assert!(
            out["lesson_text"]
                .as_str()
                .unwrap()
                .ends_with("Excellent form today!")
        );
    }

    #[tokio::test]
    async fn unknown_context_falls_back_to_general() {
        let out = CreateJournalPromptTool
            .run(&json!({"context": "midnight"}))
            .await
            .unwrap();
        assert!(GENERAL_PROMPTS.contains(&out["prompt"].as_str().unwrap()));
        assert_eq!(out["max_words"], json!(50));
    }

    #[tokio::test]
    async fn breathing_cycles_fit_the_duration() {
        let out = GenerateBreathingGuideTool
            .run(&json!({"duration_seconds": 60}))
            .await
            .unwrap();
        let cycles = out["cycles"].as_u64().unwrap();
        let expected = match out["pattern"].as_str().unwrap() {
            "4-4-4-4" => 60 / 16,
            "4-7-8" => 60 / 19,
            _ => 60 / 8,
        };
        assert_eq!(cycles, expected);
        assert!(
            out["instructions"]
                .as_str()
                .unwrap()
                .starts_with(&format!("Repeat {cycles} cycles"))
        );
    }

    #[tokio::test]
    async fn very_short_durations_still_get_one_cycle() {
        let out = GenerateBreathingGuideTool
            .run(&json!({"duration_seconds": 5}))
            .await
            .unwrap();
        assert_eq!(out["cycles"], json!(1));
    }
}
