//! The pose agent pipeline: extract keypoints per frame, detect form
//! errors, count reps, score form.

use crate::pipeline::run_step;
use crate::pose::REP_COMPLETE_THRESHOLD;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::time::Instant;
use vigor_core::{AgentHandler, AgentName, AgentOutput, MemoryContext, ToolKind, ToolRegistry};

/// Real-time exercise form analysis and correction.
pub struct PoseAgent;

const TOOLS: &[ToolKind] = &[
    ToolKind::ExtractKeypoints,
    ToolKind::DetectFormErrors,
    ToolKind::CountReps,
    ToolKind::ScoreForm,
];

#[async_trait]
impl AgentHandler for PoseAgent {
    fn name(&self) -> AgentName {
        AgentName::Pose
    }

    fn tools(&self) -> &'static [ToolKind] {
        TOOLS
    }

    async fn execute(
        &self,
        request: &Value,
        _context: &MemoryContext,
        registry: &ToolRegistry,
    ) -> AgentOutput {
        let started = Instant::now();
        let mut tools_used = Vec::new();

        let frames = request
            .get("frames")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let exercise_type = request
            .get("exercise_type")
            .and_then(Value::as_str)
            .unwrap_or("squat")
            .to_string();

        if frames.is_empty() {
            return AgentOutput::failure(
                self.name(),
                json!({}),
                "no frames provided",
                tools_used,
                started.elapsed(),
            );
        }

        let mut partial = json!({"exercise_type": exercise_type});
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

        let mut keypoints_list = Vec::with_capacity(frames.len());
        for frame in &frames {
            let extracted = step!(
                ToolKind::ExtractKeypoints,
                json!({"frame": frame, "model": "mediapipe"})
            );
            keypoints_list.push(extracted);
        }
        partial["keypoints"] = json!(keypoints_list);

        let form_errors = step!(
            ToolKind::DetectFormErrors,
            json!({"keypoints_list": keypoints_list, "exercise_type": exercise_type})
        );
        partial["form_errors"] = form_errors.clone();

        let rep_data = step!(
            ToolKind::CountReps,
            json!({"keypoints_list": keypoints_list, "exercise_type": exercise_type})
        );
        let rep_count = rep_data["rep_count"].as_u64().unwrap_or(0);
        partial["rep_count"] = json!(rep_count);

        let form_score = step!(
            ToolKind::ScoreForm,
            json!({
                "form_errors": form_errors,
                "rep_count": rep_count,
                "exercise_type": exercise_type,
            })
        );
        partial["form_score"] = form_score.clone();
        partial["workout_complete"] = json!(rep_count >= REP_COMPLETE_THRESHOLD);
        partial["summary"] = json!({
            "total_reps": rep_count,
            "form_score": form_score["overall_score"],
            "top_errors": form_errors["top_errors"],
            "recommendations": form_errors["recommendations"],
        });

        AgentOutput::success(self.name(), partial, tools_used, started.elapsed())
    }
}
