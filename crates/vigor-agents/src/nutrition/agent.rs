//! The nutrition agent pipeline: classify, estimate portion, compute
//! nutrition, suggest improvements.

use crate::pipeline::run_step;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::time::Instant;
use vigor_core::{AgentHandler, AgentName, AgentOutput, MemoryContext, ToolKind, ToolRegistry};

/// Food classification and nutrition estimation.
///
/// A `classify_only` mode short-circuits after the first step for
/// callers that only want the label.
pub struct NutritionAgent;

const TOOLS: &[ToolKind] = &[
    ToolKind::ClassifyFood,
    ToolKind::EstimatePortion,
    ToolKind::ComputeNutrition,
    ToolKind::SuggestImprovements,
];

#[async_trait]
impl AgentHandler for NutritionAgent {
    fn name(&self) -> AgentName {
        AgentName::Nutrition
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

        let Some(image) = request.get("image").filter(|i| !i.is_null()).cloned() else {
            return AgentOutput::failure(
                self.name(),
                json!({}),
                "no image provided",
                tools_used,
                started.elapsed(),
            );
        };
        let mode = request
            .get("mode")
            .and_then(Value::as_str)
            .unwrap_or("estimate");
        let user_hints = request
            .get("user_hints")
            .cloned()
            .unwrap_or_else(|| json!({}));

        let mut partial = json!({});
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

        let classification = step!(
            ToolKind::ClassifyFood,
            json!({"image": image, "model": "efficientnet_b0", "top_k": 3})
        );
        partial["classification"] = classification.clone();

        if mode == "classify_only" {
            partial["mode"] = json!("classify_only");
            return AgentOutput::success(self.name(), partial, tools_used, started.elapsed());
        }

        let top_class = classification["top_class"].clone();
        let confidence = classification["confidence"].as_f64().unwrap_or(0.5);

        let portion_estimate = step!(
            ToolKind::EstimatePortion,
            json!({
                "image": image,
                "food_class": top_class,
                "user_hints": user_hints,
            })
        );
        partial["portion_estimate"] = portion_estimate.clone();

        let nutrition = step!(
            ToolKind::ComputeNutrition,
            json!({
                "food_class": top_class,
                "portion_grams": portion_estimate["portion_grams"],
                "confidence": confidence,
            })
        );
        partial["nutrition"] = nutrition.clone();

        let suggestions = step!(
            ToolKind::SuggestImprovements,
            json!({"food_class": top_class, "current_nutrition": nutrition})
        );
        partial["suggestions"] = suggestions;
        partial["confidence"] = json!(confidence);

        AgentOutput::success(self.name(), partial, tools_used, started.elapsed())
    }
}
