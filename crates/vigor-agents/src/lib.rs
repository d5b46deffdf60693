//! # Vigor Agents
//!
//! The three capability agents of the coaching platform and their tool
//! suites:
//!
//! - **Pose**: keypoint extraction, form-error detection, rep counting,
//!   and form scoring over frame sequences.
//! - **Nutrition**: food classification, portion estimation, nutrition
//!   computation, and improvement suggestions.
//! - **Mindfulness**: mood analysis, micro-lessons, breathing guides,
//!   and journaling prompts.
//!
//! Each agent sequences its four tools as a pipeline where later steps
//! consume earlier steps' structured output. The perception and
//! generation models behind the tools are stubbed with deterministic
//! placeholder logic; swapping in real inference means replacing one
//! [`vigor_core::ToolRuntime`] implementation at a time.

pub mod mindfulness;
pub mod nutrition;
pub mod pose;

mod pipeline;

pub use mindfulness::MindfulnessAgent;
pub use nutrition::NutritionAgent;
pub use pose::PoseAgent;

use std::sync::Arc;
use vigor_core::{AgentHandler, ToolRegistry};

/// Registry holding every standard tool, keyed to its owning agent.
pub fn standard_registry() -> ToolRegistry {
    ToolRegistry::new()
        .with_tool(Arc::new(pose::tools::ExtractKeypointsTool))
        .with_tool(Arc::new(pose::tools::DetectFormErrorsTool))
        .with_tool(Arc::new(pose::tools::CountRepsTool))
        .with_tool(Arc::new(pose::tools::ScoreFormTool))
        .with_tool(Arc::new(nutrition::tools::ClassifyFoodTool))
        .with_tool(Arc::new(nutrition::tools::EstimatePortionTool))
        .with_tool(Arc::new(nutrition::tools::ComputeNutritionTool))
        .with_tool(Arc::new(nutrition::tools::SuggestImprovementsTool))
        .with_tool(Arc::new(mindfulness::tools::AnalyzeMoodTool))
        .with_tool(Arc::new(mindfulness::tools::GenerateLessonTool))
        .with_tool(Arc::new(mindfulness::tools::GenerateBreathingGuideTool))
        .with_tool(Arc::new(mindfulness::tools::CreateJournalPromptTool))
}

/// The standard agent set, one handler per closed variant.
pub fn standard_agents() -> Vec<Arc<dyn AgentHandler>> {
    vec![
        Arc::new(PoseAgent),
        Arc::new(NutritionAgent),
        Arc::new(MindfulnessAgent),
    ]
}
