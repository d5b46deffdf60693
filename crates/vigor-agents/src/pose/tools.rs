//! Pose analysis tool suite: keypoint extraction, geometric form checks,
//! rep counting, and form scoring.
//!
//! Keypoint extraction is a placeholder for a real pose model (MediaPipe
//! or MoveNet in production). The geometric checks downstream operate on
//! normalized image coordinates and are model-agnostic.

use async_trait::async_trait;
use serde_json::{Value, json};
use vigor_core::{ParamKind, ParamSchema, ToolError, ToolKind, ToolRuntime};

/// One detected form fault in a single frame.
struct FormFault {
    kind: &'static str,
    severity: f64,
    message: &'static str,
    recommendation: &'static str,
}

fn coord(keypoints: &Value, joint: &str, axis: &str, default: f64) -> f64 {
    keypoints
        .get(joint)
        .and_then(|j| j.get(axis))
        .and_then(Value::as_f64)
        .unwrap_or(default)
}

/// A neutral standing pose in normalized image coordinates.
fn canonical_pose() -> Value {
    json!({
        "left_shoulder":  {"x": 0.3,  "y": 0.2, "z": 0.0, "visibility": 0.9},
        "right_shoulder": {"x": 0.7,  "y": 0.2, "z": 0.0, "visibility": 0.9},
        "left_elbow":     {"x": 0.25, "y": 0.4, "z": 0.0, "visibility": 0.85},
        "right_elbow":    {"x": 0.75, "y": 0.4, "z": 0.0, "visibility": 0.85},
        "left_hip":       {"x": 0.35, "y": 0.5, "z": 0.0, "visibility": 0.9},
        "right_hip":      {"x": 0.65, "y": 0.5, "z": 0.0, "visibility": 0.9},
        "left_knee":      {"x": 0.35, "y": 0.7, "z": 0.0, "visibility": 0.85},
        "right_knee":     {"x": 0.65, "y": 0.7, "z": 0.0, "visibility": 0.85},
        "left_ankle":     {"x": 0.35, "y": 0.9, "z": 0.0, "visibility": 0.8},
        "right_ankle":    {"x": 0.65, "y": 0.9, "z": 0.0, "visibility": 0.8},
    })
}

/// Extract pose keypoints from one video frame.
///
/// Placeholder inference: returns the canonical pose, overlaid with any
/// joints the frame already carries under `keypoints` (upstream capture
/// pipelines may run their own estimator).
pub struct ExtractKeypointsTool;

#[async_trait]
impl ToolRuntime for ExtractKeypointsTool {
    fn kind(&self) -> ToolKind {
        ToolKind::ExtractKeypoints
    }

    fn schema(&self) -> ParamSchema {
        ParamSchema::new()
            .required("frame", ParamKind::Object)
            .optional("model", ParamKind::String)
    }

    async fn run(&self, params: &Value) -> Result<Value, ToolError> {
        let model = params
            .get("model")
            .and_then(Value::as_str)
            .unwrap_or("mediapipe");

        let mut keypoints = canonical_pose();
        let overrides = params
            .get("frame")
            .and_then(|f| f.get("keypoints"))
            .and_then(Value::as_object);
        if let (Value::Object(joints), Some(overrides)) = (&mut keypoints, overrides) {
            for (joint, value) in overrides {
                joints.insert(joint.clone(), value.clone());
            }
        }

        Ok(json!({
            "keypoints": keypoints,
            "model": model,
        }))
    }
}

/// Detect exercise form errors from a keypoint sequence.
pub struct DetectFormErrorsTool;

fn frame_faults(exercise: &str, keypoints: &Value) -> Vec<FormFault> {
    let mut faults = Vec::new();
    match exercise {
        "squat" => {
            let knee_x = coord(keypoints, "left_knee", "x", 0.0);
            let ankle_x = coord(keypoints, "left_ankle", "x", 0.0);
            if (knee_x - ankle_x).abs() > 0.1 {
                faults.push(FormFault {
                    kind: "knee_valgus",
                    severity: 0.7,
                    message: "Knees tracking inward - keep them aligned with ankles",
                    recommendation: "Focus on pushing knees out over toes",
                });
            }
        }
        "pushup" => {
            let hip_y = coord(keypoints, "left_hip", "y", 0.0);
            let shoulder_y = coord(keypoints, "left_shoulder", "y", 0.0);
            if hip_y - shoulder_y > 0.15 {
                faults.push(FormFault {
                    kind: "torso_sag",
                    severity: 0.6,
                    message: "Torso sagging - engage core and maintain straight line",
                    recommendation: "Tighten your core and keep your body straight",
                });
            }
        }
        "bicep_curl" => {
            let elbow_x = coord(keypoints, "left_elbow", "x", 0.0);
            let shoulder_x = coord(keypoints, "left_shoulder", "x", 0.0);
            if (elbow_x - shoulder_x).abs() > 0.2 {
                faults.push(FormFault {
                    kind: "elbow_swing",
                    severity: 0.65,
                    message: "Elbows moving forward - keep them close to your body",
                    recommendation: "Control the weight, avoid swinging",
                });
            }
        }
        "tricep_extension" => {
            let elbow_y = coord(keypoints, "left_elbow", "y", 0.0);
            let shoulder_y = coord(keypoints, "left_shoulder", "y", 0.0);
            // The upper arm should stay pinned, not drift level with
            // the shoulder.
            if (elbow_y - shoulder_y).abs() < 0.05 {
                faults.push(FormFault {
                    kind: "upper_arm_movement",
                    severity: 0.6,
                    message: "Upper arm moving - keep it stationary",
                    recommendation: "Lock your upper arm in place",
                });
            }
        }
        "chest_press" => {
            let elbow_x = coord(keypoints, "left_elbow", "x", 0.0);
            let shoulder_x = coord(keypoints, "left_shoulder", "x", 0.0);
            if (elbow_x - shoulder_x).abs() > 0.3 {
                faults.push(FormFault {
                    kind: "elbow_flare",
                    severity: 0.7,
                    message: "Elbows flaring out - keep them at 45-60 degrees",
                    recommendation: "Keep elbows closer to body",
                });
            }
        }
        "shoulder_press" => {
            let shoulder_x = coord(keypoints, "left_shoulder", "x", 0.0);
            let hip_x = coord(keypoints, "left_hip", "x", 0.0);
            if shoulder_x < hip_x - 0.1 {
                faults.push(FormFault {
                    kind: "back_arch",
                    severity: 0.65,
                    message: "Excessive back arch - engage core",
                    recommendation: "Keep core tight and avoid arching",
                });
            }
        }
        "lunge" => {
            let knee_x = coord(keypoints, "left_knee", "x", 0.0);
            let ankle_x = coord(keypoints, "left_ankle", "x", 0.0);
            if (knee_x - ankle_x).abs() > 0.15 {
                faults.push(FormFault {
                    kind: "knee_position",
                    severity: 0.7,
                    message: "Knee not aligned with ankle - step forward more",
                    recommendation: "Keep front knee over ankle",
                });
            }
        }
        "plank" => {
            let hip_y = coord(keypoints, "left_hip", "y", 0.0);
            let shoulder_y = coord(keypoints, "left_shoulder", "y", 0.0);
            if hip_y > shoulder_y + 0.1 {
                faults.push(FormFault {
                    kind: "hip_sag",
                    severity: 0.7,
                    message: "Hips sagging - engage core and glutes",
                    recommendation: "Tighten core and squeeze glutes",
                });
            } else if hip_y < shoulder_y - 0.1 {
                faults.push(FormFault {
                    kind: "hip_raised",
                    severity: 0.6,
                    message: "Hips too high - lower to straight line",
                    recommendation: "Lower hips to align with shoulders",
                });
            }
        }
        "row" => {
            let elbow_x = coord(keypoints, "left_elbow", "x", 0.0);
            let shoulder_x = coord(keypoints, "left_shoulder", "x", 0.0);
            if elbow_x > shoulder_x + 0.1 {
                faults.push(FormFault {
                    kind: "shoulder_retraction",
                    severity: 0.65,
                    message: "Not retracting shoulder blades - pull elbows back",
                    recommendation: "Squeeze shoulder blades together",
                });
            }
        }
        _ => {}
    }
    faults
}

#[async_trait]
impl ToolRuntime for DetectFormErrorsTool {
    fn kind(&self) -> ToolKind {
        ToolKind::DetectFormErrors
    }

    fn schema(&self) -> ParamSchema {
        ParamSchema::new()
            .required("keypoints_list", ParamKind::Array)
            .required("exercise_type", ParamKind::String)
    }

    async fn run(&self, params: &Value) -> Result<Value, ToolError> {
        let frames = params["keypoints_list"].as_array().cloned().unwrap_or_default();
        let exercise = params["exercise_type"].as_str().unwrap_or("squat");

        let mut errors = Vec::new();
        let mut recommendations: Vec<&'static str> = Vec::new();
        for frame in &frames {
            let keypoints = frame.get("keypoints").cloned().unwrap_or(Value::Null);
            for fault in frame_faults(exercise, &keypoints) {
                errors.push(json!({
                    "type": fault.kind,
                    "severity": fault.severity,
                    "message": fault.message,
                }));
                if !recommendations.contains(&fault.recommendation) {
                    recommendations.push(fault.recommendation);
                }
            }
        }

        let mut top_errors = errors.clone();
        top_errors.sort_by(|a, b| {
            let sa = a["severity"].as_f64().unwrap_or(0.0);
            let sb = b["severity"].as_f64().unwrap_or(0.0);
            sb.partial_cmp(&sa).unwrap_or(std::cmp::Ordering::Equal)
        });
        top_errors.truncate(3);

        Ok(json!({
            "errors": errors,
            "top_errors": top_errors,
            "recommendations": recommendations,
            "exercise_type": exercise,
        }))
    }
}

/// Count repetitions from a keypoint sequence.
///
/// Frame-count heuristics stand in for real peak detection over joint
/// trajectories. Sequences of ten frames or fewer count as zero reps
/// for rep-based exercises; planks are held, not repeated.
pub struct CountRepsTool;

#[async_trait]
impl ToolRuntime for CountRepsTool {
    fn kind(&self) -> ToolKind {
        ToolKind::CountReps
    }

    fn schema(&self) -> ParamSchema {
        ParamSchema::new()
            .required("keypoints_list", ParamKind::Array)
            .required("exercise_type", ParamKind::String)
    }

    async fn run(&self, params: &Value) -> Result<Value, ToolError> {
        let frames = params["keypoints_list"].as_array().map_or(0, |f| f.len());
        let exercise = params["exercise_type"].as_str().unwrap_or("squat");

        let rep_count = match exercise {
            "squat" => counted(frames, 30),
            "bicep_curl" | "tricep_extension" | "shoulder_press" => counted(frames, 25),
            "lunge" => counted(frames, 40),
            "plank" => 0,
            _ => (frames / 20).max(1),
        };

        Ok(json!({
            "rep_count": rep_count,
            "exercise_type": exercise,
            "frames_analyzed": frames,
        }))
    }
}

fn counted(frames: usize, frames_per_rep: usize) -> usize {
    if frames > 10 {
        (frames / frames_per_rep).max(1)
    } else {
        0
    }
}

/// Calculate the overall form score from detected errors.
///
/// Starts at 100 and subtracts ten points per unit of error severity,
/// clamped to [0, 100].
pub struct ScoreFormTool;

#[async_trait]
impl ToolRuntime for ScoreFormTool {
    fn kind(&self) -> ToolKind {
        ToolKind::ScoreForm
    }

    fn schema(&self) -> ParamSchema {
        ParamSchema::new()
            .required("form_errors", ParamKind::Object)
            .optional("rep_count", ParamKind::Integer)
            .optional("exercise_type", ParamKind::String)
    }

    async fn run(&self, params: &Value) -> Result<Value, ToolError> {
        let errors = params["form_errors"]["errors"]
            .as_array()
            .cloned()
            .unwrap_or_default();
        let rep_count = params.get("rep_count").and_then(Value::as_u64).unwrap_or(0);
        let exercise = params
            .get("exercise_type")
            .and_then(Value::as_str)
            .unwrap_or("squat");

        let mut score = 100.0;
        for error in &errors {
            score -= error["severity"].as_f64().unwrap_or(0.5) * 10.0;
        }
        let overall_score = (score.clamp(0.0, 100.0) * 10.0).round() / 10.0;

        let grade = if overall_score >= 90.0 {
            "Excellent"
        } else if overall_score >= 75.0 {
            "Good"
        } else if overall_score >= 60.0 {
            "Fair"
        } else {
            "Needs Improvement"
        };

        Ok(json!({
            "overall_score": overall_score,
            "grade": grade,
            "error_count": errors.len(),
            "rep_count": rep_count,
            "exercise_type": exercise,
        }))
    }
}
