//! Payload sanitization helpers.
//!
//! Sanitization rewrites flagged content instead of silently dropping it:
//! sentences containing a flagged keyword are removed from string fields,
//! the rest of the payload keeps its structure, and the caller appends a
//! disclaimer for every rewrite so nothing disappears unannounced.

use serde_json::Value;

/// Validator-owned metadata field. Exempt from matching and scrubbing,
/// otherwise a disclaimer mentioning "medical advice" would trip the
/// very rule that attached it.
pub const DISCLAIMERS_FIELD: &str = "disclaimers";

/// Flatten a payload to lowercase text for matching.
///
/// Matching runs over the compact JSON encoding, so keys and nested values
/// are all visible to keyword and regex rules. The top-level
/// [`DISCLAIMERS_FIELD`] is excluded.
pub fn payload_text(payload: &Value) -> String {
    match payload {
        Value::Object(fields) => {
            let content: serde_json::Map<String, Value> = fields
                .iter()
                .filter(|(key, _)| key.as_str() != DISCLAIMERS_FIELD)
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();
            Value::Object(content).to_string().to_lowercase()
        }
        other => other.to_string().to_lowercase(),
    }
}

fn contains_keyword(text: &str, keywords: &[String]) -> bool {
    let lower = text.to_lowercase();
    keywords.iter().any(|k| lower.contains(k.as_str()))
}

/// Remove sentences containing any flagged keyword from a text block.
pub fn scrub_text(text: &str, keywords: &[String]) -> String {
    text.split_inclusive(['.', '!', '?'])
        .filter(|sentence| !contains_keyword(sentence, keywords))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Recursively rewrite every string field in a payload.
///
/// Returns the sanitized payload and whether anything changed.
pub fn scrub_value(payload: &Value, keywords: &[String]) -> (Value, bool) {
    match payload {
        Value::String(text) => {
            if contains_keyword(text, keywords) {
                (Value::String(scrub_text(text, keywords)), true)
            } else {
                (payload.clone(), false)
            }
        }
        Value::Array(items) => {
            let mut changed = false;
            let scrubbed = items
                .iter()
                .map(|item| {
                    let (value, item_changed) = scrub_value(item, keywords);
                    changed |= item_changed;
                    value
                })
                .collect();
            (Value::Array(scrubbed), changed)
        }
        Value::Object(fields) => {
            let mut changed = false;
            let scrubbed = fields
                .iter()
                .map(|(key, value)| {
                    if key == DISCLAIMERS_FIELD {
                        return (key.clone(), value.clone());
                    }
                    let (scrubbed_value, field_changed) = scrub_value(value, keywords);
                    changed |= field_changed;
                    (key.clone(), scrubbed_value)
                })
                .collect();
            (Value::Object(scrubbed), changed)
        }
        _ => (payload.clone(), false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keywords() -> Vec<String> {
        vec!["diagnose".to_string(), "prescription".to_string()]
    }

    #[test]
    fn scrub_text_removes_only_flagged_sentences() {
        let text = "Great form today. We can diagnose your knee pain! Keep training.";
        let scrubbed = scrub_text(text, &keywords());
        assert!(scrubbed.contains("Great form today."));
        assert!(scrubbed.contains("Keep training."));
        assert!(!scrubbed.to_lowercase().contains("diagnose"));
    }

    #[test]
    fn scrub_value_walks_nested_structures() {
        let payload = json!({
            "micro_lesson": {
                "lesson_text": "Breathe deeply. Ask us to diagnose your fatigue."
            },
            "tips": ["Stay hydrated.", "Get a prescription for rest."],
            "rep_count": 12,
        });
        let (scrubbed, changed) = scrub_value(&payload, &keywords());
        assert!(changed);
        assert!(
            !scrubbed["micro_lesson"]["lesson_text"]
                .as_str()
                .unwrap()
                .to_lowercase()
                .contains("diagnose")
        );
        assert_eq!(scrubbed["tips"][0], "Stay hydrated.");
        assert_eq!(scrubbed["tips"][1], "");
        assert_eq!(scrubbed["rep_count"], 12);
    }

    #[test]
    fn attached_disclaimers_are_exempt() {
        let payload = json!({
            "text": "All good here.",
            "disclaimers": ["Never a prescription, just a suggestion."],
        });
        assert!(!payload_text(&payload).contains("prescription"));
        let (scrubbed, changed) = scrub_value(&payload, &keywords());
        assert!(!changed);
        assert_eq!(scrubbed, payload);
    }

    #[test]
    fn clean_payloads_pass_through_unchanged() {
        let payload = json!({"text": "All good here."});
        let (scrubbed, changed) = scrub_value(&payload, &keywords());
        assert!(!changed);
        assert_eq!(scrubbed, payload);
    }
}
