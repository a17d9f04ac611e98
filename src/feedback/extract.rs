use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

// Greedy: first `{` to last `}` in the reply.
fn json_object_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("hard-coded pattern"))
}

/// Best-effort extraction of a brace-delimited JSON object embedded in
/// free-form model output. Returns `None` when no such substring exists or
/// it does not parse as an object.
pub fn extract_embedded_json(text: &str) -> Option<Value> {
    let matched = json_object_pattern().find(text)?;
    let value: Value = serde_json::from_str(matched.as_str()).ok()?;
    value.is_object().then_some(value)
}
