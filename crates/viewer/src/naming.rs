//! Entry titles for the viewer list.

use serde_json::Value;

const UNKNOWN: &str = "unknown data";

/// Title for an entry payload: its string `event` field when present,
/// otherwise the first key path flattened to depth 2, otherwise a
/// placeholder.
pub fn event_name(payload: &Value) -> String {
    if let Some(name) = payload.get("event").and_then(Value::as_str) {
        if !name.is_empty() {
            return name.to_string();
        }
    }
    first_key_path(payload, 2).unwrap_or_else(|| UNKNOWN.to_string())
}

/// First key of `value`, descending into its first child up to `depth`.
fn first_key_path(value: &Value, depth: usize) -> Option<String> {
    let object = value.as_object()?;
    let (key, child) = object.iter().next()?;
    if depth <= 1 {
        return Some(key.clone());
    }
    match first_key_path(child, depth - 1) {
        Some(rest) if !rest.is_empty() => Some(format!("{key}.{rest}")),
        _ => Some(key.clone()),
    }
}
