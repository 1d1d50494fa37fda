//! Tool output to text formatting policy.

use serde_json::Value;

/// Format a persisted tool output for a `toolResult` text block.
///
/// Policy, in order:
/// - absent output (or JSON null) is an empty string;
/// - an object whose `content` field is a list of text segments joins the
///   segment texts with newlines;
/// - any other object or array serializes to its canonical JSON form;
/// - a JSON string is used as-is;
/// - remaining scalars use their JSON display form.
///
/// Identical input always yields identical output.
#[must_use]
pub fn format_tool_output(output: Option<&Value>) -> String {
    let Some(value) = output else {
        return String::new();
    };

    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Object(map) => {
            if let Some(Value::Array(items)) = map.get("content")
                && let Some(segments) = text_segments(items)
            {
                return segments.join("\n");
            }
            canonical(value)
        }
        Value::Array(_) => canonical(value),
        other => other.to_string(),
    }
}

/// All items must be `{"text": …}` segments for the join form to apply;
/// a mixed content list falls back to canonical serialization.
fn text_segments(items: &[Value]) -> Option<Vec<&str>> {
    items
        .iter()
        .map(|item| item.get("text").and_then(Value::as_str))
        .collect()
}

fn canonical(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_output_is_empty() {
        assert_eq!(format_tool_output(None), "");
        assert_eq!(format_tool_output(Some(&Value::Null)), "");
    }

    #[test]
    fn content_segments_join_with_newline() {
        let output = json!({"content": [{"text": "one"}, {"text": "two"}]});
        assert_eq!(format_tool_output(Some(&output)), "one\ntwo");
    }

    #[test]
    fn mixed_content_list_falls_back_to_canonical() {
        let output = json!({"content": [{"text": "one"}, {"image": "..."}]});
        assert_eq!(
            format_tool_output(Some(&output)),
            serde_json::to_string(&output).unwrap()
        );
    }

    #[test]
    fn plain_object_serializes_canonically() {
        let output = json!({"exit_code": 0, "stdout": "ok"});
        assert_eq!(
            format_tool_output(Some(&output)),
            serde_json::to_string(&output).unwrap()
        );
    }

    #[test]
    fn string_output_is_used_verbatim() {
        let output = json!("already text");
        assert_eq!(format_tool_output(Some(&output)), "already text");
    }

    #[test]
    fn scalar_output_uses_display_form() {
        assert_eq!(format_tool_output(Some(&json!(42))), "42");
        assert_eq!(format_tool_output(Some(&json!(true))), "true");
    }

    #[test]
    fn deterministic_for_identical_input() {
        let output = json!({"b": 1, "a": 2});
        let first = format_tool_output(Some(&output));
        let second = format_tool_output(Some(&output));
        assert_eq!(first, second);
    }
}
