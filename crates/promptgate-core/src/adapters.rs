//! Upstream response-shape adapter
//!
//! Providers disagree on where generated text lives in a completion
//! body. The extraction here tolerates the shapes seen in the wild:
//!
//! - `choices[].message.content` (OpenAI chat completions)
//! - `choices[].text` (legacy completions)
//! - `message.content` (single-message providers)
//!
//! Multiple choices are joined with a blank line.

use serde_json::Value;

/// Extract the generated text from an upstream completion body.
///
/// Returns `None` when no recognized text path is present.
pub fn extract_output_text(body: &Value) -> Option<String> {
    if let Some(choices) = body.get("choices").and_then(Value::as_array) {
        let parts: Vec<&str> = choices
            .iter()
            .filter_map(|choice| {
                choice
                    .get("message")
                    .and_then(|m| m.get("content"))
                    .and_then(Value::as_str)
                    .or_else(|| choice.get("text").and_then(Value::as_str))
            })
            .collect();

        if !parts.is_empty() {
            return Some(parts.join("\n\n"));
        }
    }

    body.get("message")
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
        .map(str::to_owned)
}
