//! Final-text extraction from a delegating backend's structured result.
//!
//! Supervisor services have returned several nested shapes over time; the
//! shapes are tried in a fixed priority order and the whole payload is
//! stringified as a last resort, so extraction never fails.

use serde_json::Value;

/// Which shape yielded the text. Logged so a shape drift is diagnosable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExtractionPath {
    /// `response.content[]` items concatenated.
    ResponseContent,
    /// `response.message`.
    ResponseMessage,
    /// `response` was itself a string.
    ResponseString,
    /// `response` was some other value, stringified.
    ResponseOther,
    /// Top-level `content[]` items concatenated.
    Content,
    /// Top-level `message`.
    Message,
    /// No known shape; the whole body stringified.
    Stringified,
}

/// Extract the final report text from a structured result body.
pub fn extract_final_text(body: &Value) -> (String, ExtractionPath) {
    if let Some(response) = body.get("response") {
        if let Some(items) = response.get("content").and_then(Value::as_array) {
            return (concat_content(items), ExtractionPath::ResponseContent);
        }
        if let Some(message) = response.get("message") {
            return (value_text(message), ExtractionPath::ResponseMessage);
        }
        if let Some(text) = response.as_str() {
            return (text.to_string(), ExtractionPath::ResponseString);
        }
        return (response.to_string(), ExtractionPath::ResponseOther);
    }
    if let Some(items) = body.get("content").and_then(Value::as_array) {
        return (concat_content(items), ExtractionPath::Content);
    }
    if let Some(message) = body.get("message") {
        return (value_text(message), ExtractionPath::Message);
    }
    (body.to_string(), ExtractionPath::Stringified)
}

/// Concatenate a content array: `text` fields of object items, string items
/// verbatim, anything else stringified.
fn concat_content(items: &[Value]) -> String {
    items
        .iter()
        .map(|item| match item {
            Value::String(text) => text.clone(),
            other => other
                .get("text")
                .map_or_else(|| other.to_string(), value_text),
        })
        .collect()
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
