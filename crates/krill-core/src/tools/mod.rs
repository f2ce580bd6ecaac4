//! Tool runtime.
//!
//! Tools are long-running, cancellable operations registered once and
//! executed on behalf of an LLM driver or a human command. Execution is
//! gated on the declared parameter schema, observes an advisory
//! cancellation signal, and may stream partial results before the final
//! one.

pub mod registry;
pub mod render;

pub use registry::{Tool, ToolRegistry};
pub use render::RenderOptions;

use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;

/// Content block within a tool result.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    Image { mime_type: String, data: String },
}

/// Result of executing a tool.
///
/// `details` is renderer-only payload: it is handed to `render_result`
/// and never shown verbatim to the human.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ToolResult {
    pub content: Vec<ContentBlock>,
    pub is_error: bool,
    pub cancelled: bool,
    pub details: Option<Value>,
}

impl ToolResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text { text: text.into() }],
            ..Default::default()
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text {
                text: message.into(),
            }],
            is_error: true,
            ..Default::default()
        }
    }

    /// Schema mismatch, surfaced as a failed result so the driving
    /// agent can react to it.
    pub fn invalid_parameters(message: impl std::fmt::Display) -> Self {
        Self::error(format!("Invalid parameters: {message}"))
    }

    /// Cooperative cancellation. A normal result variant, not an error.
    pub fn interrupted() -> Self {
        Self {
            content: vec![ContentBlock::Text {
                text: "Cancelled".to_string(),
            }],
            cancelled: true,
            ..Default::default()
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Concatenated text content, for logs and renderers.
    pub fn text_content(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                ContentBlock::Image { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// LLM-facing description of a registered tool.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// A partial result emitted while a tool is still running.
#[derive(Debug, Clone)]
pub struct ToolProgress {
    pub call_id: String,
    pub result: ToolResult,
}

/// Handle a tool uses to stream partial results.
///
/// Each emitted partial has the same shape as the final result and is
/// superseded by the next one, and ultimately by the return value.
#[derive(Clone)]
pub struct ProgressSender {
    call_id: String,
    tx: Option<mpsc::UnboundedSender<ToolProgress>>,
}

impl ProgressSender {
    pub fn new(call_id: impl Into<String>, tx: mpsc::UnboundedSender<ToolProgress>) -> Self {
        Self {
            call_id: call_id.into(),
            tx: Some(tx),
        }
    }

    /// A sender that drops every partial; for callers that do not
    /// display incremental output.
    pub fn disabled(call_id: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            tx: None,
        }
    }

    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    pub fn emit(&self, partial: ToolResult) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(ToolProgress {
                call_id: self.call_id.clone(),
                result: partial,
            });
        }
    }
}

/// Registration and lookup failures.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("tool '{name}' is already registered")]
    DuplicateTool { name: String },

    #[error("unknown tool '{name}'")]
    UnknownTool { name: String },
}

/// Check `params` against a declared JSON schema before execution.
///
/// This is a structural check on the top level: required properties must
/// be present, present properties must match their declared primitive
/// type, and unknown properties are rejected when the schema says
/// `additionalProperties: false`. Tools still deserialize into their own
/// parameter structs; this gate exists so a mismatch fails before the
/// tool body runs.
pub fn validate_params(schema: &Value, params: &Value) -> Result<(), String> {
    if schema.get("type").and_then(Value::as_str) != Some("object") {
        return Ok(());
    }

    let Some(params_object) = params.as_object() else {
        return Err(format!("expected an object, got {}", json_type_name(params)));
    };

    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for name in required.iter().filter_map(Value::as_str) {
            if !params_object.contains_key(name) {
                return Err(format!("missing required property '{name}'"));
            }
        }
    }

    let properties = schema.get("properties").and_then(Value::as_object);

    if schema.get("additionalProperties") == Some(&Value::Bool(false)) {
        for name in params_object.keys() {
            if properties.map_or(true, |props| !props.contains_key(name)) {
                return Err(format!("unknown property '{name}'"));
            }
        }
    }

    if let Some(properties) = properties {
        for (name, declared) in properties {
            let Some(value) = params_object.get(name) else {
                continue;
            };
            let Some(expected) = declared.get("type").and_then(Value::as_str) else {
                continue;
            };
            if !json_type_matches(expected, value) {
                return Err(format!(
                    "property '{name}' expected {expected}, got {}",
                    json_type_name(value)
                ));
            }
        }
    }

    Ok(())
}

fn json_type_matches(expected: &str, value: &Value) -> bool {
    match expected {
        "string" => value.is_string(),
        "boolean" => value.is_boolean(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn todo_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "action": { "type": "string" },
                "count": { "type": "integer" },
                "done": { "type": "boolean" }
            },
            "required": ["action"],
            "additionalProperties": false
        })
    }

    #[test]
    fn accepts_matching_params() {
        let params = json!({ "action": "add", "count": 2, "done": false });
        assert!(validate_params(&todo_schema(), &params).is_ok());
    }

    #[test]
    fn rejects_missing_required_property() {
        let err = validate_params(&todo_schema(), &json!({ "count": 1 })).unwrap_err();
        assert!(err.contains("action"));
    }

    #[test]
    fn rejects_wrong_primitive_type() {
        let err =
            validate_params(&todo_schema(), &json!({ "action": 7 })).unwrap_err();
        assert!(err.contains("expected string"));
    }

    #[test]
    fn rejects_unknown_property_when_schema_is_closed() {
        let err = validate_params(&todo_schema(), &json!({ "action": "a", "extra": 1 }))
            .unwrap_err();
        assert!(err.contains("extra"));
    }

    #[test]
    fn rejects_non_object_params() {
        assert!(validate_params(&todo_schema(), &json!("list")).is_err());
    }

    #[test]
    fn non_object_schema_is_not_enforced() {
        assert!(validate_params(&json!({}), &json!("anything")).is_ok());
    }

    #[test]
    fn text_content_skips_image_blocks() {
        let result = ToolResult {
            content: vec![
                ContentBlock::Text {
                    text: "first".to_string(),
                },
                ContentBlock::Image {
                    mime_type: "image/png".to_string(),
                    data: "...".to_string(),
                },
                ContentBlock::Text {
                    text: "second".to_string(),
                },
            ],
            ..Default::default()
        };
        assert_eq!(result.text_content(), "first\nsecond");
    }
}
