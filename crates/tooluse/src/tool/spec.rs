//! Tool specifications advertised to the model.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A JSON Schema document describing a tool's input.
///
/// Wraps a [`serde_json::Value`]. Validation compiles the schema with the
/// [`jsonschema`] crate; the registry does that once at registration.
///
/// ```rust
/// use tooluse::tool::InputSchema;
///
/// let schema = InputSchema::new(serde_json::json!({
///     "type": "object",
///     "properties": { "code": { "type": "string" } },
///     "required": ["code"]
/// }));
/// assert_eq!(schema.required_keys(), vec!["code"]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputSchema(Value);

impl InputSchema {
    /// Creates a schema from a raw JSON value.
    pub fn new(schema: Value) -> Self {
        Self(schema)
    }

    /// Returns the underlying JSON value.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Keys listed under the top-level `required` array.
    pub fn required_keys(&self) -> Vec<&str> {
        self.0
            .get("required")
            .and_then(Value::as_array)
            .map(|keys| keys.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Compiles the schema into a reusable validator.
    pub(crate) fn compile(&self) -> Result<jsonschema::Validator, String> {
        jsonschema::validator_for(&self.0).map_err(|e| e.to_string())
    }
}

/// A tool as advertised to the model: name, description, input schema.
///
/// The name is the registry key and must be unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Unique tool name, matched against [`ToolUseRequest::name`](crate::chat::ToolUseRequest::name).
    pub name: String,
    /// Tells the model when to use the tool.
    pub description: String,
    /// Shape of the expected input.
    #[serde(rename = "inputSchema")]
    pub input_schema: InputSchema,
}

impl ToolSpec {
    /// Creates a tool spec.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: InputSchema,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}
