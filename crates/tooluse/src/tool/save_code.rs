//! The code-persistence tool.

use std::sync::Arc;

use serde_json::{Value, json};

use super::{InputSchema, ToolError, ToolFuture, ToolHandler, ToolOutput, ToolSpec};
use crate::store::ObjectStore;

/// Object key the tool writes to unless configured otherwise.
pub const DEFAULT_OBJECT_KEY: &str = "backend.py";

/// Persists the `code` it is given to an [`ObjectStore`] under a fixed
/// key.
///
/// Every invocation overwrites the same object, so the store ends up
/// holding whatever the model saved last.
pub struct SaveCodeTool {
    store: Arc<dyn ObjectStore>,
    key: String,
}

impl std::fmt::Debug for SaveCodeTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaveCodeTool")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl SaveCodeTool {
    /// Name the tool is advertised under.
    pub const NAME: &'static str = "save_code";

    /// Creates the tool writing to [`DEFAULT_OBJECT_KEY`].
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self::with_key(store, DEFAULT_OBJECT_KEY)
    }

    /// Creates the tool writing to `key`.
    pub fn with_key(store: Arc<dyn ObjectStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// The key this tool writes to.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The spec to register this tool under.
    pub fn spec() -> ToolSpec {
        ToolSpec::new(
            Self::NAME,
            "Save the input code to the object store.",
            InputSchema::new(json!({
                "type": "object",
                "properties": {
                    "code": {
                        "type": "string",
                        "description": "The code to be saved"
                    }
                },
                "required": ["code"]
            })),
        )
    }
}

impl ToolHandler for SaveCodeTool {
    fn execute(&self, input: Value) -> ToolFuture<'_> {
        Box::pin(async move {
            let code = input
                .get("code")
                .and_then(Value::as_str)
                .ok_or_else(|| ToolError::new("'code' must be a string"))?;
            let location = self
                .store
                .put(&self.key, code.as_bytes())
                .await
                .map_err(|e| ToolError::new(format!("Failed to save code: {e}")))?;
            Ok::<_, ToolError>(ToolOutput::ok(format!("Output saved to {location}")))
        })
    }
}
