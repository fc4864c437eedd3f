//! Tool registry: specs and handlers indexed by name.

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde_json::Value;
use tracing::{debug, warn};

use super::{RegistryError, ToolHandler, ToolInvocationResult, ToolSpec};

struct RegisteredTool {
    spec: ToolSpec,
    validator: Arc<jsonschema::Validator>,
    handler: Arc<dyn ToolHandler>,
}

impl Clone for RegisteredTool {
    fn clone(&self) -> Self {
        Self {
            spec: self.spec.clone(),
            validator: Arc::clone(&self.validator),
            handler: Arc::clone(&self.handler),
        }
    }
}

/// A registry of tools, indexed by name.
///
/// Registrations are configuration: build the registry before a run and
/// share it read-only afterwards. The registry holds no per-call state,
/// so dispatch results depend only on the tool name and input.
///
/// Dispatch never fails at the outer level. Unknown tools, input that
/// does not match the schema, handler errors and handler panics all come
/// back as [`ToolInvocationResult::Error`] so a single bad tool call
/// cannot end the conversation.
///
/// ```rust
/// use tooluse::tool::{InputSchema, ToolRegistry, ToolSpec, tool_fn};
/// use serde_json::{json, Value};
///
/// let mut registry = ToolRegistry::new();
/// registry
///     .register(
///         ToolSpec::new(
///             "shout",
///             "Upper-case some text",
///             InputSchema::new(json!({
///                 "type": "object",
///                 "properties": {"text": {"type": "string"}},
///                 "required": ["text"]
///             })),
///         ),
///         tool_fn(|input: Value| async move {
///             Ok(input["text"].as_str().unwrap_or_default().to_uppercase())
///         }),
///     )
///     .unwrap();
///
/// assert!(registry.contains("shout"));
/// ```
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: BTreeMap<String, RegisteredTool>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ToolRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool.
    ///
    /// Fails with [`RegistryError::DuplicateToolName`] if the name is
    /// taken, or [`RegistryError::InvalidSchema`] if the input schema
    /// does not compile.
    pub fn register(
        &mut self,
        spec: ToolSpec,
        handler: impl ToolHandler + 'static,
    ) -> Result<&mut Self, RegistryError> {
        self.register_shared(spec, Arc::new(handler))
    }

    /// Registers a tool backed by a shared handler.
    pub fn register_shared(
        &mut self,
        spec: ToolSpec,
        handler: Arc<dyn ToolHandler>,
    ) -> Result<&mut Self, RegistryError> {
        if self.tools.contains_key(&spec.name) {
            return Err(RegistryError::DuplicateToolName(spec.name));
        }
        let validator = spec
            .input_schema
            .compile()
            .map_err(|message| RegistryError::InvalidSchema {
                name: spec.name.clone(),
                message,
            })?;
        self.tools.insert(
            spec.name.clone(),
            RegisteredTool {
                spec,
                validator: Arc::new(validator),
                handler,
            },
        );
        Ok(self)
    }

    /// Specs of all registered tools, sorted by name.
    ///
    /// Advertise these to the model on every turn.
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.values().map(|t| t.spec.clone()).collect()
    }

    /// The spec registered under `name`.
    pub fn get_spec(&self, name: &str) -> Option<&ToolSpec> {
        self.tools.get(name).map(|t| &t.spec)
    }

    /// Whether a tool with the given name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether no tools are registered.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Validates `input` and invokes the named tool.
    ///
    /// 1. Looks up the tool by name
    /// 2. Checks that the input is an object matching the input schema
    /// 3. Runs the handler, catching both errors and panics
    ///
    /// The handler's output is returned verbatim on success.
    pub async fn dispatch(&self, name: &str, input: Value) -> ToolInvocationResult {
        let Some(tool) = self.tools.get(name) else {
            warn!(tool = name, "model requested unknown tool");
            return ToolInvocationResult::error(format!(
                "The requested tool with name '{name}' does not exist."
            ));
        };

        if !input.is_object() {
            return ToolInvocationResult::error(format!(
                "Invalid input for tool '{name}': expected a JSON object"
            ));
        }

        let violations: Vec<String> = tool
            .validator
            .iter_errors(&input)
            .map(|e| e.to_string())
            .collect();
        if !violations.is_empty() {
            debug!(tool = name, ?violations, "tool input rejected");
            return ToolInvocationResult::error(format!(
                "Invalid input for tool '{name}': {}",
                violations.join("; ")
            ));
        }

        let handler = Arc::clone(&tool.handler);
        let started = std::panic::catch_unwind(AssertUnwindSafe(|| handler.execute(input)));
        let outcome = match started {
            Ok(fut) => AssertUnwindSafe(fut).catch_unwind().await,
            Err(payload) => Err(payload),
        };

        match outcome {
            Ok(Ok(output)) => ToolInvocationResult::Success(output),
            Ok(Err(e)) => {
                warn!(tool = name, error = %e, "tool handler failed");
                ToolInvocationResult::error(e.message)
            }
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                warn!(tool = name, %reason, "tool handler panicked");
                ToolInvocationResult::error(format!("Tool '{name}' panicked: {reason}"))
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
