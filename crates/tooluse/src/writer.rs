//! A ready-made "backend engineer" run.
//!
//! [`BackendWriter`] wires the pieces together for the common case: a
//! system prompt asking the model to write a Python backend, a registry
//! holding only [`SaveCodeTool`], and a recursion budget of five.

use std::sync::Arc;

use tracing::{info, warn};

use crate::chat::ChatMessage;
use crate::error::LoopError;
use crate::gateway::DynGateway;
use crate::store::ObjectStore;
use crate::tool::{
    DEFAULT_OBJECT_KEY, LoopObserverFn, LoopOutcome, RegistryError, SaveCodeTool, ToolLoopConfig,
    ToolLoopResult, ToolRegistry, tool_loop,
};

/// System prompt used when none is configured.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are a good backend engineer who writes python scripts for the applications based on the architecture you are given.
Then invoke the save_code tool to save the code.

- Explain your step-by-step process, and give brief updates before each step.
- For the code you write run tests to ensure it works as expected.
- Complete the entire process until you have all required data before sending the complete response.
- Only use the save_code tool for saving the final code version.
- Repeat the tool use for subsequent requests if necessary.
";

/// Recursion budget used when none is configured.
pub const DEFAULT_MAX_RECURSIONS: u32 = 5;

/// Settings for a [`BackendWriter`].
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// System prompt sent on every turn.
    pub system_prompt: String,
    /// Tool-use rounds allowed before the run is aborted.
    pub max_recursions: u32,
    /// Object key the generated code is saved under.
    pub object_key: String,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_recursions: DEFAULT_MAX_RECURSIONS,
            object_key: DEFAULT_OBJECT_KEY.to_string(),
        }
    }
}

/// Runs prompts through the tool loop with the code-persistence tool
/// registered.
pub struct BackendWriter {
    gateway: Arc<dyn DynGateway>,
    registry: ToolRegistry,
    config: WriterConfig,
    on_event: Option<LoopObserverFn>,
}

impl std::fmt::Debug for BackendWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendWriter")
            .field("gateway", &self.gateway.metadata())
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl BackendWriter {
    /// Creates a writer saving code into `store`.
    pub fn new(
        gateway: Arc<dyn DynGateway>,
        store: Arc<dyn ObjectStore>,
        config: WriterConfig,
    ) -> Result<Self, RegistryError> {
        let mut registry = ToolRegistry::new();
        registry.register(
            SaveCodeTool::spec(),
            SaveCodeTool::with_key(store, config.object_key.clone()),
        )?;
        Ok(Self {
            gateway,
            registry,
            config,
            on_event: None,
        })
    }

    /// Attaches an observer for loop events.
    #[must_use]
    pub fn with_observer(mut self, observer: LoopObserverFn) -> Self {
        self.on_event = Some(observer);
        self
    }

    /// The tools offered to the model.
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// The writer's settings.
    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    /// Runs one prompt to completion.
    ///
    /// Every run starts from an empty conversation.
    pub async fn run(&self, prompt: impl Into<String>) -> Result<ToolLoopResult, LoopError> {
        let metadata = self.gateway.metadata();
        info!(gateway = %metadata.name, model = %metadata.model, "starting backend writer run");

        let config = ToolLoopConfig {
            max_recursions: self.config.max_recursions,
            system_prompt: self.config.system_prompt.clone(),
            on_event: self.on_event.clone(),
            ..Default::default()
        };
        let result = tool_loop(
            self.gateway.as_ref(),
            &self.registry,
            ChatMessage::user(prompt),
            config,
        )
        .await?;

        match &result.outcome {
            LoopOutcome::Final { .. } => info!(
                gateway_calls = result.gateway_calls,
                tools = result.tool_calls_executed,
                "backend writer finished"
            ),
            LoopOutcome::Aborted { reason } => {
                warn!(?reason, "backend writer aborted; please try again");
            }
        }
        Ok(result)
    }
}
