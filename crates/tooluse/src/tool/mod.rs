//! Tool registration, dispatch and the bounded tool-use loop.
//!
//! # Architecture
//!
//! ```text
//!   ToolSpec + ToolHandler - what the model sees + what runs
//!       │
//!   ToolRegistry           - stores tools by name, validates & dispatches
//!       │
//!   tool_loop()            - model turn → dispatch → feedback, bounded
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use tooluse::ChatMessage;
//! use tooluse::store::MemoryObjectStore;
//! use tooluse::tool::{SaveCodeTool, ToolLoopConfig, ToolRegistry, tool_loop};
//!
//! # async fn example(gateway: &dyn tooluse::DynGateway) -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MemoryObjectStore::new("generated"));
//! let mut registry = ToolRegistry::new();
//! registry.register(SaveCodeTool::spec(), SaveCodeTool::new(store))?;
//!
//! let config = ToolLoopConfig {
//!     system_prompt: "You write Python and save it with save_code.".into(),
//!     ..Default::default()
//! };
//! let result = tool_loop(
//!     gateway,
//!     &registry,
//!     ChatMessage::user("Write a hello-world HTTP server"),
//!     config,
//! )
//! .await?;
//!
//! match result.outcome.text() {
//!     Some(text) => println!("{text}"),
//!     None => eprintln!("model kept requesting tools"),
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod handler;
mod loop_core;
mod loop_sync;
mod output;
mod registry;
mod save_code;
mod spec;

pub use config::{
    AbortReason, FinalText, LoopEvent, LoopObserverFn, LoopOutcome, ToolLoopConfig,
    ToolLoopResult,
};
pub use error::{RegistryError, ToolError};
pub use handler::{FnToolHandler, ToolFuture, ToolHandler, tool_fn};
pub use loop_sync::tool_loop;
pub use output::{ToolInvocationResult, ToolOutput};
pub use registry::ToolRegistry;
pub use save_code::{DEFAULT_OBJECT_KEY, SaveCodeTool};
pub use spec::{InputSchema, ToolSpec};

#[cfg(test)]
mod tests;
