//! # tooluse
//!
//! A bounded tool-use conversation loop for hosted language models.
//!
//! The loop sends a conversation to a model service, and whenever the
//! model stops to request a tool it runs the tool locally, feeds the
//! result back and asks again. It ends when the model produces a final
//! answer, or when a recursion budget runs out.
//!
//! This crate contains no backend-specific code. Concrete gateways live
//! in sibling crates and implement [`ModelGateway`] (or its object-safe
//! counterpart [`DynGateway`]).
//!
//! # Architecture
//!
//! ```text
//!  ┌──────────────────────┐
//!  │  tooluse-anthropic   │   AnthropicGateway
//!  └──────────┬───────────┘
//!             ▼
//!  ┌──────────────────────────────────────────────────┐
//!  │                     tooluse                      │
//!  │  ToolRegistry · Conversation · ModelGateway      │
//!  │  tool_loop · SaveCodeTool · BackendWriter        │
//!  └──────────────────────────────────────────────────┘
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use tooluse::store::FsObjectStore;
//! use tooluse::writer::{BackendWriter, WriterConfig};
//!
//! # async fn example(gateway: Arc<dyn tooluse::DynGateway>) -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(FsObjectStore::new("./out", "generated"));
//! let writer = BackendWriter::new(gateway, store, WriterConfig::default())?;
//!
//! let result = writer.run("Write a REST API for a todo list").await?;
//! if let Some(text) = result.outcome.text() {
//!     println!("{text}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`chat`] | Messages, content blocks and the conversation transcript |
//! | [`error`] | [`GatewayError`], [`LoopError`] and friends |
//! | [`gateway`] | The [`ModelGateway`] trait and turn types |
//! | [`tool`] | Tool registry, dispatch and the bounded loop |
//! | [`store`] | Blob storage behind the code-persistence tool |
//! | [`writer`] | The ready-made backend-writer run |
//! | [`provision`] | Polling remote resources until they are ready |

#![warn(missing_docs)]

pub mod chat;
pub mod error;
pub mod gateway;
pub mod provision;
pub mod store;
pub mod tool;
pub mod writer;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_helpers;

pub use chat::{ChatMessage, ChatRole, ContentBlock, Conversation, ToolResult, ToolUseRequest};
pub use error::{ConversationError, GatewayError, LoopError, MalformedTurn};
pub use gateway::{DynGateway, GatewayMetadata, ModelGateway, ModelTurn, StopReason, TurnRequest};
pub use tool::{ToolHandler, ToolLoopConfig, ToolRegistry, ToolSpec, tool_loop};
