//! Anthropic Claude gateway for `tooluse`.
//!
//! This crate implements [`ModelGateway`](tooluse::ModelGateway) for
//! Anthropic's Messages API: one non-streaming request per turn, with
//! tool definitions, `tool_use` blocks and `tool_result` blocks mapped to
//! and from the `tooluse` conversation types.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use tooluse::tool::{ToolLoopConfig, ToolRegistry, tool_loop};
//! use tooluse::ChatMessage;
//! use tooluse_anthropic::{AnthropicConfig, AnthropicGateway};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AnthropicConfig::from_env().ok_or("ANTHROPIC_API_KEY not set")?;
//! let gateway = AnthropicGateway::new(config)?;
//!
//! let result = tool_loop(
//!     &gateway,
//!     &ToolRegistry::new(),
//!     ChatMessage::user("Hello!"),
//!     ToolLoopConfig::default(),
//! )
//! .await?;
//! println!("{}", result.outcome.text().unwrap_or("aborted"));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod convert;
mod gateway;
mod types;

pub use config::AnthropicConfig;
pub use gateway::AnthropicGateway;
