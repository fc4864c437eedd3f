//! The model gateway: the one seam between the loop and the model service.
//!
//! - **[`ModelGateway`]**: the trait a backend implements, using native
//!   async-fn-in-traits.
//! - **[`DynGateway`]**: an object-safe mirror with boxed futures. A
//!   blanket impl bridges the two, so any gateway can be stored as
//!   `Box<dyn DynGateway>` or `Arc<dyn DynGateway>`.
//!
//! A gateway takes the whole conversation, the system prompt and the
//! advertised tools, and returns exactly one [`ModelTurn`]. It does not
//! retry; that is the caller's business.

use std::borrow::Cow;
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::chat::{ChatMessage, Conversation};
use crate::error::GatewayError;
use crate::tool::ToolSpec;

/// Everything the model sees on one turn.
#[derive(Debug, Clone, Copy)]
pub struct TurnRequest<'a> {
    /// The full transcript so far.
    pub conversation: &'a Conversation,
    /// System prompt, sent separately from the messages.
    pub system_prompt: &'a str,
    /// Tools the model may request.
    pub tools: &'a [ToolSpec],
}

/// Why the model stopped generating.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The model requested one or more tool invocations.
    ToolUse,
    /// The model produced its final answer.
    EndTurn,
    /// Any other reason reported by the service (e.g. `max_tokens`).
    Other(String),
}

impl StopReason {
    /// Parses a wire-format stop reason.
    pub fn from_wire(reason: &str) -> Self {
        match reason {
            "tool_use" => Self::ToolUse,
            "end_turn" => Self::EndTurn,
            other => Self::Other(other.to_string()),
        }
    }

    /// The wire-format spelling.
    pub fn as_str(&self) -> &str {
        match self {
            Self::ToolUse => "tool_use",
            Self::EndTurn => "end_turn",
            Self::Other(reason) => reason,
        }
    }
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One response from the model service.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelTurn {
    /// The model's message (role assistant).
    pub message: ChatMessage,
    /// Why generation stopped.
    pub stop_reason: StopReason,
}

/// Static description of a gateway instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayMetadata {
    /// Backend name (e.g. `"anthropic"`).
    pub name: Cow<'static, str>,
    /// Model identifier.
    pub model: String,
}

/// A conversational model service.
///
/// Not object-safe because of the `impl Future` return. Use
/// [`DynGateway`] for dynamic dispatch; every `ModelGateway`
/// implements it automatically.
pub trait ModelGateway: Send + Sync {
    /// Sends the conversation and returns the model's next turn.
    fn send(
        &self,
        request: &TurnRequest<'_>,
    ) -> impl Future<Output = Result<ModelTurn, GatewayError>> + Send;

    /// Describes this gateway.
    fn metadata(&self) -> GatewayMetadata;
}

/// Object-safe counterpart of [`ModelGateway`].
pub trait DynGateway: Send + Sync {
    /// Boxed-future version of [`ModelGateway::send`].
    fn send_boxed<'a>(
        &'a self,
        request: &'a TurnRequest<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<ModelTurn, GatewayError>> + Send + 'a>>;

    /// Describes this gateway.
    fn metadata(&self) -> GatewayMetadata;
}

impl<T: ModelGateway> DynGateway for T {
    fn send_boxed<'a>(
        &'a self,
        request: &'a TurnRequest<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<ModelTurn, GatewayError>> + Send + 'a>> {
        Box::pin(self.send(request))
    }

    fn metadata(&self) -> GatewayMetadata {
        ModelGateway::metadata(self)
    }
}
