//! Error types for gateway calls and loop runs.
//!
//! [`GatewayError`] is what a [`ModelGateway`](crate::gateway::ModelGateway)
//! returns when the model service itself fails. [`LoopError`] is what a
//! tool loop run returns when it cannot continue: either the gateway
//! failed, or it answered with a turn the loop cannot interpret.
//!
//! Hitting the recursion budget is *not* an error. It is reported as
//! [`LoopOutcome::Aborted`](crate::tool::LoopOutcome::Aborted) so callers
//! can tell an expected safety stop apart from a broken service.
//!
//! # Retryability
//!
//! ```rust
//! use tooluse::GatewayError;
//!
//! fn should_retry(err: &GatewayError) -> bool {
//!     err.is_retryable()
//! }
//!
//! assert!(should_retry(&GatewayError::Timeout { elapsed_ms: 30_000 }));
//! assert!(!should_retry(&GatewayError::Auth("expired".into())));
//! ```

use crate::chat::ChatRole;

/// Failure of a single model gateway call.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum GatewayError {
    /// Transport failure or unexpected HTTP status.
    ///
    /// `status` is `None` when no response was received at all.
    #[error("HTTP error (status={status:?}): {message}")]
    Http {
        /// The HTTP status code, if one was received.
        status: Option<http::StatusCode>,
        /// What went wrong.
        message: String,
        /// Whether the same request may succeed later.
        retryable: bool,
    },

    /// Credentials were rejected.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// The request was rejected as malformed.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The response body could not be parsed.
    #[error("Response format error: {message}")]
    ResponseFormat {
        /// Parse failure description.
        message: String,
        /// Raw body, for diagnostics.
        raw: String,
    },

    /// The call exceeded its deadline.
    #[error("Gateway call timed out after {elapsed_ms}ms")]
    Timeout {
        /// Milliseconds elapsed before giving up.
        elapsed_ms: u64,
    },
}

impl GatewayError {
    /// Returns `true` if the failure is transient.
    ///
    /// The loop never retries on its own; this is for callers that wrap
    /// a run in their own retry policy.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http { retryable, .. } => *retryable,
            Self::Timeout { .. } => true,
            _ => false,
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        Self::ResponseFormat {
            message: err.to_string(),
            raw: String::new(),
        }
    }
}

/// Ways a model turn can violate the gateway contract.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedTurn {
    /// `end_turn` without any text block.
    #[error("end_turn response contains no text block")]
    MissingText,
    /// A stop reason the loop has no transition for.
    #[error("unexpected stop reason '{0}'")]
    UnexpectedStopReason(String),
    /// The turn carried no content blocks at all.
    #[error("model turn has no content blocks")]
    EmptyContent,
    /// The turn was not authored by the assistant.
    #[error("model turn has role {0:?}, expected assistant")]
    UnexpectedRole(ChatRole),
    /// `tool_use` without any tool-use block.
    #[error("tool_use response contains no tool-use request")]
    NoToolRequests,
}

/// Fatal failure of a tool loop run.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum LoopError {
    /// The gateway call failed. Not retried inside the loop.
    #[error("model gateway unavailable: {0}")]
    Gateway(#[from] GatewayError),

    /// The gateway returned a turn the loop cannot interpret.
    #[error("malformed model turn: {0}")]
    MalformedTurn(#[from] MalformedTurn),

    /// The initial message could not start a conversation.
    #[error("invalid conversation: {0}")]
    Conversation(#[from] ConversationError),
}

/// A message a [`Conversation`](crate::chat::Conversation) cannot take.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversationError {
    /// Messages must carry at least one content block.
    #[error("cannot append a {role:?} message with no content")]
    EmptyMessage {
        /// Role of the rejected message.
        role: ChatRole,
    },

    /// A run must open with a user message.
    #[error("a conversation must start with a User message, got {role:?}")]
    UnexpectedInitialRole {
        /// Role of the rejected opening message.
        role: ChatRole,
    },
}
