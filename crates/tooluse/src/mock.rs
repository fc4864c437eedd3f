//! Mock gateway for testing.
//!
//! [`MockGateway`] is a queue-based fake that lets tests control exactly
//! which turns and errors the model service returns, without touching
//! the network. It implements [`ModelGateway`], so it also works through
//! [`DynGateway`](crate::DynGateway) via the blanket impl.
//!
//! # Usage
//!
//! ```rust,ignore
//! use tooluse::mock::{MockError, MockGateway};
//! use tooluse::{ChatMessage, Conversation, ModelGateway, ModelTurn, StopReason, TurnRequest};
//!
//! # async fn example() {
//! let mock = MockGateway::new("test-model");
//! mock.queue_turn(ModelTurn {
//!     message: ChatMessage::assistant("Hello!"),
//!     stop_reason: StopReason::EndTurn,
//! });
//! mock.queue_error(MockError::Timeout { elapsed_ms: 100 });
//!
//! let conversation = Conversation::new();
//! let request = TurnRequest {
//!     conversation: &conversation,
//!     system_prompt: "",
//!     tools: &[],
//! };
//! assert!(mock.send(&request).await.is_ok());
//! assert!(mock.send(&request).await.is_err());
//! assert_eq!(mock.recorded_calls().len(), 2);
//! # }
//! ```
//!
//! # Why `MockError` instead of `GatewayError`?
//!
//! [`GatewayError`] is not `Clone`, so it can't be stored in a queue
//! that tests inspect. [`MockError`] mirrors its variants in a cloneable
//! form and converts at dequeue time.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::chat::ChatMessage;
use crate::error::GatewayError;
use crate::gateway::{GatewayMetadata, ModelGateway, ModelTurn, TurnRequest};
use crate::tool::ToolSpec;

/// What the mock saw on one call.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// Conversation snapshot at call time.
    pub messages: Vec<ChatMessage>,
    /// System prompt sent.
    pub system_prompt: String,
    /// Tools advertised.
    pub tools: Vec<ToolSpec>,
}

impl RecordedCall {
    /// Names of the advertised tools, in order.
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }
}

/// A queue-based mock gateway for unit and integration tests.
///
/// Push turns with [`queue_turn`](Self::queue_turn) and errors with
/// [`queue_error`](Self::queue_error). Each call to `send` pops from the
/// front of the queue and records the request for later assertion via
/// [`recorded_calls`](Self::recorded_calls).
///
/// # Panics
///
/// [`send`](ModelGateway::send) panics if the queue is empty, so a loop
/// that makes more calls than a test expects fails loudly.
pub struct MockGateway {
    turns: Mutex<VecDeque<Result<ModelTurn, MockError>>>,
    meta: GatewayMetadata,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

/// Cloneable mirror of [`GatewayError`] for mock queuing.
#[derive(Debug, Clone)]
pub enum MockError {
    /// Maps to [`GatewayError::Http`].
    Http {
        /// HTTP status code, if any.
        status: Option<http::StatusCode>,
        /// Error message.
        message: String,
        /// Whether the error is retryable.
        retryable: bool,
    },
    /// Maps to [`GatewayError::Auth`].
    Auth(String),
    /// Maps to [`GatewayError::InvalidRequest`].
    InvalidRequest(String),
    /// Maps to [`GatewayError::ResponseFormat`].
    ResponseFormat {
        /// What went wrong during parsing.
        message: String,
        /// The raw response body.
        raw: String,
    },
    /// Maps to [`GatewayError::Timeout`].
    Timeout {
        /// Elapsed milliseconds.
        elapsed_ms: u64,
    },
}

impl MockError {
    fn into_gateway_error(self) -> GatewayError {
        match self {
            Self::Http {
                status,
                message,
                retryable,
            } => GatewayError::Http {
                status,
                message,
                retryable,
            },
            Self::Auth(msg) => GatewayError::Auth(msg),
            Self::InvalidRequest(msg) => GatewayError::InvalidRequest(msg),
            Self::ResponseFormat { message, raw } => GatewayError::ResponseFormat { message, raw },
            Self::Timeout { elapsed_ms } => GatewayError::Timeout { elapsed_ms },
        }
    }
}

impl fmt::Debug for MockGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let queued = self.turns.lock().unwrap().len();
        let call_count = self.calls.lock().unwrap().len();
        f.debug_struct("MockGateway")
            .field("meta", &self.meta)
            .field("queued_turns", &queued)
            .field("recorded_calls", &call_count)
            .finish()
    }
}

impl MockGateway {
    /// Creates a mock named `"mock"` reporting the given model.
    pub fn new(model: impl Into<String>) -> Self {
        Self::with_metadata(GatewayMetadata {
            name: "mock".into(),
            model: model.into(),
        })
    }

    /// Creates a mock with explicit metadata and an empty queue.
    pub fn with_metadata(meta: GatewayMetadata) -> Self {
        Self {
            turns: Mutex::new(VecDeque::new()),
            meta,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Enqueues a turn for the next `send` call.
    pub fn queue_turn(&self, turn: ModelTurn) -> &Self {
        self.turns.lock().unwrap().push_back(Ok(turn));
        self
    }

    /// Enqueues an error for the next `send` call.
    pub fn queue_error(&self, error: MockError) -> &Self {
        self.turns.lock().unwrap().push_back(Err(error));
        self
    }

    /// Number of queued turns not yet consumed.
    pub fn remaining(&self) -> usize {
        self.turns.lock().unwrap().len()
    }

    /// All requests seen so far, in call order.
    pub fn recorded_calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record_call(&self, request: &TurnRequest<'_>) {
        self.calls.lock().unwrap().push(RecordedCall {
            messages: request.conversation.messages().to_vec(),
            system_prompt: request.system_prompt.to_string(),
            tools: request.tools.to_vec(),
        });
    }
}

impl ModelGateway for MockGateway {
    async fn send(&self, request: &TurnRequest<'_>) -> Result<ModelTurn, GatewayError> {
        self.record_call(request);
        let result = self
            .turns
            .lock()
            .unwrap()
            .pop_front()
            .expect("MockGateway: no queued turns remaining");
        result.map_err(MockError::into_gateway_error)
    }

    fn metadata(&self) -> GatewayMetadata {
        self.meta.clone()
    }
}
