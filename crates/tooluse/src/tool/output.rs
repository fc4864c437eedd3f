//! Tool output and invocation result types.

use serde_json::{Value, json};

/// Successful output of a tool handler.
///
/// ```rust
/// use tooluse::tool::ToolOutput;
///
/// let output = ToolOutput::ok("Output saved to mem://code/backend.py");
/// assert_eq!(output.status_code, 200);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    /// Status code reported back to the model.
    pub status_code: u16,
    /// Human-readable body.
    pub body: String,
}

impl ToolOutput {
    /// Creates an output with an explicit status code.
    pub fn new(status_code: u16, body: impl Into<String>) -> Self {
        Self {
            status_code,
            body: body.into(),
        }
    }

    /// Creates a `200` output.
    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }
}

impl From<String> for ToolOutput {
    fn from(body: String) -> Self {
        Self::ok(body)
    }
}

impl From<&str> for ToolOutput {
    fn from(body: &str) -> Self {
        Self::ok(body)
    }
}

/// What a dispatch through the registry produced.
///
/// Dispatch never fails at the outer level: unknown tools, bad input and
/// handler faults all become [`ToolInvocationResult::Error`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolInvocationResult {
    /// The handler ran and returned output.
    Success(ToolOutput),
    /// The invocation could not be completed.
    Error {
        /// Description fed back to the model.
        message: String,
    },
}

impl ToolInvocationResult {
    /// Shorthand for an error result.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Whether this is an error result.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// Wire representation fed back to the model.
    ///
    /// `{"statusCode": n, "body": s}` on success, `{"error": true,
    /// "message": s}` on failure.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Success(output) => json!({
                "statusCode": output.status_code,
                "body": output.body,
            }),
            Self::Error { message } => json!({
                "error": true,
                "message": message,
            }),
        }
    }
}

impl From<ToolOutput> for ToolInvocationResult {
    fn from(output: ToolOutput) -> Self {
        Self::Success(output)
    }
}
