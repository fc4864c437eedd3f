//! Tool error types.

/// Error returned by a tool handler.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ToolError {
    /// Human-readable error description.
    pub message: String,
}

impl ToolError {
    /// Creates a new tool error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Rejected tool registration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// A tool with this name is already registered.
    #[error("tool '{0}' is already registered")]
    DuplicateToolName(String),
    /// The tool's input schema does not compile.
    #[error("invalid input schema for tool '{name}': {message}")]
    InvalidSchema {
        /// Tool name.
        name: String,
        /// Compiler message.
        message: String,
    },
}
