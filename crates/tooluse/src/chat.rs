//! Conversation vocabulary: roles, messages, content blocks.
//!
//! A [`ChatMessage`] is a role plus an ordered list of [`ContentBlock`]s.
//! Blocks are a tagged enum rather than a map with optional keys, so a
//! message can carry any mix of text, tool-use requests and tool results
//! without ambiguity about which fields are present.
//!
//! [`Conversation`] is the append-only transcript the tool loop sends to
//! the model on every turn.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConversationError;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// The human caller, or the loop feeding tool results back.
    User,
    /// The model.
    Assistant,
}

/// A model-emitted request to invoke a registered tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolUseRequest {
    /// Opaque identifier, echoed back in the paired [`ToolResult`].
    pub id: String,
    /// Name of the tool to invoke.
    pub name: String,
    /// Tool input, expected to be a JSON object.
    pub input: Value,
}

/// The outcome of a tool invocation, fed back to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// The [`ToolUseRequest::id`] this result answers.
    pub tool_use_id: String,
    /// Structured result payload.
    pub content: Value,
    /// Whether the invocation failed.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

/// One block of message content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text.
    Text {
        /// The text itself.
        text: String,
    },
    /// A tool invocation requested by the model.
    ToolUse(ToolUseRequest),
    /// A tool result returned to the model.
    ToolResult(ToolResult),
}

impl ContentBlock {
    /// Shorthand for a text block.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Returns the text if this is a text block.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            _ => None,
        }
    }

    /// Returns the request if this is a tool-use block.
    pub fn as_tool_use(&self) -> Option<&ToolUseRequest> {
        match self {
            Self::ToolUse(request) => Some(request),
            _ => None,
        }
    }

    /// Returns the result if this is a tool-result block.
    pub fn as_tool_result(&self) -> Option<&ToolResult> {
        match self {
            Self::ToolResult(result) => Some(result),
            _ => None,
        }
    }
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Author of the message.
    pub role: ChatRole,
    /// Ordered content blocks.
    pub content: Vec<ContentBlock>,
}

impl ChatMessage {
    /// A user message holding a single text block.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: vec![ContentBlock::text(text)],
        }
    }

    /// An assistant message holding a single text block.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: vec![ContentBlock::text(text)],
        }
    }

    /// A user message carrying tool results, in the given order.
    pub fn tool_results(results: Vec<ToolResult>) -> Self {
        Self {
            role: ChatRole::User,
            content: results.into_iter().map(ContentBlock::ToolResult).collect(),
        }
    }

    /// The first text block, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(ContentBlock::as_text)
    }

    /// All text blocks joined with newlines, or `None` if there are none.
    pub fn joined_text(&self) -> Option<String> {
        let parts: Vec<&str> = self.content.iter().filter_map(ContentBlock::as_text).collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n"))
        }
    }

    /// Tool-use requests in the order they appear.
    pub fn tool_uses(&self) -> impl Iterator<Item = &ToolUseRequest> {
        self.content.iter().filter_map(ContentBlock::as_tool_use)
    }

    /// Tool results in the order they appear.
    pub fn tool_results_iter(&self) -> impl Iterator<Item = &ToolResult> {
        self.content.iter().filter_map(ContentBlock::as_tool_result)
    }
}

/// The chronological transcript of one loop run.
///
/// Append-only: messages can be added and read but never edited,
/// removed or reordered. Every appended message must have at least one
/// content block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    /// Creates an empty conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message.
    ///
    /// Returns [`ConversationError::EmptyMessage`] if the message has no
    /// content blocks.
    pub fn append(&mut self, message: ChatMessage) -> Result<(), ConversationError> {
        if message.content.is_empty() {
            return Err(ConversationError::EmptyMessage { role: message.role });
        }
        self.messages.push(message);
        Ok(())
    }

    /// All messages, oldest first.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// The most recent message.
    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether no message has been appended yet.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Consumes the conversation, returning its messages.
    pub fn into_messages(self) -> Vec<ChatMessage> {
        self.messages
    }
}
