//! Tool loop configuration, events and results.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use super::ToolInvocationResult;
use crate::chat::Conversation;

/// Callback receiving loop events as they happen.
pub type LoopObserverFn = Arc<dyn Fn(&LoopEvent) + Send + Sync>;

/// How the final answer is taken from an `end_turn` message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FinalText {
    /// The first text block wins; later text blocks are ignored.
    #[default]
    First,
    /// All text blocks, joined with newlines.
    Concatenate,
}

/// Something that happened inside the loop.
///
/// Delivered synchronously to [`ToolLoopConfig::on_event`], in the same
/// order the corresponding content appears in the conversation.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum LoopEvent {
    /// About to call the gateway.
    TurnStart {
        /// Gateway call number (1-indexed).
        turn: u32,
        /// Messages in the conversation at this point.
        message_count: usize,
    },

    /// A text block from a `tool_use` turn, surfaced before any tool in
    /// that turn runs.
    AssistantText(String),

    /// About to dispatch a tool.
    ToolExecutionStart {
        /// The request id from the model.
        tool_use_id: String,
        /// Requested tool.
        tool_name: String,
        /// Input as sent by the model.
        input: Value,
    },

    /// A tool dispatch finished.
    ToolExecutionEnd {
        /// The request id from the model.
        tool_use_id: String,
        /// Requested tool.
        tool_name: String,
        /// What the registry returned.
        result: ToolInvocationResult,
        /// Wall-clock time of the dispatch.
        duration: Duration,
    },

    /// The loop reached a terminal outcome.
    Done(LoopOutcome),
}

/// Configuration for [`tool_loop`](super::tool_loop).
///
/// ```rust
/// use tooluse::tool::{FinalText, ToolLoopConfig};
///
/// let config = ToolLoopConfig {
///     max_recursions: 3,
///     system_prompt: "You write Python.".into(),
///     final_text: FinalText::Concatenate,
///     ..Default::default()
/// };
/// assert!(config.on_event.is_none());
/// ```
pub struct ToolLoopConfig {
    /// Maximum number of tool-use rounds. Default: 5.
    ///
    /// This is a circuit breaker against a model that keeps requesting
    /// tools without finishing. With a budget of `n` the gateway is
    /// called at most `n + 1` times.
    pub max_recursions: u32,
    /// System prompt sent with every turn.
    pub system_prompt: String,
    /// How the final text is extracted. Default: [`FinalText::First`].
    pub final_text: FinalText,
    /// Optional observer for loop events.
    pub on_event: Option<LoopObserverFn>,
}

impl Default for ToolLoopConfig {
    fn default() -> Self {
        Self {
            max_recursions: 5,
            system_prompt: String::new(),
            final_text: FinalText::First,
            on_event: None,
        }
    }
}

impl Clone for ToolLoopConfig {
    fn clone(&self) -> Self {
        Self {
            max_recursions: self.max_recursions,
            system_prompt: self.system_prompt.clone(),
            final_text: self.final_text,
            on_event: self.on_event.clone(),
        }
    }
}

impl std::fmt::Debug for ToolLoopConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolLoopConfig")
            .field("max_recursions", &self.max_recursions)
            .field("system_prompt_len", &self.system_prompt.len())
            .field("final_text", &self.final_text)
            .field("has_on_event", &self.on_event.is_some())
            .finish()
    }
}

/// Why a run stopped without a final answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    /// The model was still requesting tools when the budget ran out.
    RecursionExhausted {
        /// The configured budget.
        budget: u32,
    },
}

/// Terminal outcome of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopOutcome {
    /// The model finished with a text answer.
    Final {
        /// The answer.
        text: String,
    },
    /// The circuit breaker tripped.
    Aborted {
        /// Why.
        reason: AbortReason,
    },
}

impl LoopOutcome {
    /// The final text, if the run completed.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Final { text } => Some(text),
            Self::Aborted { .. } => None,
        }
    }

    /// Whether the run was aborted.
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted { .. })
    }
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct ToolLoopResult {
    /// How the run ended.
    pub outcome: LoopOutcome,
    /// Number of gateway calls made.
    pub gateway_calls: u32,
    /// Number of tool dispatches made.
    pub tool_calls_executed: usize,
    /// The full transcript of the run.
    pub conversation: Conversation,
}
