//! Run-to-completion entry point for the tool loop.

use tracing::instrument;

use crate::chat::ChatMessage;
use crate::error::LoopError;
use crate::gateway::DynGateway;

use super::ToolRegistry;
use super::config::{ToolLoopConfig, ToolLoopResult};
use super::loop_core::LoopCore;

/// Runs the model in a tool-calling loop until it finishes or the
/// recursion budget runs out.
///
/// Each round:
/// 1. Sends the conversation, system prompt and every registered tool
///    spec to `gateway`
/// 2. On `tool_use`, dispatches each requested tool in order and appends
///    one user message carrying the results
/// 3. On `end_turn`, returns the model's text as [`LoopOutcome::Final`]
///
/// When the model asks for tools after `config.max_recursions` rounds
/// the loop stops without calling the gateway again and returns
/// [`LoopOutcome::Aborted`]. An abort is a normal result, not an error.
///
/// # Errors
///
/// - [`LoopError::Gateway`] if the gateway call fails; it is not retried
/// - [`LoopError::MalformedTurn`] if the model's turn violates the
///   protocol (missing text, unknown stop reason, wrong role, and so on)
/// - [`LoopError::Conversation`] if `prompt` has no content or is not a
///   user message
///
/// Tool failures never surface here. They are reported to the model as
/// error results and the loop continues.
///
/// [`LoopOutcome::Final`]: super::LoopOutcome::Final
/// [`LoopOutcome::Aborted`]: super::LoopOutcome::Aborted
#[instrument(skip_all, fields(budget = config.max_recursions, tools = registry.len()))]
pub async fn tool_loop(
    gateway: &dyn DynGateway,
    registry: &ToolRegistry,
    prompt: ChatMessage,
    config: ToolLoopConfig,
) -> Result<ToolLoopResult, LoopError> {
    LoopCore::new(registry, config, prompt)?.run(gateway).await
}
