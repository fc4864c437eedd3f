//! The tool-use state machine.
//!
//! `LoopCore` owns the conversation for one run and walks it through
//! three states:
//!
//! ```text
//!              tool_use                 budget left
//!   AwaitingModel ──────▶ HandlingToolUse ──────────▶ AwaitingModel
//!        │                      │
//!        │ end_turn             │ budget spent
//!        ▼                      ▼
//!   Done(Final)            Done(Aborted)
//! ```
//!
//! Each step is awaited to completion before the next begins: one
//! gateway call at a time, one tool dispatch at a time, in the order the
//! model listed them.

use tokio::time::Instant;

use tracing::{debug, warn};

use crate::chat::{ChatMessage, ChatRole, ContentBlock, Conversation, ToolResult};
use crate::error::{ConversationError, LoopError, MalformedTurn};
use crate::gateway::{DynGateway, ModelTurn, StopReason, TurnRequest};

use super::config::{AbortReason, FinalText, LoopEvent, LoopOutcome, ToolLoopConfig, ToolLoopResult};
use super::{ToolRegistry, ToolSpec};

enum LoopState {
    AwaitingModel,
    /// Carries the content of the assistant message being handled.
    HandlingToolUse(Vec<ContentBlock>),
    Done(LoopOutcome),
}

pub(crate) struct LoopCore<'r> {
    registry: &'r ToolRegistry,
    config: ToolLoopConfig,
    specs: Vec<ToolSpec>,
    conversation: Conversation,
    remaining: u32,
    gateway_calls: u32,
    tool_calls_executed: usize,
}

impl<'r> LoopCore<'r> {
    /// Starts a run with `initial`, which must be a user message, as the
    /// first message.
    pub(crate) fn new(
        registry: &'r ToolRegistry,
        config: ToolLoopConfig,
        initial: ChatMessage,
    ) -> Result<Self, LoopError> {
        if initial.role != ChatRole::User {
            return Err(ConversationError::UnexpectedInitialRole { role: initial.role }.into());
        }
        let mut conversation = Conversation::new();
        conversation.append(initial)?;
        Ok(Self {
            specs: registry.specs(),
            registry,
            remaining: config.max_recursions,
            config,
            conversation,
            gateway_calls: 0,
            tool_calls_executed: 0,
        })
    }

    /// Drives the state machine until it reaches `Done` or fails.
    pub(crate) async fn run(mut self, gateway: &dyn DynGateway) -> Result<ToolLoopResult, LoopError> {
        let mut state = LoopState::AwaitingModel;
        loop {
            state = match state {
                LoopState::AwaitingModel => self.await_model(gateway).await?,
                LoopState::HandlingToolUse(blocks) => self.handle_tool_use(blocks).await?,
                LoopState::Done(outcome) => {
                    self.emit(&LoopEvent::Done(outcome.clone()));
                    return Ok(ToolLoopResult {
                        outcome,
                        gateway_calls: self.gateway_calls,
                        tool_calls_executed: self.tool_calls_executed,
                        conversation: self.conversation,
                    });
                }
            };
        }
    }

    async fn await_model(&mut self, gateway: &dyn DynGateway) -> Result<LoopState, LoopError> {
        self.gateway_calls += 1;
        self.emit(&LoopEvent::TurnStart {
            turn: self.gateway_calls,
            message_count: self.conversation.len(),
        });
        debug!(
            turn = self.gateway_calls,
            messages = self.conversation.len(),
            "sending conversation to model gateway"
        );

        let request = TurnRequest {
            conversation: &self.conversation,
            system_prompt: &self.config.system_prompt,
            tools: &self.specs,
        };
        let ModelTurn {
            message,
            stop_reason,
        } = gateway.send_boxed(&request).await?;

        if message.role != ChatRole::Assistant {
            return Err(MalformedTurn::UnexpectedRole(message.role).into());
        }
        if message.content.is_empty() {
            return Err(MalformedTurn::EmptyContent.into());
        }

        match stop_reason {
            StopReason::ToolUse => {
                if message.tool_uses().next().is_none() {
                    return Err(MalformedTurn::NoToolRequests.into());
                }
                let blocks = message.content.clone();
                self.conversation.append(message)?;
                Ok(LoopState::HandlingToolUse(blocks))
            }
            StopReason::EndTurn => {
                let text = match self.config.final_text {
                    FinalText::First => message.first_text().map(str::to_string),
                    FinalText::Concatenate => message.joined_text(),
                }
                .ok_or(MalformedTurn::MissingText)?;
                self.conversation.append(message)?;
                debug!(turn = self.gateway_calls, "model finished");
                Ok(LoopState::Done(LoopOutcome::Final { text }))
            }
            StopReason::Other(reason) => Err(MalformedTurn::UnexpectedStopReason(reason).into()),
        }
    }

    async fn handle_tool_use(&mut self, blocks: Vec<ContentBlock>) -> Result<LoopState, LoopError> {
        if self.remaining == 0 {
            warn!(
                budget = self.config.max_recursions,
                gateway_calls = self.gateway_calls,
                "maximum number of recursions reached"
            );
            return Ok(LoopState::Done(LoopOutcome::Aborted {
                reason: AbortReason::RecursionExhausted {
                    budget: self.config.max_recursions,
                },
            }));
        }

        let mut results = Vec::new();
        for block in blocks {
            match block {
                ContentBlock::Text { text } => self.emit(&LoopEvent::AssistantText(text)),
                ContentBlock::ToolUse(request) => {
                    self.emit(&LoopEvent::ToolExecutionStart {
                        tool_use_id: request.id.clone(),
                        tool_name: request.name.clone(),
                        input: request.input.clone(),
                    });
                    debug!(tool = %request.name, id = %request.id, "dispatching tool");

                    let started = Instant::now();
                    let result = self.registry.dispatch(&request.name, request.input).await;
                    let duration = started.elapsed();

                    results.push(ToolResult {
                        tool_use_id: request.id.clone(),
                        content: result.to_value(),
                        is_error: result.is_error(),
                    });
                    self.emit(&LoopEvent::ToolExecutionEnd {
                        tool_use_id: request.id,
                        tool_name: request.name,
                        result,
                        duration,
                    });
                }
                // Results only travel from the loop to the model.
                ContentBlock::ToolResult(_) => {}
            }
        }

        self.tool_calls_executed += results.len();
        self.conversation.append(ChatMessage::tool_results(results))?;
        self.remaining -= 1;
        Ok(LoopState::AwaitingModel)
    }

    fn emit(&self, event: &LoopEvent) {
        if let Some(observer) = &self.config.on_event {
            observer(event);
        }
    }
}
