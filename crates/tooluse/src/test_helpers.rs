//! Pre-built helpers for testing code that drives the tool loop.
//!
//! Available when the `test-utils` feature is enabled, so downstream
//! crates can reuse them in their own test suites. Also compiled for
//! this crate's own tests.

use serde_json::{Value, json};

use crate::chat::{ChatMessage, ChatRole, ContentBlock, ToolUseRequest};
use crate::gateway::{ModelTurn, StopReason};
use crate::mock::MockGateway;
use crate::tool::SaveCodeTool;

/// An `end_turn` with a single text block.
pub fn end_turn(text: &str) -> ModelTurn {
    ModelTurn {
        message: ChatMessage::assistant(text),
        stop_reason: StopReason::EndTurn,
    }
}

/// Builds a tool-use request block.
pub fn tool_use(id: &str, name: &str, input: Value) -> ToolUseRequest {
    ToolUseRequest {
        id: id.into(),
        name: name.into(),
        input,
    }
}

/// A `tool_use` turn requesting the given tools, in order.
pub fn tool_use_turn(requests: Vec<ToolUseRequest>) -> ModelTurn {
    ModelTurn {
        message: ChatMessage {
            role: ChatRole::Assistant,
            content: requests.into_iter().map(ContentBlock::ToolUse).collect(),
        },
        stop_reason: StopReason::ToolUse,
    }
}

/// A `tool_use` turn with a leading text block, as models usually send.
pub fn narrated_tool_use_turn(text: &str, requests: Vec<ToolUseRequest>) -> ModelTurn {
    let mut turn = tool_use_turn(requests);
    turn.message.content.insert(0, ContentBlock::text(text));
    turn
}

/// A `tool_use` turn asking to save `code`.
pub fn save_code_call(id: &str, code: &str) -> ModelTurn {
    tool_use_turn(vec![tool_use(
        id,
        SaveCodeTool::NAME,
        json!({ "code": code }),
    )])
}

/// A [`MockGateway`] preloaded with `turns`.
pub fn mock_with(turns: impl IntoIterator<Item = ModelTurn>) -> MockGateway {
    let mock = MockGateway::new("test-model");
    for turn in turns {
        mock.queue_turn(turn);
    }
    mock
}
