//! Conversion between `tooluse` types and Anthropic API types.
//!
//! Internal: callers only see `tooluse` types. The gateway uses these
//! functions to build requests and parse responses.

use serde_json::Value;
use tooluse::chat::{ChatMessage, ChatRole, ContentBlock as CoreContent, ToolUseRequest};
use tooluse::error::GatewayError;
use tooluse::gateway::{ModelTurn, StopReason, TurnRequest};

use crate::config::AnthropicConfig;
use crate::types::{
    ContentBlock, ErrorResponse, Message, Request, Response, ResponseContent, Tool,
};

// ── Request conversion ───────────────────────────────────────────────

/// Builds an Anthropic API request from a turn request and the gateway
/// config.
pub(crate) fn build_request<'a>(
    request: &TurnRequest<'a>,
    config: &'a AnthropicConfig,
) -> Request<'a> {
    let messages = request
        .conversation
        .messages()
        .iter()
        .map(convert_message)
        .collect();
    let system = Some(request.system_prompt).filter(|s| !s.is_empty());
    let tools = (!request.tools.is_empty()).then(|| {
        request
            .tools
            .iter()
            .map(|t| Tool {
                name: &t.name,
                description: &t.description,
                input_schema: t.input_schema.as_value(),
            })
            .collect()
    });

    Request {
        model: &config.model,
        messages,
        max_tokens: config.max_tokens,
        system,
        tools,
    }
}

fn convert_message(message: &ChatMessage) -> Message {
    Message {
        role: match message.role {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        },
        content: message.content.iter().map(convert_content_block).collect(),
    }
}

fn convert_content_block(block: &CoreContent) -> ContentBlock {
    match block {
        CoreContent::Text { text } => ContentBlock::Text { text: text.clone() },
        CoreContent::ToolUse(request) => ContentBlock::ToolUse {
            id: request.id.clone(),
            name: request.name.clone(),
            input: request.input.clone(),
        },
        CoreContent::ToolResult(result) => ContentBlock::ToolResult {
            tool_use_id: result.tool_use_id.clone(),
            content: match &result.content {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            },
            is_error: result.is_error,
        },
    }
}

// ── Response conversion ──────────────────────────────────────────────

/// Parses a raw Messages API response body into a [`ModelTurn`].
///
/// A body that does not deserialize, including a `tool_use` block
/// without its `id`, `name` or `input`, is a
/// [`GatewayError::ResponseFormat`]. So is a response without a
/// `stop_reason`: guessing one could drop pending tool requests.
pub(crate) fn parse_response(raw: String) -> Result<ModelTurn, GatewayError> {
    let resp = match serde_json::from_str::<Response>(&raw) {
        Ok(resp) => resp,
        Err(e) => {
            return Err(GatewayError::ResponseFormat {
                message: format!("Failed to parse Anthropic response: {e}"),
                raw,
            });
        }
    };
    convert_response(resp).map_err(|message| GatewayError::ResponseFormat { message, raw })
}

/// Converts a deserialized response to a [`ModelTurn`].
///
/// Block types other than text and tool use (e.g. thinking) are dropped.
/// The stop reason is passed through as-is, so `max_tokens` and friends
/// surface as [`StopReason::Other`].
fn convert_response(resp: Response) -> Result<ModelTurn, String> {
    let stop_reason = resp
        .stop_reason
        .as_deref()
        .map(StopReason::from_wire)
        .ok_or_else(|| "Anthropic response has no stop_reason".to_string())?;

    let content = resp
        .content
        .into_iter()
        .filter_map(|block| match block {
            ResponseContent::Text { text } => Some(CoreContent::text(text)),
            ResponseContent::ToolUse { id, name, input } => {
                Some(CoreContent::ToolUse(ToolUseRequest { id, name, input }))
            }
            ResponseContent::Unsupported => None,
        })
        .collect();

    let role = match resp.role.as_deref() {
        Some("user") => ChatRole::User,
        _ => ChatRole::Assistant,
    };

    Ok(ModelTurn {
        message: ChatMessage { role, content },
        stop_reason,
    })
}

// ── Error conversion ─────────────────────────────────────────────────

/// Converts an HTTP status and error body into a [`GatewayError`].
pub(crate) fn convert_error(status: http::StatusCode, body: &str) -> GatewayError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map_or_else(|_| body.to_string(), |e| e.error.message);

    if status == http::StatusCode::UNAUTHORIZED || status == http::StatusCode::FORBIDDEN {
        return GatewayError::Auth(message);
    }

    if status == http::StatusCode::BAD_REQUEST {
        return GatewayError::InvalidRequest(message);
    }

    let retryable = matches!(status.as_u16(), 429 | 500 | 502 | 503 | 529);

    GatewayError::Http {
        status: Some(status),
        message,
        retryable,
    }
}
