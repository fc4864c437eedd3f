//! Tests for the tool module.

use std::sync::{Arc, Mutex};

use serde_json::{Value, json};

use super::*;
use crate::chat::{ChatMessage, ChatRole, ContentBlock, ToolResult};
use crate::error::{ConversationError, GatewayError, LoopError, MalformedTurn};
use crate::gateway::{ModelTurn, StopReason};
use crate::mock::MockError;
use crate::store::{MemoryObjectStore, ObjectStore};
use crate::test_helpers::{
    end_turn, mock_with, narrated_tool_use_turn, save_code_call, tool_use, tool_use_turn,
};

fn text_schema() -> InputSchema {
    InputSchema::new(json!({
        "type": "object",
        "properties": {"text": {"type": "string"}},
        "required": ["text"]
    }))
}

fn open_schema() -> InputSchema {
    InputSchema::new(json!({"type": "object"}))
}

/// Echoes `text` back, upper-cased.
fn shout_spec() -> ToolSpec {
    ToolSpec::new("shout", "Upper-case some text", text_schema())
}

fn shout_handler() -> impl ToolHandler {
    tool_fn(|input: Value| async move {
        Ok(input["text"].as_str().unwrap_or_default().to_uppercase())
    })
}

/// A tool that always fails, for testing error paths.
struct FailTool;

impl ToolHandler for FailTool {
    fn execute(&self, _input: Value) -> ToolFuture<'_> {
        Box::pin(async { Err(ToolError::new("intentional failure")) })
    }
}

/// Panics before or during its future, depending on input.
struct PanicTool;

impl ToolHandler for PanicTool {
    fn execute(&self, input: Value) -> ToolFuture<'_> {
        assert!(input.get("eager").is_none(), "eager kaboom");
        Box::pin(async move {
            if input.get("lazy").is_some() {
                panic!("lazy kaboom");
            }
            Ok::<_, ToolError>(ToolOutput::ok("survived"))
        })
    }
}

fn save_code_registry() -> (ToolRegistry, Arc<MemoryObjectStore>) {
    let store = Arc::new(MemoryObjectStore::new("code"));
    let mut registry = ToolRegistry::new();
    registry
        .register(SaveCodeTool::spec(), SaveCodeTool::new(store.clone()))
        .unwrap();
    (registry, store)
}

fn full_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry
        .register(shout_spec(), shout_handler())
        .unwrap()
        .register(ToolSpec::new("fail", "Always fails", open_schema()), FailTool)
        .unwrap()
        .register(ToolSpec::new("explode", "Panics", open_schema()), PanicTool)
        .unwrap();
    registry
}

fn config(budget: u32) -> ToolLoopConfig {
    ToolLoopConfig {
        max_recursions: budget,
        system_prompt: "You are a backend engineer.".into(),
        ..Default::default()
    }
}

fn results_of(message: &ChatMessage) -> Vec<ToolResult> {
    message.tool_results_iter().cloned().collect()
}

// ── Registry ────────────────────────────────────────────────────

#[test]
fn test_tool_handler_is_object_safe() {
    fn assert_object_safe(_: &dyn ToolHandler) {}
    assert_object_safe(&FailTool);
}

#[test]
fn test_tool_error_display() {
    let err = ToolError::new("something broke");
    assert_eq!(format!("{err}"), "something broke");
}

#[test]
fn test_registry_duplicate_name() {
    let mut registry = ToolRegistry::new();
    registry.register(shout_spec(), shout_handler()).unwrap();

    let err = registry
        .register(shout_spec(), FailTool)
        .err()
        .unwrap();
    assert_eq!(err, RegistryError::DuplicateToolName("shout".into()));
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_registry_invalid_schema() {
    let mut registry = ToolRegistry::new();
    let spec = ToolSpec::new("bad", "Bad schema", InputSchema::new(json!({"type": 12})));

    let err = registry.register(spec, FailTool).err().unwrap();
    assert!(matches!(err, RegistryError::InvalidSchema { ref name, .. } if name == "bad"));
    assert!(registry.is_empty());
}

#[test]
fn test_registry_specs_sorted_by_name() {
    let registry = full_registry();
    let names: Vec<String> = registry.specs().into_iter().map(|s| s.name).collect();
    assert_eq!(names, vec!["explode", "fail", "shout"]);
    assert!(registry.contains("fail"));
    assert!(!registry.contains("missing"));
    assert_eq!(registry.get_spec("shout").unwrap().description, "Upper-case some text");
}

#[tokio::test]
async fn test_dispatch_success_is_verbatim() {
    let registry = full_registry();
    let result = registry.dispatch("shout", json!({"text": "hi"})).await;
    assert_eq!(result, ToolInvocationResult::Success(ToolOutput::ok("HI")));
}

#[tokio::test]
async fn test_dispatch_unknown_tool() {
    let registry = full_registry();
    let result = registry.dispatch("weather", json!({})).await;
    assert_eq!(
        result,
        ToolInvocationResult::error("The requested tool with name 'weather' does not exist.")
    );
}

#[tokio::test]
async fn test_dispatch_missing_required_key() {
    let registry = full_registry();
    let result = registry.dispatch("shout", json!({"other": 1})).await;
    match result {
        ToolInvocationResult::Error { message } => {
            assert!(message.starts_with("Invalid input for tool 'shout': "));
            assert!(message.contains("text"));
        }
        other => panic!("expected error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_dispatch_non_object_input() {
    let registry = full_registry();
    let result = registry.dispatch("fail", json!("just a string")).await;
    assert_eq!(
        result,
        ToolInvocationResult::error("Invalid input for tool 'fail': expected a JSON object")
    );
}

#[tokio::test]
async fn test_dispatch_handler_error() {
    let registry = full_registry();
    let result = registry.dispatch("fail", json!({})).await;
    assert_eq!(result, ToolInvocationResult::error("intentional failure"));
}

#[tokio::test]
async fn test_dispatch_handler_panics_are_contained() {
    let registry = full_registry();

    let eager = registry.dispatch("explode", json!({"eager": true})).await;
    assert_eq!(
        eager,
        ToolInvocationResult::error("Tool 'explode' panicked: eager kaboom")
    );

    let lazy = registry.dispatch("explode", json!({"lazy": true})).await;
    assert_eq!(
        lazy,
        ToolInvocationResult::error("Tool 'explode' panicked: lazy kaboom")
    );

    // The registry is still usable afterwards.
    let calm = registry.dispatch("explode", json!({})).await;
    assert_eq!(calm, ToolInvocationResult::Success(ToolOutput::ok("survived")));
}

#[tokio::test]
async fn test_dispatch_is_independent_of_history() {
    let registry = full_registry();
    let input = json!({"text": "same"});

    let first = registry.dispatch("shout", input.clone()).await;
    let _ = registry.dispatch("fail", json!({})).await;
    let _ = registry.dispatch("weather", json!({})).await;
    let second = registry.dispatch("shout", input.clone()).await;
    let from_clone = registry.clone().dispatch("shout", input).await;

    assert_eq!(first, second);
    assert_eq!(first, from_clone);
}

// ── Loop: happy path ────────────────────────────────────────────

#[tokio::test]
async fn test_loop_save_code_then_done() {
    let (registry, store) = save_code_registry();
    let gateway = mock_with([save_code_call("tu_1", "print(1)"), end_turn("done")]);

    let result = tool_loop(
        &gateway,
        &registry,
        ChatMessage::user("write code"),
        config(5),
    )
    .await
    .unwrap();

    assert_eq!(result.outcome, LoopOutcome::Final { text: "done".into() });
    assert_eq!(result.gateway_calls, 2);
    assert_eq!(result.tool_calls_executed, 1);
    assert_eq!(gateway.recorded_calls().len(), 2);
    assert_eq!(store.get("backend.py").await.unwrap().unwrap(), b"print(1)");

    let messages = result.conversation.messages();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[0], ChatMessage::user("write code"));
    assert_eq!(messages[1].role, ChatRole::Assistant);
    assert_eq!(messages[2].role, ChatRole::User);
    assert_eq!(
        results_of(&messages[2]),
        vec![ToolResult {
            tool_use_id: "tu_1".into(),
            content: json!({"statusCode": 200, "body": "Output saved to mem://code/backend.py"}),
            is_error: false,
        }]
    );
    assert_eq!(messages[3], ChatMessage::assistant("done"));
}

#[tokio::test]
async fn test_loop_immediate_end_turn() {
    let registry = full_registry();
    let gateway = mock_with([end_turn("no tools needed")]);

    let result = tool_loop(&gateway, &registry, ChatMessage::user("hi"), config(5))
        .await
        .unwrap();

    assert_eq!(result.outcome.text(), Some("no tools needed"));
    assert_eq!(result.gateway_calls, 1);
    assert_eq!(result.tool_calls_executed, 0);
    assert_eq!(result.conversation.len(), 2);
}

#[tokio::test]
async fn test_loop_sends_prompt_and_all_specs_every_turn() {
    let registry = full_registry();
    let gateway = mock_with([
        tool_use_turn(vec![tool_use("a", "shout", json!({"text": "x"}))]),
        end_turn("ok"),
    ]);

    tool_loop(&gateway, &registry, ChatMessage::user("go"), config(5))
        .await
        .unwrap();

    let calls = gateway.recorded_calls();
    for call in &calls {
        assert_eq!(call.system_prompt, "You are a backend engineer.");
        assert_eq!(call.tool_names(), vec!["explode", "fail", "shout"]);
    }
    assert_eq!(calls[0].messages.len(), 1);
    assert_eq!(calls[1].messages.len(), 3);
}

// ── Loop: pairing ───────────────────────────────────────────────

#[tokio::test]
async fn test_loop_pairs_results_in_request_order() {
    let registry = full_registry();
    let gateway = mock_with([
        narrated_tool_use_turn(
            "Running three tools.",
            vec![
                tool_use("id_c", "shout", json!({"text": "third"})),
                tool_use("id_a", "weather", json!({"city": "Paris"})),
                tool_use("id_b", "fail", json!({})),
            ],
        ),
        end_turn("finished"),
    ]);

    let result = tool_loop(&gateway, &registry, ChatMessage::user("go"), config(5))
        .await
        .unwrap();
    assert_eq!(result.tool_calls_executed, 3);

    let messages = result.conversation.messages();
    let request_ids: Vec<&str> = messages[1].tool_uses().map(|r| r.id.as_str()).collect();
    let results = results_of(&messages[2]);
    let result_ids: Vec<&str> = results.iter().map(|r| r.tool_use_id.as_str()).collect();

    assert_eq!(request_ids, vec!["id_c", "id_a", "id_b"]);
    assert_eq!(result_ids, request_ids);
    assert_eq!(messages[2].content.len(), 3);
    assert_eq!(
        results.iter().map(|r| r.is_error).collect::<Vec<_>>(),
        vec![false, true, true]
    );
}

// ── Loop: termination ───────────────────────────────────────────

#[tokio::test]
async fn test_loop_aborts_after_budget() {
    for budget in [0_u32, 1, 3, 5] {
        let registry = full_registry();
        let turns = (0..=budget).map(|i| {
            tool_use_turn(vec![tool_use(
                &format!("tu_{i}"),
                "shout",
                json!({"text": "again"}),
            )])
        });
        let gateway = mock_with(turns);

        let result = tool_loop(&gateway, &registry, ChatMessage::user("loop"), config(budget))
            .await
            .unwrap();

        assert_eq!(
            result.outcome,
            LoopOutcome::Aborted {
                reason: AbortReason::RecursionExhausted { budget }
            },
            "budget {budget}"
        );
        assert!(result.outcome.is_aborted());
        assert_eq!(result.gateway_calls, budget + 1, "budget {budget}");
        assert_eq!(result.tool_calls_executed, budget as usize);
        assert_eq!(gateway.remaining(), 0);
        // The last assistant turn is recorded but never answered.
        assert_eq!(result.conversation.len(), 2 * budget as usize + 2);
        assert_eq!(
            result.conversation.last().unwrap().role,
            ChatRole::Assistant
        );
    }
}

#[tokio::test]
async fn test_loop_finishes_on_last_allowed_call() {
    let registry = full_registry();
    let gateway = mock_with([
        tool_use_turn(vec![tool_use("a", "shout", json!({"text": "1"}))]),
        tool_use_turn(vec![tool_use("b", "shout", json!({"text": "2"}))]),
        end_turn("made it"),
    ]);

    let result = tool_loop(&gateway, &registry, ChatMessage::user("go"), config(2))
        .await
        .unwrap();

    assert_eq!(result.outcome.text(), Some("made it"));
    assert_eq!(result.gateway_calls, 3);
}

// ── Loop: resilience ────────────────────────────────────────────

#[tokio::test]
async fn test_loop_unknown_tool_continues() {
    let registry = full_registry();
    let gateway = mock_with([
        tool_use_turn(vec![tool_use("t1", "does_not_exist", json!({}))]),
        end_turn("recovered"),
    ]);

    let result = tool_loop(&gateway, &registry, ChatMessage::user("go"), config(5))
        .await
        .unwrap();
    assert_eq!(result.outcome.text(), Some("recovered"));

    let second_call = &gateway.recorded_calls()[1];
    let fed_back = results_of(second_call.messages.last().unwrap());
    assert_eq!(
        fed_back,
        vec![ToolResult {
            tool_use_id: "t1".into(),
            content: json!({
                "error": true,
                "message": "The requested tool with name 'does_not_exist' does not exist."
            }),
            is_error: true,
        }]
    );
}

#[tokio::test]
async fn test_loop_handler_faults_continue() {
    let registry = full_registry();
    let gateway = mock_with([
        tool_use_turn(vec![
            tool_use("f", "fail", json!({})),
            tool_use("p", "explode", json!({"lazy": true})),
        ]),
        end_turn("still here"),
    ]);

    let result = tool_loop(&gateway, &registry, ChatMessage::user("go"), config(5))
        .await
        .unwrap();
    assert_eq!(result.outcome.text(), Some("still here"));

    let results = results_of(&result.conversation.messages()[2]);
    assert_eq!(
        results[0].content,
        json!({"error": true, "message": "intentional failure"})
    );
    assert_eq!(
        results[1].content,
        json!({"error": true, "message": "Tool 'explode' panicked: lazy kaboom"})
    );
}

// ── Loop: failures ──────────────────────────────────────────────

async fn run_single(turn: ModelTurn) -> Result<ToolLoopResult, LoopError> {
    let registry = full_registry();
    let gateway = mock_with([turn]);
    tool_loop(&gateway, &registry, ChatMessage::user("go"), config(5)).await
}

#[tokio::test]
async fn test_loop_end_turn_without_text() {
    let mut turn = tool_use_turn(vec![tool_use("a", "shout", json!({"text": "x"}))]);
    turn.stop_reason = StopReason::EndTurn;

    let err = run_single(turn).await.unwrap_err();
    assert!(matches!(err, LoopError::MalformedTurn(MalformedTurn::MissingText)));
}

#[tokio::test]
async fn test_loop_unexpected_stop_reason() {
    let mut turn = end_turn("truncated");
    turn.stop_reason = StopReason::Other("max_tokens".into());

    let err = run_single(turn).await.unwrap_err();
    match err {
        LoopError::MalformedTurn(MalformedTurn::UnexpectedStopReason(reason)) => {
            assert_eq!(reason, "max_tokens");
        }
        other => panic!("expected UnexpectedStopReason, got {other:?}"),
    }
}

#[tokio::test]
async fn test_loop_empty_content() {
    let mut turn = end_turn("x");
    turn.message.content.clear();

    let err = run_single(turn).await.unwrap_err();
    assert!(matches!(err, LoopError::MalformedTurn(MalformedTurn::EmptyContent)));
}

#[tokio::test]
async fn test_loop_wrong_role() {
    let mut turn = end_turn("x");
    turn.message.role = ChatRole::User;

    let err = run_single(turn).await.unwrap_err();
    assert!(matches!(
        err,
        LoopError::MalformedTurn(MalformedTurn::UnexpectedRole(ChatRole::User))
    ));
}

#[tokio::test]
async fn test_loop_tool_use_without_requests() {
    let mut turn = end_turn("I will call a tool");
    turn.stop_reason = StopReason::ToolUse;

    let err = run_single(turn).await.unwrap_err();
    assert!(matches!(err, LoopError::MalformedTurn(MalformedTurn::NoToolRequests)));
}

#[tokio::test]
async fn test_loop_gateway_error_is_not_retried() {
    let registry = full_registry();
    let gateway = mock_with([]);
    gateway.queue_error(MockError::Timeout { elapsed_ms: 30_000 });
    gateway.queue_turn(end_turn("never reached"));

    let err = tool_loop(&gateway, &registry, ChatMessage::user("go"), config(5))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        LoopError::Gateway(GatewayError::Timeout { elapsed_ms: 30_000 })
    ));
    assert_eq!(gateway.recorded_calls().len(), 1);
    assert_eq!(gateway.remaining(), 1);
}

#[tokio::test]
async fn test_loop_gateway_error_mid_run() {
    let registry = full_registry();
    let gateway = mock_with([tool_use_turn(vec![tool_use(
        "a",
        "shout",
        json!({"text": "x"}),
    )])]);
    gateway.queue_error(MockError::Http {
        status: Some(http::StatusCode::SERVICE_UNAVAILABLE),
        message: "overloaded".into(),
        retryable: true,
    });

    let err = tool_loop(&gateway, &registry, ChatMessage::user("go"), config(5))
        .await
        .unwrap_err();
    match err {
        LoopError::Gateway(e) => assert!(e.is_retryable()),
        other => panic!("expected gateway error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_loop_rejects_empty_prompt() {
    let registry = full_registry();
    let gateway = mock_with([]);
    let prompt = ChatMessage {
        role: ChatRole::User,
        content: vec![],
    };

    let err = tool_loop(&gateway, &registry, prompt, config(5))
        .await
        .unwrap_err();
    assert!(matches!(err, LoopError::Conversation(_)));
    assert!(gateway.recorded_calls().is_empty());
}

#[tokio::test]
async fn test_loop_rejects_assistant_prompt() {
    let registry = full_registry();
    let gateway = mock_with([end_turn("unused")]);

    let err = tool_loop(
        &gateway,
        &registry,
        ChatMessage::assistant("I will start"),
        config(5),
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        LoopError::Conversation(ConversationError::UnexpectedInitialRole {
            role: ChatRole::Assistant
        })
    ));
    assert!(gateway.recorded_calls().is_empty());
    assert_eq!(gateway.remaining(), 1);
}

// ── Loop: configuration and events ──────────────────────────────

#[tokio::test]
async fn test_loop_final_text_modes() {
    let two_texts = || ModelTurn {
        message: ChatMessage {
            role: ChatRole::Assistant,
            content: vec![ContentBlock::text("first"), ContentBlock::text("second")],
        },
        stop_reason: StopReason::EndTurn,
    };
    let registry = full_registry();

    let gateway = mock_with([two_texts()]);
    let first = tool_loop(&gateway, &registry, ChatMessage::user("go"), config(5))
        .await
        .unwrap();
    assert_eq!(first.outcome.text(), Some("first"));

    let gateway = mock_with([two_texts()]);
    let joined = tool_loop(
        &gateway,
        &registry,
        ChatMessage::user("go"),
        ToolLoopConfig {
            final_text: FinalText::Concatenate,
            ..config(5)
        },
    )
    .await
    .unwrap();
    assert_eq!(joined.outcome.text(), Some("first\nsecond"));
}

#[tokio::test]
async fn test_loop_events_follow_conversation_order() {
    let events: Arc<Mutex<Vec<String>>> = Arc::default();
    let sink = Arc::clone(&events);
    let observer: LoopObserverFn = Arc::new(move |event: &LoopEvent| {
        let line = match event {
            LoopEvent::TurnStart { turn, message_count } => format!("turn {turn} ({message_count})"),
            LoopEvent::AssistantText(text) => format!("text {text}"),
            LoopEvent::ToolExecutionStart { tool_name, .. } => format!("start {tool_name}"),
            LoopEvent::ToolExecutionEnd {
                tool_name, result, ..
            } => format!("end {tool_name} error={}", result.is_error()),
            LoopEvent::Done(outcome) => format!("done {outcome:?}"),
        };
        sink.lock().unwrap().push(line);
    });

    let registry = full_registry();
    let gateway = mock_with([
        narrated_tool_use_turn(
            "Let me shout.",
            vec![
                tool_use("a", "shout", json!({"text": "x"})),
                tool_use("b", "fail", json!({})),
            ],
        ),
        end_turn("bye"),
    ]);

    tool_loop(
        &gateway,
        &registry,
        ChatMessage::user("go"),
        ToolLoopConfig {
            on_event: Some(observer),
            ..config(5)
        },
    )
    .await
    .unwrap();

    assert_eq!(
        *events.lock().unwrap(),
        vec![
            "turn 1 (1)",
            "text Let me shout.",
            "start shout",
            "end shout error=false",
            "start fail",
            "end fail error=true",
            "turn 2 (3)",
            "done Final { text: \"bye\" }",
        ]
    );
}

#[test]
fn test_loop_config_defaults() {
    let config = ToolLoopConfig::default();
    assert_eq!(config.max_recursions, 5);
    assert_eq!(config.final_text, FinalText::First);
    assert!(config.system_prompt.is_empty());

    let debug = format!("{config:?}");
    assert!(debug.contains("max_recursions: 5"));
    assert!(debug.contains("has_on_event: false"));
}
