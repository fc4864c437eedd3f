//! Writes a Python backend for an architecture description and saves it
//! to a local object store.
//!
//! ```sh
//! ANTHROPIC_API_KEY=sk-ant-... cargo run -p tooluse-anthropic --example backend_writer -- \
//!     "A todo-list REST API with Flask and SQLite"
//! ```
//!
//! `STORE_ROOT` (default `./object-store`) and `STORE_BUCKET` (default
//! `backend-writer`) pick where the code lands. `RUST_LOG` controls log
//! output.

use std::process::ExitCode;
use std::sync::Arc;

use tooluse::store::FsObjectStore;
use tooluse::tool::{LoopEvent, LoopOutcome};
use tooluse::writer::{BackendWriter, WriterConfig};
use tooluse_anthropic::{AnthropicConfig, AnthropicGateway};
use tracing_subscriber::EnvFilter;

const DEFAULT_PROMPT: &str = "A REST API for a todo list with create, list and delete endpoints, \
built with Flask and an in-memory store.";

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let prompt = std::env::args()
        .skip(1)
        .collect::<Vec<_>>()
        .join(" ");
    let prompt = if prompt.trim().is_empty() {
        DEFAULT_PROMPT.to_string()
    } else {
        prompt
    };

    let Some(config) = AnthropicConfig::from_env() else {
        eprintln!("ANTHROPIC_API_KEY is not set");
        return ExitCode::FAILURE;
    };
    let gateway = match AnthropicGateway::new(config) {
        Ok(gateway) => gateway,
        Err(e) => {
            eprintln!("failed to create gateway: {e}");
            return ExitCode::FAILURE;
        }
    };

    let root = std::env::var("STORE_ROOT").unwrap_or_else(|_| "object-store".into());
    let bucket = std::env::var("STORE_BUCKET").unwrap_or_else(|_| "backend-writer".into());
    let store = Arc::new(FsObjectStore::new(root, bucket));

    let writer = match BackendWriter::new(Arc::new(gateway), store, WriterConfig::default()) {
        Ok(writer) => writer.with_observer(Arc::new(|event: &LoopEvent| match event {
            LoopEvent::AssistantText(text) => println!("{text}\n"),
            LoopEvent::ToolExecutionEnd {
                tool_name, result, ..
            } => println!("[{tool_name}] {}\n", result.to_value()),
            _ => {}
        })),
        Err(e) => {
            eprintln!("failed to set up tools: {e}");
            return ExitCode::FAILURE;
        }
    };

    match writer.run(prompt).await {
        Ok(result) => match result.outcome {
            LoopOutcome::Final { text } => {
                println!("{text}");
                ExitCode::SUCCESS
            }
            LoopOutcome::Aborted { .. } => {
                println!("Maximum number of recursions reached. Please try again.");
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            eprintln!("run failed: {e}");
            ExitCode::FAILURE
        }
    }
}
