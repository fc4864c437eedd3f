//! Tool handler trait and the closure-backed implementation.

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use super::{ToolError, ToolOutput};

/// Boxed future returned by [`ToolHandler::execute`].
pub type ToolFuture<'a> = Pin<Box<dyn Future<Output = Result<ToolOutput, ToolError>> + Send + 'a>>;

/// The executable half of a registered tool.
///
/// The spec (name, description, schema) is supplied separately at
/// registration time, so one handler type can back several tools.
/// Implement this for tools with state; wrap plain closures with
/// [`tool_fn`].
///
/// The trait is object-safe so handlers can be stored as
/// `Arc<dyn ToolHandler>`.
///
/// ```rust
/// use tooluse::tool::{ToolError, ToolFuture, ToolHandler, ToolOutput};
/// use serde_json::Value;
///
/// struct Echo;
///
/// impl ToolHandler for Echo {
///     fn execute(&self, input: Value) -> ToolFuture<'_> {
///         Box::pin(async move {
///             let text = input["text"]
///                 .as_str()
///                 .ok_or_else(|| ToolError::new("text must be a string"))?;
///             Ok::<_, ToolError>(ToolOutput::ok(text))
///         })
///     }
/// }
/// ```
pub trait ToolHandler: Send + Sync {
    /// Runs the tool on already-validated input.
    fn execute(&self, input: Value) -> ToolFuture<'_>;
}

/// A tool handler backed by an async closure. Created by [`tool_fn`].
pub struct FnToolHandler<F> {
    handler: F,
}

impl<F> std::fmt::Debug for FnToolHandler<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnToolHandler").finish_non_exhaustive()
    }
}

impl<F, Fut, O> ToolHandler for FnToolHandler<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<O, ToolError>> + Send + 'static,
    O: Into<ToolOutput> + Send + 'static,
{
    fn execute(&self, input: Value) -> ToolFuture<'_> {
        let fut = (self.handler)(input);
        Box::pin(async move { fut.await.map(Into::into) })
    }
}

/// Wraps an async closure as a [`ToolHandler`].
///
/// Returning `Result<String, ToolError>` works through the
/// `From<String>` impl on [`ToolOutput`].
///
/// ```rust
/// use tooluse::tool::tool_fn;
/// use serde_json::Value;
///
/// let handler = tool_fn(|input: Value| async move {
///     let a = input["a"].as_f64().unwrap_or(0.0);
///     let b = input["b"].as_f64().unwrap_or(0.0);
///     Ok(format!("{}", a + b))
/// });
/// ```
pub fn tool_fn<F, Fut, O>(handler: F) -> FnToolHandler<F>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<O, ToolError>> + Send + 'static,
    O: Into<ToolOutput> + Send + 'static,
{
    FnToolHandler { handler }
}
