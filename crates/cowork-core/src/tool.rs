//! The core `Tool` / `ToolSet` contract shared by every built-in tool.
//!
//! Every tool in the runtime is described declaratively (name, category,
//! description, JSON Schema parameters) and invoked uniformly through
//! `ToolCall` / `ToolCallResult`, so the dispatcher never needs to know
//! the concrete tool it is calling.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ToolError;

/// A boxed, `Send` future, used so `Tool::call` can be implemented without
/// the `async_trait` macro (which produces an inconsistent trait object
/// shape when mixed with non-async trait methods).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Broad grouping used for documentation and tool-search filtering; not
/// interpreted by the dispatcher itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCategory {
    Filesystem,
    Shell,
    Fetch,
    Lsp,
    OpenApi,
    Rag,
    Memory,
    Tasks,
    Todo,
    Deferred,
    Misc,
}

/// Hints describing a tool's effect on the world, surfaced to callers
/// deciding whether a call needs confirmation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolAnnotations {
    /// Human-readable title distinct from the machine `name`.
    pub title: Option<String>,
    /// True if the tool only reads state and never mutates it.
    pub read_only_hint: bool,
}

/// A single callable tool: its schema plus its handler.
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn category(&self) -> ToolCategory;

    fn description(&self) -> &str;

    /// JSON Schema describing the `arguments` object this tool accepts.
    fn parameters_schema(&self) -> Value;

    /// JSON Schema describing the tool's successful `output`, if the tool
    /// chooses to publish one. Best-effort documentation only; the
    /// dispatcher does not validate against it.
    fn output_schema(&self) -> Option<Value> {
        None
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::default()
    }

    /// Invoke the tool with decoded `arguments`. Implementations decode
    /// their own arguments from the raw `Value` and map any failure onto
    /// `ToolError`.
    fn call(&self, arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>>;
}

/// A request to invoke a tool by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub function: ToolCallFunction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallFunction {
    pub name: String,
    /// JSON-encoded arguments object, matching the target tool's
    /// `parameters_schema`.
    pub arguments: String,
}

/// The result of invoking a tool, always returned even on failure so
/// that calling agents get a uniform shape to route back to a model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallResult {
    /// Human/model-readable rendering of the result.
    pub output: String,
    pub is_error: bool,
    /// Structured data a caller can use without re-parsing `output`.
    /// On error, carries `{"kind": "<ToolError::kind()>"}`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl ToolCallResult {
    pub fn success(value: Value) -> Self {
        Self {
            output: value.to_string(),
            is_error: false,
            meta: Some(value),
        }
    }

    pub fn error(err: &ToolError) -> Self {
        Self {
            output: err.to_string(),
            is_error: true,
            meta: Some(serde_json::json!({ "kind": err.kind() })),
        }
    }
}

/// A named, cohesive group of tools sharing lifecycle and configuration
/// (the filesystem sandbox, a shell session registry, an LSP client
/// pool, ...). `ToolRuntime` aggregates `Arc<dyn ToolSet>` instances.
pub trait ToolSet: Send + Sync {
    /// Stable identifier for this set, used in logs and diagnostics.
    fn id(&self) -> &str;

    /// Tools currently exposed by this set. May change between calls
    /// (e.g. the deferred set's activated partition, or OpenAPI tools
    /// synthesized after a spec is fetched).
    fn tools(&self) -> Vec<Arc<dyn Tool>>;

    /// Free-form text describing how an agent should use this set's
    /// tools, appended to the runtime's combined instructions.
    fn instructions(&self) -> Option<String> {
        None
    }

    /// Start any background resources (process pools, file watchers).
    /// Called once, in registration order, when the runtime starts.
    fn start(&self) -> BoxFuture<'_, Result<(), ToolError>> {
        Box::pin(async { Ok(()) })
    }

    /// Tear down background resources. Called once, in reverse
    /// registration order, when the runtime stops. A set's failure to
    /// stop does not prevent other sets from stopping.
    fn stop(&self) -> BoxFuture<'_, Result<(), ToolError>> {
        Box::pin(async { Ok(()) })
    }
}
