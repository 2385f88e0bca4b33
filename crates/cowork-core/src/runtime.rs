//! `ToolRuntime`: aggregates `ToolSet`s into a single dispatch surface.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::ToolError;
use crate::tool::{Tool, ToolCall, ToolCallResult, ToolSet};

/// Combines every registered `ToolSet` into one namespace and routes
/// `ToolCall`s to the matching `Tool::call`.
pub struct ToolRuntime {
    sets: Vec<Arc<dyn ToolSet>>,
}

impl ToolRuntime {
    pub fn new(sets: Vec<Arc<dyn ToolSet>>) -> Self {
        Self { sets }
    }

    /// All tools across all registered sets, in registration order.
    /// Tool names are expected to be unique across sets; a later set's
    /// tool silently shadows an earlier one with the same name here,
    /// but `dispatch` always resolves by name through this same list so
    /// behavior stays consistent with what `tools()` reports.
    pub fn tools(&self) -> Vec<Arc<dyn Tool>> {
        let mut seen = HashMap::new();
        let mut ordered = Vec::new();
        for set in &self.sets {
            for tool in set.tools() {
                let name = tool.name().to_string();
                if let Some(existing) = seen.insert(name.clone(), ordered.len()) {
                    ordered[existing] = tool;
                } else {
                    ordered.push(tool);
                }
            }
        }
        ordered
    }

    /// Combined instructions from every set that provides them, in
    /// registration order, separated by blank lines.
    pub fn instructions(&self) -> String {
        self.sets
            .iter()
            .filter_map(|s| s.instructions())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Start every set in registration order. A set that fails to start
    /// is logged and skipped; its tools remain registered but will fail
    /// at call time with `SubsystemUnavailable` if they depend on the
    /// unstarted resource.
    pub async fn start(&self) {
        for set in &self.sets {
            if let Err(err) = set.start().await {
                warn!(set = set.id(), error = %err, "tool set failed to start");
            }
        }
    }

    /// Stop every set in reverse registration order, tolerating
    /// individual failures so one misbehaving set cannot block cleanup
    /// of the rest.
    pub async fn stop(&self) {
        for set in self.sets.iter().rev() {
            if let Err(err) = set.stop().await {
                warn!(set = set.id(), error = %err, "tool set failed to stop cleanly");
            }
        }
    }

    /// Decode and invoke a tool call, always returning a `ToolCallResult`
    /// (never an `Err`) so the caller gets a uniform shape to hand back
    /// to a model regardless of failure kind.
    pub async fn dispatch(&self, call: ToolCall) -> ToolCallResult {
        let name = call.function.name.as_str();
        debug!(tool = name, "dispatching tool call");

        let arguments: serde_json::Value = match serde_json::from_str(&call.function.arguments) {
            Ok(v) => v,
            Err(e) => {
                let err = ToolError::ArgumentDecode(e.to_string());
                return ToolCallResult::error(&err);
            }
        };

        let tool = match self.tools().into_iter().find(|t| t.name() == name) {
            Some(t) => t,
            None => {
                let err = ToolError::NotFound(name.to_string());
                return ToolCallResult::error(&err);
            }
        };

        match tool.call(arguments).await {
            Ok(value) => ToolCallResult::success(value),
            Err(err) => ToolCallResult::error(&err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::{BoxFuture, ToolCategory};
    use serde_json::json;

    struct Echo;

    impl Tool for Echo {
        fn name(&self) -> &str {
            "echo"
        }
        fn category(&self) -> ToolCategory {
            ToolCategory::Misc
        }
        fn description(&self) -> &str {
            "echoes its input"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            json!({"type": "object"})
        }
        fn call(&self, arguments: serde_json::Value) -> BoxFuture<'_, Result<serde_json::Value, ToolError>> {
            Box::pin(async move { Ok(arguments) })
        }
    }

    struct EchoSet;

    impl ToolSet for EchoSet {
        fn id(&self) -> &str {
            "echo_set"
        }
        fn tools(&self) -> Vec<Arc<dyn Tool>> {
            vec![Arc::new(Echo)]
        }
    }

    #[tokio::test]
    async fn dispatch_routes_by_name() {
        let runtime = ToolRuntime::new(vec![Arc::new(EchoSet)]);
        let result = runtime
            .dispatch(ToolCall {
                function: crate::tool::ToolCallFunction {
                    name: "echo".into(),
                    arguments: r#"{"x": 1}"#.into(),
                },
            })
            .await;
        assert!(!result.is_error);
        assert_eq!(result.meta, Some(json!({"x": 1})));
    }

    #[tokio::test]
    async fn dispatch_unknown_tool_errors() {
        let runtime = ToolRuntime::new(vec![Arc::new(EchoSet)]);
        let result = runtime
            .dispatch(ToolCall {
                function: crate::tool::ToolCallFunction {
                    name: "nope".into(),
                    arguments: "{}".into(),
                },
            })
            .await;
        assert!(result.is_error);
    }

    #[tokio::test]
    async fn dispatch_bad_arguments_errors() {
        let runtime = ToolRuntime::new(vec![Arc::new(EchoSet)]);
        let result = runtime
            .dispatch(ToolCall {
                function: crate::tool::ToolCallFunction {
                    name: "echo".into(),
                    arguments: "not json".into(),
                },
            })
            .await;
        assert!(result.is_error);
    }
}
