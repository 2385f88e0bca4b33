//! Deferred ToolSet: two meta-tools, `search_tool` and `add_tool`,
//! that expose other ToolSets' tools on demand instead of all at once,
//! keeping an agent's visible tool surface small until it asks for
//! more.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{json, Value};

use crate::error::ToolError;
use crate::tool::{BoxFuture, Tool, ToolAnnotations, ToolCategory, ToolSet};

/// One source of deferrable tools: a ToolSet plus which of its tools
/// (or all of them) start out deferred.
pub struct DeferredSource {
    pub toolset: Arc<dyn ToolSet>,
    pub defer_all: bool,
    pub tool_names: Vec<String>,
}

struct Entry {
    tool: Arc<dyn Tool>,
}

pub struct DeferredToolSet {
    sources: Vec<DeferredSource>,
    deferred: Arc<RwLock<HashMap<String, Entry>>>,
    activated: Arc<RwLock<HashMap<String, Entry>>>,
}

impl DeferredToolSet {
    pub fn new(sources: Vec<DeferredSource>) -> Self {
        Self {
            sources,
            deferred: Arc::new(RwLock::new(HashMap::new())),
            activated: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl ToolSet for DeferredToolSet {
    fn id(&self) -> &str {
        "deferred"
    }

    fn tools(&self) -> Vec<Arc<dyn Tool>> {
        let mut tools: Vec<Arc<dyn Tool>> = vec![
            Arc::new(SearchTool { deferred: self.deferred.clone() }),
            Arc::new(AddTool { deferred: self.deferred.clone(), activated: self.activated.clone() }),
        ];
        tools.extend(self.activated.read().values().map(|e| e.tool.clone()));
        tools
    }

    fn start(&self) -> BoxFuture<'_, Result<(), ToolError>> {
        Box::pin(async move {
            let mut deferred = self.deferred.write();
            for source in &self.sources {
                for tool in source.toolset.tools() {
                    let name = tool.name().to_string();
                    let is_deferred = source.defer_all || source.tool_names.iter().any(|n| n == &name);
                    if is_deferred {
                        deferred.insert(name, Entry { tool });
                    }
                }
            }
            Ok(())
        })
    }
}

struct SearchTool {
    deferred: Arc<RwLock<HashMap<String, Entry>>>,
}

impl Tool for SearchTool {
    fn name(&self) -> &str {
        "search_tool"
    }
    fn category(&self) -> ToolCategory {
        ToolCategory::Deferred
    }
    fn description(&self) -> &str {
        "Search names and descriptions of tools not currently activated. \
         Use `add_tool` to activate a match before calling it."
    }
    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations { title: Some("Search tools".into()), read_only_hint: true }
    }
    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": { "query": { "type": "string" } }, "required": ["query"] })
    }
    fn call(&self, arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>> {
        Box::pin(async move {
            let query = arguments["query"]
                .as_str()
                .ok_or_else(|| ToolError::ArgumentDecode("query is required".into()))?
                .to_lowercase();
            let deferred = self.deferred.read();
            let matches: Vec<Value> = deferred
                .values()
                .filter(|e| {
                    e.tool.name().to_lowercase().contains(&query)
                        || e.tool.description().to_lowercase().contains(&query)
                })
                .map(|e| json!({ "name": e.tool.name(), "description": e.tool.description() }))
                .collect();
            Ok(json!({ "matches": matches }))
        })
    }
}

struct AddTool {
    deferred: Arc<RwLock<HashMap<String, Entry>>>,
    activated: Arc<RwLock<HashMap<String, Entry>>>,
}

impl Tool for AddTool {
    fn name(&self) -> &str {
        "add_tool"
    }
    fn category(&self) -> ToolCategory {
        ToolCategory::Deferred
    }
    fn description(&self) -> &str {
        "Activate a deferred tool by name so it appears in subsequent \
         tool listings. Idempotent if already activated."
    }
    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": { "name": { "type": "string" } }, "required": ["name"] })
    }
    fn call(&self, arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>> {
        Box::pin(async move {
            let name = arguments["name"]
                .as_str()
                .ok_or_else(|| ToolError::ArgumentDecode("name is required".into()))?
                .to_string();

            if self.activated.read().contains_key(&name) {
                return Ok(json!({ "activated": name, "already_active": true }));
            }

            let entry = self
                .deferred
                .write()
                .remove(&name)
                .ok_or_else(|| ToolError::NotFound(format!("no such deferred tool: {name}")))?;
            self.activated.write().insert(name.clone(), entry);
            Ok(json!({ "activated": name, "already_active": false }))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json as j;

    struct Echo;
    impl Tool for Echo {
        fn name(&self) -> &str {
            "echo"
        }
        fn category(&self) -> ToolCategory {
            ToolCategory::Misc
        }
        fn description(&self) -> &str {
            "echoes"
        }
        fn parameters_schema(&self) -> Value {
            j!({ "type": "object" })
        }
        fn call(&self, arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>> {
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
    async fn search_then_add_activates_tool() {
        let set = DeferredToolSet::new(vec![DeferredSource {
            toolset: Arc::new(EchoSet),
            defer_all: true,
            tool_names: vec![],
        }]);
        set.start().await.unwrap();

        let tools = set.tools();
        let search = tools.iter().find(|t| t.name() == "search_tool").unwrap();
        let found = search.call(j!({ "query": "echo" })).await.unwrap();
        assert_eq!(found["matches"].as_array().unwrap().len(), 1);

        let add = tools.iter().find(|t| t.name() == "add_tool").unwrap();
        add.call(j!({ "name": "echo" })).await.unwrap();

        assert!(set.tools().iter().any(|t| t.name() == "echo"));
    }

    #[tokio::test]
    async fn add_unknown_tool_errors() {
        let set = DeferredToolSet::new(vec![]);
        let tools = set.tools();
        let add = tools.iter().find(|t| t.name() == "add_tool").unwrap();
        assert!(add.call(j!({ "name": "nope" })).await.is_err());
    }
}
