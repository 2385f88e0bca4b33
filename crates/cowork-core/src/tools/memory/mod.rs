//! Memory ToolSet: add/list/delete user memories against an injected
//! key-value store. The store itself (its durability, its backend) is
//! an external collaborator; this crate only owns the tool surface and
//! id assignment.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ToolError;
use crate::tool::{BoxFuture, Tool, ToolAnnotations, ToolCategory, ToolSet};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub id: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub content: String,
}

pub trait MemoryStore: Send + Sync {
    fn put(&self, entry: MemoryEntry) -> BoxFuture<'_, Result<(), ToolError>>;
    fn list(&self) -> BoxFuture<'_, Result<Vec<MemoryEntry>, ToolError>>;
    fn delete(&self, id: String) -> BoxFuture<'_, Result<bool, ToolError>>;
}

/// A process-local, non-persistent `MemoryStore`, useful for
/// embedding without a real backend and for tests.
#[derive(Default)]
pub struct InMemoryStore {
    entries: parking_lot::Mutex<Vec<MemoryEntry>>,
}

impl MemoryStore for InMemoryStore {
    fn put(&self, entry: MemoryEntry) -> BoxFuture<'_, Result<(), ToolError>> {
        Box::pin(async move {
            self.entries.lock().push(entry);
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, Result<Vec<MemoryEntry>, ToolError>> {
        Box::pin(async move { Ok(self.entries.lock().clone()) })
    }

    fn delete(&self, id: String) -> BoxFuture<'_, Result<bool, ToolError>> {
        Box::pin(async move {
            let mut entries = self.entries.lock();
            let before = entries.len();
            entries.retain(|e| e.id != id);
            Ok(entries.len() != before)
        })
    }
}

/// Monotonic nanosecond-timestamp id generator; the counter tiebreaks
/// calls landing in the same nanosecond.
fn next_id(counter: &AtomicI64) -> String {
    let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0);
    let seq = counter.fetch_add(1, Ordering::Relaxed);
    format!("{nanos}-{seq}")
}

pub struct MemoryToolSet {
    store: Arc<dyn MemoryStore>,
    counter: Arc<AtomicI64>,
}

impl MemoryToolSet {
    pub fn new(store: Arc<dyn MemoryStore>) -> Self {
        Self { store, counter: Arc::new(AtomicI64::new(0)) }
    }
}

impl ToolSet for MemoryToolSet {
    fn id(&self) -> &str {
        "memory"
    }

    fn tools(&self) -> Vec<Arc<dyn Tool>> {
        vec![
            Arc::new(AddMemory { store: self.store.clone(), counter: self.counter.clone() }),
            Arc::new(GetMemories { store: self.store.clone() }),
            Arc::new(DeleteMemory { store: self.store.clone() }),
        ]
    }
}

struct AddMemory {
    store: Arc<dyn MemoryStore>,
    counter: Arc<AtomicI64>,
}

impl Tool for AddMemory {
    fn name(&self) -> &str {
        "add_memory"
    }
    fn category(&self) -> ToolCategory {
        ToolCategory::Memory
    }
    fn description(&self) -> &str {
        "Remember a piece of content for future sessions."
    }
    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": { "content": { "type": "string" } }, "required": ["content"] })
    }
    fn call(&self, arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>> {
        Box::pin(async move {
            let content = arguments["content"]
                .as_str()
                .ok_or_else(|| ToolError::ArgumentDecode("content is required".into()))?
                .to_string();
            let entry = MemoryEntry {
                id: next_id(&self.counter),
                created_at: chrono::Utc::now(),
                content,
            };
            self.store.put(entry.clone()).await?;
            Ok(json!({ "memory": entry }))
        })
    }
}

struct GetMemories {
    store: Arc<dyn MemoryStore>,
}

impl Tool for GetMemories {
    fn name(&self) -> &str {
        "get_memories"
    }
    fn category(&self) -> ToolCategory {
        ToolCategory::Memory
    }
    fn description(&self) -> &str {
        "List every remembered entry."
    }
    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations { title: Some("Get memories".into()), read_only_hint: true }
    }
    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }
    fn call(&self, _arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>> {
        Box::pin(async move {
            let entries = self.store.list().await?;
            Ok(json!({ "memories": entries }))
        })
    }
}

struct DeleteMemory {
    store: Arc<dyn MemoryStore>,
}

impl Tool for DeleteMemory {
    fn name(&self) -> &str {
        "delete_memory"
    }
    fn category(&self) -> ToolCategory {
        ToolCategory::Memory
    }
    fn description(&self) -> &str {
        "Delete a remembered entry by id."
    }
    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": { "id": { "type": "string" } }, "required": ["id"] })
    }
    fn call(&self, arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>> {
        Box::pin(async move {
            let id = arguments["id"]
                .as_str()
                .ok_or_else(|| ToolError::ArgumentDecode("id is required".into()))?
                .to_string();
            let deleted = self.store.delete(id.clone()).await?;
            if !deleted {
                return Err(ToolError::NotFound(format!("no such memory: {id}")));
            }
            Ok(json!({ "deleted": id }))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn add_list_delete_round_trip() {
        let set = MemoryToolSet::new(Arc::new(InMemoryStore::default()));
        let tools = set.tools();
        let add = tools.iter().find(|t| t.name() == "add_memory").unwrap();
        let list = tools.iter().find(|t| t.name() == "get_memories").unwrap();
        let del = tools.iter().find(|t| t.name() == "delete_memory").unwrap();

        let added = add.call(json!({ "content": "remember this" })).await.unwrap();
        let id = added["memory"]["id"].as_str().unwrap().to_string();

        let listed = list.call(json!({})).await.unwrap();
        assert_eq!(listed["memories"].as_array().unwrap().len(), 1);

        del.call(json!({ "id": id })).await.unwrap();
        let listed = list.call(json!({})).await.unwrap();
        assert_eq!(listed["memories"].as_array().unwrap().len(), 0);
    }
}
