//! Tasks ToolSet: eight tools over a JSON-file-backed `TaskStore`,
//! exposing create/get/update/delete/list/next and dependency edits.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::error::ToolError;
use crate::tool::{BoxFuture, Tool, ToolAnnotations, ToolCategory, ToolSet};

use super::store::{Priority, Status, TaskStore};

pub struct TasksToolSet {
    store: Arc<Mutex<TaskStore>>,
}

impl TasksToolSet {
    pub fn new(store_path: PathBuf) -> Result<Self, ToolError> {
        let store = TaskStore::load(store_path)?;
        Ok(Self { store: Arc::new(Mutex::new(store)) })
    }
}

impl ToolSet for TasksToolSet {
    fn id(&self) -> &str {
        "tasks"
    }

    fn tools(&self) -> Vec<Arc<dyn Tool>> {
        let s = &self.store;
        vec![
            Arc::new(CreateTask { store: s.clone() }),
            Arc::new(GetTask { store: s.clone() }),
            Arc::new(UpdateTask { store: s.clone() }),
            Arc::new(DeleteTask { store: s.clone() }),
            Arc::new(ListTasks { store: s.clone() }),
            Arc::new(NextTask { store: s.clone() }),
            Arc::new(AddDependency { store: s.clone() }),
            Arc::new(RemoveDependency { store: s.clone() }),
        ]
    }
}

fn parse_priority(s: Option<&str>) -> Result<Priority, ToolError> {
    match s.unwrap_or("medium") {
        "low" => Ok(Priority::Low),
        "medium" => Ok(Priority::Medium),
        "high" => Ok(Priority::High),
        "critical" => Ok(Priority::Critical),
        other => Err(ToolError::ArgumentDecode(format!("invalid priority: {other}"))),
    }
}

fn parse_status(s: Option<&str>) -> Result<Option<Status>, ToolError> {
    match s {
        None => Ok(None),
        Some("pending") => Ok(Some(Status::Pending)),
        Some("in_progress") => Ok(Some(Status::InProgress)),
        Some("done") => Ok(Some(Status::Done)),
        Some(other) => Err(ToolError::ArgumentDecode(format!("invalid status: {other}"))),
    }
}

struct CreateTask {
    store: Arc<Mutex<TaskStore>>,
}

impl Tool for CreateTask {
    fn name(&self) -> &str {
        "create_task"
    }
    fn category(&self) -> ToolCategory {
        ToolCategory::Tasks
    }
    fn description(&self) -> &str {
        "Create a task. `title` is a short label; `description` is used \
         directly, or `path` names a file whose contents become the \
         description, for longer briefs. `dependencies` must reference \
         existing task ids."
    }
    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "title": { "type": "string" },
                "description": { "type": "string" },
                "path": { "type": "string" },
                "priority": { "type": "string", "enum": ["low", "medium", "high", "critical"] },
                "dependencies": { "type": "array", "items": { "type": "string" } }
            },
            "required": ["title"]
        })
    }
    fn call(&self, arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>> {
        Box::pin(async move {
            let title = arguments["title"]
                .as_str()
                .ok_or_else(|| ToolError::ArgumentDecode("title is required".into()))?
                .to_string();
            let description = if let Some(path) = arguments["path"].as_str() {
                std::fs::read_to_string(path).map_err(ToolError::Io)?
            } else {
                arguments["description"].as_str().unwrap_or_default().to_string()
            };
            let priority = parse_priority(arguments["priority"].as_str())?;
            let dependencies: Vec<String> = arguments["dependencies"]
                .as_array()
                .map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
                .unwrap_or_default();

            let mut store = self.store.lock().await;
            let task = store.create(title, description, priority, dependencies)?;
            Ok(json!({ "task": task }))
        })
    }
}

struct GetTask {
    store: Arc<Mutex<TaskStore>>,
}

impl Tool for GetTask {
    fn name(&self) -> &str {
        "get_task"
    }
    fn category(&self) -> ToolCategory {
        ToolCategory::Tasks
    }
    fn description(&self) -> &str {
        "Fetch a task by id, including its effective status."
    }
    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations { title: Some("Get task".into()), read_only_hint: true }
    }
    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": { "id": { "type": "string" } }, "required": ["id"] })
    }
    fn call(&self, arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>> {
        Box::pin(async move {
            let id = arguments["id"]
                .as_str()
                .ok_or_else(|| ToolError::ArgumentDecode("id is required".into()))?;
            let store = self.store.lock().await;
            let task = store.get(id).ok_or_else(|| ToolError::NotFound(format!("no such task: {id}")))?;
            let effective_status = store.effective_status_of(id);
            Ok(json!({ "task": task, "effective_status": effective_status }))
        })
    }
}

struct UpdateTask {
    store: Arc<Mutex<TaskStore>>,
}

impl Tool for UpdateTask {
    fn name(&self) -> &str {
        "update_task"
    }
    fn category(&self) -> ToolCategory {
        ToolCategory::Tasks
    }
    fn description(&self) -> &str {
        "Update a task's title, description, priority, and/or status."
    }
    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "id": { "type": "string" },
                "title": { "type": "string" },
                "description": { "type": "string" },
                "priority": { "type": "string", "enum": ["low", "medium", "high", "critical"] },
                "status": { "type": "string", "enum": ["pending", "in_progress", "done"] }
            },
            "required": ["id"]
        })
    }
    fn call(&self, arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>> {
        Box::pin(async move {
            let id = arguments["id"]
                .as_str()
                .ok_or_else(|| ToolError::ArgumentDecode("id is required".into()))?;
            let title = arguments["title"].as_str().map(str::to_string);
            let description = arguments["description"].as_str().map(str::to_string);
            let priority = match arguments["priority"].as_str() {
                Some(p) => Some(parse_priority(Some(p))?),
                None => None,
            };
            let status = parse_status(arguments["status"].as_str())?;

            let mut store = self.store.lock().await;
            let task = store.update(id, title, description, priority, status)?;
            Ok(json!({ "task": task }))
        })
    }
}

struct DeleteTask {
    store: Arc<Mutex<TaskStore>>,
}

impl Tool for DeleteTask {
    fn name(&self) -> &str {
        "delete_task"
    }
    fn category(&self) -> ToolCategory {
        ToolCategory::Tasks
    }
    fn description(&self) -> &str {
        "Delete a task and remove it from every other task's dependency list."
    }
    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": { "id": { "type": "string" } }, "required": ["id"] })
    }
    fn call(&self, arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>> {
        Box::pin(async move {
            let id = arguments["id"]
                .as_str()
                .ok_or_else(|| ToolError::ArgumentDecode("id is required".into()))?;
            let mut store = self.store.lock().await;
            store.delete(id)?;
            Ok(json!({ "deleted": id }))
        })
    }
}

struct ListTasks {
    store: Arc<Mutex<TaskStore>>,
}

impl Tool for ListTasks {
    fn name(&self) -> &str {
        "list_tasks"
    }
    fn category(&self) -> ToolCategory {
        ToolCategory::Tasks
    }
    fn description(&self) -> &str {
        "List tasks: actionable tasks first ordered by priority \
         descending, then blocked tasks."
    }
    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations { title: Some("List tasks".into()), read_only_hint: true }
    }
    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }
    fn call(&self, _arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>> {
        Box::pin(async move {
            let store = self.store.lock().await;
            let entries: Vec<Value> = store
                .list_sorted()
                .into_iter()
                .map(|(task, eff)| json!({ "task": task, "effective_status": eff }))
                .collect();
            Ok(json!({ "tasks": entries }))
        })
    }
}

struct NextTask {
    store: Arc<Mutex<TaskStore>>,
}

impl Tool for NextTask {
    fn name(&self) -> &str {
        "next_task"
    }
    fn category(&self) -> ToolCategory {
        ToolCategory::Tasks
    }
    fn description(&self) -> &str {
        "Return the highest-priority non-blocked, non-done task, if any."
    }
    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations { title: Some("Next task".into()), read_only_hint: true }
    }
    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }
    fn call(&self, _arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>> {
        Box::pin(async move {
            let store = self.store.lock().await;
            match store.next() {
                Some(task) => Ok(json!({ "task": task })),
                None => Ok(json!({ "task": null, "message": "no actionable tasks" })),
            }
        })
    }
}

struct AddDependency {
    store: Arc<Mutex<TaskStore>>,
}

impl Tool for AddDependency {
    fn name(&self) -> &str {
        "add_dependency"
    }
    fn category(&self) -> ToolCategory {
        ToolCategory::Tasks
    }
    fn description(&self) -> &str {
        "Add a dependency edge. Rejected if the edge already exists or \
         would create a cycle."
    }
    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "task": { "type": "string" }, "depends_on": { "type": "string" } },
            "required": ["task", "depends_on"]
        })
    }
    fn call(&self, arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>> {
        Box::pin(async move {
            let task = arguments["task"]
                .as_str()
                .ok_or_else(|| ToolError::ArgumentDecode("task is required".into()))?;
            let depends_on = arguments["depends_on"]
                .as_str()
                .ok_or_else(|| ToolError::ArgumentDecode("depends_on is required".into()))?;
            let mut store = self.store.lock().await;
            store.add_dependency(task, depends_on)?;
            Ok(json!({ "task": task, "depends_on": depends_on }))
        })
    }
}

struct RemoveDependency {
    store: Arc<Mutex<TaskStore>>,
}

impl Tool for RemoveDependency {
    fn name(&self) -> &str {
        "remove_dependency"
    }
    fn category(&self) -> ToolCategory {
        ToolCategory::Tasks
    }
    fn description(&self) -> &str {
        "Remove a dependency edge, if present."
    }
    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "task": { "type": "string" }, "depends_on": { "type": "string" } },
            "required": ["task", "depends_on"]
        })
    }
    fn call(&self, arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>> {
        Box::pin(async move {
            let task = arguments["task"]
                .as_str()
                .ok_or_else(|| ToolError::ArgumentDecode("task is required".into()))?;
            let depends_on = arguments["depends_on"]
                .as_str()
                .ok_or_else(|| ToolError::ArgumentDecode("depends_on is required".into()))?;
            let mut store = self.store.lock().await;
            store.remove_dependency(task, depends_on)?;
            Ok(json!({ "task": task, "depends_on": depends_on }))
        })
    }
}
