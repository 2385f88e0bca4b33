//! Todo ToolSet: an ephemeral, in-process ordered list that clears
//! itself wholesale once every entry reaches `completed`, signalling
//! task completion back to the agent.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::RwLock;

use crate::error::ToolError;
use crate::tool::{BoxFuture, Tool, ToolAnnotations, ToolCategory, ToolSet};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    Pending,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Todo {
    pub id: String,
    pub description: String,
    pub status: TodoStatus,
}

type TodoList = Arc<RwLock<Vec<Todo>>>;

pub struct TodoToolSet {
    todos: TodoList,
}

impl TodoToolSet {
    pub fn new() -> Self {
        Self {
            todos: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for TodoToolSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolSet for TodoToolSet {
    fn id(&self) -> &str {
        "todo"
    }

    fn tools(&self) -> Vec<Arc<dyn Tool>> {
        vec![
            Arc::new(CreateTodo { todos: self.todos.clone() }),
            Arc::new(CreateTodos { todos: self.todos.clone() }),
            Arc::new(UpdateTodos { todos: self.todos.clone() }),
            Arc::new(ListTodos { todos: self.todos.clone() }),
        ]
    }
}

fn next_id(current_len: usize) -> String {
    format!("todo_{current_len}")
}

struct CreateTodo {
    todos: TodoList,
}

impl Tool for CreateTodo {
    fn name(&self) -> &str {
        "create_todo"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Todo
    }

    fn description(&self) -> &str {
        "Add a single item to the ephemeral todo list."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "description": { "type": "string" } },
            "required": ["description"]
        })
    }

    fn call(&self, arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>> {
        Box::pin(async move {
            let description = arguments["description"]
                .as_str()
                .ok_or_else(|| ToolError::ArgumentDecode("description is required".into()))?
                .to_string();

            let mut list = self.todos.write().await;
            let id = next_id(list.len());
            let todo = Todo { id, description, status: TodoStatus::Pending };
            list.push(todo.clone());
            Ok(json!({ "todo": todo }))
        })
    }
}

struct CreateTodos {
    todos: TodoList,
}

impl Tool for CreateTodos {
    fn name(&self) -> &str {
        "create_todos"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Todo
    }

    fn description(&self) -> &str {
        "Add a batch of items to the ephemeral todo list."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "descriptions": { "type": "array", "items": { "type": "string" } }
            },
            "required": ["descriptions"]
        })
    }

    fn call(&self, arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>> {
        Box::pin(async move {
            let descriptions = arguments["descriptions"]
                .as_array()
                .ok_or_else(|| ToolError::ArgumentDecode("descriptions array is required".into()))?;

            let mut list = self.todos.write().await;
            let mut created = Vec::with_capacity(descriptions.len());
            for d in descriptions {
                let description = d
                    .as_str()
                    .ok_or_else(|| ToolError::ArgumentDecode("descriptions entries must be strings".into()))?
                    .to_string();
                let id = next_id(list.len());
                let todo = Todo { id, description, status: TodoStatus::Pending };
                list.push(todo.clone());
                created.push(todo);
            }
            Ok(json!({ "todos": created }))
        })
    }
}

#[derive(Debug, Deserialize)]
struct UpdateSpec {
    id: String,
    status: TodoStatus,
}

struct UpdateTodos {
    todos: TodoList,
}

impl Tool for UpdateTodos {
    fn name(&self) -> &str {
        "update_todos"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Todo
    }

    fn description(&self) -> &str {
        "Update the status of a batch of todo items. Not-found ids are \
         reported but don't fail the rest of the batch. If every item is \
         `completed` after the update, the whole list is cleared."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "updates": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string" },
                            "status": { "type": "string", "enum": ["pending", "in_progress", "completed"] }
                        },
                        "required": ["id", "status"]
                    }
                }
            },
            "required": ["updates"]
        })
    }

    fn call(&self, arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>> {
        Box::pin(async move {
            let updates: Vec<UpdateSpec> = serde_json::from_value(arguments["updates"].clone())
                .map_err(|e| ToolError::ArgumentDecode(e.to_string()))?;

            let mut list = self.todos.write().await;
            let mut updated_ids = Vec::new();
            let mut not_found = Vec::new();

            for update in updates {
                if let Some(todo) = list.iter_mut().find(|t| t.id == update.id) {
                    todo.status = update.status;
                    updated_ids.push(update.id);
                } else {
                    not_found.push(update.id);
                }
            }

            let all_completed = !list.is_empty() && list.iter().all(|t| t.status == TodoStatus::Completed);
            if all_completed {
                list.clear();
            }

            Ok(json!({
                "updated": updated_ids,
                "not_found": not_found,
                "cleared": all_completed,
                "todos": list.clone(),
            }))
        })
    }
}

struct ListTodos {
    todos: TodoList,
}

impl Tool for ListTodos {
    fn name(&self) -> &str {
        "list_todos"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Todo
    }

    fn description(&self) -> &str {
        "List the current ephemeral todo items."
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations { title: Some("List todos".into()), read_only_hint: true }
    }

    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    fn call(&self, _arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>> {
        Box::pin(async move {
            let list = self.todos.read().await;
            Ok(json!({ "todos": *list }))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn update_to_all_completed_clears_the_list() {
        let set = TodoToolSet::new();
        let create = CreateTodos { todos: set.todos.clone() };
        create
            .call(json!({ "descriptions": ["a", "b"] }))
            .await
            .unwrap();

        let update = UpdateTodos { todos: set.todos.clone() };
        let result = update
            .call(json!({ "updates": [
                { "id": "todo_0", "status": "completed" },
                { "id": "todo_1", "status": "completed" },
            ] }))
            .await
            .unwrap();

        assert_eq!(result["cleared"], json!(true));
        assert_eq!(result["todos"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn update_reports_not_found_ids_without_failing() {
        let set = TodoToolSet::new();
        let create = CreateTodo { todos: set.todos.clone() };
        create.call(json!({ "description": "a" })).await.unwrap();

        let update = UpdateTodos { todos: set.todos.clone() };
        let result = update
            .call(json!({ "updates": [
                { "id": "todo_0", "status": "in_progress" },
                { "id": "todo_99", "status": "completed" },
            ] }))
            .await
            .unwrap();

        assert_eq!(result["updated"], json!(["todo_0"]));
        assert_eq!(result["not_found"], json!(["todo_99"]));
        assert_eq!(result["cleared"], json!(false));
    }
}
