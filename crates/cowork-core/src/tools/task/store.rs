//! Persistent task model and JSON-file store shared by every Tasks
//! ToolSet handler. Every mutation is serialized to disk with an
//! atomic temp-file-then-rename replace, under the same lock that
//! guards the in-memory copy.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ToolError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pending,
    InProgress,
    Done,
}

/// A task's status as read, accounting for unmet dependencies: a task
/// whose dependencies are not all `Done` reads as `Blocked` regardless
/// of its own stored status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EffectiveStatus {
    Pending,
    InProgress,
    Blocked,
    Done,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub status: Status,
    #[serde(default)]
    pub dependencies: Vec<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Task {
    fn effective_status(&self, all: &[Task]) -> EffectiveStatus {
        if self.status == Status::Done {
            return EffectiveStatus::Done;
        }
        let blocked = self
            .dependencies
            .iter()
            .any(|dep| all.iter().find(|t| &t.id == dep).map(|t| t.status != Status::Done).unwrap_or(true));
        if blocked {
            EffectiveStatus::Blocked
        } else {
            match self.status {
                Status::Pending => EffectiveStatus::Pending,
                Status::InProgress => EffectiveStatus::InProgress,
                Status::Done => EffectiveStatus::Done,
            }
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TaskFile {
    #[serde(default)]
    tasks: Vec<Task>,
}

pub struct TaskStore {
    path: PathBuf,
    tasks: Vec<Task>,
}

impl TaskStore {
    pub fn load(path: PathBuf) -> Result<Self, ToolError> {
        let tasks = if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(ToolError::Io)?;
            let file: TaskFile = serde_json::from_str(&content)
                .map_err(|e| ToolError::Fatal(format!("corrupt task store: {e}")))?;
            file.tasks
        } else {
            Vec::new()
        };
        Ok(Self { path, tasks })
    }

    fn save(&self) -> Result<(), ToolError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(ToolError::Io)?;
            }
        }
        let content = serde_json::to_string_pretty(&TaskFile { tasks: self.tasks.clone() })
            .map_err(|e| ToolError::Fatal(e.to_string()))?;
        let tmp_path = tmp_sibling(&self.path);
        std::fs::write(&tmp_path, content).map_err(ToolError::Io)?;
        std::fs::rename(&tmp_path, &self.path).map_err(ToolError::Io)?;
        Ok(())
    }

    pub fn create(
        &mut self,
        title: String,
        description: String,
        priority: Priority,
        dependencies: Vec<String>,
    ) -> Result<Task, ToolError> {
        for dep in &dependencies {
            if !self.tasks.iter().any(|t| &t.id == dep) {
                return Err(ToolError::ArgumentDecode(format!("dependency {dep} does not exist")));
            }
        }
        let now = chrono::Utc::now();
        let task = Task {
            id: Uuid::new_v4().to_string(),
            title,
            description,
            priority,
            status: Status::Pending,
            dependencies,
            created_at: now,
            updated_at: now,
        };
        self.tasks.push(task.clone());
        self.save()?;
        Ok(task)
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn effective_status_of(&self, id: &str) -> Option<EffectiveStatus> {
        self.get(id).map(|t| t.effective_status(&self.tasks))
    }

    pub fn update(
        &mut self,
        id: &str,
        title: Option<String>,
        description: Option<String>,
        priority: Option<Priority>,
        status: Option<Status>,
    ) -> Result<Task, ToolError> {
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| ToolError::NotFound(format!("no such task: {id}")))?;
        if let Some(t) = title {
            task.title = t;
        }
        if let Some(d) = description {
            task.description = d;
        }
        if let Some(p) = priority {
            task.priority = p;
        }
        if let Some(s) = status {
            task.status = s;
        }
        task.updated_at = chrono::Utc::now();
        let updated = task.clone();
        self.save()?;
        Ok(updated)
    }

    pub fn delete(&mut self, id: &str) -> Result<(), ToolError> {
        let existed = self.tasks.iter().any(|t| t.id == id);
        if !existed {
            return Err(ToolError::NotFound(format!("no such task: {id}")));
        }
        self.tasks.retain(|t| t.id != id);
        for task in &mut self.tasks {
            task.dependencies.retain(|d| d != id);
        }
        self.save()?;
        Ok(())
    }

    /// Actionable tasks (non-blocked, non-done) ordered by priority
    /// descending, followed by blocked tasks.
    pub fn list_sorted(&self) -> Vec<(Task, EffectiveStatus)> {
        let mut actionable = Vec::new();
        let mut blocked = Vec::new();
        for task in &self.tasks {
            let eff = task.effective_status(&self.tasks);
            match eff {
                EffectiveStatus::Blocked => blocked.push((task.clone(), eff)),
                _ => actionable.push((task.clone(), eff)),
            }
        }
        actionable.sort_by(|a, b| b.0.priority.cmp(&a.0.priority));
        blocked.sort_by(|a, b| b.0.priority.cmp(&a.0.priority));
        actionable.extend(blocked);
        actionable
    }

    pub fn next(&self) -> Option<Task> {
        self.tasks
            .iter()
            .filter(|t| t.effective_status(&self.tasks) == EffectiveStatus::Pending || t.effective_status(&self.tasks) == EffectiveStatus::InProgress)
            .max_by_key(|t| t.priority)
            .cloned()
    }

    pub fn add_dependency(&mut self, task_id: &str, depends_on: &str) -> Result<(), ToolError> {
        if !self.tasks.iter().any(|t| t.id == task_id) {
            return Err(ToolError::NotFound(format!("no such task: {task_id}")));
        }
        if !self.tasks.iter().any(|t| t.id == depends_on) {
            return Err(ToolError::NotFound(format!("no such task: {depends_on}")));
        }
        let task = self.tasks.iter().find(|t| t.id == task_id).unwrap();
        if task.dependencies.iter().any(|d| d == depends_on) {
            return Err(ToolError::PolicyDenied(format!(
                "{task_id} already depends on {depends_on}"
            )));
        }
        if self.reachable(depends_on, task_id) {
            return Err(ToolError::PolicyDenied(format!(
                "adding dependency {depends_on} -> {task_id} would create a cycle"
            )));
        }
        self.tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .unwrap()
            .dependencies
            .push(depends_on.to_string());
        self.save()?;
        Ok(())
    }

    pub fn remove_dependency(&mut self, task_id: &str, depends_on: &str) -> Result<(), ToolError> {
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| ToolError::NotFound(format!("no such task: {task_id}")))?;
        task.dependencies.retain(|d| d != depends_on);
        self.save()?;
        Ok(())
    }

    /// Whether `target` is reachable from `start` by following
    /// dependency edges, used to reject a new edge that would close a
    /// cycle before it's added.
    fn reachable(&self, start: &str, target: &str) -> bool {
        let mut seen = HashSet::new();
        let mut stack = vec![start.to_string()];
        while let Some(current) = stack.pop() {
            if current == target {
                return true;
            }
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(task) = self.tasks.iter().find(|t| t.id == current) {
                stack.extend(task.dependencies.iter().cloned());
            }
        }
        false
    }
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("store");
    tmp.set_file_name(format!(".{file_name}.tmp-{}", Uuid::new_v4()));
    tmp
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(path: PathBuf) -> TaskStore {
        TaskStore::load(path).unwrap()
    }

    #[test]
    fn create_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        let mut s = store(path.clone());
        let t = s.create("do it".into(), "do it".into(), Priority::Medium, vec![]).unwrap();
        drop(s);

        let reloaded = store(path);
        assert_eq!(reloaded.get(&t.id).unwrap().description, "do it");
    }

    #[test]
    fn dependent_task_reads_as_blocked() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = store(dir.path().join("tasks.json"));
        let a = s.create("a".into(), "a".into(), Priority::Medium, vec![]).unwrap();
        let b = s.create("b".into(), "b".into(), Priority::Medium, vec![a.id.clone()]).unwrap();
        assert_eq!(s.effective_status_of(&b.id), Some(EffectiveStatus::Blocked));
        s.update(&a.id, None, None, None, Some(Status::Done)).unwrap();
        assert_eq!(s.effective_status_of(&b.id), Some(EffectiveStatus::Pending));
    }

    #[test]
    fn add_dependency_rejects_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = store(dir.path().join("tasks.json"));
        let a = s.create("a".into(), "a".into(), Priority::Medium, vec![]).unwrap();
        let b = s.create("b".into(), "b".into(), Priority::Medium, vec![a.id.clone()]).unwrap();
        assert!(s.add_dependency(&a.id, &b.id).is_err());
    }

    #[test]
    fn delete_scrubs_dependents() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = store(dir.path().join("tasks.json"));
        let a = s.create("a".into(), "a".into(), Priority::Medium, vec![]).unwrap();
        let b = s.create("b".into(), "b".into(), Priority::Medium, vec![a.id.clone()]).unwrap();
        s.delete(&a.id).unwrap();
        assert!(s.get(&b.id).unwrap().dependencies.is_empty());
    }
}
