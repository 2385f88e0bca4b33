//! list_directory / list_directory_with_sizes / directory_tree

use std::path::PathBuf;

use serde_json::{json, Value};

use crate::error::ToolError;
use crate::tool::{BoxFuture, Tool, ToolAnnotations, ToolCategory};

use super::path_utils::path_to_display;
use super::sandbox::Sandbox;

async fn read_entries(path: &std::path::Path) -> Result<Vec<(String, bool)>, ToolError> {
    let mut dir = tokio::fs::read_dir(path).await.map_err(ToolError::Io)?;
    let mut entries = Vec::new();
    while let Some(entry) = dir.next_entry().await.map_err(ToolError::Io)? {
        let name = entry.file_name().to_string_lossy().to_string();
        let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
        entries.push((name, is_dir));
    }
    entries.sort();
    Ok(entries)
}

pub struct ListDirectory {
    sandbox: Sandbox,
}

impl ListDirectory {
    pub fn new(sandbox: Sandbox) -> Self {
        Self { sandbox }
    }
}

impl Tool for ListDirectory {
    fn name(&self) -> &str {
        "list_directory"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Filesystem
    }

    fn description(&self) -> &str {
        "Get a detailed listing of all files and directories in a specified \
         path. Results distinguish between files and directories with [FILE] \
         and [DIR] prefixes. Only works within allowed directories."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "Absolute path of the directory to list" }
            },
            "required": ["path"]
        })
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations {
            title: Some("List Directory".into()),
            read_only_hint: true,
        }
    }

    fn call(&self, arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>> {
        Box::pin(async move {
            let path_str = arguments["path"]
                .as_str()
                .ok_or_else(|| ToolError::ArgumentDecode("path is required".into()))?;
            let validated = self.sandbox.validate_path(&PathBuf::from(path_str))?;

            let entries = read_entries(&validated).await?;
            let rendered: Vec<Value> = entries
                .into_iter()
                .map(|(name, is_dir)| {
                    json!({
                        "name": name,
                        "type": if is_dir { "directory" } else { "file" },
                    })
                })
                .collect();

            Ok(json!({ "path": path_to_display(&validated), "entries": rendered }))
        })
    }
}

pub struct ListDirectoryWithSizes {
    sandbox: Sandbox,
}

impl ListDirectoryWithSizes {
    pub fn new(sandbox: Sandbox) -> Self {
        Self { sandbox }
    }
}

impl Tool for ListDirectoryWithSizes {
    fn name(&self) -> &str {
        "list_directory_with_sizes"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Filesystem
    }

    fn description(&self) -> &str {
        "Get a detailed listing of all files and directories in a specified \
         path, including file sizes. Results can be sorted by name or size. \
         Only works within allowed directories."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "Absolute path of the directory to list" },
                "sort_by": {
                    "type": "string",
                    "enum": ["name", "size"],
                    "default": "name"
                }
            },
            "required": ["path"]
        })
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations {
            title: Some("List Directory With Sizes".into()),
            read_only_hint: true,
        }
    }

    fn call(&self, arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>> {
        Box::pin(async move {
            let path_str = arguments["path"]
                .as_str()
                .ok_or_else(|| ToolError::ArgumentDecode("path is required".into()))?;
            let sort_by = arguments["sort_by"].as_str().unwrap_or("name");
            let validated = self.sandbox.validate_path(&PathBuf::from(path_str))?;

            let mut dir = tokio::fs::read_dir(&validated).await.map_err(ToolError::Io)?;
            let mut entries = Vec::new();
            let mut total_size: u64 = 0;
            while let Some(entry) = dir.next_entry().await.map_err(ToolError::Io)? {
                let name = entry.file_name().to_string_lossy().to_string();
                let metadata = entry.metadata().await.ok();
                let is_dir = metadata.as_ref().map(|m| m.is_dir()).unwrap_or(false);
                let size = metadata.as_ref().map(|m| m.len()).unwrap_or(0);
                if !is_dir {
                    total_size += size;
                }
                entries.push((name, is_dir, size));
            }

            match sort_by {
                "size" => entries.sort_by(|a, b| b.2.cmp(&a.2)),
                _ => entries.sort_by(|a, b| a.0.cmp(&b.0)),
            }

            let rendered: Vec<Value> = entries
                .iter()
                .map(|(name, is_dir, size)| {
                    json!({
                        "name": name,
                        "type": if *is_dir { "directory" } else { "file" },
                        "size_bytes": size,
                    })
                })
                .collect();

            Ok(json!({
                "path": path_to_display(&validated),
                "entries": rendered,
                "total_files": entries.iter().filter(|e| !e.1).count(),
                "total_size_bytes": total_size,
            }))
        })
    }
}

pub struct DirectoryTree {
    sandbox: Sandbox,
}

impl DirectoryTree {
    pub fn new(sandbox: Sandbox) -> Self {
        Self { sandbox }
    }
}

impl Tool for DirectoryTree {
    fn name(&self) -> &str {
        "directory_tree"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Filesystem
    }

    fn description(&self) -> &str {
        "Get a recursive tree view of files and directories as a JSON \
         structure. Each entry includes name, type, and children for \
         directories. Files have no children array. VCS-ignored paths \
         (as matched by any .gitignore chain) are skipped. Only works \
         within allowed directories."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "Absolute path of the root directory" },
                "max_depth": {
                    "type": "integer",
                    "description": "Maximum recursion depth",
                    "default": 10
                }
            },
            "required": ["path"]
        })
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations {
            title: Some("Directory Tree".into()),
            read_only_hint: true,
        }
    }

    fn call(&self, arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>> {
        Box::pin(async move {
            let path_str = arguments["path"]
                .as_str()
                .ok_or_else(|| ToolError::ArgumentDecode("path is required".into()))?;
            let max_depth = arguments["max_depth"].as_u64().unwrap_or(10) as usize;
            let validated = self.sandbox.validate_path(&PathBuf::from(path_str))?;

            let tree = tokio::task::spawn_blocking(move || build_tree(&validated, max_depth))
                .await
                .map_err(|e| ToolError::Fatal(format!("directory_tree task panicked: {e}")))??;

            Ok(tree)
        })
    }
}

fn build_tree(root: &std::path::Path, max_depth: usize) -> Result<Value, ToolError> {
    let mut walker = ignore::WalkBuilder::new(root);
    walker.max_depth(Some(max_depth)).hidden(false);

    // Build a flat map of path -> entries then nest it, since `ignore`
    // walks depth-first but we need a tree, not a list.
    let mut children: std::collections::BTreeMap<PathBuf, Vec<(String, bool)>> =
        std::collections::BTreeMap::new();

    for entry in walker.build() {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };
        if entry.path() == root {
            continue;
        }
        let parent = entry.path().parent().unwrap_or(root).to_path_buf();
        let name = entry.file_name().to_string_lossy().to_string();
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        children.entry(parent).or_default().push((name, is_dir));
    }

    Ok(render_node(root, &children))
}

fn render_node(
    path: &std::path::Path,
    children: &std::collections::BTreeMap<PathBuf, Vec<(String, bool)>>,
) -> Value {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path_to_display(path));

    match children.get(path) {
        Some(entries) => {
            let mut entries = entries.clone();
            entries.sort();
            let rendered: Vec<Value> = entries
                .iter()
                .map(|(child_name, is_dir)| {
                    if *is_dir {
                        render_node(&path.join(child_name), children)
                    } else {
                        json!({ "name": child_name, "type": "file" })
                    }
                })
                .collect();
            json!({ "name": name, "type": "directory", "children": rendered })
        }
        None => json!({ "name": name, "type": "directory", "children": [] }),
    }
}
