//! create_directory / get_file_info / list_allowed_directories /
//! add_allowed_directory

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::error::ToolError;
use crate::tool::{BoxFuture, Tool, ToolAnnotations, ToolCategory};

use super::path_utils::path_to_display;
use super::sandbox::Sandbox;

pub struct CreateDirectory {
    sandbox: Sandbox,
}

impl CreateDirectory {
    pub fn new(sandbox: Sandbox) -> Self {
        Self { sandbox }
    }
}

impl Tool for CreateDirectory {
    fn name(&self) -> &str {
        "create_directory"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Filesystem
    }

    fn description(&self) -> &str {
        "Create a new directory, or ensure a directory exists. Creates \
         parent directories as needed. Succeeds silently if the directory \
         already exists. Only works within allowed directories."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "Absolute path of the directory to create" }
            },
            "required": ["path"]
        })
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations {
            title: Some("Create Directory".into()),
            read_only_hint: false,
        }
    }

    fn call(&self, arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>> {
        Box::pin(async move {
            let path_str = arguments["path"]
                .as_str()
                .ok_or_else(|| ToolError::ArgumentDecode("path is required".into()))?;
            let validated = self.sandbox.validate_write_path(&PathBuf::from(path_str))?;

            tokio::fs::create_dir_all(&validated)
                .await
                .map_err(ToolError::Io)?;

            Ok(json!({ "path": path_to_display(&validated) }))
        })
    }
}

pub struct GetFileInfo {
    sandbox: Sandbox,
}

impl GetFileInfo {
    pub fn new(sandbox: Sandbox) -> Self {
        Self { sandbox }
    }
}

impl Tool for GetFileInfo {
    fn name(&self) -> &str {
        "get_file_info"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Filesystem
    }

    fn description(&self) -> &str {
        "Retrieve detailed metadata about a file or directory: size, \
         creation time, last modified time, last accessed time, \
         permissions, and type. Only works within allowed directories."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "Absolute path to inspect" }
            },
            "required": ["path"]
        })
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations {
            title: Some("Get File Info".into()),
            read_only_hint: true,
        }
    }

    fn call(&self, arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>> {
        Box::pin(async move {
            let path_str = arguments["path"]
                .as_str()
                .ok_or_else(|| ToolError::ArgumentDecode("path is required".into()))?;
            let validated = self.sandbox.validate_path(&PathBuf::from(path_str))?;

            let metadata = tokio::fs::metadata(&validated).await.map_err(ToolError::Io)?;

            let to_rfc3339 = |t: std::io::Result<std::time::SystemTime>| {
                t.ok()
                    .map(DateTime::<Utc>::from)
                    .map(|d| d.to_rfc3339())
            };

            Ok(json!({
                "path": path_to_display(&validated),
                "type": if metadata.is_dir() { "directory" } else { "file" },
                "size_bytes": metadata.len(),
                "created": to_rfc3339(metadata.created()),
                "modified": to_rfc3339(metadata.modified()),
                "accessed": to_rfc3339(metadata.accessed()),
                "readonly": metadata.permissions().readonly(),
            }))
        })
    }
}

pub struct ListAllowedDirectories {
    sandbox: Sandbox,
}

impl ListAllowedDirectories {
    pub fn new(sandbox: Sandbox) -> Self {
        Self { sandbox }
    }
}

impl Tool for ListAllowedDirectories {
    fn name(&self) -> &str {
        "list_allowed_directories"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Filesystem
    }

    fn description(&self) -> &str {
        "Returns the list of directories the filesystem tools are currently \
         permitted to access. Call this first if unsure what is in scope."
    }

    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations {
            title: Some("List Allowed Directories".into()),
            read_only_hint: true,
        }
    }

    fn call(&self, _arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>> {
        Box::pin(async move {
            let dirs: Vec<String> = self
                .sandbox
                .list_allowed_directories()
                .iter()
                .map(|p| path_to_display(p))
                .collect();
            Ok(json!({ "allowed_directories": dirs }))
        })
    }
}

pub struct AddAllowedDirectory {
    sandbox: Sandbox,
}

impl AddAllowedDirectory {
    pub fn new(sandbox: Sandbox) -> Self {
        Self { sandbox }
    }
}

impl Tool for AddAllowedDirectory {
    fn name(&self) -> &str {
        "add_allowed_directory"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Filesystem
    }

    fn description(&self) -> &str {
        "Request that a new directory be added to the filesystem sandbox. \
         This is a two-phase operation: the first call (without confirmed) \
         returns a pending confirmation describing the directory and the \
         reason given; nothing is granted yet. Re-issuing the call with \
         confirmed: true after the user has agreed actually widens the \
         sandbox. Never set confirmed: true without the user having \
         approved this specific directory."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "Absolute path of the directory to add" },
                "reason": { "type": "string", "description": "Why this directory is needed" },
                "confirmed": {
                    "type": "boolean",
                    "description": "Set true only after the user has approved this exact request",
                    "default": false
                }
            },
            "required": ["path", "reason"]
        })
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations {
            title: Some("Add Allowed Directory".into()),
            read_only_hint: false,
        }
    }

    fn call(&self, arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>> {
        Box::pin(async move {
            let path_str = arguments["path"]
                .as_str()
                .ok_or_else(|| ToolError::ArgumentDecode("path is required".into()))?;
            let reason = arguments["reason"]
                .as_str()
                .ok_or_else(|| ToolError::ArgumentDecode("reason is required".into()))?;
            let confirmed = arguments["confirmed"].as_bool().unwrap_or(false);

            if !confirmed {
                return Ok(json!({
                    "status": "pending",
                    "path": path_str,
                    "reason": reason,
                    "message": "call again with confirmed: true once the user has approved this directory",
                }));
            }

            let added = self.sandbox.add_allowed_directory(&PathBuf::from(path_str))?;
            Ok(json!({
                "status": "confirmed",
                "path": path_to_display(&added),
            }))
        })
    }
}
