//! write_file

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::config::PostEditHook;
use crate::error::ToolError;
use crate::tool::{BoxFuture, Tool, ToolAnnotations, ToolCategory};

use super::hooks::run_post_edit_hooks;
use super::sandbox::Sandbox;

pub struct WriteFile {
    sandbox: Sandbox,
    post_edit_hooks: Arc<Vec<PostEditHook>>,
}

impl WriteFile {
    pub fn new(sandbox: Sandbox, post_edit_hooks: Arc<Vec<PostEditHook>>) -> Self {
        Self {
            sandbox,
            post_edit_hooks,
        }
    }
}

impl Tool for WriteFile {
    fn name(&self) -> &str {
        "write_file"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Filesystem
    }

    fn description(&self) -> &str {
        "Create a new file or completely overwrite an existing file with new \
         content. Use with caution as it will overwrite existing files \
         without warning. Handles text content with proper encoding. Only \
         works within allowed directories."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "Absolute path of the file to write" },
                "content": { "type": "string", "description": "Content to write" }
            },
            "required": ["path", "content"]
        })
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations {
            title: Some("Write File".into()),
            read_only_hint: false,
        }
    }

    fn call(&self, arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>> {
        Box::pin(async move {
            let path_str = arguments["path"]
                .as_str()
                .ok_or_else(|| ToolError::ArgumentDecode("path is required".into()))?;
            let content = arguments["content"]
                .as_str()
                .ok_or_else(|| ToolError::ArgumentDecode("content is required".into()))?;

            let path = PathBuf::from(path_str);
            let validated = self.sandbox.validate_write_path(&path)?;

            tokio::fs::write(&validated, content)
                .await
                .map_err(ToolError::Io)?;

            run_post_edit_hooks(&self.post_edit_hooks, &validated).await;

            Ok(json!({
                "path": super::path_utils::path_to_display(&validated),
                "bytes_written": content.len(),
            }))
        })
    }
}
