//! read_file / read_multiple_files

use std::path::PathBuf;

use serde_json::{json, Value};

use crate::error::ToolError;
use crate::tool::{BoxFuture, Tool, ToolAnnotations, ToolCategory};

use super::sandbox::Sandbox;

pub struct ReadFile {
    sandbox: Sandbox,
}

impl ReadFile {
    pub fn new(sandbox: Sandbox) -> Self {
        Self { sandbox }
    }
}

impl Tool for ReadFile {
    fn name(&self) -> &str {
        "read_file"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Filesystem
    }

    fn description(&self) -> &str {
        "Read the complete contents of a file from the file system as text. \
         Handles various text encodings and provides detailed error messages \
         if the file cannot be read. Use this tool when you need to examine \
         the contents of a single file. Only works within allowed directories."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "Absolute path to the file to read" }
            },
            "required": ["path"]
        })
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations {
            title: Some("Read File".into()),
            read_only_hint: true,
        }
    }

    fn call(&self, arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>> {
        Box::pin(async move {
            let path_str = arguments["path"]
                .as_str()
                .ok_or_else(|| ToolError::ArgumentDecode("path is required".into()))?;

            let validated = self.sandbox.validate_path(&PathBuf::from(path_str))?;
            let content = tokio::fs::read_to_string(&validated)
                .await
                .map_err(ToolError::Io)?;

            Ok(json!({
                "path": super::path_utils::path_to_display(&validated),
                "content": content,
                "bytes": content.len(),
            }))
        })
    }
}

pub struct ReadMultipleFiles {
    sandbox: Sandbox,
}

impl ReadMultipleFiles {
    pub fn new(sandbox: Sandbox) -> Self {
        Self { sandbox }
    }
}

impl Tool for ReadMultipleFiles {
    fn name(&self) -> &str {
        "read_multiple_files"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Filesystem
    }

    fn description(&self) -> &str {
        "Read the contents of multiple files simultaneously. This is more \
         efficient than reading files one by one when you need to analyze \
         or compare multiple files. Each file's content is returned with \
         its path as a reference. Failed reads for individual files won't \
         stop the entire operation. Only works within allowed directories."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "paths": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Absolute paths of the files to read"
                }
            },
            "required": ["paths"]
        })
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations {
            title: Some("Read Multiple Files".into()),
            read_only_hint: true,
        }
    }

    fn call(&self, arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>> {
        Box::pin(async move {
            let paths = arguments["paths"]
                .as_array()
                .ok_or_else(|| ToolError::ArgumentDecode("paths array is required".into()))?;

            let mut results = Vec::with_capacity(paths.len());
            for p in paths {
                let path_str = p
                    .as_str()
                    .ok_or_else(|| ToolError::ArgumentDecode("paths must be strings".into()))?;

                // Each path is resolved and read independently so one
                // missing or unreadable file doesn't fail the whole call.
                let entry = match self.sandbox.validate_path(&PathBuf::from(path_str)) {
                    Ok(validated) => match tokio::fs::read_to_string(&validated).await {
                        Ok(content) => json!({
                            "path": path_str,
                            "content": content,
                            "error": null,
                        }),
                        Err(e) => json!({ "path": path_str, "content": null, "error": e.to_string() }),
                    },
                    Err(e) => json!({ "path": path_str, "content": null, "error": e.to_string() }),
                };
                results.push(entry);
            }

            Ok(json!({ "files": results }))
        })
    }
}
