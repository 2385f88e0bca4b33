//! move_file

use std::path::PathBuf;

use serde_json::{json, Value};

use crate::error::ToolError;
use crate::tool::{BoxFuture, Tool, ToolAnnotations, ToolCategory};

use super::path_utils::path_to_display;
use super::sandbox::Sandbox;

pub struct MoveFile {
    sandbox: Sandbox,
}

impl MoveFile {
    pub fn new(sandbox: Sandbox) -> Self {
        Self { sandbox }
    }
}

impl Tool for MoveFile {
    fn name(&self) -> &str {
        "move_file"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Filesystem
    }

    fn description(&self) -> &str {
        "Move or rename files and directories. Can move files between \
         directories and rename them in a single operation. If the \
         destination exists, the operation fails. Works across different \
         directories, both of which must be within the allowed set."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "source": { "type": "string", "description": "Absolute source path" },
                "destination": { "type": "string", "description": "Absolute destination path" }
            },
            "required": ["source", "destination"]
        })
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations {
            title: Some("Move File".into()),
            read_only_hint: false,
        }
    }

    fn call(&self, arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>> {
        Box::pin(async move {
            let source_str = arguments["source"]
                .as_str()
                .ok_or_else(|| ToolError::ArgumentDecode("source is required".into()))?;
            let dest_str = arguments["destination"]
                .as_str()
                .ok_or_else(|| ToolError::ArgumentDecode("destination is required".into()))?;

            let validated_source = self.sandbox.validate_path(&PathBuf::from(source_str))?;
            let validated_dest = self.sandbox.validate_write_path(&PathBuf::from(dest_str))?;

            if validated_dest.exists() {
                return Err(ToolError::PolicyDenied(format!(
                    "destination {} already exists",
                    validated_dest.display()
                )));
            }

            tokio::fs::rename(&validated_source, &validated_dest)
                .await
                .map_err(ToolError::Io)?;

            Ok(json!({
                "source": path_to_display(&validated_source),
                "destination": path_to_display(&validated_dest),
            }))
        })
    }
}
