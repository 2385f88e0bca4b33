//! search_files: find files by name/glob pattern under a directory

use std::path::PathBuf;

use serde_json::{json, Value};

use crate::error::ToolError;
use crate::tool::{BoxFuture, Tool, ToolAnnotations, ToolCategory};

use super::path_utils::path_to_display;
use super::sandbox::Sandbox;

pub struct SearchFiles {
    sandbox: Sandbox,
}

impl SearchFiles {
    pub fn new(sandbox: Sandbox) -> Self {
        Self { sandbox }
    }
}

impl Tool for SearchFiles {
    fn name(&self) -> &str {
        "search_files"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Filesystem
    }

    fn description(&self) -> &str {
        "Recursively search for files and directories matching a name \
         pattern. Searches through all subdirectories from the starting \
         path. The pattern is case-insensitive and matches anywhere in the \
         entry name. Provide excludePatterns to skip matching paths (e.g. \
         node_modules). Great for finding files when you don't know their \
         exact location. Only works within allowed directories."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "Absolute path to start searching from" },
                "pattern": { "type": "string", "description": "Name substring or glob to match" },
                "exclude_patterns": {
                    "type": "array",
                    "items": { "type": "string" },
                    "default": []
                }
            },
            "required": ["path", "pattern"]
        })
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations {
            title: Some("Search Files".into()),
            read_only_hint: true,
        }
    }

    fn call(&self, arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>> {
        Box::pin(async move {
            let path_str = arguments["path"]
                .as_str()
                .ok_or_else(|| ToolError::ArgumentDecode("path is required".into()))?;
            let pattern = arguments["pattern"]
                .as_str()
                .ok_or_else(|| ToolError::ArgumentDecode("pattern is required".into()))?
                .to_lowercase();
            let exclude_patterns: Vec<String> = arguments["exclude_patterns"]
                .as_array()
                .map(|a| a.iter().filter_map(|v| v.as_str().map(String::from)).collect())
                .unwrap_or_default();

            let validated = self.sandbox.validate_path(&PathBuf::from(path_str))?;

            let mut exclude_set = globset::GlobSetBuilder::new();
            for p in &exclude_patterns {
                if let Ok(g) = globset::Glob::new(p) {
                    exclude_set.add(g);
                }
            }
            let exclude_set = exclude_set
                .build()
                .map_err(|e| ToolError::ArgumentDecode(format!("invalid exclude_patterns: {e}")))?;

            let results = tokio::task::spawn_blocking(move || {
                let mut matches = Vec::new();
                for entry in ignore::WalkBuilder::new(&validated).hidden(false).build() {
                    let Ok(entry) = entry else { continue };
                    if entry.path() == validated {
                        continue;
                    }
                    let name = entry.file_name().to_string_lossy().to_lowercase();
                    if !name.contains(&pattern) {
                        continue;
                    }
                    if exclude_set.is_match(entry.path()) {
                        continue;
                    }
                    matches.push(path_to_display(entry.path()));
                }
                matches
            })
            .await
            .map_err(|e| ToolError::Fatal(format!("search_files task panicked: {e}")))?;

            let count = results.len();
            Ok(json!({ "matches": results, "count": count }))
        })
    }
}
