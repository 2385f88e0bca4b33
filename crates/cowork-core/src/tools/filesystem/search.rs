//! search_files_content: regex search across file contents

use std::path::PathBuf;

use regex::RegexBuilder;
use serde_json::{json, Value};

use crate::error::ToolError;
use crate::tool::{BoxFuture, Tool, ToolAnnotations, ToolCategory};

use super::path_utils::path_to_display;
use super::sandbox::Sandbox;

const MAX_MATCHES: usize = 500;

pub struct SearchFilesContent {
    sandbox: Sandbox,
}

impl SearchFilesContent {
    pub fn new(sandbox: Sandbox) -> Self {
        Self { sandbox }
    }
}

impl Tool for SearchFilesContent {
    fn name(&self) -> &str {
        "search_files_content"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Filesystem
    }

    fn description(&self) -> &str {
        "Search file contents for a regular expression under a directory. \
         Binary files and VCS-ignored paths are skipped. Returns at most \
         500 matches with 1-based line numbers and the matching line's \
         text; truncated is set when more matches existed. Only works \
         within allowed directories."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "Absolute path to search under" },
                "pattern": { "type": "string", "description": "Regular expression to search for" },
                "case_sensitive": { "type": "boolean", "default": true },
                "glob": {
                    "type": "string",
                    "description": "Only search files whose path matches this glob (e.g. '*.rs')"
                }
            },
            "required": ["path", "pattern"]
        })
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations {
            title: Some("Search File Contents".into()),
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
                .to_string();
            let case_sensitive = arguments["case_sensitive"].as_bool().unwrap_or(true);
            let glob_filter = arguments["glob"].as_str().map(|s| s.to_string());

            let validated = self.sandbox.validate_path(&PathBuf::from(path_str))?;

            let regex = RegexBuilder::new(&pattern)
                .case_insensitive(!case_sensitive)
                .build()
                .map_err(|e| ToolError::ArgumentDecode(format!("invalid pattern: {e}")))?;

            let glob_matcher = match &glob_filter {
                Some(g) => Some(
                    globset::Glob::new(g)
                        .map_err(|e| ToolError::ArgumentDecode(format!("invalid glob: {e}")))?
                        .compile_matcher(),
                ),
                None => None,
            };

            let (matches, truncated) = tokio::task::spawn_blocking(move || {
                let mut matches = Vec::new();
                let mut truncated = false;
                'walk: for entry in ignore::WalkBuilder::new(&validated).hidden(false).build() {
                    let Ok(entry) = entry else { continue };
                    if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                        continue;
                    }
                    if let Some(matcher) = &glob_matcher {
                        if !matcher.is_match(entry.path()) {
                            continue;
                        }
                    }
                    let Ok(content) = std::fs::read_to_string(entry.path()) else {
                        continue; // skip binary/unreadable files
                    };
                    for (i, line) in content.lines().enumerate() {
                        if regex.is_match(line) {
                            matches.push(json!({
                                "path": path_to_display(entry.path()),
                                "line": i + 1,
                                "text": line,
                            }));
                            if matches.len() >= MAX_MATCHES {
                                truncated = true;
                                break 'walk;
                            }
                        }
                    }
                }
                (matches, truncated)
            })
            .await
            .map_err(|e| ToolError::Fatal(format!("search_files_content task panicked: {e}")))?;

            Ok(json!({ "matches": matches, "truncated": truncated }))
        })
    }
}
