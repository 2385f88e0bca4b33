//! edit_file: apply a sequence of exact string replacements to a file

use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::PostEditHook;
use crate::error::ToolError;
use crate::tool::{BoxFuture, Tool, ToolAnnotations, ToolCategory};

use super::hooks::run_post_edit_hooks;
use super::sandbox::Sandbox;

#[derive(Debug, Deserialize)]
struct EditSpec {
    old_string: String,
    new_string: String,
    #[serde(default)]
    replace_all: bool,
}

pub struct EditFile {
    sandbox: Sandbox,
    post_edit_hooks: Arc<Vec<PostEditHook>>,
}

impl EditFile {
    pub fn new(sandbox: Sandbox, post_edit_hooks: Arc<Vec<PostEditHook>>) -> Self {
        Self {
            sandbox,
            post_edit_hooks,
        }
    }
}

impl Tool for EditFile {
    fn name(&self) -> &str {
        "edit_file"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Filesystem
    }

    fn description(&self) -> &str {
        "Make line-based edits to a text file. Each edit replaces exact \
         occurrences of old_string with new_string. Edits are applied in \
         the order given, each against the result of the previous one. An \
         edit fails the whole call if old_string is not found, or is found \
         more than once and replace_all is not set. Set dry_run to preview \
         the edits without writing the file."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "Absolute path of the file to edit" },
                "edits": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "old_string": { "type": "string" },
                            "new_string": { "type": "string" },
                            "replace_all": { "type": "boolean", "default": false }
                        },
                        "required": ["old_string", "new_string"]
                    }
                },
                "dry_run": {
                    "type": "boolean",
                    "description": "Preview the result without writing to disk",
                    "default": false
                }
            },
            "required": ["path", "edits"]
        })
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations {
            title: Some("Edit File".into()),
            read_only_hint: false,
        }
    }

    fn call(&self, arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>> {
        Box::pin(async move {
            let path_str = arguments["path"]
                .as_str()
                .ok_or_else(|| ToolError::ArgumentDecode("path is required".into()))?;
            let edits: Vec<EditSpec> = serde_json::from_value(
                arguments["edits"].clone(),
            )
            .map_err(|e| ToolError::ArgumentDecode(format!("invalid edits: {e}")))?;
            if edits.is_empty() {
                return Err(ToolError::ArgumentDecode("edits must not be empty".into()));
            }
            let dry_run = arguments["dry_run"].as_bool().unwrap_or(false);

            let validated = self.sandbox.validate_path(&PathBuf::from(path_str))?;
            let original = tokio::fs::read_to_string(&validated)
                .await
                .map_err(ToolError::Io)?;

            let mut content = original.clone();
            let mut total_occurrences = 0usize;
            for (i, edit) in edits.iter().enumerate() {
                if edit.old_string == edit.new_string {
                    return Err(ToolError::ArgumentDecode(format!(
                        "edit {i}: old_string and new_string must differ"
                    )));
                }
                let occurrences = content.matches(edit.old_string.as_str()).count();
                if occurrences == 0 {
                    return Err(ToolError::ArgumentDecode(format!(
                        "edit {i}: old_string not found in file"
                    )));
                }
                if !edit.replace_all && occurrences > 1 {
                    return Err(ToolError::ArgumentDecode(format!(
                        "edit {i}: old_string appears {occurrences} times; pass replace_all or add more context"
                    )));
                }
                content = if edit.replace_all {
                    content.replace(edit.old_string.as_str(), &edit.new_string)
                } else {
                    content.replacen(edit.old_string.as_str(), &edit.new_string, 1)
                };
                total_occurrences += if edit.replace_all { occurrences } else { 1 };
            }

            let diff = unified_diff(&original, &content);

            if dry_run {
                return Ok(json!({
                    "path": super::path_utils::path_to_display(&validated),
                    "dry_run": true,
                    "diff": diff,
                    "occurrences_replaced": total_occurrences,
                }));
            }

            tokio::fs::write(&validated, &content)
                .await
                .map_err(ToolError::Io)?;

            run_post_edit_hooks(&self.post_edit_hooks, &validated).await;

            Ok(json!({
                "path": super::path_utils::path_to_display(&validated),
                "dry_run": false,
                "diff": diff,
                "occurrences_replaced": total_occurrences,
            }))
        })
    }
}

/// Minimal unified-style diff over whole lines, sufficient for showing a
/// caller what an edit changed without pulling in a diff crate for
/// something this small.
fn unified_diff(before: &str, after: &str) -> String {
    let before_lines: Vec<&str> = before.lines().collect();
    let after_lines: Vec<&str> = after.lines().collect();

    let common_prefix = before_lines
        .iter()
        .zip(after_lines.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let common_suffix = before_lines[common_prefix..]
        .iter()
        .rev()
        .zip(after_lines[common_prefix..].iter().rev())
        .take_while(|(a, b)| a == b)
        .count();

    let removed = &before_lines[common_prefix..before_lines.len() - common_suffix];
    let added = &after_lines[common_prefix..after_lines.len() - common_suffix];

    let mut out = String::new();
    for line in removed {
        out.push_str("-");
        out.push_str(line);
        out.push('\n');
    }
    for line in added {
        out.push_str("+");
        out.push_str(line);
        out.push('\n');
    }
    out
}
