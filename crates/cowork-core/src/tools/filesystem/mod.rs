//! Filesystem ToolSet: a sandboxed view over a set of allowed
//! directories, exposing the directory/file manipulation tools.

mod directory;
mod edit;
mod glob;
mod hooks;
mod list;
mod move_file;
mod path_utils;
mod read;
pub mod sandbox;
mod search;
mod write;

pub use path_utils::{
    normalize_path, path_needs_shell_escape, path_to_display, path_to_glob_pattern, path_to_uri,
    shell_escape_path, shell_escape_str, uri_to_path,
};
pub use sandbox::Sandbox;

use std::sync::Arc;

use crate::config::{PostEditHook, SandboxConfig};
use crate::tool::{Tool, ToolSet};

/// The filesystem built-ins: directory/file read, write, edit, search,
/// and move tools, plus the sandbox's own introspection/growth tools.
pub struct FilesystemToolSet {
    sandbox: Sandbox,
    post_edit_hooks: Arc<Vec<PostEditHook>>,
}

impl FilesystemToolSet {
    pub fn new(config: &SandboxConfig, post_edit_hooks: Vec<PostEditHook>) -> Self {
        Self {
            sandbox: Sandbox::new(config.allowed_directories.clone()),
            post_edit_hooks: Arc::new(post_edit_hooks),
        }
    }

    /// Directly constructed sandbox, for tests and embedding contexts
    /// that already have their own directory list.
    pub fn with_sandbox(sandbox: Sandbox, post_edit_hooks: Vec<PostEditHook>) -> Self {
        Self {
            sandbox,
            post_edit_hooks: Arc::new(post_edit_hooks),
        }
    }

    pub fn sandbox(&self) -> &Sandbox {
        &self.sandbox
    }
}

impl ToolSet for FilesystemToolSet {
    fn id(&self) -> &str {
        "filesystem"
    }

    fn tools(&self) -> Vec<Arc<dyn Tool>> {
        vec![
            Arc::new(read::ReadFile::new(self.sandbox.clone())),
            Arc::new(read::ReadMultipleFiles::new(self.sandbox.clone())),
            Arc::new(write::WriteFile::new(self.sandbox.clone(), self.post_edit_hooks.clone())),
            Arc::new(edit::EditFile::new(self.sandbox.clone(), self.post_edit_hooks.clone())),
            Arc::new(list::ListDirectory::new(self.sandbox.clone())),
            Arc::new(list::ListDirectoryWithSizes::new(self.sandbox.clone())),
            Arc::new(list::DirectoryTree::new(self.sandbox.clone())),
            Arc::new(directory::CreateDirectory::new(self.sandbox.clone())),
            Arc::new(move_file::MoveFile::new(self.sandbox.clone())),
            Arc::new(glob::SearchFiles::new(self.sandbox.clone())),
            Arc::new(search::SearchFilesContent::new(self.sandbox.clone())),
            Arc::new(directory::GetFileInfo::new(self.sandbox.clone())),
            Arc::new(directory::ListAllowedDirectories::new(self.sandbox.clone())),
            Arc::new(directory::AddAllowedDirectory::new(self.sandbox.clone())),
        ]
    }

    fn instructions(&self) -> Option<String> {
        Some(
            "Filesystem tools only operate within the directories returned by \
             list_allowed_directories. If a path falls outside that set, use \
             add_allowed_directory to request access before retrying — the \
             first call returns a pending confirmation; only resubmit it with \
             confirmed: true once the user has actually agreed."
                .to_string(),
        )
    }
}
