//! Multi-directory filesystem sandbox with consent-gated growth.
//!
//! Every filesystem tool validates paths through a shared `Sandbox`
//! instead of a single workspace root. The allow-list starts from
//! configuration and can only grow at runtime through the two-phase
//! `add_allowed_directory` flow: a first call returns a `pending`
//! confirmation token, and only a second call echoing `confirmed: true`
//! actually widens the sandbox.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::ToolError;

use super::path_utils::normalize_path;

/// Shared, mutable set of directories filesystem tools may touch.
#[derive(Clone)]
pub struct Sandbox {
    inner: Arc<RwLock<Vec<PathBuf>>>,
}

impl Sandbox {
    pub fn new(allowed_directories: Vec<PathBuf>) -> Self {
        let canonical = allowed_directories
            .into_iter()
            .filter_map(|d| dunce::canonicalize(&d).ok())
            .collect();
        Self {
            inner: Arc::new(RwLock::new(canonical)),
        }
    }

    /// Current allow-list, most-recently-added last.
    pub fn list_allowed_directories(&self) -> Vec<PathBuf> {
        self.inner.read().clone()
    }

    /// Add a directory to the sandbox. Callers must already have user
    /// consent (the two-phase `add_allowed_directory` tool handles
    /// obtaining it) — this just performs the mechanical widening.
    pub fn add_allowed_directory(&self, dir: &Path) -> Result<PathBuf, ToolError> {
        let canonical = dunce::canonicalize(dir).map_err(|e| {
            ToolError::ArgumentDecode(format!("cannot resolve directory {}: {e}", dir.display()))
        })?;
        if !canonical.is_dir() {
            return Err(ToolError::ArgumentDecode(format!(
                "{} is not a directory",
                canonical.display()
            )));
        }
        let mut guard = self.inner.write();
        if !guard.iter().any(|d| d == &canonical) {
            guard.push(canonical.clone());
        }
        Ok(canonical)
    }

    fn is_within_sandbox(&self, canonical: &Path) -> bool {
        self.inner.read().iter().any(|d| canonical.starts_with(d))
    }

    /// Validate a path that must already exist, resolving symlinks via
    /// `dunce::canonicalize` (avoids the `\\?\` UNC prefix on Windows)
    /// before checking sandbox membership — this is what prevents a
    /// symlink planted inside the sandbox from escaping it.
    pub fn validate_path(&self, path: &Path) -> Result<PathBuf, ToolError> {
        let canonical = dunce::canonicalize(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ToolError::ArgumentDecode(format!("path not found: {}", path.display()))
            } else {
                ToolError::Io(e)
            }
        })?;

        if self.is_within_sandbox(&canonical) {
            Ok(canonical)
        } else {
            Err(ToolError::PolicyDenied(format!(
                "{} is outside the allowed directories",
                path.display()
            )))
        }
    }

    /// Validate a path for writing, which may not exist yet. Walks up
    /// to the nearest existing ancestor to canonicalize it, then
    /// reattaches the remaining (not-yet-created) components before
    /// the sandbox check.
    pub fn validate_write_path(&self, path: &Path) -> Result<PathBuf, ToolError> {
        let normalized = normalize_path(path);
        let absolute = if normalized.is_absolute() {
            normalized
        } else {
            std::env::current_dir()?.join(normalized)
        };

        let mut existing = absolute.clone();
        let mut tail: Vec<std::ffi::OsString> = Vec::new();
        while !existing.exists() {
            match existing.file_name() {
                Some(name) => {
                    tail.push(name.to_os_string());
                    existing = existing
                        .parent()
                        .map(|p| p.to_path_buf())
                        .ok_or_else(|| {
                            ToolError::ArgumentDecode(format!(
                                "no existing ancestor for {}",
                                path.display()
                            ))
                        })?;
                }
                None => {
                    return Err(ToolError::ArgumentDecode(format!(
                        "no existing ancestor for {}",
                        path.display()
                    )));
                }
            }
        }

        let mut canonical = dunce::canonicalize(&existing).map_err(ToolError::Io)?;
        for component in tail.into_iter().rev() {
            canonical.push(component);
        }

        if self.is_within_sandbox(&canonical) {
            Ok(canonical)
        } else {
            Err(ToolError::PolicyDenied(format!(
                "{} is outside the allowed directories",
                path.display()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_path_rejects_outside_sandbox() {
        let dir = tempfile::tempdir().unwrap();
        let other = tempfile::tempdir().unwrap();
        let sandbox = Sandbox::new(vec![dir.path().to_path_buf()]);

        let inside = dir.path().join("a.txt");
        std::fs::write(&inside, "hi").unwrap();
        assert!(sandbox.validate_path(&inside).is_ok());

        let outside = other.path().join("b.txt");
        std::fs::write(&outside, "hi").unwrap();
        assert!(sandbox.validate_path(&outside).is_err());
    }

    #[test]
    fn validate_write_path_allows_new_file_in_sandbox() {
        let dir = tempfile::tempdir().unwrap();
        let sandbox = Sandbox::new(vec![dir.path().to_path_buf()]);
        let new_file = dir.path().join("sub").join("new.txt");
        // parent doesn't exist yet either; walk-up should still land inside.
        std::fs::create_dir_all(dir.path().join("sub")).unwrap();
        assert!(sandbox.validate_write_path(&new_file).is_ok());
    }

    #[test]
    fn add_allowed_directory_widens_sandbox() {
        let dir = tempfile::tempdir().unwrap();
        let extra = tempfile::tempdir().unwrap();
        let sandbox = Sandbox::new(vec![dir.path().to_path_buf()]);

        let file = extra.path().join("c.txt");
        std::fs::write(&file, "hi").unwrap();
        assert!(sandbox.validate_path(&file).is_err());

        sandbox.add_allowed_directory(extra.path()).unwrap();
        assert!(sandbox.validate_path(&file).is_ok());
    }
}
