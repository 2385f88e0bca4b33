//! Runtime configuration: the `RuntimeConfig` tree and the manager that
//! loads, merges, and persists it as TOML.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Top-level configuration for a `ToolRuntime` instance.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub sandbox: SandboxConfig,
    #[serde(default)]
    pub shell: ShellConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub lsp: LspConfig,
    #[serde(default)]
    pub post_edit_hooks: Vec<PostEditHook>,
    #[serde(default)]
    pub tasks: TasksConfig,
    #[serde(default)]
    pub openapi: OpenApiConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

/// Filesystem sandbox: the set of directories tools are permitted to
/// touch. Grown at runtime via the consent-gated `add_allowed_directory`
/// tool, seeded here from config/CLI args.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SandboxConfig {
    #[serde(default)]
    pub allowed_directories: Vec<PathBuf>,
}

/// Shell tool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShellConfig {
    /// Override the platform default shell (`/bin/sh` / `cmd.exe`).
    #[serde(default)]
    pub shell_override: Option<String>,
    /// Extra environment variables merged into each spawned shell.
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            shell_override: None,
            env: HashMap::new(),
        }
    }
}

/// Fetch tool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub default_timeout_secs: u64,
    #[serde(default = "default_max_timeout_secs")]
    pub max_timeout_secs: u64,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_user_agent() -> String {
    "cowork-fetch/0.1".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_max_timeout_secs() -> u64 {
    120
}
fn default_max_body_bytes() -> usize {
    1024 * 1024
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            default_timeout_secs: default_timeout_secs(),
            max_timeout_secs: default_max_timeout_secs(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

/// Per-extension language server launch specs.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LspConfig {
    #[serde(default)]
    pub servers: HashMap<String, ServerSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSpec {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// A shell command template run after a successful filesystem write or
/// edit whose path matches `path_glob` (e.g. `"*.rs" -> "rustfmt {path}"`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostEditHook {
    pub path_glob: String,
    pub cmd_template: String,
}

/// Persistent task store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksConfig {
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("tasks.json")
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
        }
    }
}

/// OpenAPI ToolSet settings: every configured spec is fetched and
/// synthesized into tools at startup.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OpenApiConfig {
    #[serde(default)]
    pub sources: Vec<OpenApiSourceConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenApiSourceConfig {
    pub name: String,
    pub spec_url: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

/// Hand-templated API ToolSet settings, one `ApiToolConfig` per tool.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiConfig {
    #[serde(default)]
    pub tools: Vec<crate::tools::api::ApiToolConfig>,
}

/// Loads, merges, and persists a `RuntimeConfig` against a TOML file on
/// disk, mirroring the load-if-exists/default-otherwise pattern used
/// elsewhere in this crate for user-facing configuration.
pub struct ConfigManager {
    config_path: PathBuf,
    config: RuntimeConfig,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        Self::with_path(Self::default_config_path()?)
    }

    pub fn with_path(config_path: PathBuf) -> Result<Self> {
        let config = if config_path.exists() {
            Self::load_from_path(&config_path)?
        } else {
            RuntimeConfig::default()
        };
        Ok(Self { config_path, config })
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("could not find config directory".to_string()))?;
        Ok(config_dir.join("cowork").join("runtime.toml"))
    }

    fn load_from_path(path: &Path) -> Result<RuntimeConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config: {e}")))?;
        toml::from_str(&content).map_err(|e| Error::Config(format!("failed to parse config: {e}")))
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut RuntimeConfig {
        &mut self.config
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("failed to create config dir: {e}")))?;
        }
        let content = toml::to_string_pretty(&self.config)
            .map_err(|e| Error::Config(format!("failed to serialize config: {e}")))?;
        std::fs::write(&self.config_path, content)
            .map_err(|e| Error::Config(format!("failed to write config: {e}")))?;
        Ok(())
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new().unwrap_or_else(|_| Self {
            config_path: PathBuf::from("runtime.toml"),
            config: RuntimeConfig::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_roundtrip_through_toml() {
        let cfg = RuntimeConfig::default();
        let s = toml::to_string_pretty(&cfg).unwrap();
        let back: RuntimeConfig = toml::from_str(&s).unwrap();
        assert_eq!(back.fetch.max_body_bytes, cfg.fetch.max_body_bytes);
    }

    #[test]
    fn manager_loads_missing_path_as_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runtime.toml");
        let manager = ConfigManager::with_path(path.clone()).unwrap();
        assert_eq!(manager.config().tasks.store_path, PathBuf::from("tasks.json"));
        assert_eq!(manager.config_path(), path);
    }

    #[test]
    fn manager_saves_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runtime.toml");
        let mut manager = ConfigManager::with_path(path.clone()).unwrap();
        manager
            .config_mut()
            .sandbox
            .allowed_directories
            .push(PathBuf::from("/tmp/workspace"));
        manager.save().unwrap();

        let reloaded = ConfigManager::with_path(path).unwrap();
        assert_eq!(
            reloaded.config().sandbox.allowed_directories,
            vec![PathBuf::from("/tmp/workspace")]
        );
    }
}
