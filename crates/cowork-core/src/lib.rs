//! Cowork Core - the built-in tool runtime for an LLM agent.
//!
//! This crate owns the tool contract (`tool`), the dispatcher that
//! aggregates tool sets into one callable surface (`runtime`), the
//! TOML-backed configuration tree (`config`), and every built-in tool
//! set (`tools`): filesystem, shell, fetch, LSP, OpenAPI, tasks/todo,
//! API, deferred activation, memory, and retrieval.

pub mod config;
pub mod error;
pub mod runtime;
pub mod tool;
pub mod tools;

pub use config::{
    ApiConfig, ConfigManager, FetchConfig, LspConfig, OpenApiConfig, OpenApiSourceConfig,
    PostEditHook, RuntimeConfig, SandboxConfig, ServerSpec, ShellConfig, TasksConfig,
};
pub use error::{Error, Result, ToolError};
pub use runtime::ToolRuntime;
pub use tool::{BoxFuture, Tool, ToolAnnotations, ToolCall, ToolCallFunction, ToolCallResult, ToolCategory, ToolSet};

use std::path::PathBuf;
use std::sync::Arc;

use tools::api::ApiToolSet;
use tools::fetch::FetchToolSet;
use tools::filesystem::FilesystemToolSet;
use tools::openapi::OpenApiToolSet;
use tools::shell::ShellToolSet;
use tools::task::{TasksToolSet, TodoToolSet};

/// Build every config-driven tool set (filesystem, shell, fetch,
/// tasks, todo, API, OpenAPI, and LSP when the `lsp` feature is on) for
/// a given workspace root. Tool sets that need an embedding
/// application's own collaborators — memory, RAG, interaction
/// elicitation, deferred activation — aren't config-driven and are
/// left for the caller to construct and append before handing the
/// combined `Vec` to `ToolRuntime::new`.
pub fn build_default_toolsets(
    config: &RuntimeConfig,
    workspace_root: PathBuf,
) -> Result<Vec<Arc<dyn ToolSet>>> {
    let mut sets: Vec<Arc<dyn ToolSet>> = vec![
        Arc::new(FilesystemToolSet::new(&config.sandbox, config.post_edit_hooks.clone())),
        Arc::new(ShellToolSet::new(config.shell.clone(), workspace_root.clone())),
        Arc::new(FetchToolSet::new(config.fetch.clone()).map_err(Error::Tool)?),
        Arc::new(TasksToolSet::new(config.tasks.store_path.clone()).map_err(Error::Tool)?),
        Arc::new(TodoToolSet::new()),
        Arc::new(ApiToolSet::new(config.api.tools.clone())),
        Arc::new(OpenApiToolSet::new(config.openapi.sources.clone(), reqwest::Client::new())),
    ];

    #[cfg(feature = "lsp")]
    sets.push(Arc::new(tools::lsp::LspToolSet::new(config.lsp.clone(), workspace_root)));

    Ok(sets)
}
