//! LSP ToolSet: a long-lived JSON-RPC bridge to external language
//! servers, one session per configured extension/language id, started
//! lazily on first file-scoped request.

mod client;
mod tools_impl;
mod uri;

pub use client::LspSession;
pub use uri::{language_id_for, path_to_uri, uri_to_path};

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::Mutex as AsyncMutex;

use crate::config::LspConfig;
use crate::error::ToolError;
use crate::tool::{BoxFuture, Tool, ToolSet};

/// Cheap-to-clone handle shared by every LSP tool: resolves (lazily
/// starting, if needed) the session for a file's configured server.
#[derive(Clone)]
pub struct SessionManager {
    config: Arc<LspConfig>,
    workspace_root: Arc<std::path::Path>,
    sessions: Arc<AsyncMutex<HashMap<String, Arc<LspSession>>>>,
}

impl SessionManager {
    fn server_key_for(&self, path: &Path) -> Option<String> {
        let ext = path.extension().and_then(|e| e.to_str())?;
        if self.config.servers.contains_key(ext) {
            return Some(ext.to_string());
        }
        None
    }

    pub async fn session_for(&self, path: &Path) -> Result<Arc<LspSession>, ToolError> {
        let key = self
            .server_key_for(path)
            .ok_or_else(|| ToolError::SubsystemUnavailable(format!("no LSP server configured for {}", path.display())))?;

        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get(&key) {
            return Ok(session.clone());
        }

        let spec = self.config.servers.get(&key).expect("checked above").clone();
        let session = Arc::new(LspSession::start(&self.workspace_root, &spec.command, &spec.args).await?);
        sessions.insert(key, session.clone());
        Ok(session)
    }

    async fn all_sessions(&self) -> Vec<Arc<LspSession>> {
        self.sessions.lock().await.values().cloned().collect()
    }
}

pub struct LspToolSet {
    manager: SessionManager,
    has_servers: bool,
}

impl LspToolSet {
    pub fn new(config: LspConfig, workspace_root: std::path::PathBuf) -> Self {
        let has_servers = !config.servers.is_empty();
        Self {
            manager: SessionManager {
                config: Arc::new(config),
                workspace_root: Arc::from(workspace_root.as_path()),
                sessions: Arc::new(AsyncMutex::new(HashMap::new())),
            },
            has_servers,
        }
    }
}

impl ToolSet for LspToolSet {
    fn id(&self) -> &str {
        "lsp"
    }

    fn tools(&self) -> Vec<Arc<dyn Tool>> {
        tools_impl::all_tools(self.manager.clone())
    }

    fn instructions(&self) -> Option<String> {
        if !self.has_servers {
            None
        } else {
            Some(
                "LSP tools provide code intelligence (hover, definitions, references, \
                 diagnostics, rename, ...) for files whose extension has a configured \
                 language server. Positions are 1-based for both line and character."
                    .to_string(),
            )
        }
    }

    fn stop(&self) -> BoxFuture<'_, Result<(), ToolError>> {
        Box::pin(async move {
            for session in self.manager.all_sessions().await {
                if let Err(e) = session.shutdown().await {
                    tracing::warn!(error = %e, "LSP session failed to shut down cleanly");
                }
            }
            Ok(())
        })
    }
}
