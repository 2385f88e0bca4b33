//! Shell ToolSet: a single `shell` tool that runs one command to
//! completion, tearing down the whole process group on timeout so a
//! pipeline or backgrounded sub-process can't outlive the call.

mod execute;

pub use execute::ShellExecute;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use cowork_sandbox::process_group::KillHandle;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::config::ShellConfig;
use crate::tool::{Tool, ToolSet};

/// Kill handles for every `shell` call currently running, keyed by a
/// call id, so `ToolSet::stop` can tear all of them down together
/// instead of leaving child processes running past runtime shutdown.
pub type LiveProcesses = Arc<Mutex<HashMap<Uuid, KillHandle>>>;

pub struct ShellToolSet {
    config: ShellConfig,
    default_cwd: PathBuf,
    live_processes: LiveProcesses,
}

impl ShellToolSet {
    pub fn new(config: ShellConfig, default_cwd: PathBuf) -> Self {
        Self {
            config,
            default_cwd,
            live_processes: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl ToolSet for ShellToolSet {
    fn id(&self) -> &str {
        "shell"
    }

    fn tools(&self) -> Vec<Arc<dyn Tool>> {
        vec![Arc::new(ShellExecute::new(
            self.config.clone(),
            self.default_cwd.clone(),
            self.live_processes.clone(),
        ))]
    }

    fn stop(&self) -> crate::tool::BoxFuture<'_, Result<(), crate::error::ToolError>> {
        Box::pin(async move {
            let handles: Vec<_> = self.live_processes.lock().values().copied().collect();
            for handle in handles {
                let _ = handle.kill().await;
            }
            Ok(())
        })
    }
}
