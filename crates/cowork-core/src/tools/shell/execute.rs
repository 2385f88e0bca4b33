//! shell: run one command to completion under the platform shell

use std::path::PathBuf;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::process::Command;
use uuid::Uuid;

use cowork_sandbox::ProcessGroup;

use crate::config::ShellConfig;
use crate::error::ToolError;
use crate::tool::{BoxFuture, Tool, ToolAnnotations, ToolCategory};

use super::LiveProcesses;

const DEFAULT_TIMEOUT_SECS: u64 = 120;
const MAX_TIMEOUT_SECS: u64 = 600;
const MAX_OUTPUT_BYTES: usize = 256 * 1024;

/// Command substrings that are always refused regardless of platform,
/// mirroring a conservative shell-command blocklist rather than trying
/// to parse and understand the command.
const BLOCKED_SUBSTRINGS: &[&str] = &[
    "rm -rf /",
    "mkfs",
    "dd if=/dev",
    ":(){:|:&};:",
    "format c:",
    "del /f /s /q c:\\",
    "rd /s /q c:\\",
];

pub struct ShellExecute {
    config: ShellConfig,
    default_cwd: PathBuf,
    live_processes: LiveProcesses,
}

impl ShellExecute {
    pub fn new(config: ShellConfig, default_cwd: PathBuf, live_processes: LiveProcesses) -> Self {
        Self {
            config,
            default_cwd,
            live_processes,
        }
    }

    fn platform_shell(&self) -> (String, &'static str) {
        if let Some(shell) = &self.config.shell_override {
            (shell.clone(), "-c")
        } else if cfg!(windows) {
            ("cmd".to_string(), "/C")
        } else {
            ("/bin/sh".to_string(), "-c")
        }
    }

    fn is_blocked(command: &str) -> bool {
        let lower = command.to_lowercase();
        BLOCKED_SUBSTRINGS.iter().any(|b| lower.contains(&b.to_lowercase()))
    }
}

impl Tool for ShellExecute {
    fn name(&self) -> &str {
        "shell"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Shell
    }

    fn description(&self) -> &str {
        "Run a single shell command to completion using the platform's \
         default shell (/bin/sh, or cmd.exe on Windows) and return its exit \
         code, stdout, and stderr. If the command exceeds its timeout, the \
         entire process group it spawned is terminated, not just the direct \
         child, so backgrounded sub-processes don't outlive the call. \
         Output is truncated if it exceeds 256 KiB."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "command": { "type": "string", "description": "The command line to run" },
                "cwd": { "type": "string", "description": "Working directory (absolute path)" },
                "timeout_secs": {
                    "type": "integer",
                    "description": "Timeout in seconds (max 600, default 120)",
                    "default": 120
                }
            },
            "required": ["command"]
        })
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations {
            title: Some("Shell".into()),
            read_only_hint: false,
        }
    }

    fn call(&self, arguments: Value) -> BoxFuture<'_, Result<Value, ToolError>> {
        Box::pin(async move {
            let command = arguments["command"]
                .as_str()
                .ok_or_else(|| ToolError::ArgumentDecode("command is required".into()))?;

            if Self::is_blocked(command) {
                return Err(ToolError::PolicyDenied(format!(
                    "command matches a blocked pattern: {command}"
                )));
            }

            let cwd = arguments["cwd"]
                .as_str()
                .map(PathBuf::from)
                .unwrap_or_else(|| self.default_cwd.clone());

            let timeout_secs = arguments["timeout_secs"]
                .as_u64()
                .unwrap_or(DEFAULT_TIMEOUT_SECS)
                .min(MAX_TIMEOUT_SECS);

            let (shell, flag) = self.platform_shell();
            let mut cmd = Command::new(shell);
            cmd.arg(flag).arg(command).current_dir(&cwd);
            for (k, v) in &self.config.env {
                cmd.env(k, v);
            }

            let group = ProcessGroup::spawn(cmd).map_err(ToolError::Io)?;
            let kill_handle = group.kill_handle();
            let child = group.into_child();

            let call_id = Uuid::new_v4();
            self.live_processes.lock().insert(call_id, kill_handle);
            let result = run_to_completion(child, kill_handle, timeout_secs).await;
            self.live_processes.lock().remove(&call_id);

            result
        })
    }
}

async fn run_to_completion(
    child: tokio::process::Child,
    kill_handle: cowork_sandbox::process_group::KillHandle,
    timeout_secs: u64,
) -> Result<Value, ToolError> {
    match tokio::time::timeout(Duration::from_secs(timeout_secs), child.wait_with_output()).await {
        Ok(Ok(output)) => {
            let mut combined = String::new();
            combined.push_str(&String::from_utf8_lossy(&output.stdout));
            combined.push_str(&String::from_utf8_lossy(&output.stderr));
            let mut combined = truncate(&combined);
            if combined.is_empty() {
                combined = "<no output>".to_string();
            }
            if !output.status.success() {
                combined = format!("Error executing command: {combined}");
            }
            Ok(json!({
                "exit_code": output.status.code(),
                "output": combined,
                "success": output.status.success(),
                "timed_out": false,
            }))
        }
        Ok(Err(e)) => Err(ToolError::Io(e)),
        Err(_) => {
            let _ = kill_handle.kill().await;
            Ok(json!({
                "exit_code": null,
                "stdout": "",
                "stderr": "",
                "success": false,
                "timed_out": true,
            }))
        }
    }
}

fn truncate(s: &str) -> String {
    if s.len() <= MAX_OUTPUT_BYTES {
        s.to_string()
    } else {
        format!("{}...[truncated]", &s[..MAX_OUTPUT_BYTES])
    }
}
