//! Process-level sandboxing

use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;

use crate::{SandboxConfig, SandboxError, SandboxResult};

/// Execute a command with process-level sandboxing
pub async fn execute_sandboxed(
    config: &SandboxConfig,
    command: &str,
    args: &[&str],
) -> Result<SandboxResult, SandboxError> {
    let start = Instant::now();

    // Build the command with resource limits
    let mut cmd = Command::new(command);
    cmd.args(args)
        .current_dir(&config.root)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    // Set environment restrictions
    cmd.env_clear();

    // Set platform-appropriate PATH
    #[cfg(windows)]
    {
        cmd.env("PATH", r"C:\Windows\System32;C:\Windows;C:\Windows\System32\Wbem");
        cmd.env("USERPROFILE", config.root.display().to_string());
    }

    #[cfg(not(windows))]
    {
        cmd.env("PATH", "/usr/local/bin:/usr/bin:/bin");
        cmd.env("HOME", config.root.display().to_string());
    }

    // Execute with timeout
    let timeout = std::time::Duration::from_secs(config.limits.max_cpu_time);
    let result: Result<Result<std::process::Output, std::io::Error>, _> =
        tokio::time::timeout(timeout, cmd.output()).await;

    match result {
        Ok(Ok(output)) => Ok(SandboxResult {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration_ms: start.elapsed().as_millis() as u64,
            memory_used: 0, // Would need platform-specific tracking
            killed: !output.status.success() && output.status.code().is_none(),
            kill_reason: None,
        }),
        Ok(Err(e)) => Err(SandboxError::Execution(e.to_string())),
        Err(_) => Ok(SandboxResult {
            exit_code: -1,
            stdout: String::new(),
            stderr: String::new(),
            duration_ms: start.elapsed().as_millis() as u64,
            memory_used: 0,
            killed: true,
            kill_reason: Some("Timeout".to_string()),
        }),
    }
}

#[cfg(target_os = "linux")]
pub mod linux {
    //! Linux-specific sandboxing using namespaces and seccomp

    use super::*;

    /// Create a sandboxed process using Linux namespaces
    pub async fn execute_namespaced(
        config: &SandboxConfig,
        command: &str,
        args: &[&str],
    ) -> Result<SandboxResult, SandboxError> {
        // Would use unshare/clone to create isolated namespaces:
        // - PID namespace (process isolation)
        // - NET namespace (network isolation)
        // - MNT namespace (filesystem isolation)
        // - USER namespace (user isolation)
        //
        // For now, fall back to basic process isolation
        execute_sandboxed(config, command, args).await
    }
}

#[cfg(target_os = "macos")]
pub mod macos {
    //! macOS-specific sandboxing using sandbox-exec

    use super::*;

    /// Create a sandboxed process using macOS sandbox
    pub async fn execute_sandbox_exec(
        config: &SandboxConfig,
        command: &str,
        args: &[&str],
    ) -> Result<SandboxResult, SandboxError> {
        // Would use sandbox-exec with a custom profile
        // For now, fall back to basic process isolation
        execute_sandboxed(config, command, args).await
    }
}
