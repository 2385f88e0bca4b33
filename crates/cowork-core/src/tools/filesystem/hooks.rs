//! Post-edit hook execution.
//!
//! After a successful write or edit, the first hook whose `path_glob`
//! matches the written path is run as a detached shell command with
//! `{path}` substituted for the file's absolute path. Failures are
//! logged but never fail the write/edit call itself — a broken
//! formatter shouldn't block the agent from saving its work.

use std::path::Path;

use tracing::warn;

use crate::config::PostEditHook;

pub async fn run_post_edit_hooks(hooks: &[PostEditHook], path: &Path) {
    let display = super::path_utils::path_to_display(path);
    for hook in hooks {
        let pattern = match glob::Pattern::new(&hook.path_glob) {
            Ok(p) => p,
            Err(e) => {
                warn!(glob = %hook.path_glob, error = %e, "invalid post_edit_hooks path_glob");
                continue;
            }
        };
        if !pattern.matches(&display) {
            continue;
        }

        let cmd = hook.cmd_template.replace("{path}", &display);
        let shell = if cfg!(windows) { "cmd" } else { "sh" };
        let flag = if cfg!(windows) { "/C" } else { "-c" };

        match tokio::process::Command::new(shell).arg(flag).arg(&cmd).output().await {
            Ok(output) if !output.status.success() => {
                warn!(
                    cmd = %cmd,
                    status = %output.status,
                    stderr = %String::from_utf8_lossy(&output.stderr),
                    "post_edit_hooks command failed"
                );
            }
            Err(e) => warn!(cmd = %cmd, error = %e, "failed to spawn post_edit_hooks command"),
            _ => {}
        }
        // Only the first matching hook runs per edit.
        break;
    }
}
