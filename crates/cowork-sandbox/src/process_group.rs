//! Cross-platform process-group teardown.
//!
//! A command spawned for the shell tool may itself fork children (a
//! pipeline, a backgrounded sub-process). Killing only the direct
//! child on timeout or cancellation leaves those orphaned. On POSIX,
//! `ProcessGroup::spawn` puts the child in its own process group via
//! `setpgid`, and the resulting `KillHandle` sends its signal to the
//! whole group (`kill(-pgid, ...)`). Windows has no portable
//! equivalent of a POSIX process group, so there `KillHandle` just
//! terminates the direct child process.

use std::io;
use std::process::Stdio;

use tokio::process::{Child, Command};

use crate::SandboxError;

/// A spawned child, in its own process group on POSIX. Call
/// `kill_handle()` before consuming it with `into_child()` if the
/// caller needs to be able to terminate it while also awaiting its
/// output.
pub struct ProcessGroup {
    child: Child,
    handle: KillHandle,
}

impl ProcessGroup {
    /// Spawn `command` with stdout/stderr piped, placing it in its own
    /// process group on POSIX platforms.
    pub fn spawn(mut command: Command) -> io::Result<Self> {
        command.stdout(Stdio::piped()).stderr(Stdio::piped());

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            // SAFETY: setpgid(0, 0) in the child, before exec, only
            // affects the child's own process group membership.
            unsafe {
                command.pre_exec(|| {
                    nix::unistd::setpgid(nix::unistd::Pid::from_raw(0), nix::unistd::Pid::from_raw(0))
                        .map_err(|e| io::Error::from_raw_os_error(e as i32))
                });
            }
        }

        let child = command.spawn()?;
        let pid = child
            .id()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "spawned child has no pid"))?;

        #[cfg(unix)]
        let handle = KillHandle::Pgid(pid as i32);
        #[cfg(not(unix))]
        let handle = KillHandle::Pid(pid);

        Ok(Self { child, handle })
    }

    pub fn kill_handle(&self) -> KillHandle {
        self.handle
    }

    pub fn inner_mut(&mut self) -> &mut Child {
        &mut self.child
    }

    pub fn into_child(self) -> Child {
        self.child
    }

    /// Convenience for callers that hold the group by value and just
    /// want it gone.
    pub async fn kill(&mut self) -> Result<(), SandboxError> {
        self.handle.kill().await
    }
}

/// A lightweight, `Copy` token that can terminate a spawned group
/// without holding on to the `Child` itself, so a caller can move the
/// `Child` into a `wait_with_output()` future and still race it
/// against a timeout that kills the group.
#[derive(Debug, Clone, Copy)]
pub enum KillHandle {
    #[cfg(unix)]
    Pgid(i32),
    #[cfg(not(unix))]
    Pid(u32),
}

impl KillHandle {
    pub async fn kill(&self) -> Result<(), SandboxError> {
        match self {
            #[cfg(unix)]
            KillHandle::Pgid(pgid) => {
                use nix::sys::signal::{kill, Signal};
                use nix::unistd::Pid;
                match kill(Pid::from_raw(-pgid), Signal::SIGTERM) {
                    Ok(()) | Err(nix::errno::Errno::ESRCH) => Ok(()),
                    Err(e) => Err(SandboxError::Execution(format!("kill(-{pgid}) failed: {e}"))),
                }
            }
            #[cfg(not(unix))]
            KillHandle::Pid(pid) => kill_windows_process(*pid),
        }
    }
}

#[cfg(windows)]
fn kill_windows_process(pid: u32) -> Result<(), SandboxError> {
    use windows::Win32::Foundation::CloseHandle;
    use windows::Win32::System::Threading::{OpenProcess, TerminateProcess, PROCESS_TERMINATE};

    unsafe {
        let handle = OpenProcess(PROCESS_TERMINATE, false, pid)
            .map_err(|e| SandboxError::Execution(format!("OpenProcess({pid}) failed: {e}")))?;
        let result = TerminateProcess(handle, 1)
            .map_err(|e| SandboxError::Execution(format!("TerminateProcess({pid}) failed: {e}")));
        let _ = CloseHandle(handle);
        result
    }
}

#[cfg(all(not(unix), not(windows)))]
fn kill_windows_process(_pid: u32) -> Result<(), SandboxError> {
    Err(SandboxError::Execution("process termination unsupported on this platform".into()))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn kill_terminates_a_sleeping_pipeline() {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg("sleep 30 & wait");
        let mut group = ProcessGroup::spawn(cmd).unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        group.kill().await.unwrap();

        let status = tokio::time::timeout(std::time::Duration::from_secs(5), group.inner_mut().wait())
            .await
            .expect("process did not exit after kill")
            .unwrap();
        assert!(!status.success());
    }
}
