use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TerminateError {
    #[error("pid {0} is out of range")]
    InvalidPid(u32),
    #[error("{0}")]
    Os(String),
}

/// Kills a worker together with every process it spawned.
///
/// Implementations report success when the process is already gone.
pub trait ProcessTerminator: Send + Sync {
    fn terminate_tree(&self, pid: u32) -> Result<(), TerminateError>;
}

/// Platform implementation: process-group SIGKILL on Unix, `taskkill /T /F` on Windows.
///
/// On Unix this relies on the worker having been spawned as the leader of its
/// own process group, which `JobRunner` does.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTerminator;

#[cfg(unix)]
impl ProcessTerminator for SystemTerminator {
    fn terminate_tree(&self, pid: u32) -> Result<(), TerminateError> {
        use nix::errno::Errno;
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        let raw = i32::try_from(pid)
            .ok()
            .filter(|raw| *raw > 0)
            .ok_or(TerminateError::InvalidPid(pid))?;

        match killpg(Pid::from_raw(raw), Signal::SIGKILL) {
            Ok(()) | Err(Errno::ESRCH) => Ok(()),
            Err(errno) => Err(TerminateError::Os(errno.to_string())),
        }
    }
}

#[cfg(windows)]
impl ProcessTerminator for SystemTerminator {
    fn terminate_tree(&self, pid: u32) -> Result<(), TerminateError> {
        // taskkill exits with 128 when the pid no longer exists.
        const TASKKILL_NOT_FOUND: i32 = 128;

        if pid == 0 {
            return Err(TerminateError::InvalidPid(pid));
        }
        let output = std::process::Command::new("taskkill")
            .args(["/PID", &pid.to_string(), "/T", "/F"])
            .output()
            .map_err(|err| TerminateError::Os(err.to_string()))?;

        if output.status.success() || output.status.code() == Some(TASKKILL_NOT_FOUND) {
            Ok(())
        } else {
            Err(TerminateError::Os(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ))
        }
    }
}
