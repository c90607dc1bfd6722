//! Process-tree termination with SIGTERM → SIGKILL escalation.
//!
//! The downloader spawns helpers (ffmpeg for merging and post-processing),
//! so killing only the direct child would leave them running. Children are
//! started in their own process group (see `CapturedProcess::spawn`), which
//! lets the whole tree be signalled at once.

use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Child;
use tokio::time::timeout;
use tracing::debug;

#[cfg(unix)]
use nix::errno::Errno;
#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;

/// Time allowed for reaping after the forced kill.
const KILL_REAP_TIMEOUT: Duration = Duration::from_secs(1);

/// Failure to bring a process tree down.
#[derive(Debug, Error)]
pub enum TerminateError {
    /// The child was still not reaped after the grace period and a forced kill.
    #[error("process {pid:?} did not exit within {grace:?}")]
    Timeout { pid: Option<u32>, grace: Duration },

    /// Signalling or waiting failed.
    #[error("failed to terminate process: {0}")]
    Io(#[from] io::Error),
}

/// Terminate `child` and everything in its process group.
///
/// # Strategy
/// 1. Ask the group to stop (SIGTERM on Unix; `taskkill /T /F` on Windows)
/// 2. Wait up to `grace` for the child to exit
/// 3. Force-kill the group and wait briefly for reaping
///
/// A child that already exited is simply reaped.
pub async fn terminate_tree(child: &mut Child, grace: Duration) -> Result<ExitStatus, TerminateError> {
    let Some(pid) = child.id() else {
        // Already reaped.
        return Ok(child.wait().await?);
    };

    debug!(pid, ?grace, "terminating process tree");

    #[cfg(unix)]
    {
        terminate_unix(child, pid, grace).await
    }

    #[cfg(not(unix))]
    {
        terminate_windows(child, pid, grace).await
    }
}

#[cfg(unix)]
#[allow(clippy::cast_possible_wrap)]
async fn terminate_unix(
    child: &mut Child,
    pid: u32,
    grace: Duration,
) -> Result<ExitStatus, TerminateError> {
    let group = Pid::from_raw(pid as i32);

    // Phase 1: SIGTERM to the group
    match signal::killpg(group, Signal::SIGTERM) {
        Ok(()) => {}
        Err(Errno::ESRCH) => return Ok(child.wait().await?),
        Err(e) => return Err(TerminateError::Io(io::Error::other(e))),
    }

    if let Ok(result) = timeout(grace, child.wait()).await {
        // Helpers that ignored SIGTERM still share the group; take them down too.
        let _ = signal::killpg(group, Signal::SIGKILL);
        return Ok(result?);
    }

    // Phase 2: SIGKILL to the group
    debug!(pid, "process tree ignored SIGTERM, escalating to SIGKILL");
    match signal::killpg(group, Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => return Err(TerminateError::Io(io::Error::other(e))),
    }

    // Phase 3: reap
    timeout(KILL_REAP_TIMEOUT, child.wait())
        .await
        .map_err(|_| TerminateError::Timeout {
            pid: Some(pid),
            grace,
        })?
        .map_err(TerminateError::from)
}

#[cfg(not(unix))]
async fn terminate_windows(
    child: &mut Child,
    pid: u32,
    grace: Duration,
) -> Result<ExitStatus, TerminateError> {
    // No SIGTERM equivalent; taskkill /T walks the child tree.
    let status = tokio::process::Command::new("taskkill")
        .args(["/PID", &pid.to_string(), "/T", "/F"])
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .await;
    if let Err(e) = status {
        debug!(pid, error = %e, "taskkill failed, falling back to direct kill");
    }

    if let Ok(result) = timeout(grace, child.wait()).await {
        return Ok(result?);
    }

    child.start_kill()?;
    timeout(KILL_REAP_TIMEOUT, child.wait())
        .await
        .map_err(|_| TerminateError::Timeout {
            pid: Some(pid),
            grace,
        })?
        .map_err(TerminateError::from)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::process::CapturedProcess;
    use std::path::Path;
    use std::time::Instant;

    #[tokio::test]
    async fn test_terminates_sleeping_process() {
        let (mut proc, _lines) =
            CapturedProcess::spawn(Path::new("sleep"), &["30".to_string()]).unwrap();
        let started = Instant::now();
        let status = terminate_tree(proc.child_mut(), Duration::from_secs(5))
            .await
            .unwrap();
        assert!(!status.success());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_escalates_when_sigterm_ignored() {
        let script = "trap '' TERM; sleep 30 & wait";
        let (mut proc, _lines) = CapturedProcess::spawn(
            Path::new("sh"),
            &["-c".to_string(), script.to_string()],
        )
        .unwrap();
        // Let the shell install its trap.
        tokio::time::sleep(Duration::from_millis(200)).await;

        let started = Instant::now();
        let status = terminate_tree(proc.child_mut(), Duration::from_millis(300))
            .await
            .unwrap();
        assert!(!status.success());
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_already_exited_is_reaped() {
        let (mut proc, _lines) =
            CapturedProcess::spawn(Path::new("true"), &[]).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(terminate_tree(proc.child_mut(), Duration::from_secs(1)).await.is_ok());
    }
}
