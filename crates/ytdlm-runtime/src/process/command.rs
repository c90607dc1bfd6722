//! Spawning the downloader with captured output.

use std::io;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::debug;

use super::shutdown::{TerminateError, terminate_tree};
use super::stream::{OutputLine, StreamKind, spawn_line_reader};

/// Buffered lines between the pipe readers and the consumer.
const LINE_CHANNEL_CAPACITY: usize = 256;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// A running child whose stdout and stderr are merged into one line channel.
///
/// The child is killed if this value is dropped while it is still running.
#[derive(Debug)]
pub struct CapturedProcess {
    child: Child,
    pid: Option<u32>,
}

impl CapturedProcess {
    /// Spawn `program` with `args`.
    ///
    /// Returns the process and a receiver yielding every output line from
    /// both pipes. The receiver closes once both pipes reach EOF. Lines from
    /// the two pipes are not ordered relative to each other.
    ///
    /// On Unix the child leads a new process group so [`Self::terminate`]
    /// can reach everything it spawns.
    pub fn spawn(program: &Path, args: &[String]) -> io::Result<(Self, mpsc::Receiver<OutputLine>)> {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(unix)]
        cmd.process_group(0);

        #[cfg(windows)]
        cmd.creation_flags(CREATE_NO_WINDOW);

        let mut child = cmd.spawn()?;
        let pid = child.id();
        debug!(pid, program = %program.display(), "spawned child process");

        let (tx, rx) = mpsc::channel(LINE_CHANNEL_CAPACITY);
        if let Some(stdout) = child.stdout.take() {
            spawn_line_reader(stdout, StreamKind::Stdout, tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_line_reader(stderr, StreamKind::Stderr, tx);
        }

        Ok((Self { child, pid }, rx))
    }

    /// OS process id captured at spawn.
    #[must_use]
    pub const fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Wait for the process to exit. Cancel-safe.
    pub async fn wait(&mut self) -> io::Result<ExitStatus> {
        self.child.wait().await
    }

    /// Terminate the process tree, waiting at most `grace` before forcing it.
    pub async fn terminate(&mut self, grace: Duration) -> Result<ExitStatus, TerminateError> {
        terminate_tree(&mut self.child, grace).await
    }

    /// Underlying child handle.
    pub const fn child_mut(&mut self) -> &mut Child {
        &mut self.child
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> (CapturedProcess, mpsc::Receiver<OutputLine>) {
        CapturedProcess::spawn(Path::new("sh"), &["-c".to_string(), script.to_string()]).unwrap()
    }

    #[tokio::test]
    async fn test_merges_both_streams() {
        let (mut proc, mut rx) = sh("echo out; echo err 1>&2");
        assert!(proc.pid().is_some());

        let mut seen = Vec::new();
        while let Some(line) = rx.recv().await {
            seen.push((line.stream, line.text));
        }
        assert!(proc.wait().await.unwrap().success());

        assert!(seen.contains(&(StreamKind::Stdout, "out".to_string())));
        assert!(seen.contains(&(StreamKind::Stderr, "err".to_string())));
    }

    #[tokio::test]
    async fn test_reports_exit_code() {
        let (mut proc, _rx) = sh("exit 3");
        assert_eq!(proc.wait().await.unwrap().code(), Some(3));
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let err = CapturedProcess::spawn(Path::new("/nonexistent/ytdlm-test-binary"), &[])
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_terminate_stops_child() {
        let (mut proc, mut rx) = sh("echo ready; sleep 30");
        assert_eq!(rx.recv().await.unwrap().text, "ready");

        let status = proc.terminate(Duration::from_secs(2)).await.unwrap();
        assert!(!status.success());
        // Pipes close once the whole group is gone.
        assert!(rx.recv().await.is_none());
    }
}
