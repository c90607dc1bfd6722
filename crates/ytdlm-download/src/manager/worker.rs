//! Job runner: one downloader process from spawn to exit.
//!
//! The runner owns nothing but the process. It reports through a
//! [`RunObserver`] and returns a [`RunOutcome`]; the orchestrator decides
//! what the outcome means for the job record and who hears about it.
//!
//! # Cancellation
//!
//! The token is checked before spawn and raced against every await
//! afterwards. Once it fires the process tree is terminated with the
//! configured grace and the run ends as [`RunOutcome::Cancelled`], even if
//! the tree refuses to die in time.

use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use ytdlm_core::{DownloadError, Job, ProgressSample};
use ytdlm_runtime::{CapturedProcess, OutputLine, TerminateError};

use crate::progress::parse_progress;

/// Upper bound on reading leftover output after the process has exited.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Callbacks from a running job. All methods default to doing nothing.
pub trait RunObserver: Send {
    /// The process started. `pid` is `None` only if it exited immediately.
    fn on_spawn(&mut self, _pid: Option<u32>) {}

    /// Any output line, from either stream.
    fn on_line(&mut self, _line: &OutputLine) {}

    /// A line that parsed as download progress.
    fn on_progress(&mut self, _sample: ProgressSample) {}
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Failed(DownloadError),
    Cancelled,
}

/// Spawns and supervises the downloader executable.
#[derive(Debug, Clone)]
pub struct JobRunner {
    downloader: PathBuf,
    grace: Duration,
}

impl JobRunner {
    #[must_use]
    pub fn new(downloader: impl Into<PathBuf>, grace: Duration) -> Self {
        Self {
            downloader: downloader.into(),
            grace,
        }
    }

    /// Run one job to completion or cancellation.
    pub async fn run(
        &self,
        job: &Job,
        args: &[String],
        cancel: &CancellationToken,
        observer: &mut impl RunObserver,
    ) -> RunOutcome {
        if cancel.is_cancelled() {
            return RunOutcome::Cancelled;
        }

        let (mut proc, mut lines) = match CapturedProcess::spawn(&self.downloader, args) {
            Ok(spawned) => spawned,
            Err(e) => {
                tracing::warn!(
                    target: "ytdlm.download",
                    id = %job.id,
                    downloader = %self.downloader.display(),
                    error = %e,
                    "Failed to start downloader"
                );
                return RunOutcome::Failed(DownloadError::spawn(format!(
                    "{}: {e}",
                    self.downloader.display()
                )));
            }
        };

        let pid = proc.pid();
        observer.on_spawn(pid);
        tracing::debug!(target: "ytdlm.download", id = %job.id, pid, "Downloader started");

        let mut lines_open = true;
        let status = loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    let result = proc.terminate(self.grace).await;
                    match termination_error(self.grace, &result) {
                        None => tracing::debug!(target: "ytdlm.download", id = %job.id, pid, "Downloader terminated"),
                        Some(err) => tracing::warn!(
                            target: "ytdlm.download",
                            id = %job.id,
                            pid,
                            error = %err,
                            "Downloader did not terminate cleanly"
                        ),
                    }
                    return RunOutcome::Cancelled;
                }
                line = lines.recv(), if lines_open => match line {
                    Some(line) => handle_line(job, &line, &mut *observer),
                    None => lines_open = false,
                },
                status = proc.wait() => break status,
            }
        };

        // Pipes can still hold output written just before exit.
        let _ = tokio::time::timeout(DRAIN_TIMEOUT, async {
            while let Some(line) = lines.recv().await {
                handle_line(job, &line, &mut *observer);
            }
        })
        .await;

        match status {
            Ok(status) if status.success() => RunOutcome::Completed,
            Ok(status) => RunOutcome::Failed(DownloadError::exit(status.code())),
            Err(e) => RunOutcome::Failed(DownloadError::from_io_error(&e)),
        }
    }
}

/// What went wrong bringing a cancelled process down, if anything.
///
/// Only logged: the run is cancelled regardless.
fn termination_error(
    grace: Duration,
    result: &Result<ExitStatus, TerminateError>,
) -> Option<DownloadError> {
    match result {
        Ok(_) => None,
        Err(TerminateError::Timeout { .. }) => Some(DownloadError::TerminationTimeout {
            grace_ms: u64::try_from(grace.as_millis()).unwrap_or(u64::MAX),
        }),
        Err(TerminateError::Io(e)) => Some(DownloadError::from_io_error(e)),
    }
}

fn handle_line(job: &Job, line: &OutputLine, observer: &mut impl RunObserver) {
    tracing::trace!(target: "ytdlm.download", id = %job.id, stream = %line.stream, "{}", line.text);
    observer.on_line(line);
    if let Some(sample) = parse_progress(&line.text) {
        observer.on_progress(sample);
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::os::unix::process::ExitStatusExt;
    use std::time::Instant;

    use ytdlm_core::DownloadOptions;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        pid: Option<u32>,
        lines: Vec<String>,
        progress: Vec<f64>,
    }

    impl RunObserver for Recorder {
        fn on_spawn(&mut self, pid: Option<u32>) {
            self.pid = pid;
        }

        fn on_line(&mut self, line: &OutputLine) {
            self.lines.push(line.text.clone());
        }

        fn on_progress(&mut self, sample: ProgressSample) {
            self.progress.push(sample.percent);
        }
    }

    fn sh_args(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    fn job() -> Job {
        Job::new("https://example.com/v", "/tmp", DownloadOptions::default())
    }

    #[tokio::test]
    async fn test_success_reports_lines_and_progress() {
        let runner = JobRunner::new("sh", Duration::from_secs(1));
        let mut rec = Recorder::default();
        let outcome = runner
            .run(
                &job(),
                &sh_args("echo '[download]  10.0% of 1.00MiB'; echo '[download] 100% of 1.00MiB' 1>&2"),
                &CancellationToken::new(),
                &mut rec,
            )
            .await;

        assert_eq!(outcome, RunOutcome::Completed);
        assert!(rec.pid.is_some());
        assert_eq!(rec.lines.len(), 2);
        assert_eq!(rec.progress.len(), 2);
    }

    #[tokio::test]
    async fn test_nonzero_exit_fails_with_code() {
        let runner = JobRunner::new("sh", Duration::from_secs(1));
        let outcome = runner
            .run(&job(), &sh_args("exit 2"), &CancellationToken::new(), &mut Recorder::default())
            .await;
        match outcome {
            RunOutcome::Failed(e) => assert_eq!(e.to_string(), "Process exited with code 2"),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_executable_fails_to_spawn() {
        let runner = JobRunner::new("/nonexistent/yt-dlp", Duration::from_secs(1));
        let outcome = runner
            .run(&job(), &[], &CancellationToken::new(), &mut Recorder::default())
            .await;
        assert!(matches!(outcome, RunOutcome::Failed(DownloadError::Spawn { .. })));
    }

    #[tokio::test]
    async fn test_cancelled_before_spawn_never_starts() {
        let runner = JobRunner::new("sh", Duration::from_secs(1));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut rec = Recorder::default();
        let outcome = runner.run(&job(), &sh_args("exit 0"), &cancel, &mut rec).await;
        assert_eq!(outcome, RunOutcome::Cancelled);
        assert!(rec.pid.is_none());
    }

    #[tokio::test]
    async fn test_cancel_terminates_running_process() {
        let runner = JobRunner::new("sh", Duration::from_secs(2));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        let outcome = runner
            .run(&job(), &sh_args("sleep 30"), &cancel, &mut Recorder::default())
            .await;
        assert_eq!(outcome, RunOutcome::Cancelled);
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_termination_timeout_is_reported_as_cancellation() {
        let grace = Duration::from_millis(1500);
        let timed_out = Err(TerminateError::Timeout { pid: Some(42), grace });
        let err = termination_error(grace, &timed_out).unwrap();
        assert_eq!(err, DownloadError::TerminationTimeout { grace_ms: 1500 });
        assert!(err.is_cancellation());

        let clean: Result<ExitStatus, TerminateError> = Ok(ExitStatus::from_raw(15));
        assert!(termination_error(grace, &clean).is_none());
    }

    #[tokio::test]
    async fn test_cancel_with_stubborn_process_still_cancels() {
        // The shell ignores SIGTERM, so the grace period runs out.
        let runner = JobRunner::new("sh", Duration::from_millis(200));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            trigger.cancel();
        });

        let mut rec = Recorder::default();
        let outcome = runner
            .run(&job(), &sh_args("trap '' TERM; while :; do sleep 1; done"), &cancel, &mut rec)
            .await;
        assert_eq!(outcome, RunOutcome::Cancelled);
        assert!(rec.pid.is_some());
    }
}
