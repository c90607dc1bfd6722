//! The `Job` record and its state machine.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::options::DownloadOptions;
use super::types::{DownloadStatus, JobId};

/// Title shown until the real one is known.
pub const PLACEHOLDER_TITLE: &str = "Unknown";

/// One parsed progress line from the downloader.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProgressSample {
    /// Percentage in `[0, 100]` as reported (not yet clamped).
    pub percent: f64,
    /// Total size of the current file, if reported.
    pub total_bytes: Option<u64>,
    /// Current transfer rate in bytes per second, if reported.
    pub speed_bps: Option<f64>,
    /// Estimated seconds remaining, if reported.
    pub eta_seconds: Option<u64>,
}

impl ProgressSample {
    /// Sample carrying only a percentage.
    #[must_use]
    pub const fn percent(percent: f64) -> Self {
        Self {
            percent,
            total_bytes: None,
            speed_bps: None,
            eta_seconds: None,
        }
    }
}

/// A tracked download of one URL.
///
/// `status` and `progress` are only changed through [`Job::transition`] and
/// [`Job::apply_progress`], which enforce the state machine and the
/// no-visible-regression rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub url: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    /// Directory the output template is resolved against.
    pub output_dir: PathBuf,
    status: DownloadStatus,
    progress: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_bytes: Option<u64>,
    pub downloaded_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed_bps: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta_seconds: Option<u64>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub options: DownloadOptions,
}

impl Job {
    /// Create a Pending job with a fresh id and placeholder title.
    pub fn new(url: impl Into<String>, output_dir: impl Into<PathBuf>, options: DownloadOptions) -> Self {
        Self {
            id: JobId::new(),
            url: url.into(),
            title: PLACEHOLDER_TITLE.to_string(),
            thumbnail: None,
            output_dir: output_dir.into(),
            status: DownloadStatus::Pending,
            progress: 0.0,
            total_bytes: None,
            downloaded_bytes: 0,
            speed_bps: None,
            eta_seconds: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            error: None,
            options,
        }
    }

    /// Set a known title. Blank titles keep the placeholder.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        let title = title.into();
        if !title.trim().is_empty() {
            self.title = title;
        }
        self
    }

    /// Set the thumbnail URL.
    #[must_use]
    pub fn with_thumbnail(mut self, thumbnail: Option<String>) -> Self {
        self.thumbnail = thumbnail.filter(|t| !t.is_empty());
        self
    }

    #[must_use]
    pub const fn status(&self) -> DownloadStatus {
        self.status
    }

    /// Progress percentage in `[0, 100]`.
    #[must_use]
    pub const fn progress(&self) -> f64 {
        self.progress
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    #[must_use]
    pub fn has_placeholder_title(&self) -> bool {
        self.title == PLACEHOLDER_TITLE
    }

    /// Attempt a status transition.
    ///
    /// Returns `false` (and changes nothing) when the state machine rejects
    /// the move, e.g. a second terminal transition. Timestamps are stamped
    /// on entry to Downloading and on entry to any terminal state.
    pub fn transition(&mut self, next: DownloadStatus) -> bool {
        if !self.status.can_transition_to(next) {
            return false;
        }
        self.status = next;
        let now = Utc::now();
        if next == DownloadStatus::Downloading {
            self.started_at = Some(now);
        }
        if next.is_terminal() {
            self.completed_at = Some(now);
            self.speed_bps = None;
            self.eta_seconds = None;
        }
        if next == DownloadStatus::Completed {
            self.progress = 100.0;
            if let Some(total) = self.total_bytes {
                self.downloaded_bytes = total;
            }
        }
        true
    }

    /// Transition to Failed and record the error message.
    pub fn fail(&mut self, message: impl Into<String>) -> bool {
        if self.transition(DownloadStatus::Failed) {
            self.error = Some(message.into());
            true
        } else {
            false
        }
    }

    /// Fold a progress sample into the job.
    ///
    /// Only applies while Downloading. The percentage is clamped to `[0, 100]`
    /// and never moves backwards; a lower value arriving late from the other
    /// output stream is ignored. Returns whether anything observable changed.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn apply_progress(&mut self, sample: &ProgressSample) -> bool {
        if self.status != DownloadStatus::Downloading || !sample.percent.is_finite() {
            return false;
        }

        let before = (
            self.progress,
            self.total_bytes,
            self.speed_bps,
            self.eta_seconds,
        );

        let percent = sample.percent.clamp(0.0, 100.0);
        if percent > self.progress {
            self.progress = percent;
        }
        if sample.total_bytes.is_some() {
            self.total_bytes = sample.total_bytes;
        }
        if let Some(total) = self.total_bytes {
            self.downloaded_bytes = ((total as f64) * self.progress / 100.0).round() as u64;
        }
        self.speed_bps = sample.speed_bps;
        self.eta_seconds = sample.eta_seconds;

        before
            != (
                self.progress,
                self.total_bytes,
                self.speed_bps,
                self.eta_seconds,
            )
    }

    /// Replace the placeholder title; real titles are never overwritten.
    pub fn refine_title(&mut self, candidate: &str) -> bool {
        let candidate = candidate.trim();
        if candidate.is_empty() || !self.has_placeholder_title() {
            return false;
        }
        self.title = candidate.to_string();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> Job {
        Job::new("https://example.com/watch?v=1", "/tmp", DownloadOptions::default())
    }

    #[test]
    fn test_new_job_is_pending_with_placeholder() {
        let job = job();
        assert_eq!(job.status(), DownloadStatus::Pending);
        assert!(job.has_placeholder_title());
        assert!(job.started_at.is_none());
    }

    #[test]
    fn test_only_first_terminal_transition_wins() {
        let mut job = job();
        assert!(job.transition(DownloadStatus::Downloading));
        assert!(job.started_at.is_some());
        assert!(job.transition(DownloadStatus::Cancelled));
        assert!(!job.transition(DownloadStatus::Completed));
        assert!(!job.fail("late"));
        assert_eq!(job.status(), DownloadStatus::Cancelled);
        assert!(job.error.is_none());
        assert!(job.completed_at.is_some());
    }

    #[test]
    fn test_fail_records_message() {
        let mut job = job();
        job.transition(DownloadStatus::Downloading);
        assert!(job.fail("Process exited with code 1"));
        assert_eq!(job.error.as_deref(), Some("Process exited with code 1"));
    }

    #[test]
    fn test_progress_ignored_unless_downloading() {
        let mut job = job();
        assert!(!job.apply_progress(&ProgressSample::percent(10.0)));
        assert!(job.progress().abs() < f64::EPSILON);
    }

    #[test]
    fn test_progress_never_regresses() {
        let mut job = job();
        job.transition(DownloadStatus::Downloading);
        assert!(job.apply_progress(&ProgressSample::percent(45.2)));
        assert!(!job.apply_progress(&ProgressSample::percent(30.0)));
        assert!((job.progress() - 45.2).abs() < f64::EPSILON);
        assert!(job.apply_progress(&ProgressSample::percent(250.0)));
        assert!((job.progress() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_progress_derives_byte_counters() {
        let mut job = job();
        job.transition(DownloadStatus::Downloading);
        job.apply_progress(&ProgressSample {
            percent: 50.0,
            total_bytes: Some(1000),
            speed_bps: Some(10.0),
            eta_seconds: Some(50),
        });
        assert_eq!(job.downloaded_bytes, 500);
        assert_eq!(job.total_bytes, Some(1000));

        job.transition(DownloadStatus::Completed);
        assert_eq!(job.downloaded_bytes, 1000);
        assert!(job.speed_bps.is_none());
    }

    #[test]
    fn test_refine_title_only_replaces_placeholder() {
        let mut job = job();
        assert!(job.refine_title("First"));
        assert!(!job.refine_title("Second"));
        assert_eq!(job.title, "First");

        let named = Job::new("u", "/tmp", DownloadOptions::default()).with_title("Known");
        assert!(!named.has_placeholder_title());
    }
}
