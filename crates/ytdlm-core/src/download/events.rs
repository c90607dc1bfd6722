//! Download events: one discriminated union for every job state change.

use serde::{Deserialize, Serialize};

use super::job::Job;
use super::types::JobId;

/// Notification emitted by the orchestrator.
///
/// Each variant carries an owned snapshot of the job at the moment of the
/// change, so listeners never observe later mutation. Events for one job
/// arrive in the order they happened; no ordering holds across jobs.
///
/// Serialized shape:
///
/// ```text
/// { "type": "job_added",     "job": { ... } }
/// { "type": "job_updated",   "job": { ... } }
/// { "type": "job_completed", "job": { ... } }
/// { "type": "job_failed",    "job": { ... } }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DownloadEvent {
    /// A job was registered as Pending.
    JobAdded { job: Job },
    /// Status, progress, or title changed (including Cancelled).
    JobUpdated { job: Job },
    /// The job reached Completed.
    JobCompleted { job: Job },
    /// The job reached Failed.
    JobFailed { job: Job },
}

impl DownloadEvent {
    /// The job snapshot carried by this event.
    #[must_use]
    pub const fn job(&self) -> &Job {
        match self {
            Self::JobAdded { job }
            | Self::JobUpdated { job }
            | Self::JobCompleted { job }
            | Self::JobFailed { job } => job,
        }
    }

    #[must_use]
    pub const fn id(&self) -> JobId {
        self.job().id
    }

    /// Event type name, for logging.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::JobAdded { .. } => "job_added",
            Self::JobUpdated { .. } => "job_updated",
            Self::JobCompleted { .. } => "job_completed",
            Self::JobFailed { .. } => "job_failed",
        }
    }

    /// Event for a job that just reached a terminal state, or an update otherwise.
    #[must_use]
    pub fn for_transition(job: Job) -> Self {
        use super::types::DownloadStatus;
        match job.status() {
            DownloadStatus::Completed => Self::JobCompleted { job },
            DownloadStatus::Failed => Self::JobFailed { job },
            _ => Self::JobUpdated { job },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::{DownloadOptions, DownloadStatus};

    #[test]
    fn test_event_serializes_with_type_tag() {
        let job = Job::new("https://example.com/v", "/tmp", DownloadOptions::default());
        let event = DownloadEvent::JobAdded { job };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "job_added");
        assert_eq!(json["job"]["status"], "pending");
        assert_eq!(json["job"]["title"], "Unknown");
    }

    #[test]
    fn test_for_transition_picks_variant() {
        let mut job = Job::new("u", "/tmp", DownloadOptions::default());
        job.transition(DownloadStatus::Downloading);
        assert_eq!(
            DownloadEvent::for_transition(job.clone()).event_type(),
            "job_updated"
        );

        let mut done = job.clone();
        done.transition(DownloadStatus::Completed);
        assert_eq!(
            DownloadEvent::for_transition(done).event_type(),
            "job_completed"
        );

        let mut failed = job.clone();
        failed.fail("boom");
        assert_eq!(
            DownloadEvent::for_transition(failed).event_type(),
            "job_failed"
        );

        let mut cancelled = job;
        cancelled.transition(DownloadStatus::Cancelled);
        let event = DownloadEvent::for_transition(cancelled);
        assert_eq!(event.event_type(), "job_updated");
        assert_eq!(event.job().status(), DownloadStatus::Cancelled);
    }
}
