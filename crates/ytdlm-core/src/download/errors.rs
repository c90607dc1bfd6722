//! Download error types.
//!
//! Errors are serializable and do not hold `std::io::Error` directly; I/O
//! failures are captured as kind and message strings.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for download operations.
///
/// Every error is local to one job. Nothing here is retried automatically.
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum DownloadError {
    /// The job was cancelled while waiting for an admission slot.
    #[error("Cancelled while waiting for a download slot")]
    AdmissionCancelled,

    /// The downloader executable could not be started.
    #[error("Failed to start downloader: {message}")]
    Spawn {
        /// Underlying launch error text.
        message: String,
    },

    /// The downloader exited unsuccessfully.
    #[error("{}", exit_message(.code))]
    Exit {
        /// Exit code, or `None` when terminated by a signal.
        code: Option<i32>,
    },

    /// The process tree did not exit within the grace period after termination.
    #[error("Process did not exit within {grace_ms}ms of termination")]
    TerminationTimeout {
        /// Grace period that elapsed.
        grace_ms: u64,
    },

    /// I/O error while supervising the process.
    #[error("I/O error ({kind}): {message}")]
    Io {
        /// The kind of I/O error (e.g. "`NotFound`").
        kind: String,
        /// Detailed error message.
        message: String,
    },

    /// The request was rejected before a job was created.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Why the request was rejected.
        message: String,
    },
}

#[allow(clippy::ref_option)]
fn exit_message(code: &Option<i32>) -> String {
    code.map_or_else(
        || "Process terminated by signal".to_string(),
        |c| format!("Process exited with code {c}"),
    )
}

impl DownloadError {
    /// Create a spawn error.
    pub fn spawn(message: impl Into<String>) -> Self {
        Self::Spawn {
            message: message.into(),
        }
    }

    /// Create an exit error.
    #[must_use]
    pub const fn exit(code: Option<i32>) -> Self {
        Self::Exit { code }
    }

    /// Create an I/O error from a `std::io::Error`.
    #[must_use]
    pub fn from_io_error(err: &std::io::Error) -> Self {
        let kind = err.kind();
        Self::Io {
            kind: format!("{kind:?}"),
            message: err.to_string(),
        }
    }

    /// Create an invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Whether this error means the job ends as Cancelled rather than Failed.
    #[must_use]
    pub const fn is_cancellation(&self) -> bool {
        matches!(
            self,
            Self::AdmissionCancelled | Self::TerminationTimeout { .. }
        )
    }
}

impl From<std::io::Error> for DownloadError {
    fn from(err: std::io::Error) -> Self {
        Self::from_io_error(&err)
    }
}
