//! Errors from resolving and preparing paths.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PathError {
    /// The platform reports no home directory (needed for `~` and the
    /// default download folder).
    #[error("No home directory for the current user")]
    NoHomeDir,

    /// The platform reports no directory of the named kind, e.g. `"config"`.
    #[error("No {0} directory on this platform")]
    MissingPlatformDir(&'static str),

    #[error("Download location {0} is not a directory")]
    NotADirectory(PathBuf),

    #[error("Could not create {path}: {reason}")]
    CreateFailed { path: PathBuf, reason: String },

    /// Relative paths are anchored at the working directory.
    #[error("Working directory unavailable: {0}")]
    CurrentDir(String),

    #[error("Path is blank")]
    EmptyPath,
}
