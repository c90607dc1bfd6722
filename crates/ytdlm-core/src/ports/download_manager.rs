//! Download manager port definition.
//!
//! The public interface of the orchestration engine. Signatures carry only
//! core domain types; cancellation tokens, semaphores, and child processes
//! stay inside the implementation.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::download::{DownloadError, DownloadOptions, Job, JobId};
use crate::paths::{self, PathError};
use crate::settings::{DEFAULT_MAX_CONCURRENT_DOWNLOADS, DEFAULT_TERMINATION_GRACE_SECS, Settings};

/// Request to download one URL.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: String,
    /// Known title; the job shows a placeholder until one is learned.
    pub title: Option<String>,
    pub thumbnail: Option<String>,
    /// Destination directory; the manager default when `None`.
    pub output_dir: Option<PathBuf>,
    /// Option snapshot; the manager default when `None`.
    pub options: Option<DownloadOptions>,
}

impl DownloadRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
            thumbnail: None,
            output_dir: None,
            options: None,
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_thumbnail(mut self, thumbnail: impl Into<String>) -> Self {
        self.thumbnail = Some(thumbnail.into());
        self
    }

    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: DownloadOptions) -> Self {
        self.options = Some(options);
        self
    }
}

/// Configuration for creating a download manager.
///
/// A snapshot: changing `Settings` later does not reach a running manager
/// except through [`DownloadManagerPort::set_max_concurrent`].
#[derive(Debug, Clone)]
pub struct DownloadManagerConfig {
    /// The `yt-dlp` executable.
    pub downloader_path: PathBuf,
    /// Directory passed as `--ffmpeg-location`.
    pub ffmpeg_location: PathBuf,
    /// Destination for requests without an explicit directory.
    pub default_output_dir: PathBuf,
    /// Initial admission cap (at least 1).
    pub max_concurrent: u32,
    /// How long a cancelled process tree gets to exit.
    pub termination_grace: Duration,
    /// Options for requests without an explicit snapshot.
    pub default_options: DownloadOptions,
}

impl Default for DownloadManagerConfig {
    fn default() -> Self {
        Self {
            downloader_path: PathBuf::from("yt-dlp"),
            ffmpeg_location: PathBuf::from("."),
            default_output_dir: PathBuf::from("."),
            max_concurrent: DEFAULT_MAX_CONCURRENT_DOWNLOADS,
            termination_grace: Duration::from_secs(DEFAULT_TERMINATION_GRACE_SECS),
            default_options: DownloadOptions::default(),
        }
    }
}

impl DownloadManagerConfig {
    /// Resolve a config from settings, filling tool and directory defaults.
    pub fn from_settings(settings: &Settings) -> Result<Self, PathError> {
        let downloader_path = match settings.ytdlp_path.as_deref() {
            Some(p) => paths::tool_from_setting(p)?,
            None => paths::default_ytdlp_path(),
        };
        let ffmpeg_path = match settings.ffmpeg_path.as_deref() {
            Some(p) => paths::tool_from_setting(p)?,
            None => paths::default_ffmpeg_path(),
        };
        let default_output_dir = match settings.default_download_path.as_deref() {
            Some(p) => paths::normalize_user_path(p)?,
            None => paths::default_download_dir()?,
        };

        Ok(Self {
            downloader_path,
            ffmpeg_location: paths::ffmpeg_dir_of(&ffmpeg_path),
            default_output_dir,
            max_concurrent: settings.effective_max_concurrent_downloads(),
            termination_grace: Duration::from_secs(settings.effective_termination_grace_secs()),
            default_options: settings.default_options.clone(),
        })
    }

    #[must_use]
    pub fn with_downloader_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.downloader_path = path.into();
        self
    }

    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.default_output_dir = dir.into();
        self
    }

    #[must_use]
    pub const fn with_max_concurrent(mut self, max: u32) -> Self {
        self.max_concurrent = max;
        self
    }

    #[must_use]
    pub const fn with_termination_grace(mut self, grace: Duration) -> Self {
        self.termination_grace = grace;
        self
    }
}

/// Port for managing downloads.
///
/// ```ignore
/// let manager: Arc<dyn DownloadManagerPort> = build_download_manager(deps);
/// let id = manager.clone().submit(DownloadRequest::new(url)).await?;
/// manager.cancel(id).await;
/// ```
#[async_trait]
pub trait DownloadManagerPort: Send + Sync {
    /// Register a Pending job and start waiting for a slot in the background.
    ///
    /// Returns as soon as the job is registered. The `self: Arc<Self>`
    /// receiver lets the implementation hand a clone to the job task.
    async fn submit(self: Arc<Self>, request: DownloadRequest) -> Result<JobId, DownloadError>;

    /// Cancel a job.
    ///
    /// Pending jobs become Cancelled immediately and never spawn a process.
    /// Running jobs are signalled and reach Cancelled once torn down.
    /// Terminal or unknown ids are a no-op. Returns whether anything was
    /// cancelled or signalled.
    async fn cancel(&self, id: JobId) -> bool;

    /// Cancel every non-terminal job. Returns how many were affected.
    async fn cancel_all(&self) -> usize;

    /// Drop a job from the registry without stopping its process.
    fn remove(&self, id: JobId) -> Option<Job>;

    /// Remove every Completed, Failed, or Cancelled job. Returns the count.
    fn clear_completed(&self) -> usize;

    /// Change the admission cap (minimum 1). Never preempts running jobs.
    fn set_max_concurrent(&self, max: u32);

    fn max_concurrent(&self) -> u32;

    /// Snapshot of every registered job, in submission order.
    fn jobs(&self) -> Vec<Job>;

    fn get(&self, id: JobId) -> Option<Job>;

    /// Number of running downloader processes.
    fn active_count(&self) -> usize;
}
