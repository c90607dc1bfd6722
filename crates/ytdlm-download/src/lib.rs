//! Download orchestration for ytdlm.
//!
//! # Modules
//!
//! - `args` - job options to `yt-dlp` argument list
//! - `progress` - progress and destination extraction from output lines
//! - `manager` - admission gate, job runner, and the `DownloadManagerPort`
//!   implementation

// Re-export core types for convenience
pub use ytdlm_core::download::{
    DownloadError, DownloadEvent, DownloadOptions, DownloadStatus, Job, JobId, ProgressSample,
};
pub use ytdlm_core::ports::{
    BroadcastDownloadEmitter, DownloadEventEmitterPort, DownloadManagerConfig,
    DownloadManagerPort, DownloadRequest, NoopDownloadEmitter,
};

pub mod args;
pub mod progress;

mod manager;

pub use args::{ArgumentBuilder, format_selector, split_custom_args};
pub use manager::{
    AdmissionGate, AdmissionPermit, DownloadManagerDeps, DownloadManagerImpl, JobRunner,
    RunObserver, RunOutcome, build_download_manager,
};
pub use progress::{ProgressThrottle, parse_destination, parse_percentage, parse_progress};
