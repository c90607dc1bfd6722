//! Download domain types, events, errors, and options.
//!
//! Pure data types with no process or runtime dependencies.
//!
//! # Structure
//!
//! - `types` - identifiers and status (`JobId`, `DownloadStatus`)
//! - `options` - per-job option snapshot (`DownloadOptions`, `VideoQuality`, ...)
//! - `job` - the `Job` record and its state machine
//! - `events` - notifications emitted by the orchestrator
//! - `errors` - error types for download operations
//! - `media` - probe metadata (`VideoInfo`)

pub mod errors;
pub mod events;
pub mod job;
pub mod media;
pub mod options;
pub mod types;

pub use errors::DownloadError;
pub use events::DownloadEvent;
pub use job::{Job, PLACEHOLDER_TITLE, ProgressSample};
pub use media::{FormatInfo, SubtitleInfo, VideoInfo};
pub use options::{
    AudioFormat, DEFAULT_OUTPUT_TEMPLATE, DownloadOptions, VideoCodec, VideoQuality,
};
pub use types::{DownloadStatus, JobId};
