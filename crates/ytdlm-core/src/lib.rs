//! Core domain for ytdlm: job model, options, events, errors, ports,
//! settings, and path resolution.
//!
//! No process spawning or scheduling lives here; see `ytdlm-runtime` and
//! `ytdlm-download`.

#![deny(unused_crate_dependencies)]

pub mod download;
pub mod paths;
pub mod ports;
pub mod settings;
pub mod utils;

pub use download::{
    AudioFormat, DownloadError, DownloadEvent, DownloadOptions, DownloadStatus,
    FormatInfo, Job, JobId, PLACEHOLDER_TITLE, ProgressSample, SubtitleInfo, VideoCodec,
    VideoInfo, VideoQuality,
};
pub use paths::PathError;
pub use ports::{
    BroadcastDownloadEmitter, DownloadEventEmitterPort, DownloadManagerConfig,
    DownloadManagerPort, DownloadRequest, NoopDownloadEmitter,
};
pub use settings::{Settings, SettingsError, validate_settings};
