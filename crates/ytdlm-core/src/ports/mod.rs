//! Port definitions (trait abstractions) for the download subsystem.
//!
//! Ports use only domain types; implementations live in `ytdlm-download`
//! and the adapters.

pub mod download_event_emitter;
pub mod download_manager;

pub use download_event_emitter::{
    BroadcastDownloadEmitter, DownloadEventEmitterPort, NoopDownloadEmitter,
};
pub use download_manager::{DownloadManagerConfig, DownloadManagerPort, DownloadRequest};
