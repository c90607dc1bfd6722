//! Process runtime for ytdlm.
//!
//! - [`process`] spawns the downloader with captured output, merges its
//!   stdout and stderr into one line channel, and tears down the whole
//!   process tree on cancellation.
//! - [`ytdlp`] runs short-lived metadata queries (`--dump-json`,
//!   `--flat-playlist`, `--version`).

#![deny(unsafe_code)]

pub mod process;
pub mod ytdlp;

pub use process::{
    CapturedProcess, OutputLine, StreamKind, TerminateError, spawn_line_reader, terminate_tree,
};
pub use ytdlp::{ProbeError, YtDlp};
