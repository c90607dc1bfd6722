//! `ytdlm` command-line adapter.
//!
//! The binary in `main.rs` parses arguments, installs logging, bootstraps
//! settings, and dispatches to [`handlers`].

#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

#[cfg(test)]
use tempfile as _;

pub mod bootstrap;
pub mod commands;
pub mod handlers;
pub mod logging;
pub mod parser;
pub mod presentation;

pub use bootstrap::{CliConfig, CliContext, bootstrap};
pub use commands::{Commands, ConfigCommand, DownloadArgs};
pub use parser::Cli;
