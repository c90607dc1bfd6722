//! Main CLI parser and top-level argument handling.

use std::path::PathBuf;

use clap::Parser;

use crate::commands::Commands;

/// Command-line interface for the ytdlm download manager.
#[derive(Parser)]
#[command(name = "ytdlm")]
#[command(about = "Download videos and audio with yt-dlp, several at a time")]
#[command(version)]
pub struct Cli {
    /// Read settings from this file instead of the default location
    #[arg(long, global = true, env = "YTDLM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}
