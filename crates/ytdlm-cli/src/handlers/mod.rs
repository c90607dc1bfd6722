//! Command handlers.
//!
//! Handlers follow one pattern:
//! - Signature: `pub async fn execute(ctx: &CliContext, ...) -> Result<...>`
//! - Validate CLI input, call into the library crates, format output

pub mod config;
pub mod download;
pub mod info;
pub mod playlist;
pub mod version;
