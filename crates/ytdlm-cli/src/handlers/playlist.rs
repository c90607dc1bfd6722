//! Playlist handler: list entry URLs without downloading.

use anyhow::{Context, Result};

use crate::bootstrap::CliContext;

/// Execute the playlist command.
pub async fn execute(ctx: &CliContext, url: &str) -> Result<()> {
    let urls = ctx
        .ytdlp()?
        .playlist_urls(url)
        .await
        .with_context(|| format!("Failed to list playlist {url}"))?;

    if urls.is_empty() {
        println!("No entries found.");
        return Ok(());
    }
    let width = urls.len().to_string().len();
    for (i, entry) in urls.iter().enumerate() {
        println!("{:>width$}. {entry}", i + 1);
    }
    println!("\n{} entries", urls.len());
    Ok(())
}
