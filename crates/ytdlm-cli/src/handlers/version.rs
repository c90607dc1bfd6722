//! Version handler.

use anyhow::Result;

use crate::bootstrap::CliContext;

/// Print the ytdlm version and the version of the configured `yt-dlp`.
pub async fn execute(ctx: &CliContext) -> Result<()> {
    println!("ytdlm {}", env!("CARGO_PKG_VERSION"));

    let ytdlp = ctx.ytdlp()?;
    match ytdlp.version().await {
        Ok(version) => println!("yt-dlp {version} ({})", ytdlp.path().display()),
        Err(e) => println!("yt-dlp not available at {}: {e}", ytdlp.path().display()),
    }
    Ok(())
}
