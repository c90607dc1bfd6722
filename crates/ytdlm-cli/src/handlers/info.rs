//! Info handler: probe one URL and print its metadata.

use anyhow::{Context, Result};

use ytdlm_core::VideoInfo;

use crate::bootstrap::CliContext;
use crate::presentation::format_duration;

/// Execute the info command.
pub async fn execute(ctx: &CliContext, url: &str, json: bool) -> Result<()> {
    let info = ctx
        .ytdlp()?
        .probe(url)
        .await
        .with_context(|| format!("Failed to fetch info for {url}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        print!("{}", render(&info));
    }
    Ok(())
}

/// Human-readable summary of `info`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn render(info: &VideoInfo) -> String {
    let mut out = String::new();
    let mut line = |label: &str, value: &str| {
        if !value.is_empty() {
            out.push_str(&format!("{label:<12} {value}\n"));
        }
    };

    line("Title:", &info.title);
    line("ID:", &info.id);
    line("Uploader:", &info.uploader);
    if info.duration > 0.0 {
        line("Duration:", &format_duration(info.duration.round() as u64));
    }
    line("Uploaded:", info.upload_date.as_deref().unwrap_or_default());
    if info.view_count > 0 {
        line("Views:", &info.view_count.to_string());
    }
    if let Some(count) = info.playlist_count {
        line("Playlist:", &format!("{count} entries"));
    }

    let heights: Vec<String> = info
        .available_heights()
        .iter()
        .map(|h| format!("{h}p"))
        .collect();
    line("Qualities:", &heights.join(", "));

    let subtitles: Vec<String> = info
        .subtitle_tracks()
        .into_iter()
        .map(|track| {
            if track.is_auto_generated {
                format!("{} (auto)", track.language)
            } else {
                track.language
            }
        })
        .collect();
    line("Subtitles:", &subtitles.join(", "));
    line("Thumbnail:", info.thumbnail_url().unwrap_or_default());

    out
}
