//! Argument builder: turns a job's option snapshot into a `yt-dlp` argv.
//!
//! Pure and infallible. Arguments are emitted in a fixed order with the
//! source URL always last. Custom arguments are appended as given; they are
//! tokenized but never validated or escaped.

use std::path::PathBuf;

use ytdlm_core::{Job, VideoQuality};

/// Builds `yt-dlp` arguments for a job.
#[derive(Debug, Clone)]
pub struct ArgumentBuilder {
    ffmpeg_location: PathBuf,
}

impl ArgumentBuilder {
    /// `ffmpeg_location` is the directory passed as `--ffmpeg-location`.
    pub fn new(ffmpeg_location: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_location: ffmpeg_location.into(),
        }
    }

    /// Build the full argument list for `job`.
    #[must_use]
    pub fn build(&self, job: &Job) -> Vec<String> {
        let opts = &job.options;
        let mut args: Vec<String> = Vec::with_capacity(32);

        // Output path
        let output = job.output_dir.join(opts.effective_output_template());
        push(&mut args, ["-o", output.to_string_lossy().as_ref()]);

        // Quality
        if opts.quality.is_audio_only() {
            push(&mut args, ["-x", "--audio-format", opts.audio_format.as_str()]);
            if opts.keep_video {
                args.push("-k".into());
            }
        } else {
            push(&mut args, ["-f", format_selector(opts.quality).as_str()]);
        }

        push(
            &mut args,
            [
                "--ffmpeg-location",
                self.ffmpeg_location.to_string_lossy().as_ref(),
            ],
        );

        // Subtitles
        if opts.download_subtitles {
            push(
                &mut args,
                ["--write-subs", "--sub-langs", opts.subtitle_languages.as_str()],
            );
            if opts.embed_subtitles {
                args.push("--embed-subs".into());
            }
        }

        // Metadata
        if opts.embed_metadata {
            args.push("--embed-metadata".into());
        }
        if opts.embed_thumbnail {
            args.push("--embed-thumbnail".into());
        }
        if opts.embed_chapters {
            args.push("--embed-chapters".into());
        }

        // Playlist
        if opts.is_playlist {
            if let Some(start) = opts.playlist_start {
                push(&mut args, ["--playlist-start", start.to_string().as_str()]);
            }
            if let Some(end) = opts.playlist_end {
                push(&mut args, ["--playlist-end", end.to_string().as_str()]);
            }
            if opts.playlist_reverse {
                args.push("--playlist-reverse".into());
            }
        } else {
            args.push("--no-playlist".into());
        }

        push(
            &mut args,
            [
                "--concurrent-fragments",
                opts.max_concurrent_fragments.to_string().as_str(),
            ],
        );

        if opts.limit_speed && opts.speed_limit_kbps > 0 {
            push(
                &mut args,
                ["--limit-rate", format!("{}K", opts.speed_limit_kbps).as_str()],
            );
        }

        if opts.use_proxy && !opts.proxy_url.trim().is_empty() {
            push(&mut args, ["--proxy", opts.proxy_url.trim()]);
        }

        push(&mut args, ["--progress", "--newline", "--no-warnings"]);

        args.extend(split_custom_args(&opts.custom_arguments));

        args.push(job.url.clone());
        args
    }
}

fn push<const N: usize>(args: &mut Vec<String>, items: [&str; N]) {
    args.extend(items.iter().map(|s| (*s).to_string()));
}

/// `-f` selector for a video quality.
#[must_use]
pub fn format_selector(quality: VideoQuality) -> String {
    quality.max_height().map_or_else(
        || "bestvideo+bestaudio/best".to_string(),
        |h| format!("bestvideo[height<={h}]+bestaudio/best[height<={h}]"),
    )
}

/// Split a raw argument string on whitespace, honoring single and double quotes.
///
/// Quotes group characters and are removed; there is no backslash escaping.
/// An unterminated quote runs to the end of the input.
#[must_use]
pub fn split_custom_args(raw: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;

    for c in raw.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_token = true;
            }
            None if c.is_whitespace() => {
                if in_token {
                    out.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            None => {
                current.push(c);
                in_token = true;
            }
        }
    }
    if in_token {
        out.push(current);
    }
    out
}
