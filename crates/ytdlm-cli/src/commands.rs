//! Main commands enum and primary subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use ytdlm_core::settings::MAX_CONCURRENT_DOWNLOADS_LIMIT;
use ytdlm_core::{AudioFormat, DownloadOptions, VideoQuality};

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Download one or more URLs
    Download(DownloadArgs),

    /// Show metadata for a video without downloading it
    Info {
        /// Video URL
        url: String,
        /// Print the raw metadata as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the entry URLs of a playlist
    Playlist {
        /// Playlist URL
        url: String,
    },

    /// Show ytdlm and yt-dlp versions
    Version,

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Configuration commands.
#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the effective settings and resolved tool paths
    Show,
    /// Print the settings file location
    Path,
}

/// Flags for `ytdlm download`. Unset flags keep the configured defaults.
#[derive(Args, Debug, Default)]
pub struct DownloadArgs {
    /// URLs to download
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// Maximum resolution: best, 2160p, 1080p, 720p, ... or audio
    #[arg(short, long)]
    pub quality: Option<VideoQuality>,

    /// Extract audio only
    #[arg(short = 'x', long)]
    pub audio_only: bool,

    /// Audio codec for extraction: best, mp3, aac, flac, wav, opus, m4a, vorbis
    #[arg(long)]
    pub audio_format: Option<AudioFormat>,

    /// Keep the video file after extracting audio
    #[arg(short = 'k', long)]
    pub keep_video: bool,

    /// Download subtitles
    #[arg(long)]
    pub subs: bool,

    /// Embed subtitles into the video (implies --subs)
    #[arg(long)]
    pub embed_subs: bool,

    /// Subtitle languages, comma-separated (e.g. "en,de")
    #[arg(long)]
    pub sub_langs: Option<String>,

    /// Don't embed the thumbnail
    #[arg(long)]
    pub no_thumbnail: bool,

    /// Don't embed metadata
    #[arg(long)]
    pub no_metadata: bool,

    /// Don't embed chapters
    #[arg(long)]
    pub no_chapters: bool,

    /// Treat the URL as a playlist
    #[arg(long)]
    pub playlist: bool,

    /// First playlist item to download (1-based, implies --playlist)
    #[arg(long)]
    pub playlist_start: Option<u32>,

    /// Last playlist item to download (implies --playlist)
    #[arg(long)]
    pub playlist_end: Option<u32>,

    /// Download playlist items in reverse order (implies --playlist)
    #[arg(long)]
    pub reverse: bool,

    /// Fragments downloaded in parallel per video
    #[arg(long)]
    pub fragments: Option<u32>,

    /// Rate limit in KiB/s
    #[arg(long, value_name = "KIB_PER_SEC")]
    pub limit_rate: Option<u64>,

    /// Proxy URL (http, https, or socks)
    #[arg(long)]
    pub proxy: Option<String>,

    /// Extra yt-dlp arguments, passed through as given
    #[arg(long, allow_hyphen_values = true)]
    pub args: Option<String>,

    /// Output filename template
    #[arg(long)]
    pub template: Option<String>,

    /// Destination directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Maximum simultaneous downloads
    #[arg(
        short,
        long,
        value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_CONCURRENT_DOWNLOADS_LIMIT))
    )]
    pub jobs: Option<u32>,

    /// Don't query titles before starting
    #[arg(long)]
    pub no_probe: bool,
}

impl DownloadArgs {
    /// Layer these flags over `base`.
    #[must_use]
    pub fn apply_to(&self, base: DownloadOptions) -> DownloadOptions {
        let mut options = base;

        if let Some(quality) = self.quality {
            options.quality = quality;
        }
        if self.audio_only {
            options.quality = VideoQuality::AudioOnly;
        }
        if let Some(format) = self.audio_format {
            options.audio_format = format;
        }
        options.keep_video |= self.keep_video;

        if self.subs || self.embed_subs {
            options.download_subtitles = true;
        }
        options.embed_subtitles |= self.embed_subs;
        if let Some(langs) = &self.sub_langs {
            options.subtitle_languages.clone_from(langs);
        }

        if self.no_thumbnail {
            options.embed_thumbnail = false;
        }
        if self.no_metadata {
            options.embed_metadata = false;
        }
        if self.no_chapters {
            options.embed_chapters = false;
        }

        if self.is_playlist() {
            options.is_playlist = true;
        }
        if self.playlist_start.is_some() {
            options.playlist_start = self.playlist_start;
        }
        if self.playlist_end.is_some() {
            options.playlist_end = self.playlist_end;
        }
        options.playlist_reverse |= self.reverse;

        if let Some(fragments) = self.fragments {
            options.max_concurrent_fragments = fragments;
        }
        if let Some(kbps) = self.limit_rate {
            options.limit_speed = kbps > 0;
            options.speed_limit_kbps = kbps;
        }
        if let Some(proxy) = &self.proxy {
            options.use_proxy = true;
            options.proxy_url.clone_from(proxy);
        }
        if let Some(args) = &self.args {
            options.custom_arguments.clone_from(args);
        }
        if let Some(template) = &self.template {
            options.output_template.clone_from(template);
        }

        options
    }

    /// Whether any flag asks for playlist handling.
    #[must_use]
    pub const fn is_playlist(&self) -> bool {
        self.playlist || self.playlist_start.is_some() || self.playlist_end.is_some() || self.reverse
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::parser::Cli;

    fn download_args(argv: &[&str]) -> DownloadArgs {
        let mut full = vec!["ytdlm", "download"];
        full.extend_from_slice(argv);
        match Cli::parse_from(full).command {
            Some(Commands::Download(args)) => args,
            _ => panic!("expected download command"),
        }
    }

    #[test]
    fn test_defaults_untouched_without_flags() {
        let args = download_args(&["https://example.com/v"]);
        assert_eq!(args.apply_to(DownloadOptions::default()), DownloadOptions::default());
    }

    #[test]
    fn test_quality_and_audio_flags() {
        let args = download_args(&["-q", "720p", "u"]);
        assert_eq!(
            args.apply_to(DownloadOptions::default()).quality,
            VideoQuality::P720
        );

        let args = download_args(&["-x", "--audio-format", "mp3", "-k", "u"]);
        let options = args.apply_to(DownloadOptions::default());
        assert!(options.quality.is_audio_only());
        assert_eq!(options.audio_format, AudioFormat::Mp3);
        assert!(options.keep_video);
    }

    #[test]
    fn test_invalid_quality_rejected() {
        assert!(Cli::try_parse_from(["ytdlm", "download", "-q", "999p", "u"]).is_err());
    }

    #[test]
    fn test_playlist_range_implies_playlist() {
        let args = download_args(&["--playlist-start", "2", "--playlist-end", "5", "u"]);
        let options = args.apply_to(DownloadOptions::default());
        assert!(options.is_playlist);
        assert_eq!(options.playlist_start, Some(2));
        assert_eq!(options.playlist_end, Some(5));
        assert!(!options.playlist_reverse);
    }

    #[test]
    fn test_embed_subs_implies_subs() {
        let args = download_args(&["--embed-subs", "--sub-langs", "en,de", "u"]);
        let options = args.apply_to(DownloadOptions::default());
        assert!(options.download_subtitles);
        assert!(options.embed_subtitles);
        assert_eq!(options.subtitle_languages, "en,de");
    }

    #[test]
    fn test_embed_toggles_and_network() {
        let args = download_args(&[
            "--no-thumbnail",
            "--no-chapters",
            "--limit-rate",
            "500",
            "--proxy",
            "socks5://127.0.0.1:1080",
            "--fragments",
            "8",
            "u",
        ]);
        let options = args.apply_to(DownloadOptions::default());
        assert!(!options.embed_thumbnail);
        assert!(options.embed_metadata);
        assert!(!options.embed_chapters);
        assert!(options.limit_speed);
        assert_eq!(options.speed_limit_kbps, 500);
        assert!(options.use_proxy);
        assert_eq!(options.max_concurrent_fragments, 8);
    }

    #[test]
    fn test_custom_args_accept_leading_hyphen() {
        let args = download_args(&["--args", "--sponsorblock-remove all", "u"]);
        assert_eq!(
            args.apply_to(DownloadOptions::default()).custom_arguments,
            "--sponsorblock-remove all"
        );
    }

    #[test]
    fn test_jobs_range() {
        assert_eq!(download_args(&["-j", "4", "u"]).jobs, Some(4));
        assert!(Cli::try_parse_from(["ytdlm", "download", "-j", "0", "u"]).is_err());
        assert!(Cli::try_parse_from(["ytdlm", "download", "-j", "33", "u"]).is_err());
    }

    #[test]
    fn test_urls_required() {
        assert!(Cli::try_parse_from(["ytdlm", "download"]).is_err());
        let args = download_args(&["a", "b", "c"]);
        assert_eq!(args.urls, vec!["a", "b", "c"]);
    }
}
