//! Per-job download options.
//!
//! `DownloadOptions` is cloned into every job at submission time, so changing
//! the global defaults afterwards never affects jobs already in flight.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Requested maximum video resolution (or audio-only extraction).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoQuality {
    #[default]
    Best,
    #[serde(rename = "4320p")]
    P4320,
    #[serde(rename = "2160p")]
    P2160,
    #[serde(rename = "1440p")]
    P1440,
    #[serde(rename = "1080p")]
    P1080,
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "480p")]
    P480,
    #[serde(rename = "360p")]
    P360,
    #[serde(rename = "240p")]
    P240,
    #[serde(rename = "144p")]
    P144,
    AudioOnly,
}

/// Parse table for `VideoQuality`, keyed by the lowercase CLI/config spelling.
const QUALITY_NAMES: &[(&str, VideoQuality)] = &[
    ("best", VideoQuality::Best),
    ("4320p", VideoQuality::P4320),
    ("8k", VideoQuality::P4320),
    ("2160p", VideoQuality::P2160),
    ("4k", VideoQuality::P2160),
    ("1440p", VideoQuality::P1440),
    ("1080p", VideoQuality::P1080),
    ("720p", VideoQuality::P720),
    ("480p", VideoQuality::P480),
    ("360p", VideoQuality::P360),
    ("240p", VideoQuality::P240),
    ("144p", VideoQuality::P144),
    ("audio", VideoQuality::AudioOnly),
    ("audio_only", VideoQuality::AudioOnly),
    ("audio-only", VideoQuality::AudioOnly),
];

impl VideoQuality {
    /// Every quality in display order.
    pub const ALL: [Self; 11] = [
        Self::Best,
        Self::P4320,
        Self::P2160,
        Self::P1440,
        Self::P1080,
        Self::P720,
        Self::P480,
        Self::P360,
        Self::P240,
        Self::P144,
        Self::AudioOnly,
    ];

    /// Maximum vertical resolution in pixels, if this is a capped video quality.
    #[must_use]
    pub const fn max_height(&self) -> Option<u32> {
        match self {
            Self::P4320 => Some(4320),
            Self::P2160 => Some(2160),
            Self::P1440 => Some(1440),
            Self::P1080 => Some(1080),
            Self::P720 => Some(720),
            Self::P480 => Some(480),
            Self::P360 => Some(360),
            Self::P240 => Some(240),
            Self::P144 => Some(144),
            Self::Best | Self::AudioOnly => None,
        }
    }

    #[must_use]
    pub const fn is_audio_only(&self) -> bool {
        matches!(self, Self::AudioOnly)
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Best => "Best Available",
            Self::P4320 => "8K (4320p)",
            Self::P2160 => "4K (2160p)",
            Self::P1440 => "1440p",
            Self::P1080 => "1080p",
            Self::P720 => "720p",
            Self::P480 => "480p",
            Self::P360 => "360p",
            Self::P240 => "240p",
            Self::P144 => "144p",
            Self::AudioOnly => "Audio Only",
        }
    }
}

impl fmt::Display for VideoQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for VideoQuality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        QUALITY_NAMES
            .iter()
            .find(|(name, _)| *name == lower)
            .map(|(_, q)| *q)
            .ok_or_else(|| format!("unknown quality '{s}' (try best, 1080p, 720p, audio)"))
    }
}

/// Target audio codec for audio-only extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Best,
    Mp3,
    Aac,
    Flac,
    Wav,
    Opus,
    M4a,
    Vorbis,
}

impl AudioFormat {
    /// Value passed to `--audio-format`.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Best => "best",
            Self::Mp3 => "mp3",
            Self::Aac => "aac",
            Self::Flac => "flac",
            Self::Wav => "wav",
            Self::Opus => "opus",
            Self::M4a => "m4a",
            Self::Vorbis => "vorbis",
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AudioFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "best" => Ok(Self::Best),
            "mp3" => Ok(Self::Mp3),
            "aac" => Ok(Self::Aac),
            "flac" => Ok(Self::Flac),
            "wav" => Ok(Self::Wav),
            "opus" => Ok(Self::Opus),
            "m4a" => Ok(Self::M4a),
            "vorbis" => Ok(Self::Vorbis),
            _ => Err(format!("unknown audio format '{s}'")),
        }
    }
}

/// Preferred video codec.
///
/// Carried with the job for display and future format sorting; the argument
/// builder does not currently map it to a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoCodec {
    #[default]
    Best,
    H264,
    H265,
    Vp9,
    Av1,
}

impl VideoCodec {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Best => "Best Available",
            Self::H264 => "H.264 (AVC)",
            Self::H265 => "H.265 (HEVC)",
            Self::Vp9 => "VP9",
            Self::Av1 => "AV1",
        }
    }
}

impl FromStr for VideoCodec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "best" => Ok(Self::Best),
            "h264" | "avc" => Ok(Self::H264),
            "h265" | "hevc" => Ok(Self::H265),
            "vp9" => Ok(Self::Vp9),
            "av1" => Ok(Self::Av1),
            _ => Err(format!("unknown video codec '{s}'")),
        }
    }
}

/// Default output filename template.
pub const DEFAULT_OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";

/// Immutable per-job configuration snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadOptions {
    pub quality: VideoQuality,
    pub audio_format: AudioFormat,
    pub video_codec: VideoCodec,
    pub download_subtitles: bool,
    /// Only honored when `download_subtitles` is set.
    pub embed_subtitles: bool,
    pub embed_thumbnail: bool,
    pub embed_metadata: bool,
    pub embed_chapters: bool,
    /// Comma-separated language list for `--sub-langs` (e.g. `en,de`).
    pub subtitle_languages: String,
    pub is_playlist: bool,
    /// 1-based index of the first playlist item.
    pub playlist_start: Option<u32>,
    /// 1-based index of the last playlist item.
    pub playlist_end: Option<u32>,
    pub playlist_reverse: bool,
    /// Raw extra arguments, passed through without validation.
    pub custom_arguments: String,
    pub max_concurrent_fragments: u32,
    pub limit_speed: bool,
    /// Rate limit in KiB/s.
    pub speed_limit_kbps: u64,
    pub use_proxy: bool,
    pub proxy_url: String,
    /// Keep the source video after audio extraction.
    pub keep_video: bool,
    pub output_template: String,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            quality: VideoQuality::Best,
            audio_format: AudioFormat::Best,
            video_codec: VideoCodec::Best,
            download_subtitles: false,
            embed_subtitles: false,
            embed_thumbnail: true,
            embed_metadata: true,
            embed_chapters: true,
            subtitle_languages: "en".to_string(),
            is_playlist: false,
            playlist_start: None,
            playlist_end: None,
            playlist_reverse: false,
            custom_arguments: String::new(),
            max_concurrent_fragments: 5,
            limit_speed: false,
            speed_limit_kbps: 0,
            use_proxy: false,
            proxy_url: String::new(),
            keep_video: false,
            output_template: DEFAULT_OUTPUT_TEMPLATE.to_string(),
        }
    }
}

impl DownloadOptions {
    /// Set the quality.
    #[must_use]
    pub const fn with_quality(mut self, quality: VideoQuality) -> Self {
        self.quality = quality;
        self
    }

    /// Switch to audio-only extraction with the given codec.
    #[must_use]
    pub const fn audio_only(mut self, format: AudioFormat) -> Self {
        self.quality = VideoQuality::AudioOnly;
        self.audio_format = format;
        self
    }

    /// Mark as a playlist job with an optional item range.
    #[must_use]
    pub const fn with_playlist(mut self, start: Option<u32>, end: Option<u32>) -> Self {
        self.is_playlist = true;
        self.playlist_start = start;
        self.playlist_end = end;
        self
    }

    /// Set raw custom arguments.
    #[must_use]
    pub fn with_custom_arguments(mut self, args: impl Into<String>) -> Self {
        self.custom_arguments = args.into();
        self
    }

    /// Output template, falling back to the default when blank.
    #[must_use]
    pub fn effective_output_template(&self) -> &str {
        if self.output_template.trim().is_empty() {
            DEFAULT_OUTPUT_TEMPLATE
        } else {
            &self.output_template
        }
    }
}
