//! Settings domain types and validation.
//!
//! Settings are read once at startup and snapshotted into the download
//! manager's config. Nothing in the library writes them back.

use serde::{Deserialize, Serialize};

use crate::download::DownloadOptions;

/// Default cap on simultaneously running downloads.
pub const DEFAULT_MAX_CONCURRENT_DOWNLOADS: u32 = 3;

/// Upper bound accepted for `max_concurrent_downloads`.
pub const MAX_CONCURRENT_DOWNLOADS_LIMIT: u32 = 32;

/// Default grace period between asking a process tree to stop and giving up.
pub const DEFAULT_TERMINATION_GRACE_SECS: u64 = 5;

/// Application settings.
///
/// Optional fields fall back to the `effective_*` defaults, so a partial
/// `config.json` (or none at all) is always valid input.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Directory new downloads are written to.
    pub default_download_path: Option<String>,

    /// Maximum number of simultaneously running downloads (1-32).
    pub max_concurrent_downloads: Option<u32>,

    /// Options applied to submissions that don't carry their own.
    pub default_options: DownloadOptions,

    /// Explicit path to the `yt-dlp` executable.
    pub ytdlp_path: Option<String>,

    /// Explicit path to the `ffmpeg` executable.
    pub ffmpeg_path: Option<String>,

    /// Seconds to wait for a cancelled process tree to exit.
    pub termination_grace_secs: Option<u64>,
}

impl Settings {
    /// Settings with every optional value filled in.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            default_download_path: None,
            max_concurrent_downloads: Some(DEFAULT_MAX_CONCURRENT_DOWNLOADS),
            default_options: DownloadOptions::default(),
            ytdlp_path: None,
            ffmpeg_path: None,
            termination_grace_secs: Some(DEFAULT_TERMINATION_GRACE_SECS),
        }
    }

    /// Parse settings from JSON text. Unknown keys are ignored.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(json).map_err(|e| SettingsError::Parse(e.to_string()))
    }

    #[must_use]
    pub fn effective_max_concurrent_downloads(&self) -> u32 {
        self.max_concurrent_downloads
            .unwrap_or(DEFAULT_MAX_CONCURRENT_DOWNLOADS)
            .max(1)
    }

    #[must_use]
    pub fn effective_termination_grace_secs(&self) -> u64 {
        self.termination_grace_secs
            .unwrap_or(DEFAULT_TERMINATION_GRACE_SECS)
    }
}

/// Settings validation error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SettingsError {
    #[error("Max concurrent downloads must be between 1 and 32, got {0}")]
    InvalidConcurrency(u32),

    #[error("Download path cannot be empty")]
    EmptyDownloadPath,

    #[error("{0} path cannot be empty")]
    EmptyToolPath(&'static str),

    #[error("Termination grace must be between 1 and 300 seconds, got {0}")]
    InvalidTerminationGrace(u64),

    #[error("Invalid proxy URL: {0}")]
    InvalidProxy(String),

    #[error("Failed to parse settings: {0}")]
    Parse(String),
}

/// Validate settings values.
pub fn validate_settings(settings: &Settings) -> Result<(), SettingsError> {
    if let Some(n) = settings.max_concurrent_downloads {
        if !(1..=MAX_CONCURRENT_DOWNLOADS_LIMIT).contains(&n) {
            return Err(SettingsError::InvalidConcurrency(n));
        }
    }

    if settings
        .default_download_path
        .as_ref()
        .is_some_and(|p| p.trim().is_empty())
    {
        return Err(SettingsError::EmptyDownloadPath);
    }

    if settings.ytdlp_path.as_ref().is_some_and(|p| p.trim().is_empty()) {
        return Err(SettingsError::EmptyToolPath("yt-dlp"));
    }
    if settings.ffmpeg_path.as_ref().is_some_and(|p| p.trim().is_empty()) {
        return Err(SettingsError::EmptyToolPath("ffmpeg"));
    }

    if let Some(secs) = settings.termination_grace_secs {
        if !(1..=300).contains(&secs) {
            return Err(SettingsError::InvalidTerminationGrace(secs));
        }
    }

    let opts = &settings.default_options;
    if opts.use_proxy && !crate::utils::url::is_valid_proxy_url(&opts.proxy_url) {
        return Err(SettingsError::InvalidProxy(opts.proxy_url.clone()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.effective_max_concurrent_downloads(), 3);
        assert_eq!(settings.effective_termination_grace_secs(), 5);
        assert!(validate_settings(&settings).is_ok());
        assert!(validate_settings(&Settings::with_defaults()).is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let settings = Settings::from_json(
            r#"{"max_concurrent_downloads": 5, "default_options": {"quality": "720p"}}"#,
        )
        .unwrap();
        assert_eq!(settings.effective_max_concurrent_downloads(), 5);
        assert_eq!(
            settings.default_options.quality,
            crate::download::VideoQuality::P720
        );
        assert!(settings.default_options.embed_metadata);
    }

    #[test]
    fn test_from_json_empty_and_invalid() {
        assert_eq!(Settings::from_json("  ").unwrap(), Settings::default());
        assert!(matches!(
            Settings::from_json("{not json"),
            Err(SettingsError::Parse(_))
        ));
    }

    #[test]
    fn test_concurrency_bounds() {
        let mut settings = Settings::default();
        settings.max_concurrent_downloads = Some(0);
        assert!(matches!(
            validate_settings(&settings),
            Err(SettingsError::InvalidConcurrency(0))
        ));
        settings.max_concurrent_downloads = Some(33);
        assert!(validate_settings(&settings).is_err());
        settings.max_concurrent_downloads = Some(32);
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn test_empty_paths_rejected() {
        let mut settings = Settings::default();
        settings.default_download_path = Some("  ".into());
        assert!(matches!(
            validate_settings(&settings),
            Err(SettingsError::EmptyDownloadPath)
        ));

        let mut settings = Settings::default();
        settings.ytdlp_path = Some(String::new());
        assert!(matches!(
            validate_settings(&settings),
            Err(SettingsError::EmptyToolPath("yt-dlp"))
        ));
    }

    #[test]
    fn test_proxy_validated_only_when_enabled() {
        let mut settings = Settings::default();
        settings.default_options.proxy_url = "garbage".into();
        assert!(validate_settings(&settings).is_ok());

        settings.default_options.use_proxy = true;
        assert!(validate_settings(&settings).is_err());

        settings.default_options.proxy_url = "socks5://127.0.0.1:1080".into();
        assert!(validate_settings(&settings).is_ok());
    }
}
