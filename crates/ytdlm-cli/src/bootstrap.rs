//! CLI composition root.
//!
//! Loads settings once and resolves everything the handlers need from them.
//! Nothing here writes configuration back.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use ytdlm_core::paths;
use ytdlm_core::{DownloadManagerConfig, Settings, validate_settings};
use ytdlm_runtime::YtDlp;

/// Bootstrap inputs taken from global flags.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Explicit settings file; the platform default when `None`.
    pub config_path: Option<PathBuf>,
}

impl CliConfig {
    #[must_use]
    pub fn with_config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }
}

/// Resolved settings for one CLI invocation.
#[derive(Debug, Clone)]
pub struct CliContext {
    settings: Settings,
    settings_path: PathBuf,
}

impl CliContext {
    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    /// Download manager configuration derived from the settings.
    pub fn manager_config(&self) -> Result<DownloadManagerConfig> {
        DownloadManagerConfig::from_settings(&self.settings)
            .context("Failed to resolve download paths")
    }

    /// Metadata query client for the configured `yt-dlp`.
    pub fn ytdlp(&self) -> Result<YtDlp> {
        let path = match self.settings.ytdlp_path.as_deref() {
            Some(p) => paths::tool_from_setting(p)?,
            None => paths::default_ytdlp_path(),
        };
        Ok(YtDlp::new(path))
    }
}

/// Load and validate settings.
pub fn bootstrap(config: CliConfig) -> Result<CliContext> {
    let settings_path = match config.config_path {
        Some(path) => path,
        None => paths::settings_path().context("Failed to locate settings file")?,
    };
    let settings = load_settings(&settings_path)?;
    tracing::debug!(path = %settings_path.display(), "Loaded settings");

    Ok(CliContext {
        settings,
        settings_path,
    })
}

/// Read settings from `path`. A missing file yields the defaults.
pub fn load_settings(path: &Path) -> Result<Settings> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(Settings::with_defaults());
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read {}", path.display()));
        }
    };

    let settings = Settings::from_json(&text)
        .with_context(|| format!("Invalid settings in {}", path.display()))?;
    validate_settings(&settings).with_context(|| format!("Invalid settings in {}", path.display()))?;
    Ok(settings)
}
