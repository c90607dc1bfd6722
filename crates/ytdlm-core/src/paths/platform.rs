//! Platform roots: where data, config, and downloads live by default.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use super::error::PathError;

const APP_DIR: &str = "ytdlm";

/// Root directory for application data (bundled tools live under it).
///
/// Resolution order:
/// 1. `YTDLM_DATA_DIR` environment variable
/// 2. System data directory (e.g. `~/.local/share/ytdlm`)
pub fn data_root() -> Result<PathBuf, PathError> {
    if let Ok(path) = env::var("YTDLM_DATA_DIR") {
        return normalize_user_path(&path);
    }

    let data_dir = dirs::data_local_dir().ok_or(PathError::MissingPlatformDir("data"))?;
    Ok(data_dir.join(APP_DIR))
}

/// Location of `config.json`.
///
/// Resolution order:
/// 1. `YTDLM_CONFIG` environment variable
/// 2. `<system config dir>/ytdlm/config.json`
pub fn settings_path() -> Result<PathBuf, PathError> {
    if let Ok(path) = env::var("YTDLM_CONFIG") {
        return normalize_user_path(&path);
    }

    let config_dir = dirs::config_dir().ok_or(PathError::MissingPlatformDir("config"))?;
    Ok(config_dir.join(APP_DIR).join("config.json"))
}

/// Default download directory: `<Downloads>/ytdlm`, or `~/Downloads/ytdlm`
/// when the platform has no download folder.
pub fn default_download_dir() -> Result<PathBuf, PathError> {
    if let Some(dir) = dirs::download_dir() {
        return Ok(dir.join(APP_DIR));
    }
    let home = dirs::home_dir().ok_or(PathError::NoHomeDir)?;
    Ok(home.join("Downloads").join(APP_DIR))
}

/// Normalize a user-provided path, expanding `~` and making it absolute.
pub fn normalize_user_path(raw: &str) -> Result<PathBuf, PathError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PathError::EmptyPath);
    }

    let expanded = if trimmed == "~" {
        dirs::home_dir().ok_or(PathError::NoHomeDir)?
    } else if let Some(rest) = trimmed.strip_prefix("~/") {
        dirs::home_dir().ok_or(PathError::NoHomeDir)?.join(rest)
    } else {
        PathBuf::from(trimmed)
    };

    if expanded.is_absolute() {
        Ok(expanded)
    } else {
        let cwd = env::current_dir().map_err(|e| PathError::CurrentDir(e.to_string()))?;
        Ok(cwd.join(expanded))
    }
}

/// Create `path` (and parents) if missing; error if it exists as a file.
pub fn ensure_directory(path: &Path) -> Result<(), PathError> {
    if path.exists() {
        if !path.is_dir() {
            return Err(PathError::NotADirectory(path.to_path_buf()));
        }
        return Ok(());
    }
    fs::create_dir_all(path).map_err(|e| PathError::CreateFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
