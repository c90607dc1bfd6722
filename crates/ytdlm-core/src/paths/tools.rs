//! Locations of the external `yt-dlp` and `ffmpeg` executables.
//!
//! A copy under [`tools_dir`] wins; otherwise the first match on `PATH`;
//! otherwise the bare program name, which surfaces as a spawn error later.

use std::env;
use std::path::{Path, PathBuf};

use super::error::PathError;
use super::platform::{data_root, normalize_user_path};

/// Directory for bundled downloader/transcoder binaries.
pub fn tools_dir() -> Result<PathBuf, PathError> {
    Ok(data_root()?.join("tools"))
}

fn exe_name(stem: &str) -> String {
    if cfg!(windows) {
        format!("{stem}.exe")
    } else {
        stem.to_string()
    }
}

/// Search each `PATH` entry for an executable called `name`.
#[must_use]
pub fn find_on_path(name: &str) -> Option<PathBuf> {
    let file = exe_name(name);
    let path = env::var_os("PATH")?;
    env::split_paths(&path)
        .map(|dir| dir.join(&file))
        .find(|candidate| candidate.is_file())
}

fn resolve_tool(stem: &str) -> PathBuf {
    if let Ok(dir) = tools_dir() {
        let bundled = dir.join(exe_name(stem));
        if bundled.is_file() {
            return bundled;
        }
    }
    find_on_path(stem).unwrap_or_else(|| PathBuf::from(exe_name(stem)))
}

/// Resolved `yt-dlp` executable.
#[must_use]
pub fn default_ytdlp_path() -> PathBuf {
    resolve_tool("yt-dlp")
}

/// Resolved `ffmpeg` executable.
#[must_use]
pub fn default_ffmpeg_path() -> PathBuf {
    resolve_tool("ffmpeg")
}

/// Executable named in settings.
///
/// A bare program name (no separator) is looked up on `PATH` and kept as
/// given when absent; anything else is a path and gets normalized.
pub fn tool_from_setting(raw: &str) -> Result<PathBuf, PathError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PathError::EmptyPath);
    }
    if trimmed == "~" || trimmed.contains(['/', '\\']) {
        return normalize_user_path(trimmed);
    }
    Ok(find_on_path(trimmed).unwrap_or_else(|| PathBuf::from(trimmed)))
}

/// Directory to pass as `--ffmpeg-location` for a given ffmpeg path.
///
/// A bare program name has no directory; `.` is returned so the downloader
/// still receives a well-formed argument.
#[must_use]
pub fn ffmpeg_dir_of(ffmpeg: &Path) -> PathBuf {
    match ffmpeg.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ffmpeg_dir_of() {
        assert_eq!(
            ffmpeg_dir_of(Path::new("/opt/tools/ffmpeg")),
            PathBuf::from("/opt/tools")
        );
        assert_eq!(ffmpeg_dir_of(Path::new("ffmpeg")), PathBuf::from("."));
    }

    #[test]
    fn test_bare_setting_is_not_anchored_at_cwd() {
        let tool = tool_from_setting(" definitely-not-a-real-tool-xyz ").unwrap();
        assert_eq!(tool, PathBuf::from("definitely-not-a-real-tool-xyz"));
        assert_eq!(ffmpeg_dir_of(&tool), PathBuf::from("."));
    }

    #[cfg(unix)]
    #[test]
    fn test_bare_setting_found_on_path() {
        let tool = tool_from_setting("sh").unwrap();
        assert!(tool.is_absolute(), "{}", tool.display());
        assert!(tool.ends_with("sh"));
    }

    #[test]
    fn test_setting_with_separator_is_a_path() {
        let tool = tool_from_setting("bin/yt-dlp").unwrap();
        assert!(tool.is_absolute());
        assert!(tool.ends_with("bin/yt-dlp"));
        assert!(matches!(tool_from_setting("  "), Err(PathError::EmptyPath)));
    }

    #[test]
    fn test_resolve_falls_back_to_bare_name() {
        let resolved = resolve_tool("definitely-not-a-real-tool-xyz");
        assert_eq!(resolved, PathBuf::from(exe_name("definitely-not-a-real-tool-xyz")));
    }
}
