//! Path utilities for ytdlm data, config, and tool locations.
//!
//! Returns `PathBuf` and `PathError`; no terminal I/O. OS-specific lookups
//! stay inside `platform` and `tools`.

mod error;
mod platform;
mod tools;

pub use error::PathError;
pub use platform::{
    data_root, default_download_dir, ensure_directory, normalize_user_path, settings_path,
};
pub use tools::{
    default_ffmpeg_path, default_ytdlp_path, ffmpeg_dir_of, find_on_path, tool_from_setting,
    tools_dir,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_rejects_empty() {
        assert!(matches!(normalize_user_path("   "), Err(PathError::EmptyPath)));
    }

    #[test]
    fn test_normalize_makes_absolute() {
        let path = normalize_user_path("some/relative").unwrap();
        assert!(path.is_absolute());
        assert!(path.ends_with("some/relative"));
    }

    #[test]
    fn test_ensure_directory_creates_and_rejects_files() {
        let tmp = tempfile::TempDir::new().unwrap();
        let nested = tmp.path().join("a").join("b");
        ensure_directory(&nested).unwrap();
        assert!(nested.is_dir());
        ensure_directory(&nested).unwrap();

        let file = tmp.path().join("file.txt");
        std::fs::write(&file, "x").unwrap();
        assert!(matches!(
            ensure_directory(&file),
            Err(PathError::NotADirectory(_))
        ));
    }
}
