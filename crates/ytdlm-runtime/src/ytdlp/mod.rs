//! Short-lived metadata queries against the `yt-dlp` executable.
//!
//! These run to completion and buffer their output, unlike downloads which
//! stream through [`crate::process::CapturedProcess`].

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};
use ytdlm_core::VideoInfo;

/// Default limit for a single metadata query.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(60);

/// Longest stderr excerpt carried in an error.
const STDERR_EXCERPT_LINES: usize = 5;

/// Failure of a metadata query.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to run {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("yt-dlp exited with code {code:?}: {stderr}")]
    Failed { code: Option<i32>, stderr: String },

    #[error("could not parse yt-dlp output: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("yt-dlp did not answer within {0:?}")]
    Timeout(Duration),
}

/// Handle on a `yt-dlp` executable.
#[derive(Debug, Clone)]
pub struct YtDlp {
    path: PathBuf,
    query_timeout: Duration,
}

impl YtDlp {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    #[must_use]
    pub const fn with_timeout(mut self, query_timeout: Duration) -> Self {
        self.query_timeout = query_timeout;
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fetch metadata for one video (`--dump-json --no-playlist`).
    pub async fn probe(&self, url: &str) -> Result<VideoInfo, ProbeError> {
        let stdout = self.run(&["--dump-json", "--no-playlist", url]).await?;
        // One JSON document per line; only the first is used.
        let first = stdout.lines().find(|l| !l.trim().is_empty()).unwrap_or("{}");
        Ok(VideoInfo::from_json(first)?)
    }

    /// List the entry URLs of a playlist (`--flat-playlist --print url`).
    pub async fn playlist_urls(&self, url: &str) -> Result<Vec<String>, ProbeError> {
        let stdout = self.run(&["--flat-playlist", "--print", "url", url]).await?;
        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && *l != "NA")
            .map(str::to_string)
            .collect())
    }

    /// Reported version string (`--version`).
    pub async fn version(&self) -> Result<String, ProbeError> {
        let stdout = self.run(&["--version"]).await?;
        Ok(stdout.trim().to_string())
    }

    async fn run(&self, args: &[&str]) -> Result<String, ProbeError> {
        debug!(path = %self.path.display(), ?args, "running yt-dlp query");

        let child = Command::new(&self.path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ProbeError::Spawn {
                path: self.path.clone(),
                source,
            })?;

        let output = timeout(self.query_timeout, child.wait_with_output())
            .await
            .map_err(|_| ProbeError::Timeout(self.query_timeout))?
            .map_err(|source| ProbeError::Spawn {
                path: self.path.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = stderr_excerpt(&String::from_utf8_lossy(&output.stderr));
            warn!(code = ?output.status.code(), %stderr, "yt-dlp query failed");
            return Err(ProbeError::Failed {
                code: output.status.code(),
                stderr,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Last few non-empty stderr lines, joined.
fn stderr_excerpt(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(STDERR_EXCERPT_LINES);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stderr_excerpt_keeps_tail() {
        let text = "a\n\nb\nc\nd\ne\nf\n";
        assert_eq!(stderr_excerpt(text), "b\nc\nd\ne\nf");
        assert_eq!(stderr_excerpt(""), "");
    }
}
