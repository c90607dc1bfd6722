//! Progress extraction from `yt-dlp` output lines.
//!
//! Every function here is total: a line that doesn't match yields `None`,
//! never an error. Regexes are compiled once on first use.

mod throttle;

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use ytdlm_core::ProgressSample;

pub use throttle::ProgressThrottle;

static PERCENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[download\]\s+(\d+\.?\d*)%").expect("valid percent regex")
});

static TOTAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"of\s+~?\s*(\d+(?:\.\d+)?)\s*([KMGT]?i?B)\b").expect("valid total size regex")
});

static SPEED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"at\s+(\d+(?:\.\d+)?)\s*([KMGT]?i?B)/s").expect("valid speed regex")
});

static ETA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"ETA\s+(?:(\d+):)?(\d+):(\d{2})\b").expect("valid eta regex")
});

static DESTINATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^\[(?:download|ExtractAudio)\]\s+Destination:\s+(.+?)\s*$|^\[Merger\]\s+Merging formats into\s+"(.+)"\s*$|^\[download\]\s+(.+?) has already been downloaded"#,
    )
    .expect("valid destination regex")
});

static FORMAT_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.f\d+(?:-\d+)?$").expect("valid format suffix regex"));

/// Percentage from a `[download]  45.2% ...` line.
#[must_use]
pub fn parse_percentage(line: &str) -> Option<f64> {
    PERCENT_RE
        .captures(line)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Percentage plus total size, speed, and ETA when the line carries them.
#[must_use]
pub fn parse_progress(line: &str) -> Option<ProgressSample> {
    let percent = parse_percentage(line)?;

    let total_bytes = TOTAL_RE
        .captures(line)
        .and_then(|c| size_to_bytes(c.get(1)?.as_str(), c.get(2)?.as_str()));
    #[allow(clippy::cast_precision_loss)]
    let speed_bps = SPEED_RE
        .captures(line)
        .and_then(|c| size_to_bytes(c.get(1)?.as_str(), c.get(2)?.as_str()))
        .map(|b| b as f64);
    let eta_seconds = ETA_RE.captures(line).and_then(|c| {
        let hours = c.get(1).map_or(Some(0), |m| m.as_str().parse::<u64>().ok())?;
        let minutes = c.get(2)?.as_str().parse::<u64>().ok()?;
        let seconds = c.get(3)?.as_str().parse::<u64>().ok()?;
        Some(hours * 3600 + minutes * 60 + seconds)
    });

    Some(ProgressSample {
        percent,
        total_bytes,
        speed_bps,
        eta_seconds,
    })
}

/// Output path announced by a `Destination:`, `Merging formats into`, or
/// `has already been downloaded` line.
#[must_use]
pub fn parse_destination(line: &str) -> Option<&str> {
    let caps = DESTINATION_RE.captures(line.trim_end())?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .or_else(|| caps.get(3))
        .map(|m| m.as_str())
}

/// Human title derived from an output path: the file stem without the
/// per-format suffix yt-dlp adds to intermediate files (`.f137`).
#[must_use]
pub fn title_from_path(path: &str) -> Option<String> {
    let stem = Path::new(path).file_stem()?.to_string_lossy();
    let title = FORMAT_SUFFIX_RE.replace(&stem, "");
    let title = title.trim();
    (!title.is_empty()).then(|| title.to_string())
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn size_to_bytes(number: &str, unit: &str) -> Option<u64> {
    let value: f64 = number.parse().ok()?;
    let multiplier: f64 = match unit {
        "B" => 1.0,
        "KiB" => 1024.0,
        "MiB" => 1024.0 * 1024.0,
        "GiB" => 1024.0 * 1024.0 * 1024.0,
        "TiB" => 1024.0 * 1024.0 * 1024.0 * 1024.0,
        "KB" => 1e3,
        "MB" => 1e6,
        "GB" => 1e9,
        "TB" => 1e12,
        _ => return None,
    };
    Some((value * multiplier).round() as u64)
}
