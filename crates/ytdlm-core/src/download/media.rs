//! Media metadata reported by the downloader's `--dump-json` probe.
//!
//! Only the fields the application uses are modelled. Every field tolerates
//! being absent or `null` in the JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use super::job::PLACEHOLDER_TITLE;

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn placeholder_title() -> String {
    PLACEHOLDER_TITLE.to_string()
}

fn title_or_placeholder<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(placeholder_title))
}

/// One available format of a video.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatInfo {
    #[serde(deserialize_with = "null_as_default")]
    pub format_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub ext: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fps: Option<f64>,
    #[serde(deserialize_with = "null_as_default")]
    pub vcodec: String,
    #[serde(deserialize_with = "null_as_default")]
    pub acodec: String,
    pub filesize: Option<u64>,
    /// Total bitrate in KBit/s.
    pub tbr: Option<f64>,
}

impl FormatInfo {
    /// Whether the format carries no video stream.
    #[must_use]
    pub fn is_audio_only(&self) -> bool {
        self.vcodec == "none" && self.acodec != "none"
    }
}

/// A subtitle track advertised by the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleInfo {
    pub language: String,
    pub is_auto_generated: bool,
}

/// Metadata for a single video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoInfo {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "title_or_placeholder")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub uploader: String,
    #[serde(deserialize_with = "null_as_default")]
    pub thumbnail: String,
    /// Duration in seconds.
    #[serde(deserialize_with = "null_as_default")]
    pub duration: f64,
    /// Upload date as `YYYYMMDD`.
    pub upload_date: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub view_count: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub formats: Vec<FormatInfo>,
    #[serde(deserialize_with = "null_as_default")]
    pub subtitles: BTreeMap<String, serde_json::Value>,
    #[serde(deserialize_with = "null_as_default")]
    pub automatic_captions: BTreeMap<String, serde_json::Value>,
    pub playlist_count: Option<u32>,
}

impl Default for VideoInfo {
    fn default() -> Self {
        Self {
            id: String::new(),
            title: placeholder_title(),
            description: String::new(),
            uploader: String::new(),
            thumbnail: String::new(),
            duration: 0.0,
            upload_date: None,
            view_count: 0,
            formats: Vec::new(),
            subtitles: BTreeMap::new(),
            automatic_captions: BTreeMap::new(),
            playlist_count: None,
        }
    }
}

impl VideoInfo {
    /// Parse the output of `--dump-json`.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json.trim())
    }

    /// Thumbnail URL, if any.
    #[must_use]
    pub fn thumbnail_url(&self) -> Option<&str> {
        Some(self.thumbnail.as_str()).filter(|t| !t.is_empty())
    }

    /// Distinct heights offered by the source, highest first.
    #[must_use]
    pub fn available_heights(&self) -> Vec<u32> {
        let mut heights: Vec<u32> = self.formats.iter().filter_map(|f| f.height).collect();
        heights.sort_unstable_by(|a, b| b.cmp(a));
        heights.dedup();
        heights
    }

    /// Manual subtitles first, then auto-generated captions.
    #[must_use]
    pub fn subtitle_tracks(&self) -> Vec<SubtitleInfo> {
        let manual = self.subtitles.keys().map(|lang| SubtitleInfo {
            language: lang.clone(),
            is_auto_generated: false,
        });
        let auto = self.automatic_captions.keys().map(|lang| SubtitleInfo {
            language: lang.clone(),
            is_auto_generated: true,
        });
        manual.chain(auto).collect()
    }
}
