//! Record types for collected and prepared YouTube data
//!
//! Every record is one row of a session table. Field names double as CSV column names.

use crate::{HoloCoreError, Result};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A table of records together with the time it was collected or prepared
#[derive(Debug, Clone, PartialEq)]
pub struct Timestamped<T> {
    /// Table rows, in collection order
    pub data: Vec<T>,

    /// When the rows were collected or derived
    pub collected_at: DateTime<Utc>,
}

impl<T> Timestamped<T> {
    /// Wrap rows with the current time, truncated to whole seconds
    pub fn now(data: Vec<T>) -> Self {
        let now = Utc::now();
        let collected_at = DateTime::from_timestamp(now.timestamp(), 0).unwrap_or(now);
        Self { data, collected_at }
    }

    /// Wrap rows with an explicit timestamp
    pub fn at(data: Vec<T>, collected_at: DateTime<Utc>) -> Self {
        Self { data, collected_at }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Column names of a session table row, in serialization order.
/// Lets a table with no rows still be written with its header.
pub trait TableColumns {
    const COLUMNS: &'static [&'static str];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelTitle {
    pub channel_id: String,
    pub channel_title: String,
}

/// Channel statistics as reported by the channels resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelStats {
    pub channel_id: String,
    pub subscriber_count: u64,
    pub video_count: u64,
    pub view_count: u64,
}

/// Profile picture URLs at the three resolutions the API exposes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelThumbnailUrls {
    pub channel_id: String,
    pub default: String,
    pub medium: String,
    pub high: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadsPlaylist {
    pub channel_id: String,
    pub uploads_playlist_id: String,
}

/// A video found in an uploads playlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistVideo {
    pub video_id: String,

    /// When the video was added to the playlist, not necessarily when it was published
    pub added_to_playlist: DateTime<Utc>,
}

/// Video attributes as collected. `duration` keeps the raw ISO 8601 encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoAttributes {
    pub video_id: String,
    pub title: String,
    pub publish_datetime: DateTime<Utc>,
    pub duration: String,
    pub category_id: String,
    pub live_broadcast: bool,
    pub scheduled_start_time: Option<DateTime<Utc>>,
    pub scheduled_end_time: Option<DateTime<Utc>>,
    pub actual_start_time: Option<DateTime<Utc>>,
    pub actual_end_time: Option<DateTime<Utc>>,
}

impl VideoAttributes {
    /// Actual end minus actual start, when both are known
    pub fn live_broadcast_duration(&self) -> Option<TimeDelta> {
        match (self.actual_start_time, self.actual_end_time) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }
}

/// Video counters. A `None` count means the counter is hidden or disabled;
/// the `*_enabled` flags tell a disabled counter apart from a zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoStats {
    pub video_id: String,
    pub view_count: Option<u64>,
    pub like_count: Option<u64>,
    pub likes_enabled: bool,
    pub comment_count: Option<u64>,
    pub comments_enabled: bool,
}

/// Kind of upload, derived from live-streaming details and duration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VideoType {
    Normal,
    Short,
    #[serde(rename = "Live Stream")]
    LiveStream,
    Premiere,
}

impl VideoType {
    pub const ALL: [VideoType; 4] = [
        VideoType::Normal,
        VideoType::Short,
        VideoType::LiveStream,
        VideoType::Premiere,
    ];

    /// Human-readable label, identical to the persisted value
    pub fn label(&self) -> &'static str {
        match self {
            VideoType::Normal => "Normal",
            VideoType::Short => "Short",
            VideoType::LiveStream => "Live Stream",
            VideoType::Premiere => "Premiere",
        }
    }

    /// Snake-case prefix used in summary column names, e.g. `live_stream`
    pub fn key(&self) -> &'static str {
        match self {
            VideoType::Normal => "normal",
            VideoType::Short => "short",
            VideoType::LiveStream => "live_stream",
            VideoType::Premiere => "premiere",
        }
    }
}

impl fmt::Display for VideoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classified type of one video. `video_type` is empty when the Shorts probe was inconclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoTypeRecord {
    pub video_id: String,
    #[serde(with = "crate::time::hms_option", default)]
    pub live_broadcast_duration: Option<TimeDelta>,
    pub video_type: Option<VideoType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleKeywordsRecord {
    pub video_id: String,
    pub title: String,
    #[serde(with = "json_set")]
    pub title_keywords: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentTypesRecord {
    pub video_id: String,
    #[serde(with = "json_set")]
    pub content_types: BTreeSet<String>,
}

impl TableColumns for ChannelTitle {
    const COLUMNS: &'static [&'static str] = &["channel_id", "channel_title"];
}

impl TableColumns for ChannelStats {
    const COLUMNS: &'static [&'static str] = &["channel_id", "subscriber_count", "video_count", "view_count"];
}

impl TableColumns for ChannelThumbnailUrls {
    const COLUMNS: &'static [&'static str] = &["channel_id", "default", "medium", "high"];
}

impl TableColumns for UploadsPlaylist {
    const COLUMNS: &'static [&'static str] = &["channel_id", "uploads_playlist_id"];
}

impl TableColumns for PlaylistVideo {
    const COLUMNS: &'static [&'static str] = &["video_id", "added_to_playlist"];
}

impl TableColumns for VideoAttributes {
    const COLUMNS: &'static [&'static str] = &[
        "video_id",
        "title",
        "publish_datetime",
        "duration",
        "category_id",
        "live_broadcast",
        "scheduled_start_time",
        "scheduled_end_time",
        "actual_start_time",
        "actual_end_time",
    ];
}

impl TableColumns for VideoStats {
    const COLUMNS: &'static [&'static str] = &[
        "video_id",
        "view_count",
        "like_count",
        "likes_enabled",
        "comment_count",
        "comments_enabled",
    ];
}

impl TableColumns for VideoTypeRecord {
    const COLUMNS: &'static [&'static str] = &["video_id", "live_broadcast_duration", "video_type"];
}

impl TableColumns for TitleKeywordsRecord {
    const COLUMNS: &'static [&'static str] = &["video_id", "title", "title_keywords"];
}

impl TableColumns for ContentTypesRecord {
    const COLUMNS: &'static [&'static str] = &["video_id", "content_types"];
}

/// Selection of members or data types: everything, one name, or an explicit list
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    All,
    One(String),
    Many(Vec<String>),
}

impl Selection {
    /// Normalize the selection against the full set of known names.
    /// Duplicates are dropped and the first occurrence order is kept.
    pub fn resolve(&self, universe: &[String]) -> Result<Vec<String>> {
        let names: Vec<String> = match self {
            Selection::All => universe.to_vec(),
            Selection::One(name) => vec![name.clone()],
            Selection::Many(names) => {
                if names.is_empty() {
                    return Err(HoloCoreError::InvalidSelection(
                        "empty list of names".to_string(),
                    ));
                }
                names.clone()
            }
        };

        let mut seen = BTreeSet::new();
        Ok(names
            .into_iter()
            .filter(|name| seen.insert(name.clone()))
            .collect())
    }
}

impl From<&str> for Selection {
    fn from(value: &str) -> Self {
        if value.eq_ignore_ascii_case("all") {
            Selection::All
        } else {
            Selection::One(value.to_string())
        }
    }
}

impl From<Vec<String>> for Selection {
    fn from(values: Vec<String>) -> Self {
        Selection::Many(values)
    }
}

/// Serde adapter storing a string set as a JSON array inside a single CSV cell
pub mod json_set {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::BTreeSet;

    pub fn serialize<S>(set: &BTreeSet<String>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let encoded = serde_json::to_string(set).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&encoded)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        if raw.trim().is_empty() {
            return Ok(BTreeSet::new());
        }
        serde_json::from_str(&raw).map_err(serde::de::Error::custom)
    }
}
