//! Holo Core - Shared data structures and preparation logic for YouTube channel analytics

pub mod models;
pub mod time;
pub mod keywords;
pub mod content_types;
pub mod video_types;
pub mod stats;
pub mod join;

pub use models::{
    ChannelStats, ChannelThumbnailUrls, ChannelTitle, ContentTypesRecord, PlaylistVideo, Selection,
    TableColumns, Timestamped, TitleKeywordsRecord, UploadsPlaylist, VideoAttributes, VideoStats, VideoType,
    VideoTypeRecord,
};
pub use keywords::{KeywordBank, KeywordBanks, Language, TitleKeywordExtractor};
pub use content_types::ContentTypeClassifier;
pub use video_types::{ClassificationThresholds, ProbeStatus, Verdict};
pub use stats::{column_key, SummaryStats};

/// Result type for Holo Core operations
pub type Result<T> = std::result::Result<T, HoloCoreError>;

/// Error types for Holo Core operations
#[derive(thiserror::Error, Debug)]
pub enum HoloCoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Invalid ISO 8601 duration: {0}")]
    InvalidDuration(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Provided keyword banks do not include keywords for any of the accepted languages")]
    MissingKeywordBanks,

    #[error("Unknown language: {0}")]
    UnknownLanguage(String),

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("Table '{table}' references {} video id(s) missing from video attributes: {}", .video_ids.len(), .video_ids.join(", "))]
    UnmatchedVideoIds {
        table: String,
        video_ids: Vec<String>,
    },
}
