//! Channel tables extracted from `channels` responses

use super::models::ChannelItem;
use super::{parse_count, parse_items};
use anyhow::{Context, Result};
use holo_core::{ChannelStats, ChannelThumbnailUrls, ChannelTitle, Timestamped, UploadsPlaylist};
use serde_json::Value;

/// Parse every channel item out of the response pages
pub fn channel_items(responses: &[Value]) -> Result<Vec<ChannelItem>> {
    parse_items(responses).context("Failed to parse channel responses")
}

pub fn channel_titles(items: &[ChannelItem]) -> Vec<ChannelTitle> {
    items
        .iter()
        .map(|item| ChannelTitle {
            channel_id: item.id.clone(),
            channel_title: item.snippet.title.clone(),
        })
        .collect()
}

/// Subscriber, video and view counts. Hidden subscriber counts are recorded as 0.
pub fn channel_stats(items: &[ChannelItem]) -> Result<Vec<ChannelStats>> {
    items
        .iter()
        .map(|item| {
            let stats = &item.statistics;
            Ok(ChannelStats {
                channel_id: item.id.clone(),
                subscriber_count: parse_count(stats.subscriber_count.as_deref(), "subscriberCount", &item.id)?
                    .unwrap_or(0),
                video_count: parse_count(stats.video_count.as_deref(), "videoCount", &item.id)?.unwrap_or(0),
                view_count: parse_count(stats.view_count.as_deref(), "viewCount", &item.id)?.unwrap_or(0),
            })
        })
        .collect()
}

/// Profile picture URLs; a missing resolution is an empty string
pub fn channel_thumbnail_urls(items: &[ChannelItem]) -> Vec<ChannelThumbnailUrls> {
    let url = |thumbnail: &Option<super::models::Thumbnail>| {
        thumbnail.as_ref().map(|t| t.url.clone()).unwrap_or_default()
    };

    items
        .iter()
        .map(|item| ChannelThumbnailUrls {
            channel_id: item.id.clone(),
            default: url(&item.snippet.thumbnails.default),
            medium: url(&item.snippet.thumbnails.medium),
            high: url(&item.snippet.thumbnails.high),
        })
        .collect()
}

pub fn uploads_playlist_ids(items: &[ChannelItem]) -> Vec<UploadsPlaylist> {
    items
        .iter()
        .map(|item| UploadsPlaylist {
            channel_id: item.id.clone(),
            uploads_playlist_id: item.content_details.related_playlists.uploads.clone(),
        })
        .collect()
}

/// Every channel table, stamped with the response time
#[derive(Debug, Clone)]
pub struct ChannelTables {
    pub titles: Timestamped<ChannelTitle>,
    pub stats: Timestamped<ChannelStats>,
    pub thumbnail_urls: Timestamped<ChannelThumbnailUrls>,
    pub uploads_playlists: Timestamped<UploadsPlaylist>,
}

impl ChannelTables {
    pub fn from_responses(responses: &Timestamped<Value>) -> Result<Self> {
        let items = channel_items(&responses.data)?;
        let at = responses.collected_at;

        Ok(Self {
            titles: Timestamped::at(channel_titles(&items), at),
            stats: Timestamped::at(channel_stats(&items)?, at),
            thumbnail_urls: Timestamped::at(channel_thumbnail_urls(&items), at),
            uploads_playlists: Timestamped::at(uploads_playlist_ids(&items), at),
        })
    }
}
