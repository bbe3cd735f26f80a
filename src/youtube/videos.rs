//! Video tables extracted from `playlistItems` and `videos` responses

use super::models::{PlaylistItem, VideoItem};
use super::{parse_count, parse_items};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use holo_core::time::parse_rfc3339;
use holo_core::{PlaylistVideo, Timestamped, VideoAttributes, VideoStats};
use serde_json::Value;

/// Video ids of an uploads playlist, or `None` when the playlist has no public videos
pub fn video_ids(responses: &Timestamped<Value>) -> Result<Option<Timestamped<PlaylistVideo>>> {
    let items: Vec<PlaylistItem> =
        parse_items(&responses.data).context("Failed to parse playlist item responses")?;
    if items.is_empty() {
        return Ok(None);
    }

    let videos = items
        .into_iter()
        .map(|item| {
            Ok(PlaylistVideo {
                added_to_playlist: parse_rfc3339(&item.snippet.published_at)?,
                video_id: item.snippet.resource_id.video_id,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Some(Timestamped::at(videos, responses.collected_at)))
}

pub fn video_items(responses: &[Value]) -> Result<Vec<VideoItem>> {
    parse_items(responses).context("Failed to parse video responses")
}

fn optional_time(value: &Option<String>) -> Result<Option<DateTime<Utc>>> {
    Ok(value.as_deref().map(parse_rfc3339).transpose()?)
}

/// Attributes of each video. Only live broadcasts carry start and end times.
pub fn video_attributes(items: &[VideoItem]) -> Result<Vec<VideoAttributes>> {
    items
        .iter()
        .map(|item| {
            let live = item.live_streaming_details.clone().unwrap_or_default();
            Ok(VideoAttributes {
                video_id: item.id.clone(),
                title: item.snippet.title.clone(),
                publish_datetime: parse_rfc3339(&item.snippet.published_at)
                    .with_context(|| format!("Invalid publishedAt for {}", item.id))?,
                duration: item.content_details.duration.clone(),
                category_id: item.snippet.category_id.clone(),
                live_broadcast: item.live_streaming_details.is_some(),
                scheduled_start_time: optional_time(&live.scheduled_start_time)?,
                scheduled_end_time: optional_time(&live.scheduled_end_time)?,
                actual_start_time: optional_time(&live.actual_start_time)?,
                actual_end_time: optional_time(&live.actual_end_time)?,
            })
        })
        .collect()
}

/// Counters of each video; `*_enabled` records whether the counter was present at all
pub fn video_stats(items: &[VideoItem]) -> Result<Vec<VideoStats>> {
    items
        .iter()
        .map(|item| {
            let stats = &item.statistics;
            Ok(VideoStats {
                video_id: item.id.clone(),
                view_count: parse_count(stats.view_count.as_deref(), "viewCount", &item.id)?,
                like_count: parse_count(stats.like_count.as_deref(), "likeCount", &item.id)?,
                likes_enabled: stats.like_count.is_some(),
                comment_count: parse_count(stats.comment_count.as_deref(), "commentCount", &item.id)?,
                comments_enabled: stats.comment_count.is_some(),
            })
        })
        .collect()
}
