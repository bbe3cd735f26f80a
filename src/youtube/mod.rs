//! YouTube Data API v3 collection
//!
//! [`DataApi`] is the transport seam: it fetches a single page of a resource.
//! Pagination, id batching and the response envelope are handled on top of it,
//! and the extraction functions in [`channels`] and [`videos`] flatten the raw
//! responses into session tables.

pub mod channels;
pub mod client;
pub mod collector;
pub mod models;
pub mod videos;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use holo_core::Timestamped;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

pub use client::YouTubeClient;
pub use collector::{ChannelData, Collector, MemberVideoData};

/// Resource kinds the pipeline requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Channels,
    PlaylistItems,
    Videos,
}

impl ResourceKind {
    /// Path segment under the API base URL
    pub fn endpoint(&self) -> &'static str {
        match self {
            ResourceKind::Channels => "channels",
            ResourceKind::PlaylistItems => "playlistItems",
            ResourceKind::Videos => "videos",
        }
    }

    /// Value of the `part` query parameter
    pub fn parts(&self) -> &'static str {
        match self {
            ResourceKind::Channels => "contentDetails,snippet,statistics",
            ResourceKind::PlaylistItems => "snippet",
            ResourceKind::Videos => "snippet,contentDetails,statistics,liveStreamingDetails",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.endpoint())
    }
}

impl FromStr for ResourceKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "channel" | "channels" => Ok(ResourceKind::Channels),
            "playlistitem" | "playlistitems" => Ok(ResourceKind::PlaylistItems),
            "video" | "videos" => Ok(ResourceKind::Videos),
            other => bail!("Resource type invalid or not supported: {}", other),
        }
    }
}

/// Read-only access to the YouTube Data API
#[async_trait]
pub trait DataApi: Send + Sync {
    /// Fetch one page of `kind` with the given query parameters.
    /// Returns `None` when the API answers 404.
    async fn fetch_page(&self, kind: ResourceKind, query: &[(&str, String)]) -> Result<Option<Value>>;

    /// Page size and id batch size
    fn max_results(&self) -> usize;

    /// Fetch every page of an uploads playlist. A 404 means an empty playlist and ends pagination.
    async fn request_playlist_items(&self, playlist_id: &str) -> Result<Timestamped<Value>> {
        let mut responses = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![
                ("part", ResourceKind::PlaylistItems.parts().to_string()),
                ("playlistId", playlist_id.to_string()),
                ("maxResults", self.max_results().to_string()),
            ];
            if let Some(token) = &page_token {
                query.push(("pageToken", token.clone()));
            }

            let Some(response) = self
                .fetch_page(ResourceKind::PlaylistItems, &query)
                .await
                .with_context(|| format!("Failed to request playlist items for {}", playlist_id))?
            else {
                debug!("Playlist {} not found, treating as empty", playlist_id);
                break;
            };

            page_token = response
                .get("nextPageToken")
                .and_then(Value::as_str)
                .map(str::to_string);
            responses.push(response);

            if page_token.is_none() {
                break;
            }
        }

        debug!("📄 Playlist {}: {} page(s)", playlist_id, responses.len());
        Ok(Timestamped::now(responses))
    }

    /// Fetch channels or videos by id, in batches of at most `max_results`
    async fn request_by_ids(&self, kind: ResourceKind, ids: &[String]) -> Result<Timestamped<Value>> {
        if kind == ResourceKind::PlaylistItems {
            bail!("Playlist items are requested by playlist id, not in id batches");
        }

        let mut responses = Vec::new();
        for batch in split_n_sized_batches(ids, self.max_results()) {
            let query = [
                ("part", kind.parts().to_string()),
                ("id", batch.join(",")),
                ("maxResults", self.max_results().to_string()),
            ];
            let response = self
                .fetch_page(kind, &query)
                .await
                .with_context(|| format!("Failed to request {} for {} id(s)", kind, batch.len()))?
                .with_context(|| format!("The API returned 404 for a {} batch", kind))?;
            responses.push(response);
        }

        debug!("📄 {}: {} id(s) in {} batch(es)", kind, ids.len(), responses.len());
        Ok(Timestamped::now(responses))
    }

    /// Request any resource kind. Playlist ids are paginated one by one, other ids are batched.
    async fn request_data(&self, kind: ResourceKind, ids: &[String]) -> Result<Timestamped<Value>> {
        match kind {
            ResourceKind::PlaylistItems => {
                let mut responses = Vec::new();
                for playlist_id in ids {
                    responses.extend(self.request_playlist_items(playlist_id).await?.data);
                }
                Ok(Timestamped::now(responses))
            }
            _ => self.request_by_ids(kind, ids).await,
        }
    }
}

/// Split `data` into consecutive batches of `batch_size`; the last batch holds the remainder
pub fn split_n_sized_batches<T: Clone>(data: &[T], batch_size: usize) -> Vec<Vec<T>> {
    data.chunks(batch_size.max(1)).map(<[T]>::to_vec).collect()
}

/// Deserialize the `items` of every response page
pub fn parse_items<T: DeserializeOwned>(responses: &[Value]) -> Result<Vec<T>> {
    let mut items = Vec::new();
    for response in responses {
        let page: models::ListResponse<T> = serde_json::from_value(response.clone())
            .context("Unexpected YouTube Data API response shape")?;
        items.extend(page.items);
    }
    Ok(items)
}

/// Parse a counter the API encodes as a decimal string
pub(crate) fn parse_count(value: Option<&str>, field: &str, id: &str) -> Result<Option<u64>> {
    value
        .map(|v| {
            v.parse::<u64>()
                .with_context(|| format!("Invalid {} for {}: {}", field, id, v))
        })
        .transpose()
}
