use super::channels::ChannelTables;
use super::videos::{video_attributes, video_ids, video_items, video_stats};
use super::{DataApi, ResourceKind};
use crate::roster::Roster;
use crate::session::Session;
use anyhow::{Context, Result};
use holo_core::{PlaylistVideo, Timestamped, UploadsPlaylist, VideoAttributes, VideoStats};
use std::collections::BTreeMap;
use tracing::{info, warn};

pub type ChannelData = ChannelTables;

/// Collected video tables of one member
#[derive(Debug, Clone)]
pub struct MemberVideoData {
    pub video_ids: Timestamped<PlaylistVideo>,
    pub attributes: Timestamped<VideoAttributes>,
    pub stats: Timestamped<VideoStats>,
}

/// Requests channel and video data and exports every table into a session
pub struct Collector<'a, A: DataApi> {
    api: &'a A,
    session: &'a Session,
}

impl<'a, A: DataApi> Collector<'a, A> {
    pub fn new(api: &'a A, session: &'a Session) -> Self {
        Self { api, session }
    }

    /// Collect channel titles, stats, thumbnails and uploads playlists for `channel_ids`
    pub async fn collect_channel_data(&self, channel_ids: &[String]) -> Result<ChannelData> {
        info!("📡 Requesting channel data for {} channel(s)", channel_ids.len());

        let responses = self
            .api
            .request_data(ResourceKind::Channels, channel_ids)
            .await
            .context("Channel data request failed")?;
        let tables = ChannelTables::from_responses(&responses)?;

        self.session.export_channel_table("channel_titles", &tables.titles)?;
        self.session.export_channel_table("channel_stats", &tables.stats)?;
        self.session
            .export_channel_table("channel_thumbnail_urls", &tables.thumbnail_urls)?;
        self.session
            .export_channel_table("uploads_playlist_ids", &tables.uploads_playlists)?;

        if tables.titles.len() < channel_ids.len() {
            warn!(
                "⚠️ API returned {} of {} requested channels",
                tables.titles.len(),
                channel_ids.len()
            );
        }

        Ok(tables)
    }

    /// Collect video ids, attributes and stats for one member's uploads playlist.
    /// Returns `None` when the playlist has no public videos.
    pub async fn collect_member_videos(
        &self,
        member_name: &str,
        playlist_id: &str,
    ) -> Result<Option<MemberVideoData>> {
        let responses = self
            .api
            .request_playlist_items(playlist_id)
            .await
            .with_context(|| format!("Playlist request failed for {}", member_name))?;

        let Some(ids) = video_ids(&responses)? else {
            info!("📭 {} has no videos available in this playlist", member_name);
            return Ok(None);
        };
        self.session
            .export_video_table(member_name, "uploads_video_ids", &ids)?;

        let id_list: Vec<String> = ids.data.iter().map(|v| v.video_id.clone()).collect();
        let responses = self
            .api
            .request_data(ResourceKind::Videos, &id_list)
            .await
            .with_context(|| format!("Video request failed for {}", member_name))?;
        let items = video_items(&responses.data)?;

        let attributes = Timestamped::at(video_attributes(&items)?, responses.collected_at);
        let stats = Timestamped::at(video_stats(&items)?, responses.collected_at);

        self.session
            .export_video_table(member_name, "video_attributes", &attributes)?;
        self.session
            .export_video_table(member_name, "video_stats", &stats)?;

        info!(
            "🎬 {}: {} videos collected",
            member_name,
            attributes.len()
        );

        Ok(Some(MemberVideoData {
            video_ids: ids,
            attributes,
            stats,
        }))
    }

    /// Collect video data for every roster member with a known uploads playlist.
    /// Members with empty playlists are left out of the result.
    pub async fn collect_video_data(
        &self,
        roster: &Roster,
        uploads: &[UploadsPlaylist],
    ) -> Result<BTreeMap<String, MemberVideoData>> {
        let mut collected = BTreeMap::new();

        for member in roster.members() {
            let Some(playlist) = uploads
                .iter()
                .find(|p| p.channel_id == member.youtube_channel_id)
            else {
                warn!("⚠️ No uploads playlist for {}, skipping", member.name);
                continue;
            };

            if let Some(data) = self
                .collect_member_videos(&member.name, &playlist.uploads_playlist_id)
                .await?
            {
                collected.insert(member.name.clone(), data);
            }
        }

        info!("✅ Collected video data for {} member(s)", collected.len());
        Ok(collected)
    }

    /// Full collection run for a roster: channel data, then every member's videos
    pub async fn collect_all(
        &self,
        roster: &Roster,
    ) -> Result<(ChannelData, BTreeMap<String, MemberVideoData>)> {
        let channel_data = self.collect_channel_data(&roster.channel_ids()).await?;
        let video_data = self
            .collect_video_data(roster, &channel_data.uploads_playlists.data)
            .await?;
        Ok((channel_data, video_data))
    }
}
