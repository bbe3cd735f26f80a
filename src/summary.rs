//! Summaries: per-channel video summaries, unit roll-ups, unit shares and the coalesced
//! video table of every member

use crate::roster::{Member, Roster};
use crate::session::{GroupedTable, Session};
use anyhow::{Context, Result};
use chrono::{DateTime, TimeDelta, Utc};
use holo_core::join::{index_by_video_id, validate_video_ids};
use holo_core::time::parse_iso8601_duration;
use holo_core::{
    column_key, ChannelStats, ChannelTitle, ContentTypesRecord, KeywordBanks, Selection, SummaryStats,
    TableColumns, Timestamped, VideoAttributes, VideoStats, VideoType, VideoTypeRecord,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{info, warn};

pub const CHANNEL_SUMMARY_TABLE: &str = "channel_video_summaries";
pub const UNIT_SUMMARY_TABLE: &str = "unit_summaries";
pub const UNIT_SHARE_TABLE: &str = "unit_shares";
pub const OVERALL_TABLE: &str = "overall_video_data";

/// Per-video tables of one member, as read back from a session
#[derive(Debug, Clone)]
pub struct MemberVideoTables {
    pub attributes: Timestamped<VideoAttributes>,
    pub stats: Timestamped<VideoStats>,
    pub video_types: Timestamped<VideoTypeRecord>,
    pub content_types: Timestamped<ContentTypesRecord>,
}

impl MemberVideoTables {
    /// Import all four tables. `None` when any of them is missing.
    pub fn import(session: &Session, member_name: &str) -> Result<Option<Self>> {
        let attributes = session.import_video_table(member_name, "video_attributes")?;
        let stats = session.import_video_table(member_name, "video_stats")?;
        let video_types = session.import_video_table(member_name, "video_types")?;
        let content_types = session.import_video_table(member_name, "content_types")?;

        match (attributes, stats, video_types, content_types) {
            (Some(attributes), Some(stats), Some(video_types), Some(content_types)) => Ok(Some(Self {
                attributes,
                stats,
                video_types,
                content_types,
            })),
            _ => Ok(None),
        }
    }

    /// Every derived table may only reference ids of the attributes table
    pub fn validate(&self) -> Result<()> {
        let known = self.known_ids();
        validate_video_ids("video_stats", &known, self.stats.data.iter().map(|r| r.video_id.as_str()))?;
        validate_video_ids(
            "video_types",
            &known,
            self.video_types.data.iter().map(|r| r.video_id.as_str()),
        )?;
        validate_video_ids(
            "content_types",
            &known,
            self.content_types.data.iter().map(|r| r.video_id.as_str()),
        )?;
        Ok(())
    }

    fn known_ids(&self) -> HashSet<&str> {
        self.attributes.data.iter().map(|v| v.video_id.as_str()).collect()
    }
}

/// Summary statistics of the numeric video columns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumericSummary {
    /// Nominal video duration in seconds
    pub duration: SummaryStats,
    pub view_count: SummaryStats,
    pub like_count: SummaryStats,
    pub comment_count: SummaryStats,
}

/// One video's numeric values after joining attributes, stats and type
struct VideoRow {
    duration: f64,
    view_count: Option<f64>,
    like_count: Option<f64>,
    comment_count: Option<f64>,
    video_type: Option<VideoType>,
}

impl NumericSummary {
    fn of<'a>(rows: impl Iterator<Item = &'a VideoRow> + Clone) -> Self {
        Self {
            duration: SummaryStats::of(rows.clone().map(|r| Some(r.duration))),
            view_count: SummaryStats::of(rows.clone().map(|r| r.view_count)),
            like_count: SummaryStats::of(rows.clone().map(|r| r.like_count)),
            comment_count: SummaryStats::of(rows.map(|r| r.comment_count)),
        }
    }
}

/// Channel-level summary of one member
#[derive(Debug, Clone)]
pub struct ChannelSummary {
    pub member_name: String,
    pub channel_id: String,
    pub channel_title: Option<String>,
    pub channel_stats: Option<ChannelStats>,
    pub type_counts: BTreeMap<VideoType, usize>,
    pub overall: NumericSummary,
    pub by_type: BTreeMap<VideoType, NumericSummary>,
    pub content_counts: BTreeMap<String, usize>,
}

impl ChannelSummary {
    /// Summarize one member's video tables. `content_categories` lists every counted category.
    pub fn from_tables(
        member: &Member,
        channel_title: Option<String>,
        channel_stats: Option<ChannelStats>,
        tables: Option<&MemberVideoTables>,
        content_categories: &[String],
    ) -> Result<Self> {
        let mut type_counts: BTreeMap<VideoType, usize> = VideoType::ALL.iter().map(|t| (*t, 0)).collect();
        let mut content_counts: BTreeMap<String, usize> =
            content_categories.iter().map(|c| (c.clone(), 0)).collect();
        let mut rows = Vec::new();

        if let Some(tables) = tables {
            tables
                .validate()
                .with_context(|| format!("Inconsistent video tables for {}", member.name))?;

            let stats = index_by_video_id(&tables.stats.data, |r| r.video_id.as_str());
            let types = index_by_video_id(&tables.video_types.data, |r| r.video_id.as_str());

            for video in &tables.attributes.data {
                let duration = parse_iso8601_duration(&video.duration)
                    .with_context(|| format!("Invalid duration for {}", video.video_id))?;
                let stat = stats.get(video.video_id.as_str());
                let video_type = types.get(video.video_id.as_str()).and_then(|t| t.video_type);

                rows.push(VideoRow {
                    duration: duration.num_seconds() as f64,
                    view_count: stat.and_then(|s| s.view_count).map(|v| v as f64),
                    like_count: stat.and_then(|s| s.like_count).map(|v| v as f64),
                    comment_count: stat.and_then(|s| s.comment_count).map(|v| v as f64),
                    video_type,
                });
            }

            for record in &tables.video_types.data {
                if let Some(video_type) = record.video_type {
                    *type_counts.entry(video_type).or_default() += 1;
                }
            }

            for record in &tables.content_types.data {
                for tag in &record.content_types {
                    *content_counts.entry(tag.clone()).or_default() += 1;
                }
            }
        }

        let overall = NumericSummary::of(rows.iter());
        let by_type = VideoType::ALL
            .iter()
            .map(|t| (*t, NumericSummary::of(rows.iter().filter(move |r| r.video_type == Some(*t)))))
            .collect();

        Ok(Self {
            member_name: member.name.clone(),
            channel_id: member.youtube_channel_id.clone(),
            channel_title,
            channel_stats,
            type_counts,
            overall,
            by_type,
            content_counts,
        })
    }

    /// Total nominal duration of every video
    pub fn total_duration(&self) -> TimeDelta {
        TimeDelta::seconds(self.overall.duration.sum as i64)
    }
}

/// Build the two-row-header channel summary table
pub fn channel_summary_table(
    summaries: &[ChannelSummary],
    content_categories: &[String],
    per_type: bool,
) -> GroupedTable {
    let mut columns: Vec<(String, String)> = Vec::new();
    let mut push = |group: &str, name: String| columns.push((group.to_string(), name));

    for name in ["member_name", "channel_id", "channel_title", "subscriber_count", "video_count", "view_count"] {
        push("member_data", name.to_string());
    }
    for video_type in VideoType::ALL {
        push("video_types", format!("{}_(count)", video_type.key()));
    }
    for (label, _) in SummaryStats::default().labelled("video_duration") {
        push("video_attributes", label);
    }
    if per_type {
        for video_type in VideoType::ALL {
            for (label, _) in SummaryStats::default().labelled(&format!("{}_duration", video_type.key())) {
                push("video_attributes", label);
            }
        }
    }
    for prefix in numeric_stat_prefixes(per_type) {
        for (label, _) in SummaryStats::default().labelled(&prefix) {
            push("video_stats", label);
        }
    }
    for category in content_categories {
        push("content_types", format!("{}_(count)", column_key(category)));
    }

    let rows = summaries
        .iter()
        .map(|summary| channel_summary_row(summary, content_categories, per_type))
        .collect();

    GroupedTable { columns, rows }
}

fn numeric_stat_prefixes(per_type: bool) -> Vec<String> {
    let stats = ["view_count", "like_count", "comment_count"];
    let mut prefixes: Vec<String> = stats.iter().map(|s| s.to_string()).collect();
    if per_type {
        for video_type in VideoType::ALL {
            prefixes.extend(stats.iter().map(|s| format!("{}_{}", video_type.key(), s)));
        }
    }
    prefixes
}

fn channel_summary_row(summary: &ChannelSummary, content_categories: &[String], per_type: bool) -> Vec<String> {
    let stats = summary.channel_stats.as_ref();
    let mut row = vec![
        summary.member_name.clone(),
        summary.channel_id.clone(),
        summary.channel_title.clone().unwrap_or_default(),
        optional_cell(stats.map(|s| s.subscriber_count)),
        optional_cell(stats.map(|s| s.video_count)),
        optional_cell(stats.map(|s| s.view_count)),
    ];

    row.extend(VideoType::ALL.iter().map(|t| summary.type_counts[t].to_string()));

    let empty = NumericSummary::default();
    let of_type = |t: &VideoType| summary.by_type.get(t).unwrap_or(&empty);

    row.extend(stat_cells(&summary.overall.duration));
    if per_type {
        for video_type in VideoType::ALL.iter() {
            row.extend(stat_cells(&of_type(video_type).duration));
        }
    }

    let numeric = |s: &NumericSummary| [s.view_count, s.like_count, s.comment_count];
    for stats in numeric(&summary.overall) {
        row.extend(stat_cells(&stats));
    }
    if per_type {
        for video_type in VideoType::ALL.iter() {
            for stats in numeric(of_type(video_type)) {
                row.extend(stat_cells(&stats));
            }
        }
    }

    row.extend(
        content_categories
            .iter()
            .map(|c| summary.content_counts.get(c).copied().unwrap_or(0).to_string()),
    );
    row
}

fn stat_cells(stats: &SummaryStats) -> Vec<String> {
    stats.values().iter().map(|v| number_cell(*v)).collect()
}

fn number_cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn optional_cell(value: Option<u64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Channel figures summed over the members of one unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSummary {
    pub group: String,
    pub branch: String,
    pub unit: String,
    pub member_count: usize,
    pub subscriber_count: u64,
    pub video_count: u64,
    pub view_count: u64,
    #[serde(rename = "normal_(count)")]
    pub normal_count: usize,
    #[serde(rename = "short_(count)")]
    pub short_count: usize,
    #[serde(rename = "live_stream_(count)")]
    pub live_stream_count: usize,
    #[serde(rename = "premiere_(count)")]
    pub premiere_count: usize,
    /// Total nominal video duration in seconds
    #[serde(rename = "video_duration_(sum)")]
    pub video_duration: f64,
}

impl TableColumns for UnitSummary {
    const COLUMNS: &'static [&'static str] = &[
        "group",
        "branch",
        "unit",
        "member_count",
        "subscriber_count",
        "video_count",
        "view_count",
        "normal_(count)",
        "short_(count)",
        "live_stream_(count)",
        "premiere_(count)",
        "video_duration_(sum)",
    ];
}

/// Roll channel summaries up to the roster's units, in roster order.
/// Only summarized members are counted, so a member selection narrows every column alike;
/// units with no summarized member are left out.
pub fn summarize_units(roster: &Roster, summaries: &[ChannelSummary]) -> Vec<UnitSummary> {
    let by_member: BTreeMap<&str, &ChannelSummary> =
        summaries.iter().map(|s| (s.member_name.as_str(), s)).collect();

    roster
        .units()
        .into_iter()
        .filter_map(|unit| {
            let channels: Vec<&ChannelSummary> = roster
                .members_of(&unit)
                .into_iter()
                .filter_map(|member| by_member.get(member.name.as_str()).copied())
                .collect();
            if channels.is_empty() {
                return None;
            }

            let mut summary = UnitSummary {
                member_count: channels.len(),
                subscriber_count: 0,
                video_count: 0,
                view_count: 0,
                normal_count: 0,
                short_count: 0,
                live_stream_count: 0,
                premiere_count: 0,
                video_duration: 0.0,
                group: unit.group,
                branch: unit.branch,
                unit: unit.unit,
            };

            for channel in channels {
                if let Some(stats) = &channel.channel_stats {
                    summary.subscriber_count += stats.subscriber_count;
                    summary.video_count += stats.video_count;
                    summary.view_count += stats.view_count;
                }
                summary.normal_count += channel.type_counts[&VideoType::Normal];
                summary.short_count += channel.type_counts[&VideoType::Short];
                summary.live_stream_count += channel.type_counts[&VideoType::LiveStream];
                summary.premiere_count += channel.type_counts[&VideoType::Premiere];
                summary.video_duration += channel.overall.duration.sum;
            }

            Some(summary)
        })
        .collect()
}

/// Percentage of a branch's subscribers, videos and views held by each unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitShare {
    pub group: String,
    pub branch: String,
    pub unit: String,
    pub subscriber_share: f64,
    pub video_share: f64,
    pub view_share: f64,
}

impl TableColumns for UnitShare {
    const COLUMNS: &'static [&'static str] =
        &["group", "branch", "unit", "subscriber_share", "video_share", "view_share"];
}

pub fn unit_shares(units: &[UnitSummary]) -> Vec<UnitShare> {
    let mut totals: BTreeMap<(&str, &str), (u64, u64, u64)> = BTreeMap::new();
    for unit in units {
        let total = totals
            .entry((unit.group.as_str(), unit.branch.as_str()))
            .or_default();
        total.0 += unit.subscriber_count;
        total.1 += unit.video_count;
        total.2 += unit.view_count;
    }

    let percent = |part: u64, whole: u64| {
        if whole == 0 {
            0.0
        } else {
            part as f64 * 100.0 / whole as f64
        }
    };

    units
        .iter()
        .map(|unit| {
            let (subscribers, videos, views) = totals
                .get(&(unit.group.as_str(), unit.branch.as_str()))
                .copied()
                .unwrap_or_default();
            UnitShare {
                group: unit.group.clone(),
                branch: unit.branch.clone(),
                unit: unit.unit.clone(),
                subscriber_share: percent(unit.subscriber_count, subscribers),
                video_share: percent(unit.video_count, videos),
                view_share: percent(unit.view_count, views),
            }
        })
        .collect()
}

/// One video of the coalesced table: attributes, stats and type joined on `video_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallVideoRecord {
    pub member_name: String,
    pub video_id: String,
    pub title: String,
    pub publish_datetime: DateTime<Utc>,
    pub duration: String,
    pub category_id: String,
    pub live_broadcast: bool,
    pub actual_start_time: Option<DateTime<Utc>>,
    pub actual_end_time: Option<DateTime<Utc>>,
    pub view_count: Option<u64>,
    pub like_count: Option<u64>,
    pub comment_count: Option<u64>,
    #[serde(with = "holo_core::time::hms_option", default)]
    pub live_broadcast_duration: Option<TimeDelta>,
    pub video_type: Option<VideoType>,
}

impl TableColumns for OverallVideoRecord {
    const COLUMNS: &'static [&'static str] = &[
        "member_name",
        "video_id",
        "title",
        "publish_datetime",
        "duration",
        "category_id",
        "live_broadcast",
        "actual_start_time",
        "actual_end_time",
        "view_count",
        "like_count",
        "comment_count",
        "live_broadcast_duration",
        "video_type",
    ];
}

/// Inner-join attributes, stats and types of one member.
/// Rows missing from stats or types are dropped; ids unknown to the attributes are an error.
pub fn coalesce_member(member_name: &str, tables: &MemberVideoTables) -> Result<Vec<OverallVideoRecord>> {
    tables
        .validate()
        .with_context(|| format!("Cannot coalesce video tables for {}", member_name))?;

    let stats = index_by_video_id(&tables.stats.data, |r| r.video_id.as_str());
    let types = index_by_video_id(&tables.video_types.data, |r| r.video_id.as_str());

    Ok(tables
        .attributes
        .data
        .iter()
        .filter_map(|video| {
            let stat = stats.get(video.video_id.as_str())?;
            let video_type = types.get(video.video_id.as_str())?;
            Some(OverallVideoRecord {
                member_name: member_name.to_string(),
                video_id: video.video_id.clone(),
                title: video.title.clone(),
                publish_datetime: video.publish_datetime,
                duration: video.duration.clone(),
                category_id: video.category_id.clone(),
                live_broadcast: video.live_broadcast,
                actual_start_time: video.actual_start_time,
                actual_end_time: video.actual_end_time,
                view_count: stat.view_count,
                like_count: stat.like_count,
                comment_count: stat.comment_count,
                live_broadcast_duration: video_type.live_broadcast_duration,
                video_type: video_type.video_type,
            })
        })
        .collect())
}

/// Everything one summarize run produced
#[derive(Debug, Clone)]
pub struct SummaryReport {
    pub channels: Vec<ChannelSummary>,
    pub channel_table: GroupedTable,
    pub units: Vec<UnitSummary>,
    pub shares: Vec<UnitShare>,
    pub overall: Timestamped<OverallVideoRecord>,
}

/// Reads prepared tables from a session and writes the summary tables back
pub struct Summarizer<'a> {
    session: &'a Session,
    roster: &'a Roster,
    content_categories: Vec<String>,
    per_type: bool,
}

impl<'a> Summarizer<'a> {
    pub fn new(session: &'a Session, roster: &'a Roster, banks: &KeywordBanks) -> Self {
        Self {
            session,
            roster,
            content_categories: banks.combined().categories().map(str::to_string).collect(),
            per_type: true,
        }
    }

    /// Whether duration and counter statistics are repeated per video type
    pub fn with_type_breakdown(mut self, enable: bool) -> Self {
        self.per_type = enable;
        self
    }

    pub fn content_categories(&self) -> &[String] {
        &self.content_categories
    }

    /// Summaries of every selected member, plus each member's imported tables
    pub fn summarize_channels(
        &self,
        selection: &Selection,
    ) -> Result<(Vec<ChannelSummary>, BTreeMap<String, MemberVideoTables>)> {
        let titles: Vec<ChannelTitle> = self
            .session
            .import_channel_table("channel_titles")?
            .map(|t| t.data)
            .unwrap_or_default();
        let stats: Vec<ChannelStats> = match self.session.import_channel_table("channel_stats")? {
            Some(table) => table.data,
            None => {
                warn!("⚠️ No channel_stats table in {}", self.session.name());
                Vec::new()
            }
        };

        let mut summaries = Vec::new();
        let mut member_tables = BTreeMap::new();

        for member in self.roster.select(selection)? {
            let tables = MemberVideoTables::import(self.session, &member.name)?;
            if tables.is_none() {
                warn!("⚠️ Missing prepared video tables for {}", member.name);
            }

            let title = titles
                .iter()
                .find(|t| t.channel_id == member.youtube_channel_id)
                .map(|t| t.channel_title.clone());
            let channel_stats = stats
                .iter()
                .find(|s| s.channel_id == member.youtube_channel_id)
                .cloned();

            summaries.push(ChannelSummary::from_tables(
                member,
                title,
                channel_stats,
                tables.as_ref(),
                &self.content_categories,
            )?);

            if let Some(tables) = tables {
                member_tables.insert(member.name.clone(), tables);
            }
        }

        Ok((summaries, member_tables))
    }

    /// Coalesce the members' tables in roster order
    pub fn coalesce(&self, member_tables: &BTreeMap<String, MemberVideoTables>) -> Result<Timestamped<OverallVideoRecord>> {
        let mut records = Vec::new();
        for member in self.roster.members() {
            if let Some(tables) = member_tables.get(&member.name) {
                records.extend(coalesce_member(&member.name, tables)?);
            }
        }
        Ok(Timestamped::now(records))
    }

    /// Summarize, roll up, coalesce and export every summary table
    pub fn run(&self, selection: &Selection) -> Result<SummaryReport> {
        info!("📊 Summarizing session {}", self.session.name());

        let (channels, member_tables) = self.summarize_channels(selection)?;
        let channel_table = channel_summary_table(&channels, &self.content_categories, self.per_type);
        let units = summarize_units(self.roster, &channels);
        let shares = unit_shares(&units);
        let overall = self.coalesce(&member_tables)?;

        let stamped_units = Timestamped::at(units.clone(), overall.collected_at);
        let stamped_shares = Timestamped::at(shares.clone(), overall.collected_at);

        self.session
            .export_grouped_table(CHANNEL_SUMMARY_TABLE, &channel_table, overall.collected_at)?;
        self.session.export_channel_table(UNIT_SUMMARY_TABLE, &stamped_units)?;
        self.session.export_channel_table(UNIT_SHARE_TABLE, &stamped_shares)?;
        self.session.export_channel_table(OVERALL_TABLE, &overall)?;

        info!(
            "✅ Summarized {} channel(s), {} unit(s), {} video(s)",
            channels.len(),
            units.len(),
            overall.len()
        );

        Ok(SummaryReport {
            channels,
            channel_table,
            units,
            shares,
            overall,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionStore;
    use holo_core::KeywordBank;
    use holo_core::Language;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn member(name: &str, channel_id: &str, unit: &str) -> Member {
        Member {
            name: name.to_string(),
            youtube_channel_id: channel_id.to_string(),
            group: "Hololive".to_string(),
            branch: "English".to_string(),
            unit: unit.to_string(),
        }
    }

    fn roster() -> Roster {
        Roster::new(vec![
            member("Gawr Gura", "UCgura", "Myth"),
            member("Mori Calliope", "UCcalli", "Myth"),
            member("Ouro Kronii", "UCkronii", "Promise"),
        ])
    }

    fn video(id: &str, duration: &str) -> VideoAttributes {
        VideoAttributes {
            video_id: id.to_string(),
            title: id.to_string(),
            publish_datetime: "2024-01-01T00:00:00Z".parse().unwrap(),
            duration: duration.to_string(),
            category_id: "20".to_string(),
            live_broadcast: false,
            scheduled_start_time: None,
            scheduled_end_time: None,
            actual_start_time: None,
            actual_end_time: None,
        }
    }

    fn stats(id: &str, views: Option<u64>) -> VideoStats {
        VideoStats {
            video_id: id.to_string(),
            view_count: views,
            like_count: None,
            likes_enabled: false,
            comment_count: Some(1),
            comments_enabled: true,
        }
    }

    fn typed(id: &str, video_type: Option<VideoType>) -> VideoTypeRecord {
        VideoTypeRecord {
            video_id: id.to_string(),
            live_broadcast_duration: None,
            video_type,
        }
    }

    fn tagged(id: &str, tags: &[&str]) -> ContentTypesRecord {
        ContentTypesRecord {
            video_id: id.to_string(),
            content_types: tags.iter().map(|t| t.to_string()).collect::<BTreeSet<_>>(),
        }
    }

    fn gura_tables() -> MemberVideoTables {
        MemberVideoTables {
            attributes: Timestamped::now(vec![video("a", "PT1M40S"), video("b", "PT30S"), video("c", "PT1H")]),
            stats: Timestamped::now(vec![stats("a", Some(100)), stats("b", Some(300)), stats("c", None)]),
            video_types: Timestamped::now(vec![
                typed("a", Some(VideoType::Normal)),
                typed("b", Some(VideoType::Short)),
                typed("c", None),
            ]),
            content_types: Timestamped::now(vec![tagged("a", &["Music Video"]), tagged("c", &["Karaoke", "Music Video"])]),
        }
    }

    fn categories() -> Vec<String> {
        vec!["Karaoke".to_string(), "Music Video".to_string(), "Gaming".to_string()]
    }

    fn channel_stats(id: &str, subscribers: u64, videos: u64, views: u64) -> ChannelStats {
        ChannelStats {
            channel_id: id.to_string(),
            subscriber_count: subscribers,
            video_count: videos,
            view_count: views,
        }
    }

    #[test]
    fn test_channel_summary_counts_and_stats() {
        let roster = roster();
        let summary = ChannelSummary::from_tables(
            &roster.members()[0],
            Some("Gura Ch.".to_string()),
            Some(channel_stats("UCgura", 4_000_000, 3, 400)),
            Some(&gura_tables()),
            &categories(),
        )
        .unwrap();

        assert_eq!(summary.type_counts[&VideoType::Normal], 1);
        assert_eq!(summary.type_counts[&VideoType::Premiere], 0);
        assert_eq!(summary.overall.duration.sum, 3730.0);
        assert_eq!(summary.overall.view_count.sum, 400.0);
        assert_eq!(summary.overall.view_count.mean, Some(200.0));
        assert_eq!(summary.overall.like_count.mean, None);
        assert_eq!(summary.by_type[&VideoType::Short].duration.max, Some(30.0));
        assert_eq!(summary.by_type[&VideoType::Premiere].view_count.sum, 0.0);
        assert_eq!(summary.content_counts["Music Video"], 2);
        assert_eq!(summary.content_counts["Gaming"], 0);
        assert_eq!(summary.total_duration(), TimeDelta::seconds(3730));
    }

    #[test]
    fn test_channel_summary_rejects_unmatched_ids() {
        let mut tables = gura_tables();
        tables.stats.data.push(stats("zzz", Some(1)));

        let error = ChannelSummary::from_tables(&roster().members()[0], None, None, Some(&tables), &categories())
            .unwrap_err();
        assert!(format!("{:#}", error).contains("zzz"));
    }

    #[test]
    fn test_channel_summary_table_layout() {
        let roster = roster();
        let summary =
            ChannelSummary::from_tables(&roster.members()[1], None, None, None, &categories()).unwrap();

        let table = channel_summary_table(&[summary], &categories(), false);
        assert_eq!(table.columns[0], ("member_data".to_string(), "member_name".to_string()));
        assert_eq!(table.column("premiere_(count)"), Some(vec!["0"]));
        assert_eq!(table.column("video_duration_(sum)"), Some(vec!["0"]));
        assert_eq!(table.column("video_duration_(mean)"), Some(vec![""]));
        assert_eq!(table.column("music_video_(count)"), Some(vec!["0"]));
        assert!(table.column_index("short_view_count_(mean)").is_none());
        assert_eq!(table.rows[0].len(), table.columns.len());

        let with_types = channel_summary_table(&[], &categories(), true);
        assert!(with_types.column_index("live_stream_duration_(mean)").is_some());
        assert!(with_types.column_index("short_view_count_(max)").is_some());
        assert_eq!(
            with_types.columns.iter().filter(|(g, _)| g == "video_stats").count(),
            3 * 8 * 5
        );
    }

    #[test]
    fn test_units_and_shares() {
        let roster = roster();
        let members = roster.members();
        let summaries = vec![
            ChannelSummary::from_tables(
                &members[0],
                None,
                Some(channel_stats("UCgura", 300, 10, 1000)),
                Some(&gura_tables()),
                &categories(),
            )
            .unwrap(),
            ChannelSummary::from_tables(&members[1], None, Some(channel_stats("UCcalli", 100, 30, 0)), None, &categories())
                .unwrap(),
            ChannelSummary::from_tables(&members[2], None, Some(channel_stats("UCkronii", 100, 10, 0)), None, &categories())
                .unwrap(),
        ];

        let units = summarize_units(&roster, &summaries);
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].unit, "Myth");
        assert_eq!(units[0].member_count, 2);
        assert_eq!(units[0].subscriber_count, 400);
        assert_eq!(units[0].short_count, 1);
        assert_eq!(units[0].video_duration, 3730.0);

        let shares = unit_shares(&units);
        assert_eq!(shares[0].subscriber_share, 80.0);
        assert_eq!(shares[1].video_share, 20.0);
        assert_eq!(shares[1].view_share, 0.0);
    }

    #[test]
    fn test_units_count_only_summarized_members() {
        let roster = roster();
        let gura = ChannelSummary::from_tables(
            &roster.members()[0],
            None,
            Some(channel_stats("UCgura", 300, 10, 1000)),
            Some(&gura_tables()),
            &categories(),
        )
        .unwrap();

        let units = summarize_units(&roster, &[gura]);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].unit, "Myth");
        assert_eq!(units[0].member_count, 1);
        assert_eq!(units[0].subscriber_count, 300);
    }

    #[test]
    fn test_summary_columns_match_serialized_header() {
        fn header_of<T: Serialize + TableColumns>(row: &T) -> Vec<String> {
            let mut writer = csv::Writer::from_writer(Vec::new());
            writer.serialize(row).unwrap();
            let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
            text.lines().next().unwrap().split(',').map(str::to_string).collect()
        }

        let roster = roster();
        let summaries = vec![ChannelSummary::from_tables(
            &roster.members()[0],
            None,
            Some(channel_stats("UCgura", 300, 10, 1000)),
            Some(&gura_tables()),
            &categories(),
        )
        .unwrap()];
        let units = summarize_units(&roster, &summaries);
        let shares = unit_shares(&units);
        let overall = coalesce_member("Gawr Gura", &gura_tables()).unwrap();

        assert_eq!(header_of(&units[0]), UnitSummary::COLUMNS);
        assert_eq!(header_of(&shares[0]), UnitShare::COLUMNS);
        assert_eq!(header_of(&overall[0]), OverallVideoRecord::COLUMNS);
    }

    #[test]
    fn test_empty_summary_tables_keep_headers() {
        let temp_dir = TempDir::new().unwrap();
        let session = SessionStore::new(temp_dir.path()).create_session().unwrap();
        let roster = roster();

        let report = Summarizer::new(&session, &roster, &KeywordBanks::new())
            .run(&Selection::from("Ouro Kronii"))
            .unwrap();
        assert!(report.overall.is_empty());

        let overall_file = std::fs::read_dir(session.channel_dir())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .find(|path| path.to_string_lossy().ends_with("overall_video_data.csv"))
            .unwrap();
        let header = std::fs::read_to_string(overall_file).unwrap();
        assert_eq!(header.trim_end(), OverallVideoRecord::COLUMNS.join(","));

        let overall: Timestamped<OverallVideoRecord> =
            session.import_channel_table(OVERALL_TABLE).unwrap().unwrap();
        assert!(overall.is_empty());
    }

    #[test]
    fn test_coalesce_is_an_inner_join() {
        let mut tables = gura_tables();
        tables.video_types.data.pop();

        let records = coalesce_member("Gawr Gura", &tables).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].member_name, "Gawr Gura");
        assert_eq!(records[1].video_type, Some(VideoType::Short));
        assert_eq!(records[1].view_count, Some(300));
    }

    #[test]
    fn test_run_exports_summary_tables() {
        let temp_dir = TempDir::new().unwrap();
        let session = SessionStore::new(temp_dir.path()).create_session().unwrap();
        let roster = roster();

        let tables = gura_tables();
        session.export_video_table("Gawr Gura", "video_attributes", &tables.attributes).unwrap();
        session.export_video_table("Gawr Gura", "video_stats", &tables.stats).unwrap();
        session.export_video_table("Gawr Gura", "video_types", &tables.video_types).unwrap();
        session.export_video_table("Gawr Gura", "content_types", &tables.content_types).unwrap();
        session
            .export_channel_table("channel_stats", &Timestamped::now(vec![channel_stats("UCgura", 10, 3, 400)]))
            .unwrap();

        let mut bank = KeywordBank::new();
        bank.insert("Karaoke", ["Karaoke"]);
        bank.insert("Music Video", ["Official"]);
        let mut banks = KeywordBanks::new();
        banks.insert(Language::English, bank);

        let summarizer = Summarizer::new(&session, &roster, &banks);
        let report = summarizer.run(&Selection::All).unwrap();
        assert_eq!(report.channels.len(), 3);
        assert_eq!(report.overall.len(), 3);

        let table = session.import_grouped_table(CHANNEL_SUMMARY_TABLE).unwrap().unwrap();
        let table = &table.data[0];
        assert_eq!(table.column("member_name").unwrap(), vec!["Gawr Gura", "Mori Calliope", "Ouro Kronii"]);
        assert_eq!(table.column("karaoke_(count)").unwrap(), vec!["1", "0", "0"]);
        assert_eq!(table.column("subscriber_count").unwrap(), vec!["10", "", ""]);

        let units: Timestamped<UnitSummary> = session.import_channel_table(UNIT_SUMMARY_TABLE).unwrap().unwrap();
        assert_eq!(units.data, report.units);

        let overall: Timestamped<OverallVideoRecord> = session.import_channel_table(OVERALL_TABLE).unwrap().unwrap();
        assert_eq!(overall.data, report.overall.data);
    }
}
