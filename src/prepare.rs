//! Preparation stage: title keywords, video types and content tags per member

use crate::probe::ShortsProbe;
use crate::roster::Roster;
use crate::session::Session;
use anyhow::{Context, Result};
use holo_core::join::validate_video_ids;
use holo_core::video_types::classify_attributes;
use holo_core::{
    ClassificationThresholds, ContentTypeClassifier, ContentTypesRecord, KeywordBanks, Selection,
    TitleKeywordExtractor, TitleKeywordsRecord, Timestamped, VideoAttributes, VideoType,
    VideoTypeRecord, Verdict,
};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, warn};

/// Derived tables of one member
#[derive(Debug, Clone)]
pub struct PreparedMember {
    pub title_keywords: Timestamped<TitleKeywordsRecord>,
    pub video_types: Timestamped<VideoTypeRecord>,
    pub content_types: Timestamped<ContentTypesRecord>,
}

pub struct Preparer<'a, P: ShortsProbe> {
    session: &'a Session,
    probe: &'a P,
    extractor: TitleKeywordExtractor,
    classifier: ContentTypeClassifier,
    thresholds: ClassificationThresholds,
}

impl<'a, P: ShortsProbe> Preparer<'a, P> {
    /// Fails when no bank has keywords for any supported language
    pub fn new(
        session: &'a Session,
        banks: &KeywordBanks,
        thresholds: ClassificationThresholds,
        probe: &'a P,
    ) -> Result<Self> {
        let extractor = TitleKeywordExtractor::new(banks).context("Cannot extract title keywords")?;
        let classifier = ContentTypeClassifier::new(&banks.combined());

        Ok(Self {
            session,
            probe,
            extractor,
            classifier,
            thresholds,
        })
    }

    pub fn title_keywords(&self, attributes: &Timestamped<VideoAttributes>) -> Timestamped<TitleKeywordsRecord> {
        let records = attributes
            .data
            .iter()
            .map(|video| TitleKeywordsRecord {
                video_id: video.video_id.clone(),
                title: video.title.clone(),
                title_keywords: self.extractor.extract(&video.title),
            })
            .collect();
        Timestamped::now(records)
    }

    /// Classify every video. Only short non-live uploads hit the Shorts probe.
    pub async fn video_types(&self, attributes: &Timestamped<VideoAttributes>) -> Result<Timestamped<VideoTypeRecord>> {
        let mut records = Vec::with_capacity(attributes.len());
        let mut probed = 0;

        for video in &attributes.data {
            let verdict = classify_attributes(video, &self.thresholds)
                .with_context(|| format!("Cannot classify {}", video.video_id))?;

            let video_type = match verdict {
                Verdict::Classified(video_type) => Some(video_type),
                Verdict::ProbeRequired => {
                    probed += 1;
                    let status = self.probe.probe(&video.video_id).await?;
                    if status.video_type().is_none() {
                        warn!("⚠️ Shorts probe inconclusive for {}: {:?}", video.video_id, status);
                    }
                    status.video_type()
                }
            };

            records.push(VideoTypeRecord {
                video_id: video.video_id.clone(),
                live_broadcast_duration: video.live_broadcast_duration(),
                video_type,
            });
        }

        debug!("🔎 Probed {} of {} videos", probed, attributes.len());
        Ok(Timestamped::now(records))
    }

    /// Tag each video with every content category its keywords trigger
    pub fn content_types(
        &self,
        attributes: &Timestamped<VideoAttributes>,
        title_keywords: &Timestamped<TitleKeywordsRecord>,
    ) -> Result<Timestamped<ContentTypesRecord>> {
        let known: HashSet<&str> = attributes.data.iter().map(|v| v.video_id.as_str()).collect();
        validate_video_ids(
            "video_title_keywords",
            &known,
            title_keywords.data.iter().map(|r| r.video_id.as_str()),
        )?;

        let records = title_keywords
            .data
            .iter()
            .map(|record| ContentTypesRecord {
                video_id: record.video_id.clone(),
                content_types: self.classifier.classify(&record.title_keywords),
            })
            .collect();
        Ok(Timestamped::now(records))
    }

    /// Prepare and export one member's tables. `None` when the member has no attributes table.
    pub async fn prepare_member(&self, member_name: &str) -> Result<Option<PreparedMember>> {
        let Some(attributes) = self
            .session
            .import_video_table::<VideoAttributes>(member_name, "video_attributes")?
        else {
            info!("📭 No video attributes for {}, skipping", member_name);
            return Ok(None);
        };

        let title_keywords = self.title_keywords(&attributes);
        let video_types = self
            .video_types(&attributes)
            .await
            .with_context(|| format!("Video type classification failed for {}", member_name))?;
        let content_types = self.content_types(&attributes, &title_keywords)?;

        self.session
            .export_video_table(member_name, "video_title_keywords", &title_keywords)?;
        self.session
            .export_video_table(member_name, "video_types", &video_types)?;
        self.session
            .export_video_table(member_name, "content_types", &content_types)?;

        let counts = type_counts(&video_types);
        info!(
            "🏷️ {}: {} videos ({})",
            member_name,
            attributes.len(),
            counts
                .iter()
                .map(|(t, n)| format!("{} {}", n, t))
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(Some(PreparedMember {
            title_keywords,
            video_types,
            content_types,
        }))
    }

    /// Prepare every selected roster member
    pub async fn prepare(
        &self,
        roster: &Roster,
        selection: &Selection,
    ) -> Result<BTreeMap<String, PreparedMember>> {
        let members = roster.select(selection)?;
        info!("⚙️ Preparing {} member(s) in {}", members.len(), self.session.name());

        let mut prepared = BTreeMap::new();
        for member in members {
            if let Some(tables) = self.prepare_member(&member.name).await? {
                prepared.insert(member.name.clone(), tables);
            }
        }

        info!("✅ Prepared {} member(s)", prepared.len());
        Ok(prepared)
    }
}

/// Number of videos per type, every type present
pub fn type_counts(video_types: &Timestamped<VideoTypeRecord>) -> BTreeMap<VideoType, usize> {
    let mut counts: BTreeMap<VideoType, usize> = VideoType::ALL.iter().map(|t| (*t, 0)).collect();
    for record in &video_types.data {
        if let Some(video_type) = record.video_type {
            *counts.entry(video_type).or_default() += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionStore;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeDelta, Utc};
    use holo_core::{KeywordBank, Language, ProbeStatus};
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Answers 200 for ids starting with `short`, 303 otherwise
    #[derive(Default)]
    struct FixtureProbe {
        probed: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ShortsProbe for FixtureProbe {
        async fn probe(&self, video_id: &str) -> Result<ProbeStatus> {
            self.probed.lock().unwrap().push(video_id.to_string());
            Ok(if video_id.starts_with("short") {
                ProbeStatus::Ok
            } else if video_id.starts_with("gone") {
                ProbeStatus::Other(404)
            } else {
                ProbeStatus::Redirect
            })
        }
    }

    fn banks() -> KeywordBanks {
        let mut english = KeywordBank::new();
        english.insert("Karaoke", ["Karaoke"]);
        english.insert("Music Video", ["Official"]);
        let mut banks = KeywordBanks::new();
        banks.insert(Language::English, english);
        banks
    }

    fn time(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn video(id: &str, title: &str, duration: &str) -> VideoAttributes {
        VideoAttributes {
            video_id: id.to_string(),
            title: title.to_string(),
            publish_datetime: time("2024-01-01T00:00:00Z"),
            duration: duration.to_string(),
            category_id: "10".to_string(),
            live_broadcast: false,
            scheduled_start_time: None,
            scheduled_end_time: None,
            actual_start_time: None,
            actual_end_time: None,
        }
    }

    fn stream(id: &str, duration: &str, start: &str, end: &str) -> VideoAttributes {
        VideoAttributes {
            live_broadcast: true,
            actual_start_time: Some(time(start)),
            actual_end_time: Some(time(end)),
            ..video(id, "【Karaoke】Singing stream", duration)
        }
    }

    fn attributes() -> Timestamped<VideoAttributes> {
        Timestamped::now(vec![
            video("normal1", "【Official MV】Song", "PT4M"),
            video("short1", "#shorts dance", "PT30S"),
            video("gone1", "Removed", "PT20S"),
            stream("live1", "PT2H", "2024-01-01T12:00:00Z", "2024-01-01T14:00:00Z"),
            // 20 minute video, broadcast ran 2 minutes longer
            stream("premiere1", "PT20M", "2024-01-01T12:00:00Z", "2024-01-01T12:22:00Z"),
        ])
    }

    #[tokio::test]
    async fn test_video_types_probe_only_short_uploads() {
        let temp_dir = TempDir::new().unwrap();
        let session = SessionStore::new(temp_dir.path()).create_session().unwrap();
        let probe = FixtureProbe::default();
        let preparer = Preparer::new(&session, &banks(), ClassificationThresholds::default(), &probe).unwrap();

        let types = preparer.video_types(&attributes()).await.unwrap();
        let by_id: BTreeMap<&str, Option<VideoType>> = types
            .data
            .iter()
            .map(|r| (r.video_id.as_str(), r.video_type))
            .collect();

        assert_eq!(by_id["normal1"], Some(VideoType::Normal));
        assert_eq!(by_id["short1"], Some(VideoType::Short));
        assert_eq!(by_id["gone1"], None);
        assert_eq!(by_id["live1"], Some(VideoType::LiveStream));
        assert_eq!(by_id["premiere1"], Some(VideoType::Premiere));

        assert_eq!(*probe.probed.lock().unwrap(), vec!["short1", "gone1"]);
        assert_eq!(types.data[4].live_broadcast_duration, Some(TimeDelta::minutes(22)));
    }

    #[tokio::test]
    async fn test_prepare_member_exports_tables() {
        let temp_dir = TempDir::new().unwrap();
        let session = SessionStore::new(temp_dir.path()).create_session().unwrap();
        session
            .export_video_table("Tokino Sora", "video_attributes", &attributes())
            .unwrap();

        let probe = FixtureProbe::default();
        let preparer = Preparer::new(&session, &banks(), ClassificationThresholds::default(), &probe).unwrap();
        let prepared = preparer.prepare_member("Tokino Sora").await.unwrap().unwrap();

        let tags = &prepared.content_types.data;
        assert!(tags[0].content_types.contains("Music Video"));
        assert!(tags[1].content_types.is_empty());
        assert!(tags[3].content_types.contains("Karaoke"));

        let reloaded: Timestamped<ContentTypesRecord> = session
            .import_video_table("Tokino Sora", "content_types")
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.data, prepared.content_types.data);

        let types: Timestamped<VideoTypeRecord> = session
            .import_video_table("Tokino Sora", "video_types")
            .unwrap()
            .unwrap();
        assert_eq!(types.data, prepared.video_types.data);
    }

    #[tokio::test]
    async fn test_member_without_attributes_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let session = SessionStore::new(temp_dir.path()).create_session().unwrap();
        let probe = FixtureProbe::default();
        let preparer = Preparer::new(&session, &banks(), ClassificationThresholds::default(), &probe).unwrap();

        assert!(preparer.prepare_member("AZKi").await.unwrap().is_none());
    }

    #[test]
    fn test_empty_banks_are_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let session = SessionStore::new(temp_dir.path()).create_session().unwrap();
        let probe = FixtureProbe::default();
        let result = Preparer::new(&session, &KeywordBanks::new(), ClassificationThresholds::default(), &probe);
        assert!(result.is_err());
    }

    #[test]
    fn test_unmatched_keyword_rows_are_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let session = SessionStore::new(temp_dir.path()).create_session().unwrap();
        let probe = FixtureProbe::default();
        let preparer = Preparer::new(&session, &banks(), ClassificationThresholds::default(), &probe).unwrap();

        let stray = Timestamped::now(vec![TitleKeywordsRecord {
            video_id: "stray".to_string(),
            title: "Stray".to_string(),
            title_keywords: Default::default(),
        }]);
        let error = preparer.content_types(&attributes(), &stray).unwrap_err();
        assert!(error.to_string().contains("stray"));
    }

    #[test]
    fn test_type_counts_include_every_type() {
        let counts = type_counts(&Timestamped::now(vec![VideoTypeRecord {
            video_id: "a".to_string(),
            live_broadcast_duration: None,
            video_type: Some(VideoType::Short),
        }]));
        assert_eq!(counts.len(), 4);
        assert_eq!(counts[&VideoType::Short], 1);
        assert_eq!(counts[&VideoType::Premiere], 0);
    }
}
