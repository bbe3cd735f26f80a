use holo_analytics::{Config, Roster};
use holo_core::{ContentTypeClassifier, KeywordBanks, Language, Selection, TitleKeywordExtractor};
use std::path::Path;

#[test]
fn test_bundled_config_parses() {
    let config: Config = toml::from_str(include_str!("../config/holo-analytics.toml")).unwrap();
    config.validate().unwrap();
    assert_eq!(config.classification.premiere_cutoff_secs, 3601);
    assert!(config.network.user_agent.starts_with("holo-analytics/"));
}

#[test]
fn test_bundled_roster() {
    let roster = Roster::load(Path::new("data/starting/holopro_members.csv")).unwrap();
    assert!(!roster.is_empty());

    let myth = roster
        .units()
        .into_iter()
        .find(|u| u.unit == "Myth")
        .unwrap();
    assert_eq!(roster.members_of(&myth).len(), 5);

    let selected = roster.select(&Selection::from("Gawr_Gura")).unwrap();
    assert_eq!(selected[0].youtube_channel_id, "UCoSrY_IQQVpmIRZ9Xf-y93g");
}

#[test]
fn test_bundled_keyword_banks() {
    let banks = KeywordBanks::import_dir(Path::new("data/keyword_banks")).unwrap();
    assert_eq!(banks.languages().count(), 3);

    let combined = banks.combined();
    assert_eq!(combined.categories().count(), 15);

    let extractor = TitleKeywordExtractor::new(&banks).unwrap();
    let classifier = ContentTypeClassifier::new(&combined);

    let tags = classifier.classify(&extractor.extract("【歌枠】Singing until midnight!"));
    assert!(tags.contains("Karaoke"));

    let tags = classifier.classify(&extractor.extract("【Minecraft】Collab with everyone"));
    assert!(tags.contains("Gaming"));
    assert!(tags.contains("Collab"));

    assert!(!banks.search_keywords(Language::Indonesian).is_empty());
}
