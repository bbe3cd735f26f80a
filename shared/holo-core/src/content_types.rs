//! Content-type tagging from extracted title keywords

use crate::keywords::KeywordBank;
use std::collections::{BTreeSet, HashSet};

/// Tags videos with content categories by matching their title keywords
/// against a combined keyword bank. Tags are not mutually exclusive.
#[derive(Debug, Clone)]
pub struct ContentTypeClassifier {
    categories: Vec<(String, HashSet<String>)>,
}

impl ContentTypeClassifier {
    pub fn new(combined_bank: &KeywordBank) -> Self {
        let categories = combined_bank
            .iter()
            .map(|(category, triggers)| {
                let triggers = triggers.iter().map(|t| t.to_lowercase()).collect();
                (category.to_string(), triggers)
            })
            .collect();

        Self { categories }
    }

    /// Every category name, in bank order. Summaries emit one count column per entry.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|(category, _)| category.as_str())
    }

    /// Categories whose triggers match any extracted keyword, ignoring case
    pub fn classify(&self, title_keywords: &BTreeSet<String>) -> BTreeSet<String> {
        let lowered: Vec<String> = title_keywords.iter().map(|k| k.to_lowercase()).collect();

        self.categories
            .iter()
            .filter(|(_, triggers)| lowered.iter().any(|keyword| triggers.contains(keyword)))
            .map(|(category, _)| category.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> ContentTypeClassifier {
        let mut bank = KeywordBank::new();
        bank.insert("Karaoke", ["Karaoke", "歌枠", "Singing"]);
        bank.insert("Collab", ["Collab", "w/"]);
        bank.insert("Music Video", ["Official", "MV"]);
        bank.insert("Other", Vec::<String>::new());
        ContentTypeClassifier::new(&bank)
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_multiple_tags() {
        let tags = classifier().classify(&set(&["karaoke", "COLLAB", "#hololive"]));
        assert_eq!(tags, set(&["Collab", "Karaoke"]));
    }

    #[test]
    fn test_no_tags() {
        assert!(classifier().classify(&set(&["Minecraft"])).is_empty());
        assert!(classifier().classify(&BTreeSet::new()).is_empty());
    }

    #[test]
    fn test_exact_keyword_membership() {
        // "official mv" is one bracketed keyword, not two triggers
        let tags = classifier().classify(&set(&["official mv", "Official"]));
        assert_eq!(tags, set(&["Music Video"]));

        assert!(classifier().classify(&set(&["official mv"])).is_empty());
    }

    #[test]
    fn test_categories_follow_bank_order() {
        let classifier = classifier();
        assert_eq!(
            classifier.categories().collect::<Vec<_>>(),
            vec!["Collab", "Karaoke", "Music Video", "Other"]
        );
    }
}
