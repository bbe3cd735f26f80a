//! Keyword banks and video title keyword extraction
//!
//! A keyword bank maps a content category (e.g. "Karaoke") to the words that
//! trigger it. Banks exist per language and are stored as header-less CSV files
//! where every row is `category,keyword1,keyword2,...`.

use crate::{HoloCoreError, Result};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

/// Bracket characters stripped from bracketed title spans
const BRACKET_CHARS: &[char] = &['【', '】', '≪', '≫', '『', '』', '「', '」', '[', ']', '(', ')'];

/// Languages with keyword banks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Language {
    English,
    Japanese,
    Indonesian,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::English, Language::Japanese, Language::Indonesian];

    pub fn name(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Japanese => "Japanese",
            Language::Indonesian => "Indonesian",
        }
    }

    /// File name of this language's bank, e.g. `english_video_title_keywords.csv`
    pub fn bank_file_name(&self) -> String {
        format!("{}_video_title_keywords.csv", self.name().to_lowercase())
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Language {
    type Err = HoloCoreError;

    fn from_str(s: &str) -> Result<Self> {
        Language::ALL
            .into_iter()
            .find(|language| language.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| HoloCoreError::UnknownLanguage(s.to_string()))
    }
}

/// Category name to trigger keywords, for a single language or combined
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordBank {
    categories: BTreeMap<String, Vec<String>>,
}

impl KeywordBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add keywords to a category, creating it when missing. Blank keywords are ignored.
    pub fn insert<I, S>(&mut self, category: &str, keywords: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entry = self.categories.entry(category.to_string()).or_default();
        for keyword in keywords {
            let keyword: String = keyword.into();
            let keyword = keyword.trim();
            if !keyword.is_empty() {
                entry.push(keyword.to_string());
            }
        }
    }

    pub fn keywords(&self, category: &str) -> Option<&[String]> {
        self.categories.get(category).map(Vec::as_slice)
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.categories
            .iter()
            .map(|(category, keywords)| (category.as_str(), keywords.as_slice()))
    }

    /// Every keyword of every category, in category order
    pub fn all_keywords(&self) -> Vec<String> {
        self.categories.values().flatten().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.values().all(Vec::is_empty)
    }

    /// Read a bank from a header-less CSV file
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)?;

        let mut bank = KeywordBank::new();
        for record in reader.records() {
            let record = record?;
            let mut fields = record.iter();
            let Some(category) = fields.next().map(str::trim).filter(|c| !c.is_empty()) else {
                continue;
            };
            bank.insert(category, fields);
        }

        Ok(bank)
    }

    /// Write the bank as a header-less CSV file
    pub fn to_csv_path(&self, path: &Path) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)?;

        for (category, keywords) in self.iter() {
            let mut row = Vec::with_capacity(keywords.len() + 1);
            row.push(category);
            row.extend(keywords.iter().map(String::as_str));
            writer.write_record(&row)?;
        }

        writer.flush()?;
        Ok(())
    }
}

/// Keyword banks for every available language
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordBanks {
    banks: BTreeMap<Language, KeywordBank>,
}

impl KeywordBanks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, language: Language, bank: KeywordBank) {
        self.banks.insert(language, bank);
    }

    pub fn get(&self, language: Language) -> Option<&KeywordBank> {
        self.banks.get(&language)
    }

    pub fn languages(&self) -> impl Iterator<Item = Language> + '_ {
        self.banks.keys().copied()
    }

    /// Import every language bank found in `dir`. Missing language files are skipped.
    pub fn import_dir(dir: &Path) -> Result<Self> {
        let mut banks = KeywordBanks::new();

        for language in Language::ALL {
            let path = dir.join(language.bank_file_name());
            if !path.exists() {
                debug!("No {} keyword bank at {}", language, path.display());
                continue;
            }

            let bank = KeywordBank::from_csv_path(&path)?;
            debug!(
                "📚 Loaded {} keyword bank: {} categories",
                language,
                bank.categories().count()
            );
            banks.insert(language, bank);
        }

        info!("📚 Imported keyword banks for {} language(s)", banks.banks.len());
        Ok(banks)
    }

    /// Export every bank into `dir`, returning the written paths
    pub fn export_dir(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;

        let mut written = Vec::new();
        for (language, bank) in &self.banks {
            let path = dir.join(language.bank_file_name());
            bank.to_csv_path(&path)?;
            written.push(path);
        }

        info!("💾 Exported {} keyword bank(s) to {}", written.len(), dir.display());
        Ok(written)
    }

    /// Merge all languages into one bank. A category missing from a language
    /// counts as empty there, so every category of every language is present.
    pub fn combined(&self) -> KeywordBank {
        let mut combined = KeywordBank::new();

        for bank in self.banks.values() {
            for category in bank.categories() {
                combined.insert(category, Vec::<String>::new());
            }
        }

        for language in Language::ALL {
            if let Some(bank) = self.banks.get(&language) {
                for (category, keywords) in bank.iter() {
                    combined.insert(category, keywords.iter().cloned());
                }
            }
        }

        combined
    }

    /// Flattened keywords of one language, empty when the language has no bank
    pub fn search_keywords(&self, language: Language) -> Vec<String> {
        self.banks
            .get(&language)
            .map(KeywordBank::all_keywords)
            .unwrap_or_default()
    }
}

/// Extracts keyword sets from video titles: bracketed spans, bank keywords and hashtags
#[derive(Debug)]
pub struct TitleKeywordExtractor {
    bracket_pattern: Regex,
    hashtag_pattern: Regex,
    keyword_patterns: Vec<(String, Regex)>,
}

impl TitleKeywordExtractor {
    /// Fails with [`HoloCoreError::MissingKeywordBanks`] when no language has any keyword
    pub fn new(banks: &KeywordBanks) -> Result<Self> {
        let mut search_keywords = Vec::new();
        for language in Language::ALL {
            search_keywords.extend(banks.search_keywords(language));
        }

        if search_keywords.is_empty() {
            return Err(HoloCoreError::MissingKeywordBanks);
        }

        let mut seen = BTreeSet::new();
        let mut keyword_patterns = Vec::with_capacity(search_keywords.len());
        for keyword in search_keywords {
            if !seen.insert(keyword.clone()) {
                continue;
            }
            let pattern = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(&keyword)))?;
            keyword_patterns.push((keyword, pattern));
        }

        Ok(Self {
            bracket_pattern: Regex::new(
                r"【[^【】]*】|≪[^≪≫]*≫|『[^『』]*』|「[^「」]*」|\[[^\[\]]*\]|\([^()]*\)",
            )?,
            hashtag_pattern: Regex::new(r"#[A-Za-z0-9]*[A-Za-z]+")?,
            keyword_patterns,
        })
    }

    /// Union of bracketed words, bank keywords and hashtags found in `title`
    pub fn extract(&self, title: &str) -> BTreeSet<String> {
        let mut keywords = self.bracketed_words(title);
        keywords.extend(self.specific_keywords(title));
        keywords.extend(self.hashtags(title));
        keywords
    }

    /// Text inside any of the six bracket styles, with every bracket character removed
    pub fn bracketed_words(&self, title: &str) -> BTreeSet<String> {
        self.bracket_pattern
            .find_iter(title)
            .map(|m| m.as_str().chars().filter(|c| !BRACKET_CHARS.contains(c)).collect())
            .collect()
    }

    /// Bank keywords appearing as whole words, spelled as in the bank
    pub fn specific_keywords(&self, title: &str) -> BTreeSet<String> {
        self.keyword_patterns
            .iter()
            .filter(|(_, pattern)| pattern.is_match(title))
            .map(|(keyword, _)| keyword.clone())
            .collect()
    }

    pub fn hashtags(&self, title: &str) -> BTreeSet<String> {
        self.hashtag_pattern
            .find_iter(title)
            .map(|m| m.as_str().to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn english_banks(keywords: &[&str]) -> KeywordBanks {
        let mut bank = KeywordBank::new();
        bank.insert("Music Video", keywords.iter().copied());
        let mut banks = KeywordBanks::new();
        banks.insert(Language::English, bank);
        banks
    }

    #[test]
    fn test_extract_title_keywords() {
        let extractor = TitleKeywordExtractor::new(&english_banks(&["Official"])).unwrap();
        let keywords = extractor.extract("【official mv】Song Name #Debut");

        let expected: BTreeSet<String> = ["official mv", "Official", "#Debut"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(keywords, expected);
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let extractor = TitleKeywordExtractor::new(&english_banks(&["Karaoke", "3D Live"])).unwrap();
        let title = "【歌枠】Karaoke night!! [3D LIVE] (w/ friends) #hololive #2024";

        assert_eq!(extractor.extract(title), extractor.extract(title));
    }

    #[test]
    fn test_bracket_styles() {
        let extractor = TitleKeywordExtractor::new(&english_banks(&["unused"])).unwrap();
        let words = extractor.bracketed_words("≪a≫『b』「c」[d](e)【f】【g【h】");

        let expected: BTreeSet<String> = ["a", "b", "c", "d", "e", "f", "h"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(words, expected);
    }

    #[test]
    fn test_whole_word_matching() {
        let extractor = TitleKeywordExtractor::new(&english_banks(&["VR"])).unwrap();

        assert!(extractor.specific_keywords("Playing VRChat").is_empty());
        assert_eq!(
            extractor.specific_keywords("vr chatting"),
            BTreeSet::from(["VR".to_string()])
        );
    }

    #[test]
    fn test_hashtags_need_a_letter() {
        let extractor = TitleKeywordExtractor::new(&english_banks(&["unused"])).unwrap();
        let tags = extractor.hashtags("#123 #abc #2nd");

        assert_eq!(
            tags,
            BTreeSet::from(["#abc".to_string(), "#2nd".to_string()])
        );
    }

    #[test]
    fn test_missing_keyword_banks() {
        let result = TitleKeywordExtractor::new(&KeywordBanks::new());
        assert!(matches!(result, Err(HoloCoreError::MissingKeywordBanks)));

        let mut banks = KeywordBanks::new();
        banks.insert(Language::Japanese, KeywordBank::new());
        assert!(TitleKeywordExtractor::new(&banks).is_err());
    }

    #[test]
    fn test_combined_bank_fills_missing_categories() {
        let mut english = KeywordBank::new();
        english.insert("Karaoke", ["Karaoke", "Singing"]);
        english.insert("Gaming", ["Minecraft"]);
        let mut japanese = KeywordBank::new();
        japanese.insert("Karaoke", ["歌枠"]);
        japanese.insert("Chatting", ["雑談"]);

        let mut banks = KeywordBanks::new();
        banks.insert(Language::English, english);
        banks.insert(Language::Japanese, japanese);

        let combined = banks.combined();
        assert_eq!(
            combined.categories().collect::<Vec<_>>(),
            vec!["Chatting", "Gaming", "Karaoke"]
        );
        assert_eq!(
            combined.keywords("Karaoke").unwrap(),
            &["Karaoke".to_string(), "Singing".to_string(), "歌枠".to_string()]
        );
        assert_eq!(combined.keywords("Gaming").unwrap(), &["Minecraft".to_string()]);
    }

    #[test]
    fn test_bank_files_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let mut english = KeywordBank::new();
        english.insert("Collab", ["Collab", "w/"]);
        english.insert("Other", Vec::<String>::new());
        let mut banks = KeywordBanks::new();
        banks.insert(Language::English, english);

        let written = banks.export_dir(temp_dir.path()).unwrap();
        assert_eq!(written.len(), 1);
        assert!(written[0].ends_with("english_video_title_keywords.csv"));

        let imported = KeywordBanks::import_dir(temp_dir.path()).unwrap();
        assert_eq!(imported, banks);
    }

    #[test]
    fn test_language_parsing() {
        assert_eq!("english".parse::<Language>().unwrap(), Language::English);
        assert!("klingon".parse::<Language>().is_err());
    }
}
