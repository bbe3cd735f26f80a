use anyhow::{anyhow, Result};
use holo_core::ClassificationThresholds;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for the Hololive analytics pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// YouTube Data API settings
    pub api: ApiConfig,

    /// Shorts probe settings
    pub probe: ProbeConfig,

    /// HTTP client settings shared by the API client and the probe
    pub network: NetworkConfig,

    /// Video type heuristics
    pub classification: ClassificationThresholds,

    /// Input and output locations
    pub paths: PathsConfig,

    /// Output and logging settings
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the YouTube Data API v3
    pub base_url: String,

    /// API key. Falls back to the `api_key_env` environment variable when unset
    pub api_key: Option<String>,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// Maximum results per request and id batch size (1-50)
    pub max_results: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Base URL of Shorts pages; the video id is appended as the last path segment
    pub shorts_base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Request timeout in seconds
    pub timeout_seconds: u64,

    /// User agent sent with every request
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding the `YYYY-MM-DD_YT-DAPI_Session` directories
    pub sessions_root: PathBuf,

    /// Roster CSV with name, channel id, group, branch and unit
    pub roster_file: PathBuf,

    /// Directory with the `<language>_video_title_keywords.csv` banks
    pub keyword_banks_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Log level
    pub log_level: String,

    /// Prefix exported file names with `YYYY-MM-DD-HHMM_`
    pub timestamp_filenames: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.googleapis.com/youtube/v3".to_string(),
            api_key: None,
            api_key_env: "YOUTUBE_API_KEY".to_string(),
            max_results: 50,
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            shorts_base_url: "https://www.youtube.com/shorts".to_string(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            user_agent: format!("holo-analytics/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            sessions_root: PathBuf::from("results/data/YouTube/YouTube-Data-API-Sessions"),
            roster_file: PathBuf::from("data/starting/holopro_members.csv"),
            keyword_banks_dir: PathBuf::from("data/keyword_banks"),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            timestamp_filenames: true,
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        let config_paths = [
            "holo-analytics.toml",
            "config/holo-analytics.toml",
            "/etc/holo-analytics/config.toml",
        ];

        for path in &config_paths {
            if let Ok(config_str) = std::fs::read_to_string(path) {
                match toml::from_str::<Config>(&config_str) {
                    Ok(config) => {
                        tracing::info!("📄 Loaded configuration from: {}", path);
                        return Ok(config.with_env_overrides());
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path, e);
                    }
                }
            }
        }

        Self::from_env()
    }

    /// Load configuration from environment variables on top of the defaults
    pub fn from_env() -> Result<Self> {
        Ok(Self::default().with_env_overrides())
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(api_key) = std::env::var("HOLO_ANALYTICS_API_KEY") {
            self.api.api_key = Some(api_key);
        }

        if let Ok(base_url) = std::env::var("HOLO_ANALYTICS_API_BASE_URL") {
            self.api.base_url = base_url;
        }

        if let Ok(timeout) = std::env::var("HOLO_ANALYTICS_TIMEOUT") {
            match timeout.parse() {
                Ok(seconds) => self.network.timeout_seconds = seconds,
                Err(_) => tracing::warn!("Ignoring invalid HOLO_ANALYTICS_TIMEOUT: {}", timeout),
            }
        }

        if let Ok(sessions_root) = std::env::var("HOLO_ANALYTICS_SESSIONS_ROOT") {
            self.paths.sessions_root = PathBuf::from(sessions_root);
        }

        if let Ok(roster_file) = std::env::var("HOLO_ANALYTICS_ROSTER") {
            self.paths.roster_file = PathBuf::from(roster_file);
        }

        if let Ok(banks_dir) = std::env::var("HOLO_ANALYTICS_KEYWORD_BANKS") {
            self.paths.keyword_banks_dir = PathBuf::from(banks_dir);
        }

        if let Ok(log_level) = std::env::var("HOLO_ANALYTICS_LOG_LEVEL") {
            self.output.log_level = log_level;
        }

        self
    }

    /// Write the effective configuration as TOML, e.g. to seed a config file
    pub fn save(&self, path: &Path) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        std::fs::write(path, config_str)
            .map_err(|e| anyhow!("Failed to write {}: {}", path.display(), e))?;
        tracing::info!("💾 Configuration saved to: {}", path.display());
        Ok(())
    }

    /// API key from the config file, or from the configured environment variable
    pub fn api_key(&self) -> Option<String> {
        self.api
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| std::env::var(&self.api.api_key_env).ok())
            .filter(|key| !key.trim().is_empty())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.api.max_results == 0 || self.api.max_results > 50 {
            return Err(anyhow!(
                "max_results must be between 1 and 50 (got {})",
                self.api.max_results
            ));
        }

        if self.network.timeout_seconds == 0 {
            return Err(anyhow!("timeout_seconds must be greater than 0"));
        }

        url::Url::parse(&self.api.base_url)
            .map_err(|e| anyhow!("Invalid API base URL {}: {}", self.api.base_url, e))?;
        url::Url::parse(&self.probe.shorts_base_url)
            .map_err(|e| anyhow!("Invalid Shorts base URL {}: {}", self.probe.shorts_base_url, e))?;

        self.classification
            .check()
            .map_err(|e| anyhow!("Invalid classification thresholds: {}", e))?;

        tracing::debug!("✅ Configuration validation passed");
        Ok(())
    }

    /// Validate configuration for data collection, which also needs an API key
    pub fn validate_for_collection(&self) -> Result<()> {
        self.validate()?;

        if self.api_key().is_none() {
            return Err(anyhow!(
                "API key required for data collection: set api.api_key or {}",
                self.api.api_key_env
            ));
        }

        Ok(())
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "Holo Analytics Configuration:\n\
            - API Base URL: {}\n\
            - API Key: {}\n\
            - Max Results: {}\n\
            - Shorts Probe: {}\n\
            - Timeout: {}s\n\
            - Premiere Window: {}s ± {}s\n\
            - Premiere Cutoff: {}s\n\
            - Live Stream Cutoff: {}s\n\
            - Short Ceiling: {}s\n\
            - Sessions Root: {}\n\
            - Roster: {}\n\
            - Keyword Banks: {}",
            self.api.base_url,
            if self.api_key().is_some() { "configured" } else { "missing" },
            self.api.max_results,
            self.probe.shorts_base_url,
            self.network.timeout_seconds,
            self.classification.premiere_countdown_secs,
            self.classification.bounds_secs,
            self.classification.premiere_cutoff_secs,
            self.classification.live_stream_cutoff_secs,
            self.classification.short_ceiling_secs,
            self.paths.sessions_root.display(),
            self.paths.roster_file.display(),
            self.paths.keyword_banks_dir.display(),
        )
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config.api.api_key = Some(api_key.into());
        self
    }

    pub fn with_api_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.api.base_url = base_url.into();
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.config.api.max_results = max_results;
        self
    }

    pub fn with_shorts_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.probe.shorts_base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.config.network.timeout_seconds = seconds;
        self
    }

    pub fn with_thresholds(mut self, thresholds: ClassificationThresholds) -> Self {
        self.config.classification = thresholds;
        self
    }

    pub fn with_sessions_root(mut self, dir: PathBuf) -> Self {
        self.config.paths.sessions_root = dir;
        self
    }

    pub fn with_roster_file(mut self, path: PathBuf) -> Self {
        self.config.paths.roster_file = path;
        self
    }

    pub fn with_keyword_banks_dir(mut self, dir: PathBuf) -> Self {
        self.config.paths.keyword_banks_dir = dir;
        self
    }

    pub fn timestamp_filenames(mut self, enable: bool) -> Self {
        self.config.output.timestamp_filenames = enable;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_writes_loadable_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("holo-analytics.toml");

        let config = ConfigBuilder::new().with_max_results(25).build();
        config.save(&path).unwrap();

        let saved: Config = toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved.api.max_results, 25);
        assert_eq!(saved.paths.roster_file, config.paths.roster_file);
        assert!(saved.validate().is_ok());
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.max_results, 50);
        assert_eq!(config.classification.premiere_countdown_secs, 120);
        assert_eq!(config.classification.short_ceiling_secs, 60);
        assert!(config.output.timestamp_filenames);
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .with_api_key("secret")
            .with_max_results(10)
            .with_timeout(5)
            .timestamp_filenames(false)
            .build();

        assert_eq!(config.api_key().as_deref(), Some("secret"));
        assert_eq!(config.api.max_results, 10);
        assert_eq!(config.network.timeout_seconds, 5);
        assert!(!config.output.timestamp_filenames);
    }

    #[test]
    fn test_config_validation() {
        assert!(Config::default().validate().is_ok());

        let config = ConfigBuilder::new().with_max_results(51).build();
        assert!(config.validate().is_err());

        let config = ConfigBuilder::new()
            .with_thresholds(ClassificationThresholds {
                live_stream_cutoff_secs: 4000,
                ..Default::default()
            })
            .build();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_collection_needs_api_key() {
        let mut config = ConfigBuilder::new().with_api_key("key").build();
        assert!(config.validate_for_collection().is_ok());

        config.api.api_key = None;
        config.api.api_key_env = "HOLO_ANALYTICS_TEST_UNSET_KEY".to_string();
        assert!(config.validate_for_collection().is_err());
    }

    #[test]
    fn test_partial_toml() {
        let config: Config = toml::from_str(
            "[classification]\npremiere_countdown_secs = 90\nbounds_secs = 10\n\
             premiere_cutoff_secs = 3601\nlive_stream_cutoff_secs = 300\nshort_ceiling_secs = 60\n\
             [api]\nmax_results = 25\n",
        )
        .unwrap();

        assert_eq!(config.classification.premiere_countdown_secs, 90);
        assert_eq!(config.api.max_results, 25);
        assert_eq!(config.api.api_key_env, "YOUTUBE_API_KEY");
        assert_eq!(config.paths.keyword_banks_dir, PathBuf::from("data/keyword_banks"));
    }
}
