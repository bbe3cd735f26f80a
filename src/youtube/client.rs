use super::{DataApi, ResourceKind};
use crate::config::Config;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// HTTP client for the YouTube Data API v3
pub struct YouTubeClient {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
    max_results: usize,
}

impl YouTubeClient {
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        max_results: usize,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        // A trailing slash keeps the last path segment when joining endpoints
        let mut base = base_url.trim_end_matches('/').to_string();
        base.push('/');
        let base_url = Url::parse(&base).with_context(|| format!("Invalid API base URL: {}", base_url))?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.into(),
            max_results,
        })
    }

    /// Build a client from configuration. Requires an API key.
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.api_key().ok_or_else(|| {
            anyhow!(
                "No YouTube Data API key: set api.api_key or {}",
                config.api.api_key_env
            )
        })?;

        Self::new(
            &config.api.base_url,
            api_key,
            config.api.max_results,
            Duration::from_secs(config.network.timeout_seconds),
            &config.network.user_agent,
        )
    }

    fn endpoint_url(&self, kind: ResourceKind) -> Result<Url> {
        Ok(self.base_url.join(kind.endpoint())?)
    }
}

#[async_trait]
impl DataApi for YouTubeClient {
    async fn fetch_page(&self, kind: ResourceKind, query: &[(&str, String)]) -> Result<Option<Value>> {
        let url = self.endpoint_url(kind)?;
        debug!("Requesting {} with {:?}", url, query);

        let response = self
            .client
            .get(url)
            .query(query)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("YouTube Data API error {}: {}", status, text));
        }

        Ok(Some(response.json().await?))
    }

    fn max_results(&self) -> usize {
        self.max_results
    }
}
