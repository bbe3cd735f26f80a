//! Shorts probe: tells a Short from a Normal upload by the status of `<shorts_base>/<video_id>`

use crate::config::Config;
use anyhow::{Context, Result};
use async_trait::async_trait;
use holo_core::ProbeStatus;
use std::time::Duration;
use tracing::debug;

#[async_trait]
pub trait ShortsProbe: Send + Sync {
    /// Status of the Shorts URL for `video_id`. Transport failures are errors.
    async fn probe(&self, video_id: &str) -> Result<ProbeStatus>;
}

/// HEAD request against the Shorts URL, without following redirects
pub struct HttpShortsProbe {
    client: reqwest::Client,
    base_url: String,
}

impl HttpShortsProbe {
    pub fn new(base_url: &str, timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("Failed to build Shorts probe client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.probe.shorts_base_url,
            Duration::from_secs(config.network.timeout_seconds),
            &config.network.user_agent,
        )
    }

    fn url(&self, video_id: &str) -> String {
        format!("{}/{}", self.base_url, video_id)
    }
}

#[async_trait]
impl ShortsProbe for HttpShortsProbe {
    async fn probe(&self, video_id: &str) -> Result<ProbeStatus> {
        let url = self.url(video_id);
        let response = self
            .client
            .head(&url)
            .send()
            .await
            .with_context(|| format!("Shorts probe failed for {}", video_id))?;

        let status = ProbeStatus::from_status_code(response.status().as_u16());
        debug!("🔎 {} -> {:?}", url, status);
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use holo_core::VideoType;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn probe_with_status(status: u16) -> ProbeStatus {
        let server = MockServer::start().await;
        let mut template = ResponseTemplate::new(status);
        if (300..400).contains(&status) {
            template = template.insert_header("Location", "https://www.youtube.com/watch?v=abc");
        }
        Mock::given(method("HEAD"))
            .and(path("/shorts/abc"))
            .respond_with(template)
            .expect(1)
            .mount(&server)
            .await;

        let probe = HttpShortsProbe::new(
            &format!("{}/shorts/", server.uri()),
            Duration::from_secs(5),
            "holo-analytics-test",
        )
        .unwrap();
        probe.probe("abc").await.unwrap()
    }

    #[tokio::test]
    async fn test_ok_is_short() {
        let status = probe_with_status(200).await;
        assert_eq!(status, ProbeStatus::Ok);
        assert_eq!(status.video_type(), Some(VideoType::Short));
    }

    #[tokio::test]
    async fn test_redirect_is_not_followed() {
        let status = probe_with_status(303).await;
        assert_eq!(status, ProbeStatus::Redirect);
        assert_eq!(status.video_type(), Some(VideoType::Normal));
    }

    #[tokio::test]
    async fn test_not_found_is_unknown() {
        let status = probe_with_status(404).await;
        assert_eq!(status.video_type(), None);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_an_error() {
        let probe = HttpShortsProbe::new("http://127.0.0.1:9/shorts", Duration::from_secs(2), "test").unwrap();
        assert!(probe.probe("abc").await.is_err());
    }
}
