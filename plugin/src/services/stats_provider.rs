use async_trait::async_trait;
use bf6_stats_shared::PlayerProfile;
use thiserror::Error;
use tracing::warn;

use crate::config::{
    USER_AGENT, stats_api_url, upstream_connect_timeout, upstream_http_timeout,
};

const BODY_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("stats request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("stats provider answered HTTP {0}")]
    Status(u16),
    #[error("failed to decode stats payload: {source}; body preview: {preview}")]
    Decode {
        #[source]
        source: serde_json::Error,
        preview: String,
    },
}

/// Source of player statistics. The controller only sees this seam so tests can
/// script responses without a network.
#[async_trait]
pub trait StatsProvider: Send + Sync {
    async fn fetch_profile(&self, player: &str, platform: &str)
    -> Result<PlayerProfile, FetchError>;
}

/// gametools.network client.
pub struct HttpStatsProvider {
    client: reqwest::Client,
    base_url: String,
}

impl HttpStatsProvider {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Client with the configured request and connect timeouts.
    pub fn from_config() -> Result<Self, reqwest::Error> {
        let request_timeout = upstream_http_timeout();
        let connect_timeout = upstream_connect_timeout();
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .or_else(|e| {
                warn!(
                    error = %e,
                    "failed to build configured HTTP client, retrying without custom user-agent"
                );
                reqwest::Client::builder()
                    .timeout(request_timeout)
                    .connect_timeout(connect_timeout)
                    .build()
            })?;
        Ok(Self::new(client, stats_api_url()))
    }
}

#[async_trait]
impl StatsProvider for HttpStatsProvider {
    async fn fetch_profile(
        &self,
        player: &str,
        platform: &str,
    ) -> Result<PlayerProfile, FetchError> {
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("name", player),
                ("platform", platform),
                ("format_values", "true"),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let bytes = resp.bytes().await?;
        PlayerProfile::from_slice(&bytes).map_err(|source| FetchError::Decode {
            source,
            preview: String::from_utf8_lossy(&bytes)
                .chars()
                .take(BODY_PREVIEW_CHARS)
                .collect(),
        })
    }
}
