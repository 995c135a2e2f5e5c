//! TMDB-backed provider client

use super::ProviderClient;
use crate::catalog::ServiceId;
use crate::config::ProviderConfig;
use crate::error::{Error, ProviderError, Result};
use crate::types::{MediaKind, NextEpisode};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::{BTreeSet, HashMap};
use std::time::Duration;
use url::Url;

/// Provider client for The Movie Database (TMDB) v3 API
///
/// # Examples
///
/// ```no_run
/// use stream_notifier::config::ProviderConfig;
/// use stream_notifier::provider::{ProviderClient, TmdbClient};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = TmdbClient::new(&ProviderConfig {
///     api_key: "secret".into(),
///     ..Default::default()
/// })?;
///
/// if let Some(episode) = client.next_episode(1396).await? {
///     println!("next: {} on {}", episode.label(), episode.air_date);
/// }
/// # Ok(())
/// # }
/// ```
pub struct TmdbClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
    region: String,
    request_timeout: Duration,
}

#[derive(Deserialize)]
struct TvDetails {
    #[serde(default)]
    next_episode_to_air: Option<EpisodeSummary>,
}

#[derive(Deserialize)]
struct EpisodeSummary {
    #[serde(default)]
    air_date: Option<String>,
    season_number: u32,
    episode_number: u32,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Deserialize)]
struct WatchProviders {
    #[serde(default)]
    results: HashMap<String, RegionProviders>,
}

#[derive(Deserialize)]
struct RegionProviders {
    #[serde(default)]
    flatrate: Vec<ProviderEntry>,
}

#[derive(Deserialize)]
struct ProviderEntry {
    provider_id: u32,
}

impl TmdbClient {
    /// Create a client from provider settings
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the base URL cannot carry path segments,
    /// or [`Error::Network`] when the HTTP client cannot be built.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| Error::Config {
            message: format!("invalid provider base URL '{}': {}", config.base_url, e),
            key: Some("provider.base_url".to_string()),
        })?;

        if base_url.cannot_be_a_base() {
            return Err(Error::Config {
                message: format!("provider base URL '{}' cannot be a base", config.base_url),
                key: Some("provider.base_url".to_string()),
            });
        }

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http,
            base_url,
            api_key: config.api_key.clone(),
            region: config.region.clone(),
            request_timeout: config.request_timeout,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // cannot_be_a_base was rejected in new()
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> std::result::Result<T, ProviderError> {
        let response = self
            .http
            .get(url.clone())
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if status.is_client_error()
            && status != StatusCode::REQUEST_TIMEOUT
            && status != StatusCode::TOO_MANY_REQUESTS
        {
            return Err(ProviderError::rejected(status.as_u16(), url.path()));
        }
        if !status.is_success() {
            return Err(ProviderError::transport(format!(
                "{} returned status {}",
                url.path(),
                status
            )));
        }

        let body = response.bytes().await.map_err(|e| self.map_send_error(e))?;
        serde_json::from_slice(&body)
            .map_err(|e| ProviderError::format(format!("{}: {}", url.path(), e)))
    }

    fn map_send_error(&self, error: reqwest::Error) -> ProviderError {
        if error.is_timeout() {
            ProviderError::timeout(self.request_timeout)
        } else {
            // without_url keeps the api_key out of error messages
            ProviderError::transport(error.without_url().to_string())
        }
    }
}

#[async_trait]
impl ProviderClient for TmdbClient {
    async fn next_episode(
        &self,
        external_id: i64,
    ) -> std::result::Result<Option<NextEpisode>, ProviderError> {
        let id = external_id.to_string();
        let details: TvDetails = self.get_json(self.endpoint(&["tv", &id])).await?;

        let Some(summary) = details.next_episode_to_air else {
            return Ok(None);
        };

        // An announced episode without a date cannot become due yet
        let Some(raw_date) = summary.air_date.filter(|d| !d.is_empty()) else {
            tracing::debug!(external_id, "next episode has no air date yet");
            return Ok(None);
        };

        let air_date = NaiveDate::parse_from_str(&raw_date, "%Y-%m-%d")
            .map_err(|e| ProviderError::format(format!("air_date '{}': {}", raw_date, e)))?;

        Ok(Some(NextEpisode {
            air_date,
            season_number: summary.season_number,
            episode_number: summary.episode_number,
            name: summary.name.filter(|n| !n.is_empty()),
        }))
    }

    async fn availability(
        &self,
        external_id: i64,
        media_kind: MediaKind,
    ) -> std::result::Result<BTreeSet<ServiceId>, ProviderError> {
        let kind = match media_kind {
            MediaKind::Series => "tv",
            MediaKind::Film => "movie",
        };
        let id = external_id.to_string();
        let providers: WatchProviders = self
            .get_json(self.endpoint(&[kind, &id, "watch", "providers"]))
            .await?;

        let services = providers
            .results
            .get(&self.region)
            .map(|region| {
                region
                    .flatrate
                    .iter()
                    .filter_map(|entry| ServiceId::from_provider_id(entry.provider_id))
                    .collect()
            })
            .unwrap_or_default();

        Ok(services)
    }

    fn name(&self) -> &str {
        "tmdb"
    }
}
