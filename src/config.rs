//! Configuration types for stream-notifier

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, time::Duration};
use utoipa::ToSchema;

/// Main configuration for StreamNotifier
///
/// Fields are organized into logical sub-configs:
/// - [`provider`](ProviderConfig) — metadata provider access
/// - [`reconcile`](ReconcileConfig) — pass schedule, parallelism, retries
/// - [`notifications`](NotificationConfig) — push relay
/// - [`persistence`](PersistenceConfig) — database location
/// - [`server`](ServerIntegrationConfig) — REST API
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Metadata provider settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Reconciliation pass settings
    #[serde(default)]
    pub reconcile: ReconcileConfig,

    /// Notification delivery settings
    #[serde(default)]
    pub notifications: NotificationConfig,

    /// Data storage
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// API and external server integration
    #[serde(default)]
    pub server: ServerIntegrationConfig,
}

impl Config {
    /// Check settings that serde cannot enforce
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.provider.base_url).map_err(|e| Error::Config {
            message: format!("invalid provider base URL '{}': {}", self.provider.base_url, e),
            key: Some("provider.base_url".to_string()),
        })?;

        if self.reconcile.max_concurrent_queries == 0 {
            return Err(Error::Config {
                message: "max_concurrent_queries must be at least 1".to_string(),
                key: Some("reconcile.max_concurrent_queries".to_string()),
            });
        }

        if self.reconcile.check_interval.is_zero() {
            return Err(Error::Config {
                message: "check_interval must be greater than zero".to_string(),
                key: Some("reconcile.check_interval".to_string()),
            });
        }

        if self.reconcile.query_timeout.is_zero() {
            return Err(Error::Config {
                message: "query_timeout must be greater than zero".to_string(),
                key: Some("reconcile.query_timeout".to_string()),
            });
        }

        let multiplier = self.reconcile.retry.backoff_multiplier;
        if !multiplier.is_finite() || multiplier < 1.0 {
            return Err(Error::Config {
                message: format!("backoff_multiplier must be a finite number >= 1.0, got {multiplier}"),
                key: Some("reconcile.retry.backoff_multiplier".to_string()),
            });
        }

        if let Some(relay) = &self.notifications.relay {
            url::Url::parse(&relay.url).map_err(|e| Error::Config {
                message: format!("invalid relay URL '{}': {}", relay.url, e),
                key: Some("notifications.relay.url".to_string()),
            })?;
        }

        Ok(())
    }
}

/// Metadata provider (TMDB) configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ProviderConfig {
    /// API key sent as the `api_key` query parameter
    #[serde(default)]
    pub api_key: String,

    /// Base URL of the provider API (default: "https://api.themoviedb.org/3")
    #[serde(default = "default_provider_base_url")]
    pub base_url: String,

    /// Watch-provider region code (default: "GB")
    #[serde(default = "default_region")]
    pub region: String,

    /// Overall HTTP client timeout (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub request_timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_provider_base_url(),
            region: default_region(),
            request_timeout: default_request_timeout(),
        }
    }
}

/// Reconciliation pass configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ReconcileConfig {
    /// Time between scheduled passes (default: 3600 seconds)
    #[serde(default = "default_check_interval", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub check_interval: Duration,

    /// Run one pass as soon as the scheduler starts (default: false)
    #[serde(default)]
    pub check_on_startup: bool,

    /// Maximum provider queries in flight during a pass (default: 4)
    #[serde(default = "default_max_concurrent_queries")]
    pub max_concurrent_queries: usize,

    /// Timeout applied to every query attempt (default: 15 seconds)
    #[serde(default = "default_query_timeout", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub query_timeout: Duration,

    /// Retry policy for transient query failures
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            check_interval: default_check_interval(),
            check_on_startup: false,
            max_concurrent_queries: default_max_concurrent_queries(),
            query_timeout: default_query_timeout(),
            retry: RetryConfig::default(),
        }
    }
}

/// Retry configuration for transient failures
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt (default: 2)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial delay before first retry (default: 1 second)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 30 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

/// Notification delivery configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct NotificationConfig {
    /// Push relay; notifications are only logged when unset
    #[serde(default)]
    pub relay: Option<RelayConfig>,
}

/// Push relay endpoint
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct RelayConfig {
    /// URL the notification payload is POSTed to
    pub url: String,

    /// Value for the `Authorization` header, if the relay requires one
    #[serde(default)]
    pub auth_header: Option<String>,

    /// Timeout for a single delivery (default: 10 seconds)
    #[serde(default = "default_relay_timeout", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub timeout: Duration,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PersistenceConfig {
    /// Database path (default: "./stream-notifier.db")
    #[serde(default = "default_database_path")]
    #[schema(value_type = String)]
    pub database_path: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// API and external server integration configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ServerIntegrationConfig {
    /// REST API configuration
    #[serde(default)]
    pub api: ApiConfig,
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:6790)
    #[serde(default = "default_bind_address")]
    #[schema(value_type = String)]
    pub bind_address: SocketAddr,

    /// Optional API key for authentication
    #[serde(default)]
    pub api_key: Option<String>,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            api_key: None,
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

fn default_provider_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_region() -> String {
    "GB".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_check_interval() -> Duration {
    Duration::from_secs(3600)
}

fn default_max_concurrent_queries() -> usize {
    4
}

fn default_query_timeout() -> Duration {
    Duration::from_secs(15)
}

fn default_max_attempts() -> u32 {
    2
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(30)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_relay_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./stream-notifier.db")
}

fn default_true() -> bool {
    true
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 6790))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

// Durations are (de)serialized as whole seconds
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
