//! Service Configuration Settings
//!
//! Configuration types for the watchlist service, loaded from environment
//! variables.

use std::time::Duration;

use crate::application::services::RetryConfig;

/// Where asset quotes come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuoteSourceKind {
    /// Yahoo Finance compatible HTTP API.
    #[default]
    Yahoo,
    /// Fixed in-process quotes, for local runs without an API key.
    Static,
}

impl QuoteSourceKind {
    /// Parse source kind from string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` for unknown kinds.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.trim().to_lowercase().as_str() {
            "yahoo" => Ok(Self::Yahoo),
            "static" => Ok(Self::Static),
            other => Err(ConfigError::Invalid {
                key: "QUOTE_SOURCE".to_string(),
                value: other.to_string(),
            }),
        }
    }

    /// Get the source name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Yahoo => "yahoo",
            Self::Static => "static",
        }
    }
}

/// Which watchlist store variant to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    /// Durable SQLite database.
    #[default]
    Sqlite,
    /// Process-local set, lost on restart.
    Memory,
}

impl StoreBackend {
    /// Parse backend from string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` for unknown backends.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::Invalid {
                key: "WATCHLIST_STORE".to_string(),
                value: other.to_string(),
            }),
        }
    }

    /// Get the backend name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Memory => "memory",
        }
    }
}

/// Quote source settings.
#[derive(Clone)]
pub struct QuoteSettings {
    /// Which source to use.
    pub source: QuoteSourceKind,
    /// API key sent as `X-API-KEY`. Empty for the static source.
    pub api_key: String,
    /// API base URL.
    pub base_url: String,
    /// HTTP client timeout.
    pub timeout: Duration,
}

impl Default for QuoteSettings {
    fn default() -> Self {
        Self {
            source: QuoteSourceKind::Yahoo,
            api_key: String::new(),
            base_url: "https://yfapi.net".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl std::fmt::Debug for QuoteSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuoteSettings")
            .field("source", &self.source)
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Watchlist store settings.
#[derive(Debug, Clone)]
pub struct StoreSettings {
    /// Store variant.
    pub backend: StoreBackend,
    /// Database URL for the SQLite variant.
    pub database_url: String,
    /// Maximum pooled connections. Never zero.
    pub max_connections: u32,
    /// Maximum lifetime of a pooled connection.
    pub conn_max_lifetime: Duration,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Sqlite,
            database_url: "sqlite://watchlist.db".to_string(),
            max_connections: 10,
            conn_max_lifetime: Duration::from_secs(3600),
        }
    }
}

/// Message broker settings.
#[derive(Debug, Clone)]
pub struct BrokerSettings {
    /// Topic carrying quote snapshots.
    pub topic: String,
    /// Consumer group of the persistence consumer.
    pub consumer_group: String,
    /// Producer publish deadline.
    pub publish_timeout: Duration,
    /// Maximum retained messages per topic. Never zero.
    pub topic_capacity: usize,
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            topic: "watchlist-topic".to_string(),
            consumer_group: "persistence-group".to_string(),
            publish_timeout: Duration::from_secs(2),
            topic_capacity: 10_000,
        }
    }
}

/// Consumer retry settings.
#[derive(Debug, Clone)]
pub struct ConsumerSettings {
    /// Delay after the first failed pull.
    pub retry_initial: Duration,
    /// Upper bound on the pull retry delay.
    pub retry_max: Duration,
}

impl Default for ConsumerSettings {
    fn default() -> Self {
        Self {
            retry_initial: Duration::from_millis(500),
            retry_max: Duration::from_secs(30),
        }
    }
}

impl From<&ConsumerSettings> for RetryConfig {
    fn from(settings: &ConsumerSettings) -> Self {
        Self {
            initial_delay: settings.retry_initial,
            max_delay: settings.retry_max,
            ..Self::default()
        }
    }
}

/// Server port settings.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// HTTP gateway port.
    pub http_port: u16,
    /// gRPC gateway port.
    pub grpc_port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            http_port: 8080,
            grpc_port: 50051,
        }
    }
}

/// Complete service configuration.
#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    /// Quote source settings.
    pub quotes: QuoteSettings,
    /// Watchlist store settings.
    pub store: StoreSettings,
    /// Message broker settings.
    pub broker: BrokerSettings,
    /// Consumer retry settings.
    pub consumer: ConsumerSettings,
    /// Server port settings.
    pub server: ServerSettings,
}

impl ServiceConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing, a
    /// selector variable holds an unknown value, or a pool or topic size is
    /// zero.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// See [`ServiceConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let source = lookup("QUOTE_SOURCE")
            .map(|s| QuoteSourceKind::parse(&s))
            .transpose()?
            .unwrap_or_default();

        let api_key = match source {
            QuoteSourceKind::Yahoo => {
                let key = lookup("YAHOO_API_KEY")
                    .ok_or_else(|| ConfigError::MissingEnvVar("YAHOO_API_KEY".to_string()))?;
                if key.trim().is_empty() {
                    return Err(ConfigError::EmptyValue("YAHOO_API_KEY".to_string()));
                }
                key
            }
            QuoteSourceKind::Static => lookup("YAHOO_API_KEY").unwrap_or_default(),
        };

        let quotes = QuoteSettings {
            source,
            api_key,
            base_url: lookup("QUOTE_API_BASE_URL")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| QuoteSettings::default().base_url),
            timeout: parse_duration_secs(
                &lookup,
                "QUOTE_API_TIMEOUT_SECS",
                QuoteSettings::default().timeout,
            ),
        };

        let store = StoreSettings {
            backend: lookup("WATCHLIST_STORE")
                .map(|s| StoreBackend::parse(&s))
                .transpose()?
                .unwrap_or_default(),
            database_url: lookup("DATABASE_URL")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| StoreSettings::default().database_url),
            max_connections: parse_nonzero(
                &lookup,
                "DATABASE_MAX_CONNECTIONS",
                StoreSettings::default().max_connections,
            )?,
            conn_max_lifetime: parse_duration_secs(
                &lookup,
                "DATABASE_CONN_MAX_LIFETIME_SECS",
                StoreSettings::default().conn_max_lifetime,
            ),
        };

        let broker = BrokerSettings {
            topic: non_empty(&lookup, "WATCHLIST_TOPIC", BrokerSettings::default().topic)?,
            consumer_group: non_empty(
                &lookup,
                "CONSUMER_GROUP",
                BrokerSettings::default().consumer_group,
            )?,
            publish_timeout: parse_duration_millis(
                &lookup,
                "PUBLISH_TIMEOUT_MS",
                BrokerSettings::default().publish_timeout,
            ),
            topic_capacity: parse_nonzero(
                &lookup,
                "BROKER_TOPIC_CAPACITY",
                BrokerSettings::default().topic_capacity,
            )?,
        };

        let consumer = ConsumerSettings {
            retry_initial: parse_duration_millis(
                &lookup,
                "CONSUMER_RETRY_INITIAL_MS",
                ConsumerSettings::default().retry_initial,
            ),
            retry_max: parse_duration_secs(
                &lookup,
                "CONSUMER_RETRY_MAX_SECS",
                ConsumerSettings::default().retry_max,
            ),
        };

        let server = ServerSettings {
            http_port: parse_or(&lookup, "HTTP_PORT", ServerSettings::default().http_port),
            grpc_port: parse_or(&lookup, "GRPC_PORT", ServerSettings::default().grpc_port),
        };

        Ok(Self {
            quotes,
            store,
            broker,
            consumer,
            server,
        })
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    /// Environment variable has empty value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),
    /// Environment variable holds an unsupported value.
    #[error("environment variable {key} has unsupported value {value:?}")]
    Invalid {
        /// Variable name.
        key: String,
        /// Offending value.
        value: String,
    },
}

fn non_empty<F>(lookup: &F, key: &str, default: String) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(v) if v.trim().is_empty() => Err(ConfigError::EmptyValue(key.to_string())),
        Some(v) => Ok(v),
        None => Ok(default),
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Like [`parse_or`], but an explicit zero is rejected.
fn parse_nonzero<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + Default + PartialEq,
{
    let value = parse_or(lookup, key, default);
    if value == T::default() {
        return Err(ConfigError::Invalid {
            key: key.to_string(),
            value: lookup(key).unwrap_or_default(),
        });
    }
    Ok(value)
}

fn parse_duration_secs<F>(lookup: &F, key: &str, default: Duration) -> Duration
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map_or(default, Duration::from_secs)
}

fn parse_duration_millis<F>(lookup: &F, key: &str, default: Duration) -> Duration
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map_or(default, Duration::from_millis)
}
