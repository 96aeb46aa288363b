use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Feed identifiers to poll (e.g. "tampere"). Must be served by the
    /// configured endpoint.
    pub feeds: Vec<String>,
    /// Allowed CORS origins. Required unless cors_permissive is true.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Explicitly allow all origins (development only). Defaults to false.
    #[serde(default)]
    pub cors_permissive: bool,
    /// Feed polling and delay classification configuration
    #[serde(default)]
    pub feed_sync: FeedSyncConfig,
}

/// Configuration for the Digitransit feed sync
#[derive(Debug, Clone, Deserialize)]
pub struct FeedSyncConfig {
    /// Digitransit routing API endpoint
    #[serde(default = "FeedSyncConfig::default_endpoint")]
    pub endpoint: String,
    /// IANA timezone the feed's stop time offsets are relative to
    #[serde(default = "FeedSyncConfig::default_timezone")]
    pub timezone: String,
    /// Interval in seconds between background refresh cycles (default: 90)
    #[serde(default = "FeedSyncConfig::default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// How long a fetched summary stays fresh, in seconds (default: 90)
    #[serde(default = "FeedSyncConfig::default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// Upstream request timeout in seconds (default: 10)
    #[serde(default = "FeedSyncConfig::default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    /// A trip counts as delayed once one of its stops exceeds this many
    /// seconds of departure delay (default: 300)
    #[serde(default = "FeedSyncConfig::default_trip_delay_threshold_secs")]
    pub trip_delay_threshold_secs: i32,
    /// Stops later than this many seconds are listed for a delayed trip
    /// (default: 60)
    #[serde(default = "FeedSyncConfig::default_stop_delay_threshold_secs")]
    pub stop_delay_threshold_secs: i32,
}

impl Default for FeedSyncConfig {
    fn default() -> Self {
        Self {
            endpoint: Self::default_endpoint(),
            timezone: Self::default_timezone(),
            poll_interval_secs: Self::default_poll_interval_secs(),
            cache_ttl_secs: Self::default_cache_ttl_secs(),
            fetch_timeout_secs: Self::default_fetch_timeout_secs(),
            trip_delay_threshold_secs: Self::default_trip_delay_threshold_secs(),
            stop_delay_threshold_secs: Self::default_stop_delay_threshold_secs(),
        }
    }
}

impl FeedSyncConfig {
    fn default_endpoint() -> String {
        "https://api.digitransit.fi/routing/v2/waltti/gtfs/v1".to_string()
    }
    fn default_timezone() -> String {
        "Europe/Helsinki".to_string()
    }
    fn default_poll_interval_secs() -> u64 {
        90
    }
    fn default_cache_ttl_secs() -> u64 {
        90
    }
    fn default_fetch_timeout_secs() -> u64 {
        10
    }
    fn default_trip_delay_threshold_secs() -> i32 {
        300
    }
    fn default_stop_delay_threshold_secs() -> i32 {
        60
    }

    pub fn parsed_timezone(&self) -> chrono_tz::Tz {
        self.timezone.parse().unwrap_or_else(|_| {
            tracing::warn!(
                timezone = %self.timezone,
                "Unknown timezone in config, falling back to Europe/Helsinki"
            );
            chrono_tz::Europe::Helsinki
        })
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::ReadError(e.to_string()))?;

        serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    pub fn validate(&self) {
        if self.feeds.is_empty() {
            panic!("Configuration error: 'feeds' must list at least one feed identifier");
        }
        if self.feed_sync.stop_delay_threshold_secs > self.feed_sync.trip_delay_threshold_secs {
            tracing::warn!(
                stop = self.feed_sync.stop_delay_threshold_secs,
                trip = self.feed_sync.trip_delay_threshold_secs,
                "Stop-level delay threshold exceeds the trip-level threshold; detail lists will be shorter than expected"
            );
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to parse config: {0}")]
    ParseError(String),
    #[error("Missing required credential: {0} is not set")]
    MissingCredential(&'static str),
}
