use serde::{Deserialize, Deserializer};
use std::time::Duration;
use thiserror::Error;

use crate::sky::Site;
use crate::telemetry::{
    Backoff, SessionSettings, DEFAULT_HISTORY_CAPACITY, DEFAULT_INITIAL_BACKOFF,
    DEFAULT_MAX_BACKOFF, DEFAULT_PING_INTERVAL, DEFAULT_STALE_AFTER,
};
use crate::visibility::{RefreshSettings, DEFAULT_LOCATION_RETRY, DEFAULT_REFRESH_INTERVAL};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub telemetry: TelemetryConfig,
    pub site: SiteConfig,
    pub visibility: VisibilityConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub url: Option<String>,
    #[serde(deserialize_with = "deserialize_duration")]
    pub initial_backoff: Duration,
    #[serde(deserialize_with = "deserialize_duration")]
    pub max_backoff: Duration,
    #[serde(deserialize_with = "deserialize_duration")]
    pub ping_interval: Duration,
    #[serde(deserialize_with = "deserialize_duration")]
    pub stale_after: Duration,
    pub history_capacity: usize,
    /// Topics subscribed on startup by the CLI.
    pub topics: Vec<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            url: None,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
            max_backoff: DEFAULT_MAX_BACKOFF,
            ping_interval: DEFAULT_PING_INTERVAL,
            stale_after: DEFAULT_STALE_AFTER,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            topics: Vec::new(),
        }
    }
}

impl TelemetryConfig {
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            backoff: Backoff {
                initial: self.initial_backoff,
                max: self.max_backoff,
            },
            ping_interval: self.ping_interval,
            stale_after: self.stale_after,
            history_capacity: self.history_capacity,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.url {
            if !(url.starts_with("ws://") || url.starts_with("wss://")) {
                return Err(ConfigError::Invalid(format!(
                    "telemetry.url must be a ws:// or wss:// url, got {}",
                    url
                )));
            }
        }
        if self.initial_backoff.is_zero() || self.ping_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "telemetry.initial_backoff and telemetry.ping_interval must be positive".into(),
            ));
        }
        if self.max_backoff < self.initial_backoff {
            return Err(ConfigError::Invalid(
                "telemetry.max_backoff is shorter than telemetry.initial_backoff".into(),
            ));
        }
        if self.stale_after < self.ping_interval {
            return Err(ConfigError::Invalid(
                "telemetry.stale_after is shorter than telemetry.ping_interval".into(),
            ));
        }
        if self.history_capacity == 0 {
            return Err(ConfigError::Invalid(
                "telemetry.history_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Either `latitude_deg`/`longitude_deg` or `coordinates: "lat, lon"`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub latitude_deg: Option<f64>,
    pub longitude_deg: Option<f64>,
    pub coordinates: Option<String>,
}

impl SiteConfig {
    /// `Ok(None)` when no location is configured.
    pub fn site(&self) -> Result<Option<Site>, ConfigError> {
        match (&self.coordinates, self.latitude_deg, self.longitude_deg) {
            (Some(_), Some(_), _) | (Some(_), _, Some(_)) => Err(ConfigError::Invalid(
                "site: give either coordinates or latitude_deg/longitude_deg".into(),
            )),
            (Some(coordinates), None, None) => Site::from_coordinates(coordinates)
                .map(Some)
                .ok_or_else(|| {
                    ConfigError::Invalid(format!("site.coordinates not understood: {}", coordinates))
                }),
            (None, Some(lat), Some(lon)) => Site::new(lat, lon).map(Some).ok_or_else(|| {
                ConfigError::Invalid(format!("site out of range: {}, {}", lat, lon))
            }),
            (None, None, None) => Ok(None),
            (None, _, _) => Err(ConfigError::Invalid(
                "site needs both latitude_deg and longitude_deg".into(),
            )),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VisibilityConfig {
    #[serde(deserialize_with = "deserialize_duration")]
    pub refresh_interval: Duration,
    #[serde(deserialize_with = "deserialize_duration")]
    pub location_retry: Duration,
    pub max_location_attempts: Option<u32>,
}

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            location_retry: DEFAULT_LOCATION_RETRY,
            max_location_attempts: None,
        }
    }
}

impl VisibilityConfig {
    pub fn refresh_settings(&self) -> RefreshSettings {
        RefreshSettings {
            refresh_interval: self.refresh_interval,
            location_retry: self.location_retry,
            max_location_attempts: self.max_location_attempts,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.refresh_interval.is_zero() || self.location_retry.is_zero() {
            return Err(ConfigError::Invalid(
                "visibility intervals must be positive".into(),
            ));
        }
        if self.max_location_attempts == Some(0) {
            return Err(ConfigError::Invalid(
                "visibility.max_location_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Config::default());
        }
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.telemetry.validate()?;
        self.site.site()?;
        self.visibility.validate()
    }
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(s.trim()).map_err(serde::de::Error::custom)
}
