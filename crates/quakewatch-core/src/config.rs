//! Configuration loading and typed config structures for Quakewatch.
//!
//! The canonical configuration lives in `quakewatch.yaml`. This module
//! defines strongly-typed structs that mirror the YAML structure, and
//! provides a loader that reads and validates the file. Every field has a
//! default, so an empty or missing file yields a working configuration.

use std::path::Path;

use serde::Deserialize;

use crate::cluster::PairStrategy;
use crate::planner::DegenerateZonePolicy;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is outside its allowed range.
    #[error("invalid config value: {0}")]
    Invalid(String),
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
///
/// Mirrors the structure of `quakewatch.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct QuakewatchConfig {
    /// Diff, clustering, and geometry parameters.
    #[serde(default)]
    pub planner: PlannerConfig,

    /// Upstream event feed.
    #[serde(default)]
    pub feed: FeedConfig,

    /// Periodic refresh trigger.
    #[serde(default)]
    pub refresh: RefreshConfig,

    /// HTTP layer server.
    #[serde(default)]
    pub observer: ObserverConfig,

    /// GeoJSON file output.
    #[serde(default)]
    pub output: OutputConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl QuakewatchConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `QUAKEWATCH_FEED_URL` overrides `feed.base_url`
    /// - `QUAKEWATCH_REFRESH_INTERVAL_MS` overrides `refresh.interval_ms`
    /// - `QUAKEWATCH_OBSERVER_PORT` overrides `observer.port`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, applying environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        Self::parse_with(yaml, |key| std::env::var(key).ok())
    }

    /// Parse configuration, resolving overrides through `lookup` instead of
    /// the process environment.
    ///
    /// # Errors
    ///
    /// Same as [`parse`](Self::parse).
    pub fn parse_with<F>(yaml: &str, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment-style overrides resolved through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if an override value does not parse.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("QUAKEWATCH_FEED_URL") {
            self.feed.base_url = url;
        }
        if let Some(val) = lookup("QUAKEWATCH_REFRESH_INTERVAL_MS") {
            self.refresh.interval_ms = val.parse().map_err(|e| {
                ConfigError::Invalid(format!("QUAKEWATCH_REFRESH_INTERVAL_MS={val}: {e}"))
            })?;
        }
        if let Some(val) = lookup("QUAKEWATCH_OBSERVER_PORT") {
            self.observer.port = val.parse().map_err(|e| {
                ConfigError::Invalid(format!("QUAKEWATCH_OBSERVER_PORT={val}: {e}"))
            })?;
        }
        Ok(())
    }

    /// Check value ranges that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.planner.validate()?;
        if !self.feed.min_magnitude.is_finite() || self.feed.min_magnitude < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "feed.min_magnitude must be a non-negative number, got {}",
                self.feed.min_magnitude
            )));
        }
        if self.refresh.interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "refresh.interval_ms must be greater than zero".to_owned(),
            ));
        }
        if self.feed.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "feed.request_timeout_ms must be greater than zero".to_owned(),
            ));
        }
        if self.feed.source == FeedSourceKind::File && self.feed.path.is_none() {
            return Err(ConfigError::Invalid(
                "feed.path is required when feed.source is `file`".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Parameters for one planner cycle.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlannerConfig {
    /// Magnitude at or above which a new event is reported.
    #[serde(default = "default_min_magnitude")]
    pub min_magnitude: f64,

    /// Pairs at most this far apart (km) produce a risk zone.
    #[serde(default = "default_proximity_threshold_km")]
    pub proximity_threshold_km: f64,

    /// Sides of the circle approximation.
    #[serde(default = "default_polygon_steps")]
    pub polygon_steps: u32,

    /// Candidate pair generator.
    #[serde(default)]
    pub pair_strategy: PairStrategy,

    /// What to do with zero-radius zones from co-located pairs.
    #[serde(default)]
    pub degenerate_zones: DegenerateZonePolicy,
}

impl PlannerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.min_magnitude.is_finite() || self.min_magnitude < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "planner.min_magnitude must be a non-negative number, got {}",
                self.min_magnitude
            )));
        }
        if !self.proximity_threshold_km.is_finite() || self.proximity_threshold_km < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "planner.proximity_threshold_km must be a non-negative number, got {}",
                self.proximity_threshold_km
            )));
        }
        if self.polygon_steps < quakewatch_geo::MIN_STEPS {
            return Err(ConfigError::Invalid(format!(
                "planner.polygon_steps must be at least {}, got {}",
                quakewatch_geo::MIN_STEPS,
                self.polygon_steps
            )));
        }
        Ok(())
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            min_magnitude: default_min_magnitude(),
            proximity_threshold_km: default_proximity_threshold_km(),
            polygon_steps: default_polygon_steps(),
            pair_strategy: PairStrategy::default(),
            degenerate_zones: DegenerateZonePolicy::default(),
        }
    }
}

/// Where events come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedSourceKind {
    /// The USGS FDSN event web service.
    #[default]
    Usgs,
    /// A GeoJSON file on disk, re-read every cycle.
    File,
}

/// Upstream feed configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FeedConfig {
    /// Which source to use.
    #[serde(default)]
    pub source: FeedSourceKind,

    /// FDSN event query endpoint.
    #[serde(default = "default_feed_base_url")]
    pub base_url: String,

    /// How many days back the query window starts.
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,

    /// Server-side magnitude floor for the query.
    #[serde(default = "default_min_magnitude")]
    pub min_magnitude: f64,

    /// Maximum time for one fetch, in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// GeoJSON file to replay when `source` is `file`.
    #[serde(default)]
    pub path: Option<String>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            source: FeedSourceKind::default(),
            base_url: default_feed_base_url(),
            lookback_days: default_lookback_days(),
            min_magnitude: default_min_magnitude(),
            request_timeout_ms: default_request_timeout_ms(),
            path: None,
        }
    }
}

/// Refresh trigger configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RefreshConfig {
    /// Milliseconds between cycles.
    #[serde(default = "default_refresh_interval_ms")]
    pub interval_ms: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_refresh_interval_ms(),
        }
    }
}

/// Layer server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ObserverConfig {
    /// Whether to serve layers over HTTP.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Bind host.
    #[serde(default = "default_observer_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_observer_port")]
    pub port: u16,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: default_observer_host(),
            port: default_observer_port(),
        }
    }
}

/// GeoJSON file output configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OutputConfig {
    /// Directory for `quake-points.geojson` and `risk-area.geojson`.
    /// No files are written when unset.
    #[serde(default)]
    pub dir: Option<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_min_magnitude() -> f64 {
    5.0
}

const fn default_proximity_threshold_km() -> f64 {
    20.0
}

const fn default_polygon_steps() -> u32 {
    64
}

fn default_feed_base_url() -> String {
    "https://earthquake.usgs.gov/fdsnws/event/1/query".to_owned()
}

const fn default_lookback_days() -> u32 {
    30
}

const fn default_request_timeout_ms() -> u64 {
    10_000
}

const fn default_refresh_interval_ms() -> u64 {
    60_000
}

fn default_observer_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_observer_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_true() -> bool {
    true
}
