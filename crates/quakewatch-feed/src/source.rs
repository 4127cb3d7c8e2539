//! Feed sources and enum-based dispatch between them.
//!
//! [`FeedSource`] wraps each concrete source in an enum instead of a trait
//! object because async methods are not dyn-compatible. Both sources yield
//! a parsed [`EventSet`] or a [`FeedError`].

use std::time::Duration;

use chrono::{Days, NaiveDate, Utc};
use quakewatch_core::config::{FeedConfig, FeedSourceKind};
use quakewatch_types::EventSet;
use tracing::debug;

use crate::error::FeedError;
use crate::parse::parse_feature_collection;

/// A source of event snapshots.
pub enum FeedSource {
    /// The USGS FDSN event web service.
    Usgs(UsgsFeed),
    /// A GeoJSON file on disk.
    File(FileFeed),
}

impl FeedSource {
    /// Build the source selected by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Config`] if a file source has no path or the
    /// HTTP client cannot be built.
    pub fn from_config(config: &FeedConfig) -> Result<Self, FeedError> {
        match config.source {
            FeedSourceKind::Usgs => Ok(Self::Usgs(UsgsFeed::new(config)?)),
            FeedSourceKind::File => {
                let path = config.path.clone().ok_or_else(|| {
                    FeedError::Config("feed.path is required for a file source".to_owned())
                })?;
                Ok(Self::File(FileFeed::new(path)))
            }
        }
    }

    /// Fetch and parse one snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError`] if retrieval or parsing fails.
    pub async fn fetch(&self) -> Result<EventSet, FeedError> {
        match self {
            Self::Usgs(feed) => feed.fetch().await,
            Self::File(feed) => feed.fetch().await,
        }
    }

    /// Human-readable name for logging.
    pub const fn name(&self) -> &str {
        match self {
            Self::Usgs(_) => "usgs",
            Self::File(_) => "file",
        }
    }
}

// ---------------------------------------------------------------------------
// USGS FDSN event service
// ---------------------------------------------------------------------------

/// Client for the FDSN event query endpoint.
///
/// Requests `format=geojson` events from the last `lookback_days` days with
/// magnitude at least `min_magnitude`.
pub struct UsgsFeed {
    client: reqwest::Client,
    base_url: String,
    lookback_days: u32,
    min_magnitude: f64,
}

impl UsgsFeed {
    /// Create a client from feed settings.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Config`] if the HTTP client cannot be built.
    pub fn new(config: &FeedConfig) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| FeedError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            lookback_days: config.lookback_days,
            min_magnitude: config.min_magnitude,
        })
    }

    /// Query parameters for a request issued on `today`.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Config`] if the window start underflows the
    /// calendar.
    pub fn query_params(&self, today: NaiveDate) -> Result<Vec<(&'static str, String)>, FeedError> {
        let start = today
            .checked_sub_days(Days::new(u64::from(self.lookback_days)))
            .ok_or_else(|| {
                FeedError::Config(format!("lookback of {} days underflows", self.lookback_days))
            })?;
        Ok(vec![
            ("format", "geojson".to_owned()),
            ("starttime", start.format("%Y-%m-%d").to_string()),
            ("minmagnitude", self.min_magnitude.to_string()),
        ])
    }

    async fn fetch(&self) -> Result<EventSet, FeedError> {
        let params = self.query_params(Utc::now().date_naive())?;
        debug!(url = %self.base_url, ?params, "Requesting event feed");

        let response = self
            .client
            .get(&self.base_url)
            .query(&params)
            .send()
            .await
            .map_err(|e| FeedError::Transport(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(FeedError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| FeedError::Transport(format!("failed to read body: {e}")))?;
        parse_feature_collection(&body)
    }
}

// ---------------------------------------------------------------------------
// File replay
// ---------------------------------------------------------------------------

/// Reads a GeoJSON feed document from disk on every fetch.
pub struct FileFeed {
    path: String,
}

impl FileFeed {
    /// Create a replay source for `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    async fn fetch(&self) -> Result<EventSet, FeedError> {
        let body = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| FeedError::Io {
                path: self.path.clone(),
                source,
            })?;
        parse_feature_collection(&body)
    }
}
