//! # Weather Data Fetching and Caching
//!
//! This module handles all network operations for the weather panel: fetching
//! the live citypage document, applying it to the [`WeatherSnapshot`], falling
//! back to the hourly archive for the current-day forecast, and keeping the
//! last good snapshot on disk.
//!
//! ## Data Source
//!
//! ### Environment Canada Datamart
//! - **Live**: `citypage_weather/xml/{province}/{station}_e.xml`
//! - **Archive**: one directory per UTC hour, listing files named
//!   `..._{station}_en.xml`
//! - **Format**: XML, see [`crate::citypage`]
//!
//! ### Refresh Pipeline
//! 1. **Fetch**: one GET of the live document, no retry
//! 2. **Parse**: extract current conditions, "Today" and the forecast strip
//! 3. **Fallback**: without a "Today" period and nothing captured for today,
//!    walk the archive (see [`crate::fallback`])
//! 4. **Apply**: mutate the snapshot in place
//!
//! A fetch or parse failure returns before step 4, so the snapshot the panel
//! is showing stays exactly as it was.
//!
//! ## Caching Strategy
//! - **Location**: configurable, `/tmp/matrix_station_weather.json` by default
//! - **Format**: JSON of the whole snapshot
//! - **TTL**: file modification time checked against `cache_ttl_minutes`
//! - **Failures**: logged by the caller and otherwise ignored

use crate::citypage::{self, ParsedForecast};
use crate::config::WeatherConfig;
use crate::fallback;
use crate::{WeatherDay, WeatherSnapshot, FORECAST_SLOTS};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use std::{fs, io};
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur while refreshing weather data.
#[derive(Error, Debug)]
pub enum WeatherError {
    /// The request could not complete (connect, timeout, HTTP status)
    #[error("fetch of {url} failed: {reason}")]
    Transport { url: String, reason: String },

    /// The document parsed but a required block is missing or invalid
    #[error("malformed citypage document: {0}")]
    Malformed(String),

    /// The document is not well-formed XML
    #[error("XML error: {0}")]
    Xml(#[from] roxmltree::Error),

    /// No archived document within the lookback window had a "Today" period
    #[error(
        "no archived forecast with a Today period for {station} within {max_lookback_hours}h (tried: {})",
        .tried.join(", ")
    )]
    ArchiveExhausted {
        station: String,
        max_lookback_hours: u32,
        tried: Vec<String>,
    },

    /// Snapshot cache could not be read or written
    #[error("cache IO: {0}")]
    Cache(#[from] io::Error),
}

/// Where documents and archive listings come from.
#[async_trait]
pub trait ForecastSource: Send + Sync {
    /// GET `url` and return the body as text.
    async fn fetch_text(&self, url: &str) -> Result<String, WeatherError>;
}

#[async_trait]
impl<S: ForecastSource + ?Sized> ForecastSource for Arc<S> {
    async fn fetch_text(&self, url: &str) -> Result<String, WeatherError> {
        (**self).fetch_text(url).await
    }
}

/// [`ForecastSource`] over HTTPS with certificate validation left on.
pub struct HttpForecastSource {
    client: reqwest::Client,
}

impl HttpForecastSource {
    /// Build a client whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("matrix-station/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ForecastSource for HttpForecastSource {
    async fn fetch_text(&self, url: &str) -> Result<String, WeatherError> {
        let transport = |e: reqwest::Error| WeatherError::Transport {
            url: url.to_string(),
            reason: e.to_string(),
        };
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(transport)?;
        response.text().await.map_err(transport)
    }
}

/// How a successful refresh obtained its current-day fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The live document had a "Today" period
    Live,
    /// Kept the current-day fields already captured for this date
    Retained,
    /// Current-day fields came from an archived document
    Archived { offset_hours: u32 },
}

impl WeatherSnapshot {
    /// Apply a parsed document in place.
    ///
    /// Current temperature and feels-like always come from `parsed`. The
    /// current-day fields (high, icon, summary, pop) are replaced only when
    /// `today` is given, and are otherwise retained. An empty forecast strip
    /// keeps the previous one.
    pub fn apply(&mut self, parsed: ParsedForecast, today: Option<WeatherDay>) {
        let date = parsed.issued_at.date();
        self.issued_at = Some(parsed.issued_at);
        if parsed.sunrise.is_some() {
            self.sunrise = parsed.sunrise;
        }
        if parsed.sunset.is_some() {
            self.sunset = parsed.sunset;
        }

        let current = &mut self.current_conditions;
        current.day = parsed.current.day;
        current.weekday = parsed.current.weekday;
        current.temp_cur = parsed.current.temp_cur;
        current.feels_like = parsed.current.feels_like;

        if let Some(today) = today {
            current.temp_high = today.temp_high;
            current.weather_type = today.weather_type;
            current.text_summary = today.text_summary;
            current.pop = today.pop;
            self.current_day_for = Some(date);
        }

        if !parsed.forecast.is_empty() {
            self.forecast = parsed.forecast;
            self.forecast.truncate(FORECAST_SLOTS);
        }
    }
}

/// Run one refresh cycle against `snapshot`.
///
/// Transport and parse failures of the live document return early without
/// touching the snapshot. When the archive fallback is exhausted the live
/// fields are still applied before the error is returned.
pub async fn refresh(
    snapshot: &mut WeatherSnapshot,
    source: &dyn ForecastSource,
    config: &WeatherConfig,
    now: DateTime<Utc>,
) -> Result<RefreshOutcome, WeatherError> {
    let body = source.fetch_text(&config.live_url).await?;
    let mut parsed = citypage::parse(&body, &config.zone)?;
    let date = parsed.issued_at.date();
    debug!(
        "live document issued {} with {} forecast periods",
        parsed.issued_at,
        parsed.forecast.len()
    );

    if let Some(today) = parsed.today.take() {
        snapshot.apply(parsed, Some(today));
        return Ok(RefreshOutcome::Live);
    }

    if snapshot.has_current_day_for(date) {
        snapshot.apply(parsed, None);
        return Ok(RefreshOutcome::Retained);
    }

    info!("live document has no Today period, searching the archive");
    match fallback::find_archived_today(source, config, now).await {
        Ok(archived) => {
            snapshot.apply(parsed, archived.parsed.today);
            Ok(RefreshOutcome::Archived {
                offset_hours: archived.offset_hours,
            })
        }
        Err(e) => {
            snapshot.apply(parsed, None);
            Err(e)
        }
    }
}

/// Load a cached snapshot if the file is younger than `ttl`.
pub fn load_cache(path: &Path, ttl: Duration) -> Result<WeatherSnapshot, WeatherError> {
    let meta = fs::metadata(path)?;
    let age = SystemTime::now()
        .duration_since(meta.modified()?)
        .unwrap_or_default();
    if age > ttl {
        return Err(io::Error::other("stale").into());
    }
    let data = fs::read(path)?;
    let snapshot = serde_json::from_slice(&data).map_err(io::Error::from)?;
    Ok(snapshot)
}

/// Write the snapshot as JSON.
pub fn save_cache(path: &Path, snapshot: &WeatherSnapshot) -> Result<(), WeatherError> {
    let data = serde_json::to_vec(snapshot).map_err(io::Error::from)?;
    fs::write(path, data)?;
    Ok(())
}
