//! # Archived Forecast Fallback
//!
//! Later in the day the live citypage document drops its "Today" period, and
//! with it the day's high, icon and precipitation probability. When nothing has
//! been captured for today yet, this module walks the hourly datamart archive
//! backwards to find the last document that still had a "Today" period.
//!
//! ## Search
//!
//! - Offsets `step, 2·step, ..` hours before now (UTC), bounded by the
//!   configured lookback (2, 4, 6, 8 by default)
//! - Each offset is an archive directory; its HTML index is scanned for a
//!   filename ending in `{station}_en.xml`
//! - The matching file is fetched and parsed the same way as the live one
//! - A failure at one offset is logged and the next offset is tried
//!
//! Running out of offsets is [`WeatherError::ArchiveExhausted`], logged at
//! error level with every URL tried.

use crate::citypage::{self, ParsedForecast};
use crate::config::WeatherConfig;
use crate::weather_data::{ForecastSource, WeatherError};
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, error, info, warn};

/// A "Today" forecast found in the archive.
#[derive(Clone, Debug)]
pub struct ArchivedForecast {
    pub offset_hours: u32,
    pub url: String,
    /// `today` is always `Some`
    pub parsed: ParsedForecast,
}

/// Archive directory URL for the UTC hour containing `at`.
pub fn archive_url(template: &str, at: DateTime<Utc>, province: &str, station: &str) -> String {
    template
        .replace("{date}", &at.format("%Y%m%d").to_string())
        .replace("{hour}", &at.format("%H").to_string())
        .replace("{province}", province)
        .replace("{station}", station)
}

fn is_filename_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')
}

/// Latest filename in a directory index that ends with `{station}_en.xml`.
///
/// Names in the datamart start with their UTC timestamp, so the
/// lexicographically greatest match is the most recent.
pub fn find_in_listing(listing: &str, station: &str) -> Option<String> {
    let needle = format!("{station}_en.xml");
    listing
        .match_indices(&needle)
        .filter_map(|(end, _)| {
            let head = &listing[..end];
            let start = head
                .char_indices()
                .rev()
                .find(|&(_, c)| !is_filename_char(c))
                .map(|(i, c)| i + c.len_utf8())
                .unwrap_or(0);
            let name = &listing[start..end + needle.len()];
            // Reject a longer station code that merely ends with ours.
            let prefix = &listing[start..end];
            (prefix.is_empty() || prefix.ends_with('_')).then(|| name.to_string())
        })
        .max()
}

fn join(dir: &str, file: &str) -> String {
    if dir.ends_with('/') {
        format!("{dir}{file}")
    } else {
        format!("{dir}/{file}")
    }
}

async fn try_offset(
    source: &dyn ForecastSource,
    config: &WeatherConfig,
    dir: &str,
    tried: &mut Vec<String>,
) -> Result<Option<(String, ParsedForecast)>, WeatherError> {
    let listing = source.fetch_text(dir).await?;
    let Some(file) = find_in_listing(&listing, &config.station_code) else {
        debug!("no {} file listed in {}", config.station_code, dir);
        return Ok(None);
    };
    let url = join(dir, &file);
    tried.push(url.clone());
    let parsed = citypage::parse(&source.fetch_text(&url).await?, &config.zone)?;
    Ok(parsed.has_today().then_some((url, parsed)))
}

/// Walk the archive backwards from `now` for a document with a "Today" period.
pub async fn find_archived_today(
    source: &dyn ForecastSource,
    config: &WeatherConfig,
    now: DateTime<Utc>,
) -> Result<ArchivedForecast, WeatherError> {
    let step = config.archive_step_hours.max(1);
    let mut tried = Vec::new();
    let mut offset = step;

    while offset <= config.archive_max_lookback_hours {
        let at = now - Duration::hours(offset as i64);
        let dir = archive_url(
            &config.archive_url_template,
            at,
            &config.province,
            &config.station_code,
        );
        tried.push(dir.clone());

        match try_offset(source, config, &dir, &mut tried).await {
            Ok(Some((url, parsed))) => {
                info!("found archived Today forecast {}h back: {}", offset, url);
                return Ok(ArchivedForecast {
                    offset_hours: offset,
                    url,
                    parsed,
                });
            }
            Ok(None) => debug!("no Today period {}h back", offset),
            Err(e) => warn!("archive lookup {}h back failed: {}", offset, e),
        }
        offset += step;
    }

    let err = WeatherError::ArchiveExhausted {
        station: config.station_code.clone(),
        max_lookback_hours: config.archive_max_lookback_hours,
        tried,
    };
    error!("{}", err);
    Err(err)
}
