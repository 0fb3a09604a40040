//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the
//! `matrix-station.toml` file. The resulting [`Config`] is passed explicitly to
//! every module constructor: matrix dimensions, dwell times, clock geometry and
//! the weather station all live here rather than in process-wide statics.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "matrix-station.toml";

/// Application configuration loaded from matrix-station.toml
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub matrix: MatrixConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub clock: ClockConfig,
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Panel geometry and presentation
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct MatrixConfig {
    /// Matrix width in pixels
    pub width: u32,
    /// Matrix height in pixels
    pub height: u32,
    /// Fixed refresh cadence; `present` returns on this boundary
    pub refresh_rate_hz: u32,
    /// Render truecolor half-blocks in the terminal (false = `#` and spaces)
    pub color: bool,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            width: 64,
            height: 64,
            refresh_rate_hz: 90,
            color: true,
        }
    }
}

/// Rotation dwell times. The rotation order is clock, then weather.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub clock_dwell_secs: u64,
    pub weather_dwell_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            clock_dwell_secs: 15,
            weather_dwell_secs: 45,
        }
    }
}

impl ScheduleConfig {
    pub fn clock_dwell(&self) -> Duration {
        Duration::from_secs(self.clock_dwell_secs.max(1))
    }

    pub fn weather_dwell(&self) -> Duration {
        Duration::from_secs(self.weather_dwell_secs.max(1))
    }
}

/// Analog clock geometry. Hand radii are tuned independently.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Draw the HH:MM readout in the middle of the face
    pub digital_readout: bool,
    pub hour_hand_radius: i32,
    pub minute_hand_radius: i32,
    pub second_hand_radius: i32,
    /// Top-left corner of the digital readout bounding box
    pub readout_x: i32,
    pub readout_y: i32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            digital_readout: true,
            hour_hand_radius: 18,
            minute_hand_radius: 22,
            second_hand_radius: 20,
            readout_x: 22,
            readout_y: 28,
        }
    }
}

/// Environment Canada citypage station and refresh policy
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Citypage station code (e.g., "s0000439" for Kentville, NS)
    pub station_code: String,
    /// Two-letter province directory on the datamart
    pub province: String,
    /// Live citypage document URL
    pub live_url: String,
    /// Hourly archive directory. `{date}` (YYYYMMDD), `{hour}` (HH, UTC),
    /// `{province}` and `{station}` are substituted.
    pub archive_url_template: String,
    /// Zone labels of the `dateTime` / `riseSet` blocks to read, comma
    /// separated. Documents switch between standard and daylight labels
    /// (`AST` in winter, `ADT` in summer), so list both.
    pub zone: String,
    /// Minutes between weather refreshes
    pub refresh_minutes: u64,
    /// Archive lookback step and bound, in hours
    pub archive_step_hours: u32,
    pub archive_max_lookback_hours: u32,
    /// Per-request timeout; bounds how long a fetch can hold the rotation
    pub fetch_timeout_secs: u64,
    /// Last good snapshot is written here (empty disables the cache)
    pub cache_path: String,
    pub cache_ttl_minutes: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            station_code: "s0000439".to_string(),
            province: "NS".to_string(),
            live_url: "https://dd.weather.gc.ca/citypage_weather/xml/NS/s0000439_e.xml"
                .to_string(),
            archive_url_template:
                "https://dd.weather.gc.ca/{date}/WXO-DD/citypage_weather/{province}/{hour}/"
                    .to_string(),
            zone: "AST,ADT".to_string(),
            refresh_minutes: 20,
            archive_step_hours: 2,
            archive_max_lookback_hours: 8,
            fetch_timeout_secs: 10,
            cache_path: "/tmp/matrix_station_weather.json".to_string(),
            cache_ttl_minutes: 180,
        }
    }
}

impl WeatherConfig {
    pub fn refresh_interval(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.refresh_minutes.max(1) as i64)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }
}

/// Logging setup consumed by the binary
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence
    pub level: String,
    /// Append log lines to this file instead of stderr
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from matrix-station.toml
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    info!(
                        "Loaded configuration for station {} from {}",
                        config.weather.station_code,
                        path.display()
                    );
                    config
                }
                Err(e) => {
                    warn!("Invalid config file format in {}: {}", path.display(), e);
                    warn!("Using default configuration (Kentville, NS)");
                    Self::default()
                }
            },
            Err(_) => {
                info!("No config file found, using default configuration (Kentville, NS)");
                Self::default()
            }
        }
    }

    /// Save current configuration as pretty TOML
    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path.as_ref(), contents)?;
        info!("Configuration saved to {}", path.as_ref().display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.matrix.width, 64);
        assert_eq!(config.matrix.height, 64);
        assert_eq!(config.schedule.clock_dwell(), Duration::from_secs(15));
        assert_eq!(config.schedule.weather_dwell(), Duration::from_secs(45));
        assert_eq!(config.weather.station_code, "s0000439");
        assert_eq!(config.weather.refresh_minutes, 20);
        assert_eq!(config.weather.archive_max_lookback_hours, 8);
        assert_eq!(config.weather.zone, "AST,ADT");
    }

    #[test]
    fn test_config_roundtrip() {
        let file = NamedTempFile::new().unwrap();
        let mut config = Config::default();
        config.weather.station_code = "s0000430".to_string();
        config.logging.file = Some("matrix.log".to_string());
        config.save(file.path()).unwrap();

        let parsed = Config::load_from_path(file.path());
        assert_eq!(parsed.weather.station_code, "s0000430");
        assert_eq!(parsed.logging.file.as_deref(), Some("matrix.log"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let file = NamedTempFile::new().unwrap();
        fs::write(
            file.path(),
            "[schedule]\nclock_dwell_secs = 5\n\n[weather]\nzone = \"UTC\"\n",
        )
        .unwrap();

        let config = Config::load_from_path(file.path());
        assert_eq!(config.schedule.clock_dwell_secs, 5);
        assert_eq!(config.schedule.weather_dwell_secs, 45);
        assert_eq!(config.weather.zone, "UTC");
        assert_eq!(config.weather.province, "NS");
    }

    #[test]
    fn test_invalid_file_falls_back() {
        let file = NamedTempFile::new().unwrap();
        fs::write(file.path(), "matrix = [not toml").unwrap();
        let config = Config::load_from_path(file.path());
        assert_eq!(config.matrix.refresh_rate_hz, 90);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let config = Config::load_from_path("/nonexistent/path");
        // Should fallback to default
        assert_eq!(config.weather.station_code, "s0000439");
    }

    #[test]
    fn test_zero_dwell_is_clamped() {
        let schedule = ScheduleConfig {
            clock_dwell_secs: 0,
            weather_dwell_secs: 0,
        };
        assert_eq!(schedule.clock_dwell(), Duration::from_secs(1));
        assert_eq!(schedule.weather_dwell(), Duration::from_secs(1));
    }
}
