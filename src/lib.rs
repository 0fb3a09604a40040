//! # Matrix Station Core Library
//!
//! This library drives a small fixed-refresh RGB LED matrix by rotating among
//! independent display modules (an analog/digital clock and a weather panel).
//! Each module renders into its own off-screen [`canvas::FrameCanvas`] and the
//! [`scheduler::Scheduler`] presents whichever module is currently active.
//!
//! ## Design Philosophy
//!
//! ### One update = one time-slice
//! - Every module owns a [`pacer::SecondPacer`] and renders the frame that will
//!   be true at the *next* whole second, then sleeps until that boundary
//! - Deadlines only ever move forward; they are never recomputed from the wall
//!   clock on every tick, so long uptimes do not drift
//!
//! ### Stale data over blank data
//! - A [`WeatherSnapshot`] starts out full of placeholders and is mutated in
//!   place by successful parses
//! - A failed refresh leaves the previous snapshot untouched
//!
//! ### Data Flow
//! 1. **Live**: fetch the regional citypage XML → parse → apply → full redraw
//! 2. **Archive**: if the live document has no "Today" period and nothing is
//!    cached for today, walk the hourly archive backwards (2, 4, 6, 8 hours)
//! 3. **Between refreshes**: redraw only the date/time block
//!
//! ## Core Types
//!
//! - [`ModuleState`] / [`ModuleStatus`]: scheduler-imposed state and
//!   module-reported health
//! - [`WeatherType`]: closed set of conditions resolved from icon codes
//! - [`WeatherDay`] / [`WeatherSnapshot`]: the weather render state

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

// Module declarations
pub mod canvas;
pub mod citypage;
pub mod clock;
pub mod config;
pub mod fallback;
pub mod icons;
pub mod module;
pub mod pacer;
pub mod panel;
pub mod renderer;
pub mod scheduler;
pub mod weather;
pub mod weather_data;

/// Number of forecast slots shown in the bottom strip of the weather panel.
pub const FORECAST_SLOTS: usize = 4;

/// State imposed on a module by the scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModuleState {
    /// Currently shown; `update()` is being called.
    Active,
    /// Waiting for its turn in the rotation. Performs no work.
    Inactive,
    /// The scheduler is stopping; the module should release its resources.
    Exiting,
}

/// Health reported by a module.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModuleStatus {
    /// Nothing has been produced yet.
    Loading,
    Ok,
    /// The last refresh failed. Previously rendered data is still shown.
    Error,
}

/// Weather conditions the panel knows how to draw.
///
/// The set is closed: every Environment Canada icon code resolves to exactly
/// one variant through [`WeatherType::from_icon_code`], and anything outside
/// the table (including the `-1` "missing" code) is [`WeatherType::Unknown`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeatherType {
    Sun,
    PartlyCloudy,
    MostlyCloudy,
    LightFlurries,
    Snow,
    Cloud,
    LightRain,
    Rain,
    FreezingRain,
    RainSnow,
    Thundershowers,
    Unknown,
}

use WeatherType::*;

/// Icon code → condition lookup, indexed by the numeric `iconCode` value.
///
/// Codes 30-39 are the night variants of the day icons.
const ICON_CODES: [WeatherType; 48] = [
    Sun,            // 00 sunny
    Sun,            // 01 mainly sunny
    PartlyCloudy,   // 02 partly cloudy
    MostlyCloudy,   // 03 mostly cloudy
    MostlyCloudy,   // 04 increasing cloudiness
    PartlyCloudy,   // 05 decreasing cloudiness
    LightRain,      // 06 light rain shower
    RainSnow,       // 07 light rain shower and flurries
    LightFlurries,  // 08 light flurries
    Thundershowers, // 09 thunderstorm with showers
    Cloud,          // 10 cloudy
    Rain,           // 11 precipitation
    Rain,           // 12 rain
    Rain,           // 13 heavy rain
    FreezingRain,   // 14 freezing rain
    RainSnow,       // 15 rain and snow
    LightFlurries,  // 16 light snow
    Snow,           // 17 snow
    Snow,           // 18 heavy snow
    Thundershowers, // 19 thunderstorm
    Unknown,        // 20 unused
    Unknown,        // 21 unused
    Cloud,          // 22 increasing cloud
    Cloud,          // 23 haze
    Cloud,          // 24 fog
    Snow,           // 25 drifting snow
    FreezingRain,   // 26 ice crystals
    FreezingRain,   // 27 hail
    LightRain,      // 28 drizzle
    Unknown,        // 29 unused
    Sun,            // 30 clear
    Sun,            // 31 mainly clear
    PartlyCloudy,   // 32 partly cloudy
    MostlyCloudy,   // 33 mostly cloudy
    LightRain,      // 34 light rain shower
    RainSnow,       // 35 light rain shower and flurries
    LightFlurries,  // 36 light flurries
    Thundershowers, // 37 thunderstorm with showers
    Snow,           // 38 snow
    Thundershowers, // 39 thunderstorm
    Snow,           // 40 blowing snow
    Unknown,        // 41 funnel cloud
    Unknown,        // 42 tornado
    Cloud,          // 43 windy
    Cloud,          // 44 smoke
    Unknown,        // 45 dust
    Thundershowers, // 46 thunderstorm with hail
    Thundershowers, // 47 thunderstorm with dust
];

impl WeatherType {
    /// Resolve an `iconCode` value. Total: codes outside `0..=47` are `Unknown`.
    pub fn from_icon_code(code: i32) -> Self {
        usize::try_from(code)
            .ok()
            .and_then(|index| ICON_CODES.get(index).copied())
            .unwrap_or(Unknown)
    }

    /// Short human-readable name, used in logs and the terminal panel title.
    pub fn label(self) -> &'static str {
        match self {
            Sun => "sun",
            PartlyCloudy => "partly cloudy",
            MostlyCloudy => "mostly cloudy",
            LightFlurries => "light flurries",
            Snow => "snow",
            Cloud => "cloud",
            LightRain => "light rain",
            Rain => "rain",
            FreezingRain => "freezing rain",
            RainSnow => "rain/snow",
            Thundershowers => "thundershowers",
            Unknown => "unknown",
        }
    }
}

/// Adjusted "feels like" temperature. Wind chill and humidex are mutually
/// exclusive in a reading, so the kind travels with the value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum FeelsLike {
    WindChill(f64),
    Humidex(f64),
}

impl FeelsLike {
    pub fn value(self) -> f64 {
        match self {
            FeelsLike::WindChill(v) | FeelsLike::Humidex(v) => v,
        }
    }
}

/// One forecast period, or the current conditions.
///
/// Missing values are `None` and render as the `--` placeholder. `pop`
/// (probability of precipitation, 0-100) is `None` when the document leaves
/// it empty.
///
/// # Example
/// ```
/// use matrix_station_lib::{WeatherDay, WeatherType};
///
/// let day = WeatherDay::default();
/// assert_eq!(day.weather_type, WeatherType::Unknown);
/// assert!(day.temp_high.is_none());
/// assert!(day.pop.is_none());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeatherDay {
    /// Period label, e.g. "Today", "Tuesday" or "Tuesday night"
    pub day: String,
    /// Weekday name the period falls on, e.g. "Tuesday"
    pub weekday: String,
    /// Only populated for current conditions
    pub temp_cur: Option<f64>,
    /// Only populated for current conditions
    pub feels_like: Option<FeelsLike>,
    pub temp_high: Option<f64>,
    pub weather_type: WeatherType,
    pub text_summary: String,
    pub pop: Option<u8>,
}

impl Default for WeatherDay {
    fn default() -> Self {
        Self {
            day: String::new(),
            weekday: String::new(),
            temp_cur: None,
            feels_like: None,
            temp_high: None,
            weather_type: Unknown,
            text_summary: String::new(),
            pop: None,
        }
    }
}

/// Everything the weather panel draws.
///
/// Created empty at module construction and mutated in place by successful
/// refreshes (see `weather_data`). `forecast` never holds more than
/// [`FORECAST_SLOTS`] entries and never contains a "night" or "today" period.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// Issue time of the document, in the configured zone
    pub issued_at: Option<NaiveDateTime>,
    pub sunrise: Option<NaiveTime>,
    pub sunset: Option<NaiveTime>,
    pub current_conditions: WeatherDay,
    pub forecast: Vec<WeatherDay>,
    /// Date the current-day fields (high, pop, icon, summary) were captured for
    pub current_day_for: Option<NaiveDate>,
}

impl WeatherSnapshot {
    /// True when the current-day fields were captured for `date`.
    pub fn has_current_day_for(&self, date: NaiveDate) -> bool {
        self.current_day_for == Some(date)
    }

    /// Day when the local time lies between sunrise and sunset.
    /// Without rise/set data the panel stays in its day palette.
    pub fn is_daytime(&self, time: NaiveTime) -> bool {
        match (self.sunrise, self.sunset) {
            (Some(rise), Some(set)) => time >= rise && time < set,
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icon_table_is_total() {
        for code in -5..60 {
            let resolved = WeatherType::from_icon_code(code);
            if !(0..=47).contains(&code) {
                assert_eq!(resolved, Unknown, "code {code} is outside the table");
            }
        }
        assert_eq!(WeatherType::from_icon_code(-1), Unknown);
        assert_eq!(WeatherType::from_icon_code(48), Unknown);
    }

    #[test]
    fn icon_table_known_codes() {
        assert_eq!(WeatherType::from_icon_code(0), Sun);
        assert_eq!(WeatherType::from_icon_code(1), Sun);
        assert_eq!(WeatherType::from_icon_code(3), MostlyCloudy);
        assert_eq!(WeatherType::from_icon_code(12), Rain);
        assert_eq!(WeatherType::from_icon_code(14), FreezingRain);
        assert_eq!(WeatherType::from_icon_code(17), Snow);
        assert_eq!(WeatherType::from_icon_code(19), Thundershowers);
        assert_eq!(WeatherType::from_icon_code(30), Sun);
    }

    #[test]
    fn icon_lookup_is_deterministic() {
        for code in 0..48 {
            assert_eq!(
                WeatherType::from_icon_code(code),
                WeatherType::from_icon_code(code)
            );
        }
    }

    #[test]
    fn daytime_window() {
        let mut snapshot = WeatherSnapshot::default();
        let noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap();
        let late = NaiveTime::from_hms_opt(22, 0, 0).unwrap();
        assert!(snapshot.is_daytime(late), "unknown rise/set defaults to day");

        snapshot.sunrise = NaiveTime::from_hms_opt(7, 12, 0);
        snapshot.sunset = NaiveTime::from_hms_opt(17, 48, 0);
        assert!(snapshot.is_daytime(noon));
        assert!(!snapshot.is_daytime(late));
    }

    #[test]
    fn feels_like_value() {
        assert_eq!(FeelsLike::WindChill(-12.0).value(), -12.0);
        assert_eq!(FeelsLike::Humidex(31.0).value(), 31.0);
    }
}
