//! # Citypage XML Parsing
//!
//! Extracts the fields the weather panel needs from an Environment Canada
//! citypage document:
//!
//! ```text
//! siteData
//! ├── dateTime[@zone]                      year, month, day, hour, minute
//! ├── riseSet/dateTime[@name][@zone]       sunrise / sunset hour, minute
//! ├── currentConditions                    temperature, windChill | humidex
//! └── forecastGroup/forecast*
//!     ├── period[@textForecastName]        label; text is the weekday
//!     ├── temperatures/temperature[@class=high]
//!     └── abbreviatedForecast              iconCode, pop, textSummary
//! ```
//!
//! Only direct children are matched at each level: `currentConditions` and
//! `forecastGroup` carry their own `dateTime` and `temperature` nodes that
//! must not be confused with the ones above.

use crate::weather_data::WeatherError;
use crate::{FeelsLike, WeatherDay, WeatherType};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use roxmltree::{Document, Node};
use std::str::FromStr;

/// Result of parsing one citypage document.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedForecast {
    pub issued_at: NaiveDateTime,
    pub sunrise: Option<NaiveTime>,
    pub sunset: Option<NaiveTime>,
    /// Current temperature and feels-like only
    pub current: WeatherDay,
    /// First period, when it is labelled "Today"
    pub today: Option<WeatherDay>,
    /// Up to four periods, none of them "today" or "night"
    pub forecast: Vec<WeatherDay>,
}

impl ParsedForecast {
    pub fn has_today(&self) -> bool {
        self.today.is_some()
    }
}

fn child<'a, 'i>(node: Node<'a, 'i>, name: &str) -> Option<Node<'a, 'i>> {
    node.children().find(|n| n.has_tag_name(name))
}

fn child_text<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    child(node, name)
        .and_then(|n| n.text())
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn child_number<T: FromStr>(node: Node<'_, '_>, name: &str) -> Option<T> {
    child_text(node, name).and_then(|t| t.parse().ok())
}

fn malformed(what: &str) -> WeatherError {
    WeatherError::Malformed(what.to_string())
}

/// Labels excluded from the forecast strip.
pub fn is_excluded_period(label: &str) -> bool {
    let label = label.to_lowercase();
    label.contains("night") || label.contains("today")
}

/// True when the node's `zone` attribute is one of the comma-separated
/// labels in `zones`.
fn in_zone(node: Node<'_, '_>, zones: &str) -> bool {
    node.attribute("zone")
        .is_some_and(|zone| zones.split(',').any(|z| z.trim() == zone))
}

/// Parse a citypage document, reading time blocks for any of the
/// comma-separated zone labels in `zone` (e.g. `AST,ADT`).
pub fn parse(xml: &str, zone: &str) -> Result<ParsedForecast, WeatherError> {
    let doc = Document::parse(xml)?;
    let root = doc.root_element();
    if !root.has_tag_name("siteData") {
        return Err(malformed("root element is not siteData"));
    }

    let issued = root
        .children()
        .find(|n| n.has_tag_name("dateTime") && in_zone(*n, zone))
        .ok_or_else(|| WeatherError::Malformed(format!("no dateTime block for zone {zone}")))?;
    let issued_at = parse_issued(issued)?;

    let (sunrise, sunset) = match child(root, "riseSet") {
        Some(rise_set) => (
            rise_set_time(rise_set, "sunrise", zone),
            rise_set_time(rise_set, "sunset", zone),
        ),
        None => (None, None),
    };

    let conditions =
        child(root, "currentConditions").ok_or_else(|| malformed("missing currentConditions"))?;
    let current = WeatherDay {
        day: "Now".to_string(),
        weekday: child(issued, "day")
            .and_then(|d| d.attribute("name"))
            .unwrap_or_default()
            .to_string(),
        temp_cur: child_number(conditions, "temperature"),
        feels_like: feels_like(conditions),
        ..WeatherDay::default()
    };

    let group = child(root, "forecastGroup").ok_or_else(|| malformed("missing forecastGroup"))?;
    let periods: Vec<WeatherDay> = group
        .children()
        .filter(|n| n.has_tag_name("forecast"))
        .map(parse_period)
        .collect();

    let today = periods
        .first()
        .filter(|p| p.day.eq_ignore_ascii_case("today"))
        .cloned();
    let forecast = periods
        .into_iter()
        .filter(|p| !is_excluded_period(&p.day))
        .take(crate::FORECAST_SLOTS)
        .collect();

    Ok(ParsedForecast {
        issued_at,
        sunrise,
        sunset,
        current,
        today,
        forecast,
    })
}

fn parse_issued(node: Node<'_, '_>) -> Result<NaiveDateTime, WeatherError> {
    let year: i32 = child_number(node, "year").ok_or_else(|| malformed("dateTime year"))?;
    let month: u32 = child_number(node, "month").ok_or_else(|| malformed("dateTime month"))?;
    let day: u32 = child_number(node, "day").ok_or_else(|| malformed("dateTime day"))?;
    let hour: u32 = child_number(node, "hour").ok_or_else(|| malformed("dateTime hour"))?;
    let minute: u32 = child_number(node, "minute").ok_or_else(|| malformed("dateTime minute"))?;
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, 0))
        .ok_or_else(|| {
            WeatherError::Malformed(format!(
                "invalid issue time {year}-{month}-{day} {hour}:{minute}"
            ))
        })
}

fn rise_set_time(rise_set: Node<'_, '_>, name: &str, zone: &str) -> Option<NaiveTime> {
    let node = rise_set.children().find(|n| {
        n.has_tag_name("dateTime") && n.attribute("name") == Some(name) && in_zone(*n, zone)
    })?;
    NaiveTime::from_hms_opt(child_number(node, "hour")?, child_number(node, "minute")?, 0)
}

fn feels_like(conditions: Node<'_, '_>) -> Option<FeelsLike> {
    if let Some(v) = child_number(conditions, "windChill") {
        return Some(FeelsLike::WindChill(v));
    }
    child_number(conditions, "humidex").map(FeelsLike::Humidex)
}

fn parse_period(forecast: Node<'_, '_>) -> WeatherDay {
    let period = child(forecast, "period");
    let day = period
        .and_then(|p| p.attribute("textForecastName"))
        .unwrap_or_default()
        .trim()
        .to_string();
    let weekday = period
        .and_then(|p| p.text())
        .unwrap_or_default()
        .trim()
        .to_string();

    let temp_high = child(forecast, "temperatures").and_then(|temps| {
        temps
            .children()
            .find(|n| n.has_tag_name("temperature") && n.attribute("class") == Some("high"))
            .and_then(|n| n.text())
            .and_then(|t| t.trim().parse().ok())
    });

    let abbreviated = child(forecast, "abbreviatedForecast");
    let icon_code = abbreviated
        .and_then(|a| child_number::<i32>(a, "iconCode"))
        .unwrap_or(-1);
    let pop = abbreviated
        .and_then(|a| child_number::<i32>(a, "pop"))
        .map(|p| p.clamp(0, 100) as u8);
    let text_summary = abbreviated
        .and_then(|a| child_text(a, "textSummary"))
        .unwrap_or_default()
        .to_string();

    WeatherDay {
        day,
        weekday,
        temp_cur: None,
        feels_like: None,
        temp_high,
        weather_type: WeatherType::from_icon_code(icon_code),
        text_summary,
        pop,
    }
}

/// Synthetic documents shared by the parser and pipeline tests.
#[cfg(test)]
pub(crate) mod fixtures {
    /// One `<forecast>` element.
    pub fn period(label: &str, weekday: &str, high: Option<i32>, icon: &str, pop: &str) -> String {
        let temperature = match high {
            Some(h) => format!(r#"<temperature unitType="metric" units="C" class="high">{h}</temperature>"#),
            None => r#"<temperature unitType="metric" units="C" class="low">-3</temperature>"#.to_string(),
        };
        format!(
            r#"<forecast>
      <period textForecastName="{label}">{weekday}</period>
      <textSummary>Long text.</textSummary>
      <abbreviatedForecast>
        <iconCode format="gif">{icon}</iconCode>
        <pop units="%">{pop}</pop>
        <textSummary>{label} summary</textSummary>
      </abbreviatedForecast>
      <temperatures><textSummary>Temp.</textSummary>{temperature}</temperatures>
    </forecast>"#
        )
    }

    /// A full citypage document. `conditions_extra` lands inside
    /// `currentConditions` (wind chill, humidex).
    pub fn document(temperature: &str, conditions_extra: &str, periods: &[String]) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<siteData xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <dateTime name="xmlCreation" zone="UTC" UTCOffset="0">
    <year>2025</year><month name="January">01</month><day name="Wednesday">15</day>
    <hour>18</hour><minute>05</minute>
  </dateTime>
  <dateTime name="xmlCreation" zone="AST" UTCOffset="-4">
    <year>2025</year><month name="January">01</month><day name="Wednesday">15</day>
    <hour>14</hour><minute>05</minute>
  </dateTime>
  <currentConditions>
    <dateTime name="observation" zone="AST"><year>2024</year><month>12</month><day>31</day><hour>1</hour><minute>0</minute></dateTime>
    <iconCode format="gif">10</iconCode>
    <temperature unitType="metric" units="C">{temperature}</temperature>
    {conditions_extra}
  </currentConditions>
  <forecastGroup>
    <regionalNormals><temperature unitType="metric" units="C" class="high">-1</temperature></regionalNormals>
    {}
  </forecastGroup>
  <riseSet>
    <dateTime name="sunrise" zone="UTC"><hour>11</hour><minute>40</minute></dateTime>
    <dateTime name="sunrise" zone="AST"><hour>07</hour><minute>40</minute></dateTime>
    <dateTime name="sunset" zone="UTC"><hour>20</hour><minute>50</minute></dateTime>
    <dateTime name="sunset" zone="AST"><hour>16</hour><minute>50</minute></dateTime>
  </riseSet>
</siteData>"#,
            periods.join("\n")
        )
    }

    /// Today plus a week of day/night periods.
    pub fn week(today_high: i32, today_icon: &str, today_pop: &str) -> Vec<String> {
        vec![
            period("Today", "Wednesday", Some(today_high), today_icon, today_pop),
            period("Tonight", "Wednesday night", None, "30", ""),
            period("Thursday", "Thursday", Some(5), "12", "30"),
            period("Thursday night", "Thursday night", None, "38", "60"),
            period("Friday", "Friday", Some(-4), "17", "0"),
            period("Friday night", "Friday night", None, "31", ""),
            period("Saturday", "Saturday", Some(-12), "02", ""),
            period("Saturday night", "Saturday night", None, "36", "40"),
            period("Sunday", "Sunday", Some(1), "06", "70"),
            period("Sunday night", "Sunday night", None, "33", ""),
            period("Monday", "Monday", Some(2), "03", ""),
        ]
    }
}
