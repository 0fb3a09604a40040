//! Fetch → parse → apply → render, with an in-memory forecast source.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use matrix_station_lib::canvas::FrameCanvas;
use matrix_station_lib::config::WeatherConfig;
use matrix_station_lib::renderer::{self, WeatherView};
use matrix_station_lib::weather_data::{self, ForecastSource, RefreshOutcome, WeatherError};
use matrix_station_lib::{WeatherSnapshot, WeatherType};
use std::collections::HashMap;

/// Serves fixed bodies; any other URL fails like a dropped connection.
struct FixedSource(HashMap<String, String>);

impl FixedSource {
    fn live(config: &WeatherConfig, body: String) -> Self {
        Self(HashMap::from([(config.live_url.clone(), body)]))
    }

    fn offline() -> Self {
        Self(HashMap::new())
    }
}

#[async_trait]
impl ForecastSource for FixedSource {
    async fn fetch_text(&self, url: &str) -> Result<String, WeatherError> {
        self.0.get(url).cloned().ok_or_else(|| WeatherError::Transport {
            url: url.to_string(),
            reason: "connection refused".to_string(),
        })
    }
}

fn citypage(temperature: &str, today_pop: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<siteData>
  <dateTime name="xmlCreation" zone="ADT" UTCOffset="-3">
    <year>2025</year><month name="July">07</month><day name="Tuesday">22</day>
    <hour>09</hour><minute>30</minute>
  </dateTime>
  <currentConditions>
    <temperature unitType="metric" units="C">{temperature}</temperature>
    <humidex unitType="metric">27</humidex>
  </currentConditions>
  <forecastGroup>
    <forecast>
      <period textForecastName="Today">Tuesday</period>
      <abbreviatedForecast>
        <iconCode format="gif">01</iconCode>
        <pop units="%">{today_pop}</pop>
        <textSummary>Mainly sunny</textSummary>
      </abbreviatedForecast>
      <temperatures>
        <temperature unitType="metric" units="C" class="high">23</temperature>
      </temperatures>
    </forecast>
    <forecast>
      <period textForecastName="Tonight">Tuesday night</period>
      <abbreviatedForecast><iconCode format="gif">31</iconCode><pop units="%"></pop><textSummary>Clear</textSummary></abbreviatedForecast>
      <temperatures><temperature unitType="metric" units="C" class="low">14</temperature></temperatures>
    </forecast>
    <forecast>
      <period textForecastName="Wednesday">Wednesday</period>
      <abbreviatedForecast><iconCode format="gif">12</iconCode><pop units="%">30</pop><textSummary>Rain</textSummary></abbreviatedForecast>
      <temperatures><temperature unitType="metric" units="C" class="high">19</temperature></temperatures>
    </forecast>
  </forecastGroup>
  <riseSet>
    <dateTime name="sunrise" zone="ADT"><hour>05</hour><minute>51</minute></dateTime>
    <dateTime name="sunset" zone="ADT"><hour>21</hour><minute>01</minute></dateTime>
  </riseSet>
</siteData>"#
    )
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 7, 22, 12, 30, 0).unwrap()
}

fn local() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 7, 22)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap()
}

async fn render(body: String) -> WeatherView {
    let config = WeatherConfig::default();
    let source = FixedSource::live(&config, body);
    let mut snapshot = WeatherSnapshot::default();
    let outcome = weather_data::refresh(&mut snapshot, &source, &config, now())
        .await
        .unwrap();
    assert_eq!(outcome, RefreshOutcome::Live);

    let mut canvas = FrameCanvas::new(64, 64);
    let view = renderer::draw_full(&mut canvas, &snapshot, local()).unwrap();
    assert!(canvas.lit_pixels() > 0);
    view
}

#[tokio::test]
async fn synthetic_document_renders_expected_text() {
    let view = render(citypage("21.4", "10")).await;

    assert_eq!(view.current_temp, "21°");
    assert_eq!(view.high, "23°");
    assert_eq!(view.icon, WeatherType::Sun);
    assert_eq!(view.feels_like.as_deref(), Some("27°"));
    assert_eq!(view.pop.as_deref(), Some("10%"));

    assert_eq!(view.forecast.len(), 1);
    assert_eq!(view.forecast[0].weekday, "WED");
    assert_eq!(view.forecast[0].icon, WeatherType::Rain);
    assert_eq!(view.forecast[0].high, "19°");
    assert_eq!(view.forecast[0].pop.as_deref(), Some("30%"));
}

#[tokio::test]
async fn precipitation_text_only_when_positive() {
    assert_eq!(render(citypage("21.4", "0")).await.pop, None);
    assert_eq!(render(citypage("21.4", "")).await.pop, None);
    assert_eq!(render(citypage("21.4", "30")).await.pop.as_deref(), Some("30%"));
}

#[tokio::test]
async fn failed_fetch_leaves_current_conditions_unchanged() {
    let config = WeatherConfig::default();
    let mut snapshot = WeatherSnapshot::default();
    let source = FixedSource::live(&config, citypage("21.4", "10"));
    weather_data::refresh(&mut snapshot, &source, &config, now())
        .await
        .unwrap();
    let before = snapshot.current_conditions.clone();

    let result = weather_data::refresh(&mut snapshot, &FixedSource::offline(), &config, now()).await;
    assert!(matches!(result, Err(WeatherError::Transport { .. })));
    assert_eq!(snapshot.current_conditions, before);
    assert_eq!(
        renderer::format_temperature(snapshot.current_conditions.temp_cur),
        "21°"
    );
}
