//! # Weather Panel Rendering
//!
//! Turns a [`WeatherSnapshot`] into pixels on a 64x64 [`FrameCanvas`]. Text is
//! prepared first as a [`WeatherView`] so the formatting rules can be checked
//! without looking at pixels.
//!
//! ## Layout
//!
//! ```text
//! y  0 ┌──────────────────────────────┐
//!      │ WED JAN 15          2:05 PM  │  date / time block
//! y 13 ├──────────────────────────────┤
//!      │ [icon]  21°          23°     │  current conditions
//!      │ 16x16   10%          -9°     │
//! y 35 ├───────┬───────┬───────┬──────┤
//!      │ THU   │ FRI   │ SAT   │ SUN  │  forecast strip
//!      │ icon  │ icon  │ icon  │ icon │
//!      │  5°   │ -4°   │ -12°  │  1°  │
//!      │ 30%   │       │       │ 70%  │
//!      └───────┴───────┴───────┴──────┘
//! ```
//!
//! Values that need one or two glyphs and values that need three (or a minus
//! sign) are drawn at different x offsets so the degree sign stays on screen.

use crate::canvas::{text_width, FrameCanvas, RenderError};
use crate::{icons, FeelsLike, WeatherDay, WeatherSnapshot, WeatherType, FORECAST_SLOTS};
use chrono::NaiveDateTime;
use embedded_graphics::mono_font::iso_8859_1::{FONT_4X6, FONT_6X10};
use embedded_graphics::pixelcolor::Rgb888;

/// Height of the date/time block, which is the only area the partial redraw
/// touches.
pub const DATE_TIME_HEIGHT: u32 = 13;

const UPPER_SEPARATOR_Y: i32 = 13;
const LOWER_SEPARATOR_Y: i32 = 35;
const COLUMN_WIDTH: i32 = 16;

/// Colours for one time of day.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Palette {
    pub separator: Rgb888,
    pub clock: Rgb888,
    pub date: Rgb888,
    pub current_weekday: Rgb888,
    pub temp_cur: Rgb888,
    pub temp_high: Rgb888,
    pub wind_chill: Rgb888,
    pub humidex: Rgb888,
    pub future_weekday: Rgb888,
    pub predicted_high: Rgb888,
    pub predicted_pop: Rgb888,
}

impl Palette {
    pub fn day() -> Self {
        Self {
            separator: Rgb888::new(0, 90, 160),
            clock: Rgb888::new(255, 255, 255),
            date: Rgb888::new(200, 200, 200),
            current_weekday: Rgb888::new(160, 90, 220),
            temp_cur: Rgb888::new(255, 255, 255),
            temp_high: Rgb888::new(255, 126, 0),
            wind_chill: Rgb888::new(0, 183, 239),
            humidex: Rgb888::new(255, 60, 60),
            future_weekday: Rgb888::new(200, 200, 200),
            predicted_high: Rgb888::new(230, 230, 230),
            predicted_pop: Rgb888::new(90, 170, 255),
        }
    }

    pub fn night() -> Self {
        Self {
            separator: Rgb888::new(84, 84, 84),
            clock: Rgb888::new(255, 255, 255),
            date: Rgb888::new(120, 120, 120),
            current_weekday: Rgb888::new(111, 49, 152),
            temp_cur: Rgb888::new(255, 255, 255),
            temp_high: Rgb888::new(255, 126, 0),
            wind_chill: Rgb888::new(0, 183, 239),
            humidex: Rgb888::new(255, 60, 60),
            future_weekday: Rgb888::new(120, 120, 120),
            predicted_high: Rgb888::new(120, 120, 120),
            predicted_pop: Rgb888::new(60, 110, 170),
        }
    }

    /// Day palette between sunrise and sunset, night palette otherwise.
    pub fn for_time(snapshot: &WeatherSnapshot, at: NaiveDateTime) -> Self {
        if snapshot.is_daytime(at.time()) {
            Self::day()
        } else {
            Self::night()
        }
    }
}

/// Rounded temperature with a degree sign, or `--` when unknown.
pub fn format_temperature(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{}°", v.round() as i64),
        None => "--".to_string(),
    }
}

/// Probability of precipitation text; nothing when absent or zero.
pub fn format_pop(pop: Option<u8>) -> Option<String> {
    pop.filter(|&p| p > 0).map(|p| format!("{p}%"))
}

/// `narrow` for values drawn with one or two digits, `wide` for negative or
/// three-digit values.
pub fn glyph_offset(value: Option<f64>, narrow: i32, wide: i32) -> i32 {
    match value.map(|v| v.round() as i64) {
        Some(v) if !(0..=99).contains(&v) => wide,
        _ => narrow,
    }
}

fn weekday_abbrev(day: &WeatherDay) -> String {
    let name = if day.weekday.is_empty() { &day.day } else { &day.weekday };
    name.chars().take(3).collect::<String>().to_uppercase()
}

/// One column of the forecast strip.
#[derive(Clone, Debug, PartialEq)]
pub struct ForecastColumn {
    pub weekday: String,
    pub icon: WeatherType,
    pub high: String,
    pub pop: Option<String>,
}

/// All text the full redraw puts on screen.
#[derive(Clone, Debug, PartialEq)]
pub struct WeatherView {
    pub icon: WeatherType,
    pub current_temp: String,
    pub high: String,
    pub feels_like: Option<String>,
    pub pop: Option<String>,
    pub forecast: Vec<ForecastColumn>,
}

impl WeatherView {
    pub fn from_snapshot(snapshot: &WeatherSnapshot) -> Self {
        let current = &snapshot.current_conditions;
        Self {
            icon: current.weather_type,
            current_temp: format_temperature(current.temp_cur),
            high: format_temperature(current.temp_high),
            feels_like: current.feels_like.map(|f| format_temperature(Some(f.value()))),
            pop: format_pop(current.pop),
            forecast: snapshot
                .forecast
                .iter()
                .take(FORECAST_SLOTS)
                .map(|day| ForecastColumn {
                    weekday: weekday_abbrev(day),
                    icon: day.weather_type,
                    high: format_temperature(day.temp_high),
                    pop: format_pop(day.pop),
                })
                .collect(),
        }
    }
}

/// Erase and redraw only the date/time block.
pub fn draw_date_time(canvas: &mut FrameCanvas, at: NaiveDateTime, palette: &Palette) {
    canvas.erase_rect(0, 0, canvas.width(), DATE_TIME_HEIGHT);

    let font = &FONT_4X6;
    let weekday = at.format("%a").to_string().to_uppercase();
    let x = canvas.draw_text(font, 1, 1, palette.current_weekday, &weekday, 0);
    let date = at.format(" %b %d").to_string().to_uppercase();
    canvas.draw_text(font, x, 1, palette.date, &date, 0);

    let time = at.format("%-I:%M %p").to_string();
    let time_x = canvas.width() as i32 - text_width(font, &time, 0) - 1;
    canvas.draw_text(font, time_x, 7, palette.clock, &time, 0);
}

fn draw_separators(canvas: &mut FrameCanvas, palette: &Palette) {
    let right = canvas.width() as i32 - 1;
    let bottom = canvas.height() as i32 - 1;
    canvas.draw_line(0, UPPER_SEPARATOR_Y, right, UPPER_SEPARATOR_Y, palette.separator);
    canvas.draw_line(0, LOWER_SEPARATOR_Y, right, LOWER_SEPARATOR_Y, palette.separator);
    for slot in 1..FORECAST_SLOTS as i32 {
        let x = slot * COLUMN_WIDTH;
        canvas.draw_line(x, LOWER_SEPARATOR_Y + 1, x, bottom, palette.separator);
    }
}

fn draw_current(
    canvas: &mut FrameCanvas,
    snapshot: &WeatherSnapshot,
    view: &WeatherView,
    palette: &Palette,
) -> Result<(), RenderError> {
    let current = &snapshot.current_conditions;
    icons::draw(canvas, 1, 16, view.icon, 2)?;

    let x = glyph_offset(current.temp_cur, 22, 19);
    canvas.draw_text(&FONT_6X10, x, 19, palette.temp_cur, &view.current_temp, 0);
    if let Some(pop) = &view.pop {
        canvas.draw_text(&FONT_4X6, x, 29, palette.predicted_pop, pop, 0);
    }

    let x = glyph_offset(current.temp_high, 48, 44);
    canvas.draw_text(&FONT_4X6, x, 16, palette.temp_high, &view.high, 0);

    if let (Some(kind), Some(text)) = (current.feels_like, &view.feels_like) {
        let color = match kind {
            FeelsLike::WindChill(_) => palette.wind_chill,
            FeelsLike::Humidex(_) => palette.humidex,
        };
        let x = glyph_offset(Some(kind.value()), 48, 44);
        canvas.draw_text(&FONT_4X6, x, 26, color, text, 0);
    }
    Ok(())
}

fn draw_forecast(
    canvas: &mut FrameCanvas,
    view: &WeatherView,
    palette: &Palette,
) -> Result<(), RenderError> {
    let font = &FONT_4X6;
    for (slot, column) in view.forecast.iter().enumerate() {
        let x0 = slot as i32 * COLUMN_WIDTH;
        let centered = |text: &str| x0 + (COLUMN_WIDTH + 1 - text_width(font, text, 0)) / 2;

        canvas.draw_text(font, centered(&column.weekday), 37, palette.future_weekday, &column.weekday, 0);
        icons::draw(canvas, x0 + 4, 43, column.icon, 1)?;
        canvas.draw_text(font, centered(&column.high), 52, palette.predicted_high, &column.high, 0);
        if let Some(pop) = &column.pop {
            canvas.draw_text(font, centered(pop), 58, palette.predicted_pop, pop, 0);
        }
    }
    Ok(())
}

/// Clear the canvas and draw everything.
pub fn draw_full(
    canvas: &mut FrameCanvas,
    snapshot: &WeatherSnapshot,
    at: NaiveDateTime,
) -> Result<WeatherView, RenderError> {
    let palette = Palette::for_time(snapshot, at);
    let view = WeatherView::from_snapshot(snapshot);

    canvas.fill(0, 0, 0);
    draw_separators(canvas, &palette);
    draw_date_time(canvas, at, &palette);
    draw_current(canvas, snapshot, &view, &palette)?;
    draw_forecast(canvas, &view, &palette)?;
    Ok(view)
}
