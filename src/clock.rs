//! # Analog Clock Module
//!
//! Draws an analog face with hour, minute and second hands plus an optional
//! 12-hour `HH:MM` readout. The frame is a pure function of wall-clock time.
//!
//! ## Hand Geometry
//!
//! Each hand is driven by a fraction of a full turn, negated so that the hands
//! sweep clockwise starting at 12 o'clock:
//!
//! - hour: `-((hour mod 12) + minute / 60) / 12`
//! - minute: `-minute / 60`
//! - second: `-second / 60`
//!
//! The endpoint of a hand of radius `r` is
//! `(cx + r·cos(2πf + π/2), cy + r·sin(2πf - π/2))`, rounded to the nearest
//! pixel. With screen y growing downwards this puts `f = 0` straight up and
//! `f = -0.25` at 3 o'clock.
//!
//! ## Cadence
//!
//! [`ClockModule::update`] renders the frame for the *next* whole second and
//! sleeps until that boundary, so the seconds hand never drifts.

use crate::canvas::{text_width, FrameCanvas, RenderError};
use crate::config::{ClockConfig, Config};
use crate::pacer::{SecondPacer, WallClock};
use crate::{ModuleState, ModuleStatus};
use chrono::{Local, NaiveTime, Timelike};
use embedded_graphics::mono_font::iso_8859_1::FONT_4X6;
use embedded_graphics::pixelcolor::Rgb888;
use std::f64::consts::{FRAC_PI_2, TAU};
use std::sync::Arc;
use tracing::debug;

const FACE_COLOR: Rgb888 = Rgb888::new(84, 84, 84);
const HAND_COLOR: Rgb888 = Rgb888::new(255, 255, 255);
const SECOND_COLOR: Rgb888 = Rgb888::new(220, 30, 30);
const READOUT_COLOR: Rgb888 = Rgb888::new(120, 120, 120);

/// Fractions of a turn for each hand, all in `[-1, 0]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandFractions {
    pub hour: f64,
    pub minute: f64,
    pub second: f64,
}

impl HandFractions {
    pub fn at(time: NaiveTime) -> Self {
        let hour = (time.hour() % 12) as f64;
        let minute = time.minute() as f64;
        let second = time.second().min(59) as f64;
        Self {
            hour: -((hour + minute / 60.0) / 12.0),
            minute: -(minute / 60.0),
            second: -(second / 60.0),
        }
    }
}

/// Pixel endpoint of a hand of `radius` pointing at `fraction` of a turn.
pub fn hand_endpoint(center: (i32, i32), radius: i32, fraction: f64) -> (i32, i32) {
    let r = radius as f64;
    let x = center.0 as f64 + r * (fraction * TAU + FRAC_PI_2).cos();
    let y = center.1 as f64 + r * (fraction * TAU - FRAC_PI_2).sin();
    (x.round() as i32, y.round() as i32)
}

/// 12-hour `HH:MM` text; hour 0 and 12 both read "12".
pub fn readout_text(time: NaiveTime) -> String {
    let hour = match time.hour() % 12 {
        0 => 12,
        h => h,
    };
    format!("{:02}:{:02}", hour, time.minute())
}

pub struct ClockModule {
    config: ClockConfig,
    canvas: FrameCanvas,
    pacer: SecondPacer,
    state: ModuleState,
    status: ModuleStatus,
}

impl ClockModule {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clock.clone(),
            canvas: FrameCanvas::new(config.matrix.width, config.matrix.height),
            pacer: SecondPacer::new(),
            state: ModuleState::Inactive,
            status: ModuleStatus::Loading,
        }
    }

    /// Take deadlines from `clock` instead of the system clock.
    pub fn with_wall_clock(mut self, clock: Arc<dyn WallClock>) -> Self {
        self.pacer = SecondPacer::with_clock(clock);
        self
    }

    pub fn state(&self) -> ModuleState {
        self.state
    }

    pub fn set_state(&mut self, state: ModuleState) {
        self.state = state;
    }

    pub fn status(&self) -> ModuleStatus {
        self.status
    }

    pub fn canvas(&self) -> &FrameCanvas {
        &self.canvas
    }

    fn center(&self) -> (i32, i32) {
        (
            (self.canvas.width() as i32 - 1) / 2,
            (self.canvas.height() as i32 - 1) / 2,
        )
    }

    /// Redraw the whole face for `time`.
    pub fn render_at(&mut self, time: NaiveTime) -> Result<(), RenderError> {
        let center = self.center();
        let face_radius = center.0.min(center.1);
        self.canvas.fill(0, 0, 0);

        for mark in 0..12 {
            let fraction = -(mark as f64) / 12.0;
            let inner = if mark % 3 == 0 { face_radius - 3 } else { face_radius - 1 };
            let (x0, y0) = hand_endpoint(center, inner, fraction);
            let (x1, y1) = hand_endpoint(center, face_radius, fraction);
            self.canvas.draw_line(x0, y0, x1, y1, FACE_COLOR);
        }

        let hands = HandFractions::at(time);
        for (radius, fraction) in [
            (self.config.hour_hand_radius, hands.hour),
            (self.config.minute_hand_radius, hands.minute),
        ] {
            let (ex, ey) = hand_endpoint(center, radius, fraction);
            for i in 0..2 {
                for j in 0..2 {
                    self.canvas
                        .draw_line(center.0 + i, center.1 + j, ex + i, ey + j, HAND_COLOR);
                }
            }
        }
        let (sx, sy) = hand_endpoint(center, self.config.second_hand_radius, hands.second);
        self.canvas.draw_line(center.0, center.1, sx, sy, SECOND_COLOR);

        if self.config.digital_readout {
            self.draw_readout(time);
        }
        self.status = ModuleStatus::Ok;
        Ok(())
    }

    fn draw_readout(&mut self, time: NaiveTime) {
        let text = readout_text(time);
        let font = &FONT_4X6;
        let (x, y) = (self.config.readout_x, self.config.readout_y);
        let width = text_width(font, &text, 0) + 2;
        let height = font.character_size.height as i32 + 2;
        self.canvas.erase_rect(x, y, width as u32, height as u32);
        self.canvas.draw_text(font, x + 1, y + 1, READOUT_COLOR, &text, 0);
    }

    /// Render the next whole second and wait for it to start. A failed
    /// render still waits out its second.
    pub async fn update(&mut self) -> Result<&FrameCanvas, RenderError> {
        let deadline = self.pacer.next_tick(self.pacer.now());
        let local = deadline.with_timezone(&Local);
        let rendered = self.render_at(local.time());
        debug!("clock frame for {}", local.format("%H:%M:%S"));
        self.pacer.hold_until(deadline, rendered).await?;
        Ok(&self.canvas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::pixelcolor::RgbColor;

    fn hms(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn fractions_stay_in_range() {
        for h in 0..24 {
            for m in 0..60 {
                for s in (0..60).step_by(7) {
                    let f = HandFractions::at(hms(h, m, s));
                    for v in [f.hour, f.minute, f.second] {
                        assert!((-1.0..=0.0).contains(&v), "{h}:{m}:{s} gave {v}");
                    }
                }
            }
        }
    }

    #[test]
    fn endpoints_stay_within_radius() {
        let center = (31, 31);
        for radius in [18, 20, 22] {
            for step in 0..=720 {
                let fraction = -(step as f64) / 720.0;
                let (x, y) = hand_endpoint(center, radius, fraction);
                let dx = (x - center.0) as f64;
                let dy = (y - center.1) as f64;
                let dist = (dx * dx + dy * dy).sqrt();
                assert!(dist <= radius as f64 + 0.71, "r={radius} f={fraction} d={dist}");
                assert!(dist >= radius as f64 - 0.71);
            }
        }
    }

    #[test]
    fn hands_sweep_clockwise_from_twelve() {
        let c = (31, 31);
        assert_eq!(hand_endpoint(c, 20, 0.0), (31, 11));
        assert_eq!(hand_endpoint(c, 20, -0.25), (51, 31));
        assert_eq!(hand_endpoint(c, 20, -0.5), (31, 51));
        assert_eq!(hand_endpoint(c, 20, -0.75), (11, 31));

        let three = HandFractions::at(hms(15, 0, 0));
        assert_eq!(hand_endpoint(c, 18, three.hour), (49, 31));
        let half_past = HandFractions::at(hms(9, 30, 45));
        assert_eq!(hand_endpoint(c, 22, half_past.minute), (31, 53));
        assert_eq!(hand_endpoint(c, 20, half_past.second), (11, 31));
    }

    #[test]
    fn readout_uses_twelve_hour_clock() {
        assert_eq!(readout_text(hms(0, 5, 0)), "12:05");
        assert_eq!(readout_text(hms(12, 0, 0)), "12:00");
        assert_eq!(readout_text(hms(13, 30, 0)), "01:30");
        assert_eq!(readout_text(hms(9, 7, 0)), "09:07");
    }

    #[test]
    fn render_draws_face_and_clears_readout_box() {
        let config = Config::default();
        let mut clock = ClockModule::new(&config);
        assert_eq!(clock.status(), ModuleStatus::Loading);
        clock.render_at(hms(10, 10, 30)).unwrap();
        assert_eq!(clock.status(), ModuleStatus::Ok);

        let canvas = clock.canvas();
        assert!(canvas.lit_pixels() > 0);
        // Readout border column is erased over the hands.
        assert_eq!(
            canvas.pixel(config.clock.readout_x, config.clock.readout_y + 3),
            Some(Rgb888::BLACK)
        );
        // Twelve o'clock tick mark.
        assert_eq!(canvas.pixel(31, 0), Some(FACE_COLOR));
    }

    #[test]
    fn render_without_readout() {
        let mut config = Config::default();
        config.clock.digital_readout = false;
        let mut clock = ClockModule::new(&config);
        clock.render_at(hms(6, 0, 30)).unwrap();
        // Minute hand passes straight through the readout area at 6:00.
        assert_eq!(clock.canvas().pixel(31, 20), Some(HAND_COLOR));
    }

    #[tokio::test]
    async fn update_returns_rendered_canvas() {
        let mut clock = ClockModule::new(&Config::default());
        let lit = clock.update().await.unwrap().lit_pixels();
        assert!(lit > 0);
    }

    #[tokio::test(start_paused = true)]
    async fn updates_land_on_consecutive_seconds() {
        use crate::pacer::testing::TokioClock;
        use chrono::{TimeZone, Utc};

        let start = Utc.with_ymd_and_hms(2025, 1, 15, 18, 0, 0).unwrap();
        let wall = TokioClock::starting_at(start);
        let mut clock = ClockModule::new(&Config::default()).with_wall_clock(wall.clone());
        for k in 1..=3 {
            clock.update().await.unwrap();
            let elapsed = wall.now() - start;
            assert!(elapsed >= chrono::Duration::seconds(k));
            assert!(elapsed < chrono::Duration::seconds(k) + chrono::Duration::milliseconds(100));
        }
    }
}
