//! # Weather Station Module
//!
//! Owns the weather panel: its canvas, the [`WeatherSnapshot`] it draws, and
//! the refresh deadline. Every update renders one second like the clock does,
//! but a network refresh happens only once the refresh deadline has passed.
//!
//! ## Update Paths
//! - **Refresh due**: fetch, parse and apply, then a full redraw
//! - **First frame**: full redraw of whatever the snapshot holds
//! - **Otherwise**: only the date/time block is redrawn
//!
//! The next refresh is scheduled one interval after the attempt whether it
//! succeeded or not, so a dead network costs one fetch per interval.

use crate::canvas::{FrameCanvas, RenderError};
use crate::config::{Config, WeatherConfig};
use crate::pacer::{SecondPacer, WallClock};
use crate::renderer::{self, Palette};
use crate::weather_data::{self, ForecastSource, RefreshOutcome, WeatherError};
use crate::{ModuleState, ModuleStatus, WeatherSnapshot};
use chrono::{DateTime, Local, NaiveDateTime, Utc};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub struct WeatherModule {
    config: WeatherConfig,
    canvas: FrameCanvas,
    snapshot: WeatherSnapshot,
    source: Box<dyn ForecastSource>,
    next_weather_update: Option<DateTime<Utc>>,
    drawn: bool,
    pacer: SecondPacer,
    state: ModuleState,
    status: ModuleStatus,
}

impl WeatherModule {
    /// Create the module, seeding the snapshot from a fresh enough cache file.
    pub fn new(config: &Config, source: Box<dyn ForecastSource>) -> Self {
        let weather = config.weather.clone();
        let mut snapshot = WeatherSnapshot::default();
        let mut status = ModuleStatus::Loading;

        if !weather.cache_path.is_empty() {
            let ttl = Duration::from_secs(weather.cache_ttl_minutes * 60);
            match weather_data::load_cache(Path::new(&weather.cache_path), ttl) {
                Ok(cached) => {
                    info!("Seeded weather snapshot from {}", weather.cache_path);
                    snapshot = cached;
                    status = ModuleStatus::Ok;
                }
                Err(e) => debug!("No usable weather cache: {}", e),
            }
        }

        Self {
            config: weather,
            canvas: FrameCanvas::new(config.matrix.width, config.matrix.height),
            snapshot,
            source,
            next_weather_update: None,
            drawn: false,
            pacer: SecondPacer::new(),
            state: ModuleState::Inactive,
            status,
        }
    }

    /// Take deadlines from `clock` instead of the system clock.
    pub fn with_wall_clock(mut self, clock: Arc<dyn WallClock>) -> Self {
        self.pacer = SecondPacer::with_clock(clock);
        self
    }

    pub fn snapshot(&self) -> &WeatherSnapshot {
        &self.snapshot
    }

    pub fn canvas(&self) -> &FrameCanvas {
        &self.canvas
    }

    pub fn status(&self) -> ModuleStatus {
        self.status
    }

    pub fn state(&self) -> ModuleState {
        self.state
    }

    pub fn next_weather_update(&self) -> Option<DateTime<Utc>> {
        self.next_weather_update
    }

    /// Apply a scheduler state. `Exiting` flushes the snapshot to the cache.
    pub fn set_state(&mut self, state: ModuleState) {
        if state == ModuleState::Exiting && self.state != ModuleState::Exiting {
            self.save_cache();
        }
        self.state = state;
    }

    pub fn is_refresh_due(&self, now: DateTime<Utc>) -> bool {
        self.next_weather_update.map_or(true, |next| now >= next)
    }

    fn save_cache(&self) {
        if self.config.cache_path.is_empty() || self.status == ModuleStatus::Loading {
            return;
        }
        if let Err(e) = weather_data::save_cache(Path::new(&self.config.cache_path), &self.snapshot) {
            warn!("Failed to write weather cache {}: {}", self.config.cache_path, e);
        }
    }

    async fn refresh(&mut self, now: DateTime<Utc>) {
        self.next_weather_update = Some(now + self.config.refresh_interval());

        match weather_data::refresh(&mut self.snapshot, self.source.as_ref(), &self.config, now).await {
            Ok(outcome) => {
                match outcome {
                    RefreshOutcome::Live => info!("Weather refreshed from live document"),
                    RefreshOutcome::Retained => info!("Weather refreshed, keeping today's forecast"),
                    RefreshOutcome::Archived { offset_hours } => {
                        info!("Weather refreshed, today's forecast from {}h archive", offset_hours)
                    }
                }
                self.status = ModuleStatus::Ok;
                self.save_cache();
            }
            Err(WeatherError::ArchiveExhausted { station, .. }) => {
                // URLs tried are in the fallback log line.
                error!("No forecast for today available for {}", station);
                self.status = ModuleStatus::Error;
            }
            Err(e) => {
                warn!("Weather refresh failed, keeping previous data: {}", e);
                self.status = ModuleStatus::Error;
            }
        }
    }

    /// Produce the frame for `now`; `local` is the same instant on the wall clock.
    pub async fn render_at(
        &mut self,
        now: DateTime<Utc>,
        local: NaiveDateTime,
    ) -> Result<(), RenderError> {
        let full = if self.is_refresh_due(now) {
            self.refresh(now).await;
            true
        } else {
            !self.drawn
        };

        if full {
            renderer::draw_full(&mut self.canvas, &self.snapshot, local)?;
            self.drawn = true;
        } else {
            let palette = Palette::for_time(&self.snapshot, local);
            renderer::draw_date_time(&mut self.canvas, local, &palette);
        }
        Ok(())
    }

    /// Render the next whole second and wait for it to start. A failed
    /// render still waits out its second.
    pub async fn update(&mut self) -> Result<&FrameCanvas, RenderError> {
        let deadline = self.pacer.next_tick(self.pacer.now());
        let local = deadline.with_timezone(&Local).naive_local();
        let rendered = self.render_at(deadline, local).await;
        self.pacer.hold_until(deadline, rendered).await?;
        Ok(&self.canvas)
    }
}
