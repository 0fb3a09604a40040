//! Closed set of display modules the scheduler rotates through.

use crate::canvas::{FrameCanvas, RenderError};
use crate::clock::ClockModule;
use crate::weather::WeatherModule;
use crate::{ModuleState, ModuleStatus};
use tracing::debug;

pub enum DisplayModule {
    Clock(ClockModule),
    Weather(WeatherModule),
}

impl DisplayModule {
    pub fn name(&self) -> &'static str {
        match self {
            DisplayModule::Clock(_) => "clock",
            DisplayModule::Weather(_) => "weather",
        }
    }

    /// Render one time-slice and hand back the canvas to present.
    ///
    /// Only ever called on the active module. Returns at the next whole
    /// second; a weather refresh can extend that by up to its fetch timeouts.
    pub async fn update(&mut self) -> Result<&FrameCanvas, RenderError> {
        match self {
            DisplayModule::Clock(clock) => clock.update().await,
            DisplayModule::Weather(weather) => weather.update().await,
        }
    }

    pub fn set_state(&mut self, state: ModuleState) {
        debug!("{} -> {:?}", self.name(), state);
        match self {
            DisplayModule::Clock(clock) => clock.set_state(state),
            DisplayModule::Weather(weather) => weather.set_state(state),
        }
    }

    pub fn state(&self) -> ModuleState {
        match self {
            DisplayModule::Clock(clock) => clock.state(),
            DisplayModule::Weather(weather) => weather.state(),
        }
    }

    pub fn status(&self) -> ModuleStatus {
        match self {
            DisplayModule::Clock(clock) => clock.status(),
            DisplayModule::Weather(weather) => weather.status(),
        }
    }
}

impl From<ClockModule> for DisplayModule {
    fn from(clock: ClockModule) -> Self {
        DisplayModule::Clock(clock)
    }
}

impl From<WeatherModule> for DisplayModule {
    fn from(weather: WeatherModule) -> Self {
        DisplayModule::Weather(weather)
    }
}
