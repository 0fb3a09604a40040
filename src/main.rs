//! # Matrix Station Application Entry Point
//!
//! Loads the configuration, sets up logging, builds the clock and weather
//! modules and hands them to the scheduler. Frames are shown on the terminal
//! stand-in for the LED matrix.
//!
//! ```text
//! matrix-station [CONFIG] [--once]
//! ```
//!
//! - `CONFIG`: path to the TOML configuration (default `matrix-station.toml`)
//! - `--once`: present one frame from each module and exit
//!
//! SIGINT and SIGTERM stop the scheduler; the weather snapshot is flushed to
//! its cache on the way out.

// Test modules
#[cfg(test)]
mod tests;

use anyhow::Context;
use matrix_station_lib::clock::ClockModule;
use matrix_station_lib::config::{Config, LoggingConfig, DEFAULT_CONFIG_PATH};
use matrix_station_lib::panel::TerminalPanel;
use matrix_station_lib::scheduler::Scheduler;
use matrix_station_lib::weather::WeatherModule;
use matrix_station_lib::weather_data::HttpForecastSource;
use std::env;
use std::fs::OpenOptions;
use std::future::Future;
use std::sync::Mutex;
use tokio::signal::unix::{signal, SignalKind};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Command line options.
#[derive(Debug, PartialEq, Eq)]
pub struct Args {
    pub config_path: String,
    pub once: bool,
}

impl Args {
    /// Parse arguments after the program name. Unknown flags are ignored.
    pub fn parse<I: IntoIterator<Item = String>>(args: I) -> Self {
        let mut config_path = None;
        let mut once = false;
        for arg in args {
            if arg == "--once" {
                once = true;
            } else if !arg.starts_with("--") && config_path.is_none() {
                config_path = Some(arg);
            }
        }
        Self {
            config_path: config_path.unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string()),
            once,
        }
    }
}

/// Install the tracing subscriber. `RUST_LOG` overrides the configured level.
fn init_logging(logging: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .context("Invalid logging level")?;

    match &logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

/// Resolves on SIGTERM or SIGINT.
fn shutdown_signal() -> anyhow::Result<impl Future<Output = ()>> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    Ok(async move {
        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
            _ = sigint.recv() => info!("Received SIGINT, shutting down"),
        }
    })
}

/// Main application entry point.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse(env::args().skip(1));
    let config = Config::load_from_path(&args.config_path);
    init_logging(&config.logging)?;
    info!(
        "Matrix {}x{} at {} Hz, station {} ({}), rotation clock {}s / weather {}s",
        config.matrix.width,
        config.matrix.height,
        config.matrix.refresh_rate_hz,
        config.weather.station_code,
        config.weather.province,
        config.schedule.clock_dwell().as_secs(),
        config.schedule.weather_dwell().as_secs()
    );

    let source = HttpForecastSource::new(config.weather.fetch_timeout())
        .context("Failed to build HTTP client")?;
    let clock = ClockModule::new(&config);
    let weather = WeatherModule::new(&config, Box::new(source));
    let panel = TerminalPanel::stdout(&config.matrix);

    let mut scheduler = Scheduler::new(
        vec![
            (clock.into(), config.schedule.clock_dwell()),
            (weather.into(), config.schedule.weather_dwell()),
        ],
        panel,
    )?;

    if args.once {
        scheduler.run_once().await?;
    } else {
        let shutdown = shutdown_signal().context("Failed to install signal handlers")?;
        scheduler.run(shutdown).await?;
    }
    Ok(())
}
