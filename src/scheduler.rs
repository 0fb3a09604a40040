//! # Module Scheduler
//!
//! Rotates through the configured display modules round-robin, giving each one
//! its own dwell time, and presents whatever the active module renders.
//!
//! ## State Machine
//!
//! `Idle -> Running -> Stopped`. While running, every tick:
//! 1. checks the switch deadline and advances the rotation if it has passed
//! 2. calls `update()` on the active module (inactive modules do no work)
//! 3. presents the returned canvas
//!
//! Everything runs on one task. The shutdown future is raced against each
//! tick, so a module stuck in a fetch is dropped mid-update at shutdown.

use crate::module::DisplayModule;
use crate::panel::Panel;
use crate::ModuleState;
use std::future::Future;
use std::io;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("no display modules configured")]
    NoModules,

    #[error("scheduler already stopped")]
    Stopped,

    #[error("panel present failed: {0}")]
    Present(#[from] io::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Stopped,
}

/// Round-robin rotation with a dwell time per slot.
#[derive(Clone, Debug)]
pub struct Rotation {
    dwell: Vec<Duration>,
    active: usize,
    next_switch: Option<Instant>,
}

impl Rotation {
    pub fn new(dwell: Vec<Duration>) -> Self {
        Self {
            dwell,
            active: 0,
            next_switch: None,
        }
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn len(&self) -> usize {
        self.dwell.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dwell.is_empty()
    }

    /// Activate the first slot at `now`.
    pub fn start(&mut self, now: Instant) {
        self.active = 0;
        self.next_switch = self.dwell.first().map(|d| now + *d);
    }

    /// Advance when the switch deadline has passed. Returns `(from, to)` when
    /// the active slot changed; the new slot's dwell is counted from `now`.
    pub fn poll(&mut self, now: Instant) -> Option<(usize, usize)> {
        let due = self.next_switch.map_or(false, |deadline| now >= deadline);
        if !due {
            return None;
        }
        let from = self.active;
        let to = (from + 1) % self.dwell.len();
        self.active = to;
        self.next_switch = Some(now + self.dwell[to]);
        (from != to).then_some((from, to))
    }
}

pub struct Scheduler<P: Panel> {
    modules: Vec<DisplayModule>,
    rotation: Rotation,
    panel: P,
    state: SchedulerState,
    presented: Vec<u64>,
}

impl<P: Panel> Scheduler<P> {
    /// Build a scheduler over `(module, dwell)` pairs in rotation order.
    pub fn new(entries: Vec<(DisplayModule, Duration)>, panel: P) -> Result<Self, SchedulerError> {
        if entries.is_empty() {
            return Err(SchedulerError::NoModules);
        }
        let (modules, dwell): (Vec<_>, Vec<_>) = entries.into_iter().unzip();
        let presented = vec![0; modules.len()];
        Ok(Self {
            modules,
            rotation: Rotation::new(dwell),
            panel,
            state: SchedulerState::Idle,
            presented,
        })
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Frames presented per module, in rotation order.
    pub fn presented(&self) -> &[u64] {
        &self.presented
    }

    pub fn panel(&self) -> &P {
        &self.panel
    }

    pub fn modules(&self) -> &[DisplayModule] {
        &self.modules
    }

    fn ensure_not_stopped(&self) -> Result<(), SchedulerError> {
        match self.state {
            SchedulerState::Stopped => Err(SchedulerError::Stopped),
            _ => Ok(()),
        }
    }

    fn start(&mut self) {
        self.state = SchedulerState::Running;
        self.rotation.start(Instant::now());
        for (i, module) in self.modules.iter_mut().enumerate() {
            module.set_state(if i == 0 {
                ModuleState::Active
            } else {
                ModuleState::Inactive
            });
        }
        info!("Scheduler running with {} modules", self.modules.len());
    }

    /// One pass: maybe switch, update the active module, present its frame.
    pub async fn tick(&mut self) -> Result<(), SchedulerError> {
        self.ensure_not_stopped()?;
        if let Some((from, to)) = self.rotation.poll(Instant::now()) {
            self.modules[from].set_state(ModuleState::Inactive);
            self.modules[to].set_state(ModuleState::Active);
            info!(
                "Switching from {} to {}",
                self.modules[from].name(),
                self.modules[to].name()
            );
        }

        let active = self.rotation.active();
        let name = self.modules[active].name();
        match self.modules[active].update().await {
            Ok(canvas) => {
                self.panel.present(canvas).await?;
                self.presented[active] += 1;
            }
            Err(e) => warn!("Dropped {} frame: {}", name, e),
        }
        Ok(())
    }

    /// Run until `shutdown` resolves, then tear every module down.
    pub async fn run<F>(&mut self, shutdown: F) -> Result<(), SchedulerError>
    where
        F: Future<Output = ()>,
    {
        self.ensure_not_stopped()?;
        self.start();
        tokio::pin!(shutdown);

        let outcome = loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break Ok(());
                }
                result = self.tick() => {
                    if let Err(e) = result {
                        break Err(e);
                    }
                }
            }
        };

        self.stop();
        outcome
    }

    /// Present one frame from every module in order, then stop.
    pub async fn run_once(&mut self) -> Result<(), SchedulerError> {
        self.ensure_not_stopped()?;
        self.start();
        let mut outcome = Ok(());
        for i in 0..self.modules.len() {
            if i > 0 {
                self.modules[i - 1].set_state(ModuleState::Inactive);
                self.modules[i].set_state(ModuleState::Active);
            }
            let name = self.modules[i].name();
            match self.modules[i].update().await {
                Ok(canvas) => {
                    if let Err(e) = self.panel.present(canvas).await {
                        outcome = Err(e.into());
                        break;
                    }
                    self.presented[i] += 1;
                }
                Err(e) => warn!("Dropped {} frame: {}", name, e),
            }
        }
        self.stop();
        outcome
    }

    fn stop(&mut self) {
        for module in self.modules.iter_mut() {
            module.set_state(ModuleState::Exiting);
        }
        for (module, count) in self.modules.iter().zip(&self.presented) {
            debug!("{} presented {} frames", module.name(), count);
        }
        self.modules.clear();
        self.state = SchedulerState::Stopped;
        info!("Scheduler stopped");
    }
}
