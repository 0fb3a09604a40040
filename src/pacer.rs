//! Deadline pacing for modules and panels.
//!
//! Modules render the frame for the next whole second and then sleep until
//! that second starts. Panels present on a fixed refresh cadence.

use chrono::{DateTime, DurationRound, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

/// Source of wall-clock time for render deadlines.
pub trait WallClock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The system clock.
pub struct SystemClock;

impl WallClock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Hands out whole-second render deadlines.
///
/// Every deadline is strictly after the previous one, and never earlier than
/// the first second boundary after "now". A previous deadline more than a
/// second ahead of that boundary means the wall clock stepped back; the pacer
/// then re-anchors to the boundary instead of waiting for the old timeline.
pub struct SecondPacer {
    last: Option<DateTime<Utc>>,
    clock: Arc<dyn WallClock>,
}

impl Default for SecondPacer {
    fn default() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }
}

impl SecondPacer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clock(clock: Arc<dyn WallClock>) -> Self {
        Self { last: None, clock }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Next deadline to render for, recorded as the new "last render".
    pub fn next_tick(&mut self, now: DateTime<Utc>) -> DateTime<Utc> {
        let one = chrono::Duration::seconds(1);
        let boundary = now.duration_trunc(one).unwrap_or(now) + one;
        let next = match self.last {
            Some(last) if last + one > boundary => {
                if last + one - boundary <= one {
                    last + one
                } else {
                    warn!(
                        "Wall clock moved back {}s, re-anchoring deadlines to {}",
                        (last - boundary).num_seconds(),
                        boundary.format("%H:%M:%S")
                    );
                    boundary
                }
            }
            _ => boundary,
        };
        self.last = Some(next);
        next
    }

    pub fn last(&self) -> Option<DateTime<Utc>> {
        self.last
    }

    /// Sleep on the tokio timer until this pacer's clock reaches `deadline`.
    pub async fn sleep_until(&self, deadline: DateTime<Utc>) {
        if let Ok(wait) = (deadline - self.now()).to_std() {
            tokio::time::sleep(wait).await;
        }
    }

    /// Wait for `deadline`, then hand back `result`. Failed frames still use
    /// up their time-slice.
    pub async fn hold_until<T, E>(
        &self,
        deadline: DateTime<Utc>,
        result: Result<T, E>,
    ) -> Result<T, E> {
        self.sleep_until(deadline).await;
        result
    }
}

/// Fixed-rate frame cadence for panels.
pub struct FramePacer {
    next_deadline: Instant,
    frame: Duration,
}

impl FramePacer {
    pub fn new(target_hz: u32) -> Self {
        let frame = Duration::from_micros((1_000_000u32 / target_hz.max(1)) as u64);
        Self {
            next_deadline: Instant::now(),
            frame,
        }
    }

    pub fn frame(&self) -> Duration {
        self.frame
    }

    /// Wait for the next refresh boundary and schedule the one after it.
    pub async fn wait(&mut self) {
        let now = Instant::now();
        if self.next_deadline > now {
            tokio::time::sleep(self.next_deadline - now).await;
            self.next_deadline += self.frame;
        } else {
            // Fell behind; re-anchor instead of bursting to catch up.
            self.next_deadline = now + self.frame;
        }
    }
}
