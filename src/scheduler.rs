//! Update throttling.
//!
//! Sensor updates can arrive far more often than the readout needs to change.
//! A rebuild happens when one of these holds:
//! - a full render was requested (configuration replaced, scene reattached)
//! - nothing has been rendered yet
//! - the interval is zero
//! - strictly more than the interval has passed since the last render
//!
//! Time is passed in by the caller, so the scheduler is deterministic.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::DEFAULT_UPDATE_INTERVAL;

#[derive(Clone, Copy, Debug)]
pub struct UpdateScheduler {
    interval: Duration,
    last_render: Option<Instant>,
    force: bool,
}

impl UpdateScheduler {
    pub const fn new(interval: Duration) -> Self { Self { interval, last_render: None, force: false } }

    #[inline]
    pub const fn interval(&self) -> Duration { self.interval }

    pub const fn set_interval(
        &mut self,
        interval: Duration,
    ) {
        self.interval = interval;
    }

    /// Make the next [`Self::should_render`] return `true`.
    pub const fn request_full_render(&mut self) { self.force = true; }

    pub fn should_render(
        &self,
        now: Instant,
    ) -> bool {
        let Some(last) = self.last_render else {
            return true;
        };
        if self.force || self.interval.is_zero() {
            return true;
        }
        let elapsed = now.saturating_duration_since(last);
        if elapsed > self.interval {
            return true;
        }
        debug!(elapsed_ms = elapsed.as_millis() as u64, "update throttled");
        false
    }

    pub const fn mark_rendered(
        &mut self,
        now: Instant,
    ) {
        self.last_render = Some(now);
        self.force = false;
    }

    /// Forget the last render.
    pub const fn reset(&mut self) {
        self.last_render = None;
        self.force = false;
    }
}

impl Default for UpdateScheduler {
    fn default() -> Self { Self::new(DEFAULT_UPDATE_INTERVAL) }
}
