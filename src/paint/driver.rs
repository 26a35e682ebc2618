//! Drives a runner at frame cadence against a clock.

use crate::paint::persist::SessionStore;
use crate::paint::runner::Runner;
use crate::paint::signals::SignalFeed;
use crate::paint::state::RunLifecycle;
use crate::paint::surface::DrawingSurface;
use std::cell::Cell;
use std::time::{Duration, Instant};

/// Roughly one animation frame.
pub const FRAME: Duration = Duration::from_millis(16);

pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Deterministic clock; sleeping advances it instantly.
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<Instant>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(start: Instant) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    pub fn advance(&self, duration: Duration) {
        self.now.set(self.now.get() + duration);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

/// Delivers pending signals, ticks once, then sleeps one frame.
pub fn step<S, P, C>(runner: &mut Runner<S, P>, feed: &SignalFeed, clock: &C, frame: Duration)
where
    S: DrawingSurface,
    P: SessionStore,
    C: Clock + ?Sized,
{
    feed.drain_into(runner);
    runner.tick(clock.now());
    clock.sleep(frame);
}

/// Runs until the run ends or waits on the user.
pub fn drive<S, P, C>(
    runner: &mut Runner<S, P>,
    feed: &SignalFeed,
    clock: &C,
    frame: Duration,
) -> RunLifecycle
where
    S: DrawingSurface,
    P: SessionStore,
    C: Clock + ?Sized,
{
    while runner.is_active() && !runner.needs_user() {
        step(runner, feed, clock, frame);
    }
    tracing::debug!(lifecycle = ?runner.lifecycle(), "driver loop exited");
    runner.lifecycle()
}
