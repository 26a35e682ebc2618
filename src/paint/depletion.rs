//! Resource-exhaustion handling: reconcile in-flight actions against the
//! depletion signal, then sit out a cooldown.

use crate::paint::applied::Reconciliation;
use crate::paint::context::RunContext;
use crate::paint::status;
use std::time::{Duration, Instant};

/// Repeated observations inside this window count as one.
pub const DEBOUNCE: Duration = Duration::from_secs(2);
/// Reopen delay after a commit forced by full depletion.
pub const FULL_DEPLETION_REOPEN: Duration = Duration::from_secs(35);
const COUNTDOWN_STEP: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Default)]
pub struct DepletionHandler {
    handling: bool,
    last_seen: Option<Instant>,
}

impl DepletionHandler {
    /// Claims the handler for an observation at `at`. Refused while a
    /// previous one is still being handled or was seen within [`DEBOUNCE`].
    pub fn try_begin(&mut self, at: Instant) -> bool {
        if self.handling {
            return false;
        }
        if let Some(last) = self.last_seen {
            if at.saturating_duration_since(last) < DEBOUNCE {
                return false;
            }
        }
        self.handling = true;
        self.last_seen = Some(at);
        true
    }

    pub fn finish(&mut self) {
        self.handling = false;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Confirms what was dispatched before the signal and puts the rest back
/// into the queue at the cursor. Must only run while the runner is held.
pub fn reconcile(ctx: &mut RunContext, observed_at: Instant) -> Reconciliation {
    let outcome = ctx.applied.split_at(observed_at);
    ctx.queue.reinsert_at_cursor(outcome.rolled_back.clone());
    outcome
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownTick {
    Waiting,
    Report(Duration),
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cooldown {
    pub minutes: u32,
    pub until: Instant,
    next_report: Instant,
}

impl Cooldown {
    pub fn new(minutes: u32, length: Duration, now: Instant) -> Self {
        Self {
            minutes,
            until: now + length,
            next_report: now,
        }
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        self.until.saturating_duration_since(now)
    }

    pub fn tick(&mut self, now: Instant) -> CooldownTick {
        if now >= self.until {
            return CooldownTick::Done;
        }
        if now < self.next_report {
            return CooldownTick::Waiting;
        }
        while self.next_report <= now {
            self.next_report += COUNTDOWN_STEP;
        }
        CooldownTick::Report(self.remaining(now))
    }

    pub fn status_text(&self, now: Instant) -> String {
        status::cooling_down(self.minutes, self.remaining(now))
    }
}
