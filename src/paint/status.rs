//! User-facing status text, transient notices and progress.

use std::time::Duration;

pub const DONE: &str = "Done!";
pub const PAUSED: &str = "Paused.";
pub const RESUMED: &str = "Resuming...";
pub const STOPPED: &str = "Stopped.";
pub const STARTED: &str = "Painting...";
pub const COMMITTING: &str = "Committing...";
pub const COMMITTED: &str = "Committed.";
pub const SESSION_SAVED: &str = "Session saved.";
pub const SESSION_LOADED: &str = "Session restored.";
pub const OUT_OF_PAINT: &str = "Out of paint!";
pub const NOTHING_TO_PAINT: &str = "Nothing to paint with current filters.";
pub const ALREADY_RUNNING: &str = "Already running";
pub const CAPTCHA_DETECTED: &str = "MANUAL ACTION: Solve the Captcha to continue!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Level {
    #[default]
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusLine {
    pub message: String,
    pub level: Level,
}

/// A transient message for the host's toast presenter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub level: Level,
    pub duration: Duration,
}

impl Notice {
    pub fn new(message: impl Into<String>, level: Level) -> Self {
        Self {
            message: message.into(),
            level,
            duration: Duration::from_millis(3000),
        }
    }

    pub fn lasting(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub done: usize,
    pub total: usize,
}

impl Progress {
    pub fn percent(self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.done as f64 / self.total as f64 * 100.0).clamp(0.0, 100.0)
    }
}

/// Formats a remaining duration as `m:ss`, rounding seconds up.
pub fn mmss(remaining: Duration) -> String {
    let secs = remaining.as_millis().div_ceil(1000);
    format!("{}:{:02}", secs / 60, secs % 60)
}

pub fn queue_built(n: usize) -> String {
    format!("Queue built: {n} pixels")
}

pub fn cooling_down(minutes: u32, remaining: Duration) -> String {
    format!("Cooldown {minutes}min... {} left", mmss(remaining))
}

pub fn color_missing(id: u32) -> String {
    format!("ERROR: Color #{id} not found in palette! Pausing.")
}

pub fn aligned(x: i32, y: i32, width: u32, height: u32) -> String {
    format!("Aligned at X:{x} Y:{y}. Size: {width}x{height}")
}

pub fn image_loaded(width: u32, height: u32) -> String {
    format!("Image: {width}x{height}")
}
