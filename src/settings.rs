use crate::paint::model::OrderMode;
use crate::paint::queue::PixelFilters;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const SETTINGS_FILE_NAME: &str = "settings.json";

pub const MIN_RATE: u32 = 1;
pub const MAX_RATE: u32 = 1000;
pub const MIN_COOLDOWN_MINUTES: u32 = 1;
pub const MAX_COOLDOWN_MINUTES: u32 = 60;
/// Largest cell edge, in surface pixels, that one image pixel may cover.
pub const MAX_PIXEL_SIZE: u32 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ManualStart {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub index: usize,
}

impl ManualStart {
    /// Start index to use for a freshly built queue of `queue_len` items.
    /// Only honoured when enabled and strictly inside the queue.
    pub fn resolve(self, queue_len: usize) -> Option<usize> {
        (self.enabled && self.index > 0 && self.index < queue_len).then_some(self.index)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSettings {
    /// Actions per second.
    #[serde(default = "default_rate")]
    pub rate: u32,
    #[serde(default = "default_cooldown_minutes")]
    pub cooldown_minutes: u32,
    #[serde(default)]
    pub order: OrderMode,
    #[serde(default = "default_true")]
    pub skip_transparent: bool,
    #[serde(default = "default_alpha_threshold")]
    pub alpha_threshold: u8,
    #[serde(default = "default_true")]
    pub skip_white: bool,
    #[serde(default = "default_white_threshold")]
    pub white_threshold: u8,
    #[serde(default)]
    pub manual_start: ManualStart,
    /// Dispatch at the maximum rate, ignoring `rate`.
    #[serde(default)]
    pub turbo: bool,
    /// Surface pixels per image pixel.
    #[serde(default = "default_pixel_size")]
    pub pixel_size: u32,
    /// Persist silently after this many successful dispatches.
    #[serde(default = "default_autosave_every")]
    pub autosave_every: u32,
    #[serde(default)]
    pub debug_logging: bool,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

fn default_rate() -> u32 {
    80
}

fn default_cooldown_minutes() -> u32 {
    10
}

fn default_true() -> bool {
    true
}

fn default_alpha_threshold() -> u8 {
    100
}

fn default_white_threshold() -> u8 {
    250
}

fn default_pixel_size() -> u32 {
    1
}

fn default_autosave_every() -> u32 {
    50
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            rate: default_rate(),
            cooldown_minutes: default_cooldown_minutes(),
            order: OrderMode::default(),
            skip_transparent: true,
            alpha_threshold: default_alpha_threshold(),
            skip_white: true,
            white_threshold: default_white_threshold(),
            manual_start: ManualStart::default(),
            turbo: false,
            pixel_size: default_pixel_size(),
            autosave_every: default_autosave_every(),
            debug_logging: false,
            log_file: None,
        }
    }
}

impl RunSettings {
    pub fn sanitize(&mut self) {
        self.rate = self.rate.clamp(MIN_RATE, MAX_RATE);
        self.cooldown_minutes = self
            .cooldown_minutes
            .clamp(MIN_COOLDOWN_MINUTES, MAX_COOLDOWN_MINUTES);
        self.pixel_size = self.pixel_size.clamp(1, MAX_PIXEL_SIZE);
        self.autosave_every = self.autosave_every.max(1);
    }

    pub fn sanitized(mut self) -> Self {
        self.sanitize();
        self
    }

    pub fn effective_rate(&self) -> u32 {
        if self.turbo {
            MAX_RATE
        } else {
            self.rate.clamp(MIN_RATE, MAX_RATE)
        }
    }

    /// Minimum spacing between two dispatches.
    pub fn dispatch_interval(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / self.effective_rate() as u64)
    }

    pub fn cooldown(&self) -> Duration {
        let minutes = self
            .cooldown_minutes
            .clamp(MIN_COOLDOWN_MINUTES, MAX_COOLDOWN_MINUTES);
        Duration::from_secs(minutes as u64 * 60)
    }

    pub fn filters(&self) -> PixelFilters {
        PixelFilters {
            skip_transparent: self.skip_transparent,
            alpha_threshold: self.alpha_threshold,
            skip_white: self.skip_white,
            white_threshold: self.white_threshold,
        }
    }
}

/// Loads settings from `path`. A missing or blank file yields defaults.
pub fn load_from_path(path: &Path) -> Result<RunSettings> {
    if !path.exists() {
        return Ok(RunSettings::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("read settings file {}", path.display()))?;
    if content.trim().is_empty() {
        return Ok(RunSettings::default());
    }
    let loaded: RunSettings = serde_json::from_str(&content)
        .with_context(|| format!("deserialize settings file {}", path.display()))?;
    Ok(loaded.sanitized())
}

pub fn save_to_path(path: &Path, settings: &RunSettings) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create settings parent folder {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(&settings.clone().sanitized())
        .context("serialize settings")?;
    std::fs::write(path, json).with_context(|| format!("write settings file {}", path.display()))
}
