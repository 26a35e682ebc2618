//! Session persistence: snapshot and restore of a run through a key-value
//! store keyed by origin.

use crate::paint::context::RunContext;
use crate::paint::model::{OrderMode, SurfacePoint};
use crate::paint::queue::ActionQueue;
use crate::paint::raster::RgbaBuffer;
use crate::settings::ManualStart;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

pub const SESSION_KEY_PREFIX: &str = "pixel-converge-session";
const STORE_DIR_NAME: &str = "pixel_converge";

pub fn session_key(origin: &str) -> String {
    format!("{SESSION_KEY_PREFIX}:{origin}")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    /// Target image as a PNG data URL.
    #[serde(default)]
    pub img: Option<String>,
    #[serde(default)]
    pub pos: Option<SurfacePoint>,
    #[serde(default)]
    pub img_width: u32,
    #[serde(default)]
    pub img_height: u32,
    #[serde(default = "default_pixel_size")]
    pub pixel_size: u32,
    #[serde(default)]
    pub skip_white: bool,
    #[serde(default)]
    pub skip_transparent: bool,
    #[serde(default = "default_white_thr")]
    pub white_thr: u8,
    #[serde(default = "default_alpha_thr")]
    pub alpha_thr: u8,
    #[serde(default)]
    pub order: OrderMode,
    #[serde(default)]
    pub turbo: bool,
    #[serde(default = "default_cps")]
    pub cps: u32,
    #[serde(default)]
    pub queue_ptr: usize,
    #[serde(default = "default_cooldown_min")]
    pub cooldown_min: u32,
    #[serde(default)]
    pub manual_start: ManualStart,
    #[serde(default)]
    pub applied_set: Vec<String>,
    #[serde(default)]
    pub ts: i64,
}

fn default_pixel_size() -> u32 {
    1
}

fn default_white_thr() -> u8 {
    250
}

fn default_alpha_thr() -> u8 {
    100
}

fn default_cps() -> u32 {
    80
}

fn default_cooldown_min() -> u32 {
    10
}

pub fn snapshot(ctx: &RunContext) -> Result<SessionSnapshot> {
    let img = match &ctx.target {
        Some(target) if !target.is_empty() => Some(target.to_data_url()?),
        _ => None,
    };
    let mut applied_set: Vec<String> = ctx
        .applied
        .confirmed()
        .iter()
        .map(|point| point.to_string())
        .collect();
    applied_set.sort();

    let s = &ctx.settings;
    Ok(SessionSnapshot {
        img,
        pos: ctx.origin,
        img_width: ctx.width,
        img_height: ctx.height,
        pixel_size: s.pixel_size,
        skip_white: s.skip_white,
        skip_transparent: s.skip_transparent,
        white_thr: s.white_threshold,
        alpha_thr: s.alpha_threshold,
        order: s.order,
        turbo: s.turbo,
        cps: s.rate,
        queue_ptr: ctx.persisted_cursor(),
        cooldown_min: s.cooldown_minutes,
        manual_start: s.manual_start,
        applied_set,
        ts: chrono::Utc::now().timestamp_millis(),
    })
}

/// Applies a snapshot to `ctx`. Everything is decoded before anything is
/// written, so a failure leaves `ctx` as it was.
pub fn restore(ctx: &mut RunContext, snap: &SessionSnapshot) -> bool {
    let target = match snap.img.as_deref().map(RgbaBuffer::from_data_url) {
        Some(Ok(image)) => Some(image),
        Some(Err(err)) => {
            tracing::warn!(?err, "session image could not be decoded");
            return false;
        }
        None => None,
    };
    let mut confirmed = HashSet::with_capacity(snap.applied_set.len());
    for key in &snap.applied_set {
        let Some(point) = SurfacePoint::parse_key(key) else {
            tracing::warn!(key = %key, "session holds a malformed surface key");
            return false;
        };
        confirmed.insert(point);
    }

    if let Some(image) = target {
        ctx.width = image.width;
        ctx.height = image.height;
        ctx.target = Some(image);
    }
    if snap.img_width > 0 && snap.img_height > 0 {
        ctx.width = snap.img_width;
        ctx.height = snap.img_height;
    }
    ctx.origin = snap.pos;

    let settings = &mut ctx.settings;
    settings.pixel_size = snap.pixel_size;
    settings.skip_white = snap.skip_white;
    settings.skip_transparent = snap.skip_transparent;
    settings.white_threshold = snap.white_thr;
    settings.alpha_threshold = snap.alpha_thr;
    settings.order = snap.order;
    settings.turbo = snap.turbo;
    settings.rate = snap.cps;
    settings.cooldown_minutes = snap.cooldown_min;
    settings.manual_start = snap.manual_start;
    settings.sanitize();

    ctx.queue = ActionQueue::default();
    ctx.cursor_hint = snap.queue_ptr;
    ctx.applied.replace_confirmed(confirmed);
    ctx.total_target = ctx.applied.confirmed_len();
    ctx.since_save = 0;
    ctx.last_color = None;
    ctx.last_dispatch = None;
    true
}

pub fn restore_from_text(ctx: &mut RunContext, text: &str) -> bool {
    match serde_json::from_str::<SessionSnapshot>(text) {
        Ok(snap) => restore(ctx, &snap),
        Err(err) => {
            tracing::warn!(?err, "session text is not a valid snapshot");
            false
        }
    }
}

/// Durable text store for snapshots.
pub trait SessionStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    entries: HashMap<String, String>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One JSON file per key inside a folder.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store under the platform data folder, falling back to the working
    /// directory.
    pub fn in_data_dir() -> Self {
        let base = dirs_next::data_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::new(base.join(STORE_DIR_NAME))
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{file}.json"))
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("read session file {}", path.display()))?;
        Ok(Some(content))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("create session folder {}", self.dir.display()))?;
        let path = self.path_for(key);
        std::fs::write(&path, value)
            .with_context(|| format!("write session file {}", path.display()))
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => {
                Err(err).with_context(|| format!("remove session file {}", path.display()))
            }
        }
    }
}
