use crate::paint::applied::AppliedState;
use crate::paint::model::{PaletteEntry, Placement, SurfacePoint};
use crate::paint::queue::ActionQueue;
use crate::paint::raster::RgbaBuffer;
use crate::settings::RunSettings;
use std::time::Instant;

/// Everything one convergence session owns. Created with the runner,
/// mutated by the runner and its handlers, torn down on stop.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    pub settings: RunSettings,
    pub target: Option<RgbaBuffer>,
    pub origin: Option<SurfacePoint>,
    /// Selected area size in image pixels. Matches the target once captured.
    pub width: u32,
    pub height: u32,
    pub queue: ActionQueue,
    /// Cursor to apply after the next queue build, e.g. one restored from a
    /// snapshot.
    pub cursor_hint: usize,
    pub applied: AppliedState,
    pub palette: Vec<PaletteEntry>,
    pub total_target: usize,
    pub since_save: u32,
    pub last_color: Option<u32>,
    pub last_dispatch: Option<Instant>,
}

impl RunContext {
    pub fn new(settings: RunSettings) -> Self {
        Self {
            settings: settings.sanitized(),
            ..Self::default()
        }
    }

    pub fn placement(&self) -> Option<Placement> {
        Some(Placement {
            origin: self.origin?,
            cell_size: self.settings.pixel_size.max(1),
        })
    }

    /// Cursor value worth persisting: the live one while a queue exists,
    /// otherwise the pending hint.
    pub fn persisted_cursor(&self) -> usize {
        if self.queue.is_empty() {
            self.cursor_hint
        } else {
            self.queue.cursor()
        }
    }

    /// Drops the queue and every tracked action.
    pub fn reset_progress(&mut self) {
        self.queue.clear();
        self.cursor_hint = 0;
        self.applied.clear();
        self.total_target = 0;
        self.since_save = 0;
        self.last_color = None;
        self.last_dispatch = None;
    }
}
