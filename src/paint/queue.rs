//! Surface differ and action queue builder.

use crate::paint::model::{
    ActionItem, OrderMode, PaletteEntry, Placement, Rgba, SurfaceBounds, SurfacePoint,
};
use crate::paint::quantize::ColorQuantizer;
use crate::paint::raster::RgbaBuffer;
use std::collections::HashSet;

/// Pixels whose RGB is within this distance of the live surface are already
/// converged.
pub const MATCH_TOLERANCE: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelFilters {
    pub skip_transparent: bool,
    pub alpha_threshold: u8,
    pub skip_white: bool,
    pub white_threshold: u8,
}

impl Default for PixelFilters {
    fn default() -> Self {
        Self {
            skip_transparent: true,
            alpha_threshold: 100,
            skip_white: true,
            white_threshold: 250,
        }
    }
}

impl PixelFilters {
    /// Whether a target pixel should be painted at all.
    pub fn includes(&self, px: Rgba) -> bool {
        if self.skip_transparent && px.a < self.alpha_threshold {
            return false;
        }
        let t = self.white_threshold;
        !(self.skip_white && px.r >= t && px.g >= t && px.b >= t)
    }
}

pub struct QueueInputs<'a> {
    pub target: &'a RgbaBuffer,
    /// Surface sampled at each cell centre, same dimensions as `target`.
    pub live: &'a RgbaBuffer,
    pub palette: &'a [PaletteEntry],
    pub filters: PixelFilters,
    pub placement: Placement,
    pub bounds: SurfaceBounds,
    pub confirmed: &'a HashSet<SurfacePoint>,
    pub order: OrderMode,
}

pub fn build_queue(inputs: &QueueInputs<'_>) -> Vec<ActionItem> {
    let mut quantizer = ColorQuantizer::new(inputs.palette);
    let mut items = Vec::new();

    for y in 0..inputs.target.height {
        for x in 0..inputs.target.width {
            let Some(want) = inputs.target.get(x, y) else {
                continue;
            };
            if !inputs.filters.includes(want) {
                continue;
            }
            let have = inputs.live.get(x, y);
            if have.is_some_and(|have| want.rgb().distance(have.rgb()) <= MATCH_TOLERANCE) {
                continue;
            }
            let Some(entry) = quantizer.nearest(want.rgb()) else {
                continue;
            };
            let Some(target) = inputs.placement.surface_point(inputs.bounds, x, y) else {
                continue;
            };
            if inputs.confirmed.contains(&target) {
                continue;
            }
            items.push(ActionItem {
                source_x: x,
                source_y: y,
                color_id: entry.id,
                rgb: entry.rgb,
                target,
            });
        }
    }

    if inputs.order == OrderMode::ByColor {
        // stable: discovery order survives inside each colour group
        items.sort_by_key(|item| item.color_id);
    }
    items
}

/// Ordered actions plus the cursor of the next unprocessed entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionQueue {
    items: Vec<ActionItem>,
    cursor: usize,
}

impl ActionQueue {
    pub fn new(items: Vec<ActionItem>) -> Self {
        Self { items, cursor: 0 }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn items(&self) -> &[ActionItem] {
        &self.items
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.items.len()
    }

    pub fn current(&self) -> Option<&ActionItem> {
        self.items.get(self.cursor)
    }

    pub fn advance(&mut self) {
        self.cursor += 1;
    }

    /// Places the cursor, clamped to `0..=len`.
    pub fn set_cursor(&mut self, cursor: usize) {
        self.cursor = cursor.min(self.items.len());
    }

    /// Puts rolled-back items back right at the cursor, keeping their order,
    /// and steps the cursor back by the same count.
    pub fn reinsert_at_cursor(&mut self, rolled_back: Vec<ActionItem>) {
        if rolled_back.is_empty() {
            return;
        }
        let count = rolled_back.len();
        let at = self.cursor.min(self.items.len());
        self.items.splice(at..at, rolled_back);
        self.cursor = at.saturating_sub(count);
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.cursor = 0;
    }
}
