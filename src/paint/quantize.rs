use crate::paint::model::{PaletteEntry, Rgb};
use std::collections::HashMap;

/// Nearest-palette lookup with a cache that lives for one queue build.
///
/// Ties go to the entry met first in palette order.
#[derive(Debug)]
pub struct ColorQuantizer<'a> {
    palette: &'a [PaletteEntry],
    cache: HashMap<Rgb, PaletteEntry>,
}

impl<'a> ColorQuantizer<'a> {
    pub fn new(palette: &'a [PaletteEntry]) -> Self {
        Self {
            palette,
            cache: HashMap::new(),
        }
    }

    pub fn nearest(&mut self, rgb: Rgb) -> Option<PaletteEntry> {
        if let Some(hit) = self.cache.get(&rgb) {
            return Some(*hit);
        }
        let best = nearest_uncached(rgb, self.palette)?;
        self.cache.insert(rgb, best);
        Some(best)
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }
}

pub fn nearest_uncached(rgb: Rgb, palette: &[PaletteEntry]) -> Option<PaletteEntry> {
    let mut best: Option<(u32, PaletteEntry)> = None;
    for entry in palette {
        let d = rgb.distance_sq(entry.rgb);
        match best {
            Some((best_d, _)) if d >= best_d => {}
            _ => best = Some((d, *entry)),
        }
    }
    best.map(|(_, entry)| entry)
}
