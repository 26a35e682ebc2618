//! Palette registry: turns the surface's colour controls into palette entries.

use crate::paint::model::{PaletteEntry, Rgb};
use once_cell::sync::Lazy;
use regex::Regex;

const CONTROL_ID_PREFIX: &str = "color-";

static CHANNEL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

/// One colour control as exposed by the surface's control panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorControl {
    /// Element identifier, `color-<id>`.
    pub element_id: String,
    /// CSS background colour, usually `rgb(r, g, b)`.
    pub background: String,
    /// Locked controls carry an icon overlay and cannot be selected.
    pub locked: bool,
}

impl ColorControl {
    pub fn new(id: u32, rgb: Rgb) -> Self {
        Self {
            element_id: format!("{CONTROL_ID_PREFIX}{id}"),
            background: format!("rgb({}, {}, {})", rgb.r, rgb.g, rgb.b),
            locked: false,
        }
    }
}

pub fn control_id(element_id: &str) -> Option<u32> {
    element_id
        .strip_prefix(CONTROL_ID_PREFIX)?
        .trim()
        .parse()
        .ok()
}

pub fn parse_background(background: &str) -> Option<Rgb> {
    let mut channels = CHANNEL_RE
        .find_iter(background)
        .map(|m| m.as_str().parse::<u8>().ok());
    let r = channels.next()??;
    let g = channels.next()??;
    let b = channels.next()??;
    Some(Rgb::new(r, g, b))
}

/// Snapshot of the selectable palette, in control order. Controls without a
/// numeric id or a readable colour are dropped. An empty result means the
/// palette UI is not available.
pub fn extract_palette(controls: &[ColorControl]) -> Vec<PaletteEntry> {
    controls
        .iter()
        .filter(|control| !control.locked)
        .filter_map(|control| {
            let id = control_id(&control.element_id)?;
            let rgb = parse_background(&control.background)?;
            Some(PaletteEntry { id, rgb })
        })
        .collect()
}
