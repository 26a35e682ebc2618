//! In-memory drawing surface with paint charges, used by the headless binary
//! and the tests.

use crate::paint::driver::Clock;
use crate::paint::model::{PaletteEntry, Rgb, Rgba, SurfaceBounds, SurfacePoint};
use crate::paint::palette::{extract_palette, ColorControl};
use crate::paint::raster::RgbaBuffer;
use crate::paint::signals::{classify_notification, SignalKind, SignalSender};
use crate::paint::surface::{DrawingSurface, PaletteControls};
use std::rc::Rc;
use std::time::{Duration, Instant};

const DEPLETED_TOAST: &str = "Out of paint! Wait for your charges to recover.";

/// The free colours of the usual pixel canvas, ids 1 to 31.
pub fn basic_palette() -> Vec<ColorControl> {
    const COLORS: [(u8, u8, u8); 31] = [
        (0, 0, 0),
        (60, 60, 60),
        (120, 120, 120),
        (210, 210, 210),
        (255, 255, 255),
        (96, 0, 24),
        (237, 28, 36),
        (255, 127, 39),
        (246, 170, 9),
        (249, 221, 59),
        (255, 250, 188),
        (14, 185, 104),
        (19, 230, 123),
        (135, 255, 94),
        (12, 129, 110),
        (16, 174, 166),
        (19, 225, 190),
        (40, 80, 158),
        (64, 147, 228),
        (96, 247, 242),
        (107, 80, 246),
        (153, 177, 251),
        (120, 12, 153),
        (170, 56, 185),
        (224, 159, 249),
        (203, 0, 122),
        (236, 31, 128),
        (243, 141, 169),
        (104, 70, 52),
        (149, 104, 42),
        (248, 178, 119),
    ];
    COLORS
        .iter()
        .zip(1u32..)
        .map(|(&(r, g, b), id)| ColorControl::new(id, Rgb::new(r, g, b)))
        .collect()
}

#[derive(Debug, Clone, Copy)]
struct Charges {
    left: u32,
    capacity: u32,
    regen: Option<Duration>,
    last_regen: Instant,
}

pub struct SimulatedSurface {
    canvas: RgbaBuffer,
    controls: Vec<ColorControl>,
    attached: bool,
    palette_open: bool,
    active: Option<Rgb>,
    intents: Vec<(SurfacePoint, Rgb)>,
    charges: Option<Charges>,
    signals: Option<SignalSender>,
    clock: Rc<dyn Clock>,
    pub paint_calls: usize,
    pub rejected_paints: usize,
    pub select_calls: usize,
    pub commit_calls: usize,
}

impl SimulatedSurface {
    pub fn new(canvas: RgbaBuffer, controls: Vec<ColorControl>, clock: Rc<dyn Clock>) -> Self {
        Self {
            canvas,
            controls,
            attached: true,
            palette_open: true,
            active: None,
            intents: Vec::new(),
            charges: None,
            signals: None,
            clock,
            paint_calls: 0,
            rejected_paints: 0,
            select_calls: 0,
            commit_calls: 0,
        }
    }

    /// Blank white canvas with the basic palette.
    pub fn blank(width: u32, height: u32, clock: Rc<dyn Clock>) -> Self {
        Self::new(RgbaBuffer::new(width, height, Rgba::WHITE), basic_palette(), clock)
    }

    pub fn with_signals(mut self, sender: SignalSender) -> Self {
        self.signals = Some(sender);
        self
    }

    /// Limits painting to `capacity` accepted intents, regaining one every
    /// `regen` when given.
    pub fn with_charges(mut self, capacity: u32, regen: Option<Duration>) -> Self {
        self.charges = Some(Charges {
            left: capacity,
            capacity,
            regen,
            last_regen: self.clock.now(),
        });
        self
    }

    pub fn canvas(&self) -> &RgbaBuffer {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut RgbaBuffer {
        &mut self.canvas
    }

    pub fn set_attached(&mut self, attached: bool) {
        self.attached = attached;
    }

    pub fn set_palette_open(&mut self, open: bool) {
        self.palette_open = open;
    }

    pub fn pending_intents(&self) -> usize {
        self.intents.len()
    }

    pub fn charges_left(&mut self) -> Option<u32> {
        self.regenerate();
        self.charges.map(|c| c.left)
    }

    pub fn show_challenge(&self) {
        self.emit(SignalKind::ChallengeShown);
    }

    pub fn clear_challenge(&self) {
        self.emit(SignalKind::ChallengeCleared);
    }

    fn emit(&self, kind: SignalKind) {
        self.emit_at(kind, self.clock.now());
    }

    /// Shows a toast on the surface. Toasts the observer recognises become
    /// signals.
    fn toast(&self, text: &str) {
        match classify_notification(text, self.clock.now()) {
            Some(signal) => self.emit_at(signal.kind, signal.at),
            None => tracing::debug!(text, "surface toast"),
        }
    }

    fn emit_at(&self, kind: SignalKind, at: Instant) {
        if let Some(sender) = &self.signals {
            if !sender.send(kind, at) {
                tracing::debug!(?kind, "signal dropped, feed closed");
            }
        }
    }

    fn regenerate(&mut self) {
        let now = self.clock.now();
        let Some(charges) = self.charges.as_mut() else {
            return;
        };
        let Some(every) = charges.regen.filter(|d| !d.is_zero()) else {
            return;
        };
        let elapsed = now.saturating_duration_since(charges.last_regen);
        let gained = (elapsed.as_nanos() / every.as_nanos()) as u32;
        if gained > 0 {
            charges.left = charges.left.saturating_add(gained).min(charges.capacity);
            charges.last_regen += every * gained;
        }
    }

    /// Takes one charge. `false` when none is left.
    fn spend(&mut self) -> bool {
        self.regenerate();
        match self.charges.as_mut() {
            None => true,
            Some(charges) if charges.left > 0 => {
                charges.left -= 1;
                true
            }
            Some(_) => false,
        }
    }
}

impl PaletteControls for SimulatedSurface {
    fn list(&self) -> Vec<PaletteEntry> {
        if !self.palette_open {
            return Vec::new();
        }
        extract_palette(&self.controls)
    }

    fn select(&mut self, id: u32) -> bool {
        self.select_calls += 1;
        if !self.palette_open {
            return false;
        }
        let Some(entry) = extract_palette(&self.controls)
            .into_iter()
            .find(|entry| entry.id == id)
        else {
            return false;
        };
        self.active = Some(entry.rgb);
        true
    }
}

impl DrawingSurface for SimulatedSurface {
    fn bounds(&self) -> Option<SurfaceBounds> {
        self.attached.then_some(SurfaceBounds {
            width: self.canvas.width,
            height: self.canvas.height,
        })
    }

    fn capture(&self, origin: SurfacePoint, width: u32, height: u32) -> Option<RgbaBuffer> {
        self.attached
            .then(|| self.canvas.crop(origin.x, origin.y, width, height))
    }

    fn paint(&mut self, at: SurfacePoint) {
        self.paint_calls += 1;
        let Some(rgb) = self.active else {
            tracing::debug!(%at, "paint without an active colour");
            return;
        };
        if !self.spend() {
            self.rejected_paints += 1;
            self.toast(DEPLETED_TOAST);
            return;
        }
        self.intents.push((at, rgb));
    }

    fn commit(&mut self) -> bool {
        self.commit_calls += 1;
        for (at, rgb) in self.intents.drain(..) {
            if at.x < 0 || at.y < 0 {
                continue;
            }
            self.canvas
                .set(at.x as u32, at.y as u32, Rgba::rgba(rgb.r, rgb.g, rgb.b, 255));
        }
        true
    }
}
