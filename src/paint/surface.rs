use crate::paint::model::{PaletteEntry, SurfaceBounds, SurfacePoint};
use crate::paint::raster::RgbaBuffer;

/// Selectable colours of the surface.
pub trait PaletteControls {
    /// Current palette in control order. Empty when the palette UI is closed.
    fn list(&self) -> Vec<PaletteEntry>;
    /// Activates the control for `id`. `false` when no such control exists.
    fn select(&mut self, id: u32) -> bool;
}

/// The live drawing surface the runner paints on.
pub trait DrawingSurface: PaletteControls {
    /// Visible size, or `None` when the surface cannot be found.
    fn bounds(&self) -> Option<SurfaceBounds>;
    /// Raster of a region in surface coordinates.
    fn capture(&self, origin: SurfacePoint, width: u32, height: u32) -> Option<RgbaBuffer>;
    /// Sends a paint intent for `at` with the active colour.
    fn paint(&mut self, at: SurfacePoint);
    /// Presses the commit control. `false` when it is missing.
    fn commit(&mut self) -> bool;
}
