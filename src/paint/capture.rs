use crate::paint::error::RunError;
use crate::paint::model::{Placement, Rgba, SurfacePoint};
use crate::paint::raster::RgbaBuffer;
use crate::paint::surface::DrawingSurface;

/// Rectangle picked on the surface, inclusive of both clicked corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub origin: SurfacePoint,
    pub width: u32,
    pub height: u32,
}

impl Selection {
    pub fn from_corners(a: SurfacePoint, b: SurfacePoint) -> Self {
        let min_x = a.x.min(b.x);
        let min_y = a.y.min(b.y);
        let max_x = a.x.max(b.x);
        let max_y = a.y.max(b.y);
        // i64 span: corners at opposite ends of i32 overflow a plain subtraction
        let span = |lo: i32, hi: i32| (hi as i64 - lo as i64 + 1).min(u32::MAX as i64) as u32;
        Self {
            origin: SurfacePoint::new(min_x, min_y),
            width: span(min_x, max_x),
            height: span(min_y, max_y),
        }
    }
}

/// Grabs the selected region as a new target image.
pub fn capture_target(
    surface: &impl DrawingSurface,
    selection: Selection,
) -> Result<RgbaBuffer, RunError> {
    if selection.width == 0 || selection.height == 0 {
        return Err(RunError::NoPosition);
    }
    surface.bounds().ok_or(RunError::NoSurface)?;
    surface
        .capture(selection.origin, selection.width, selection.height)
        .ok_or(RunError::NoSurface)
}

/// Samples the surface under a placed image of `width` x `height` image
/// pixels, one surface pixel per cell centre. The result has the image's
/// dimensions; cells whose centre is off the surface stay transparent.
pub fn capture_live(
    surface: &impl DrawingSurface,
    placement: Placement,
    width: u32,
    height: u32,
) -> Result<RgbaBuffer, RunError> {
    if placement.cell() == 1 {
        return surface
            .capture(placement.origin, width, height)
            .ok_or(RunError::NoSurface);
    }
    surface.bounds().ok_or(RunError::NoSurface)?;
    let mut live = RgbaBuffer::new(width, height, Rgba::default());
    for iy in 0..height {
        for ix in 0..width {
            let (x, y) = placement.cell_centre(ix, iy);
            let (Ok(x), Ok(y)) = (i32::try_from(x), i32::try_from(y)) else {
                continue;
            };
            let sample = surface
                .capture(SurfacePoint::new(x, y), 1, 1)
                .ok_or(RunError::NoSurface)?;
            if let Some(px) = sample.get(0, 0) {
                live.set(ix, iy, px);
            }
        }
    }
    Ok(live)
}
