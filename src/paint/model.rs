use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Squared Euclidean distance in RGB space.
    pub fn distance_sq(self, other: Rgb) -> u32 {
        let dr = self.r as i32 - other.r as i32;
        let dg = self.g as i32 - other.g as i32;
        let db = self.b as i32 - other.b as i32;
        (dr * dr + dg * dg + db * db) as u32
    }

    pub fn distance(self, other: Rgb) -> f64 {
        (self.distance_sq(other) as f64).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const WHITE: Self = Self::rgba(255, 255, 255, 255);
    pub const BLACK: Self = Self::rgba(0, 0, 0, 255);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn rgb(self) -> Rgb {
        Rgb::new(self.r, self.g, self.b)
    }
}

/// A point in surface space, also the identity of an action for dedup and
/// rollback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SurfacePoint {
    pub x: i32,
    pub y: i32,
}

impl SurfacePoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Parses the `"x,y"` form used in persisted snapshots.
    pub fn parse_key(key: &str) -> Option<Self> {
        let (x, y) = key.split_once(',')?;
        Some(Self {
            x: x.trim().parse().ok()?,
            y: y.trim().parse().ok()?,
        })
    }
}

impl fmt::Display for SurfacePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SurfaceBounds {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PaletteEntry {
    pub id: u32,
    pub rgb: Rgb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionItem {
    pub source_x: u32,
    pub source_y: u32,
    pub color_id: u32,
    pub rgb: Rgb,
    pub target: SurfacePoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OrderMode {
    #[serde(rename = "scanline")]
    Scanline,
    #[default]
    #[serde(rename = "bycolor", alias = "by-color")]
    ByColor,
}

/// Where the target image sits on the surface and how large one image pixel
/// is in surface units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub origin: SurfacePoint,
    pub cell_size: u32,
}

impl Placement {
    pub fn cell(self) -> u32 {
        self.cell_size.max(1)
    }

    /// Maps an image pixel to the centre of its cell on the surface, or
    /// `None` when that point is off the visible surface.
    pub fn surface_point(self, bounds: SurfaceBounds, ix: u32, iy: u32) -> Option<SurfacePoint> {
        let (x, y) = self.cell_centre(ix, iy);
        if x < 0 || y < 0 || x >= bounds.width as i64 || y >= bounds.height as i64 {
            return None;
        }
        Some(SurfacePoint::new(x as i32, y as i32))
    }

    /// Centre of an image pixel's cell in surface space, unbounded.
    pub fn cell_centre(self, ix: u32, iy: u32) -> (i64, i64) {
        let cell = self.cell() as i64;
        (
            self.origin.x as i64 + ix as i64 * cell + cell / 2,
            self.origin.y as i64 + iy as i64 * cell + cell / 2,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_key_roundtrips_through_display() {
        let point = SurfacePoint::new(-3, 42);
        assert_eq!(SurfacePoint::parse_key(&point.to_string()), Some(point));
        assert_eq!(SurfacePoint::parse_key("12"), None);
        assert_eq!(SurfacePoint::parse_key("a,b"), None);
    }

    #[test]
    fn placement_picks_cell_centre() {
        let placement = Placement {
            origin: SurfacePoint::new(10, 20),
            cell_size: 4,
        };
        let bounds = SurfaceBounds {
            width: 100,
            height: 100,
        };
        assert_eq!(
            placement.surface_point(bounds, 2, 1),
            Some(SurfacePoint::new(20, 26))
        );
    }

    #[test]
    fn placement_rejects_points_past_the_surface() {
        let placement = Placement {
            origin: SurfacePoint::new(-1, 0),
            cell_size: 1,
        };
        let bounds = SurfaceBounds {
            width: 5,
            height: 5,
        };
        assert_eq!(placement.surface_point(bounds, 0, 0), None);
        assert_eq!(placement.surface_point(bounds, 7, 0), None);
        assert_eq!(placement.surface_point(bounds, 6, 0), None);
        assert_eq!(
            placement.surface_point(bounds, 5, 0),
            Some(SurfacePoint::new(4, 0))
        );
        assert_eq!(
            placement.surface_point(bounds, 1, 0),
            Some(SurfacePoint::new(0, 0))
        );
    }

    #[test]
    fn order_mode_accepts_both_spellings() {
        let a: OrderMode = serde_json::from_str("\"bycolor\"").unwrap();
        let b: OrderMode = serde_json::from_str("\"by-color\"").unwrap();
        let c: OrderMode = serde_json::from_str("\"scanline\"").unwrap();
        assert_eq!(a, OrderMode::ByColor);
        assert_eq!(b, OrderMode::ByColor);
        assert_eq!(c, OrderMode::Scanline);
    }
}
