use crate::paint::model::Rgba;
use anyhow::{anyhow, bail, Context, Result};
use base64::{engine::general_purpose, Engine as _};
use std::io::Cursor;

const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Row-major RGBA raster. Used for the target image and for live captures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RgbaBuffer {
    pub fn new(width: u32, height: u32, fill: Rgba) -> Self {
        let mut pixels = vec![0u8; (width as usize) * (height as usize) * 4];
        for chunk in pixels.chunks_exact_mut(4) {
            chunk[0] = fill.r;
            chunk[1] = fill.g;
            chunk[2] = fill.b;
            chunk[3] = fill.a;
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn from_pixels(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = (width as usize) * (height as usize) * 4;
        if pixels.len() != expected {
            bail!(
                "rgba buffer {width}x{height} needs {expected} bytes, got {}",
                pixels.len()
            );
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn get(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y as usize) * (self.width as usize) + x as usize) * 4;
        Some(Rgba {
            r: self.pixels[idx],
            g: self.pixels[idx + 1],
            b: self.pixels[idx + 2],
            a: self.pixels[idx + 3],
        })
    }

    pub fn set(&mut self, x: u32, y: u32, color: Rgba) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let idx = ((y as usize) * (self.width as usize) + x as usize) * 4;
        self.pixels[idx] = color.r;
        self.pixels[idx + 1] = color.g;
        self.pixels[idx + 2] = color.b;
        self.pixels[idx + 3] = color.a;
        true
    }

    /// Copies a region out of this raster. Parts of the region outside the
    /// raster come back fully transparent.
    pub fn crop(&self, x: i32, y: i32, width: u32, height: u32) -> RgbaBuffer {
        let mut out = RgbaBuffer::new(width, height, Rgba::default());
        for dy in 0..height {
            for dx in 0..width {
                let sx = x as i64 + dx as i64;
                let sy = y as i64 + dy as i64;
                if sx < 0 || sy < 0 {
                    continue;
                }
                if let Some(px) = self.get(sx as u32, sy as u32) {
                    out.set(dx, dy, px);
                }
            }
        }
        out
    }

    pub fn to_png(&self) -> Result<Vec<u8>> {
        let img = image::RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
            .ok_or_else(|| anyhow!("rgba buffer does not match its dimensions"))?;
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageOutputFormat::Png)
            .context("encode target image as png")?;
        Ok(bytes)
    }

    pub fn from_png(bytes: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(bytes)
            .context("decode png image")?
            .to_rgba8();
        let (width, height) = img.dimensions();
        Self::from_pixels(width, height, img.into_raw())
    }

    pub fn to_data_url(&self) -> Result<String> {
        let png = self.to_png()?;
        Ok(format!(
            "{PNG_DATA_URL_PREFIX}{}",
            general_purpose::STANDARD.encode(png)
        ))
    }

    pub fn from_data_url(url: &str) -> Result<Self> {
        let payload = url
            .strip_prefix(PNG_DATA_URL_PREFIX)
            .ok_or_else(|| anyhow!("image is not a png data url"))?;
        let bytes = general_purpose::STANDARD
            .decode(payload)
            .context("decode base64 image payload")?;
        Self::from_png(&bytes)
    }
}
