//! Drawing surface abstraction
//!
//! The player and the field simulator only ever issue these primitive calls.
//! `PixelBuffer` implements it for the SDL2 window; tests use `RecordingSurface`.

use crate::color::Rgba;
use crate::error::{Error, Result};

/// Axis-aligned rectangle in pixel space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }
}

/// A 2-D drawing target
pub trait RenderSurface {
    fn width(&self) -> f32;
    fn height(&self) -> f32;

    /// Reset a region to fully transparent
    fn clear(&mut self, region: Rect);
    fn fill_circle(&mut self, x: f32, y: f32, radius: f32, color: Rgba);
    fn fill_rect(&mut self, rect: Rect, color: Rgba);
    fn stroke_rect(&mut self, rect: Rect, color: Rgba);
    fn fill_text(&mut self, text: &str, x: f32, y: f32, color: Rgba);

    /// The whole drawable area
    fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width(), self.height())
    }

    fn clear_all(&mut self) {
        let bounds = self.bounds();
        self.clear(bounds);
    }
}

/// Fail construction when a surface has no usable area
pub fn ensure_usable(surface: &impl RenderSurface) -> Result<()> {
    let (w, h) = (surface.width(), surface.height());
    if !w.is_finite() || !h.is_finite() || w <= 0.0 || h <= 0.0 {
        return Err(Error::MissingSurface(format!(
            "surface has no drawable area ({}x{})",
            w, h
        )));
    }
    Ok(())
}

#[cfg(test)]
pub use recording::{DrawCommand, RecordingSurface};
