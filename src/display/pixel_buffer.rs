use crate::color::Rgba;
use crate::surface::{Rect, RenderSurface};

use super::font::{draw_text, GLYPH_HEIGHT};

// ============================================================================
// Utility Functions
// ============================================================================

/// Alpha blend a single color channel
/// Uses fast approximation: (x + 1 + (x >> 8)) >> 8 instead of x / 255
#[inline]
fn blend_channel(src: u8, dst: u8, alpha: u16) -> u8 {
    let result = src as u16 * alpha + dst as u16 * (255 - alpha);
    ((result + 1 + (result >> 8)) >> 8) as u8
}

/// Blend into one ABGR pixel (RGBA8888 little-endian byte order), result opaque
#[inline]
fn blend_into(dest: &mut [u8], r: u8, g: u8, b: u8, alpha: u16) {
    dest[0] = 255; // A
    dest[1] = blend_channel(b, dest[1], alpha);
    dest[2] = blend_channel(g, dest[2], alpha);
    dest[3] = blend_channel(r, dest[3], alpha);
}

// ============================================================================
// PixelBuffer
// ============================================================================

/// RGBA8888 software canvas that the SDL2 window presents.
/// "Clearing" paints the background colour; every draw alpha-blends over it.
pub struct PixelBuffer {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    background: (u8, u8, u8),
}

impl PixelBuffer {
    /// Deep ocean blue
    pub const DEFAULT_BACKGROUND: (u8, u8, u8) = (4, 14, 30);

    pub fn with_size(width: u32, height: u32) -> Self {
        let mut buffer = Self {
            pixels: vec![0; (width * height * 4) as usize],
            width,
            height,
            background: Self::DEFAULT_BACKGROUND,
        };
        buffer.fill_background();
        buffer
    }

    pub fn with_background(mut self, r: u8, g: u8, b: u8) -> Self {
        self.background = (r, g, b);
        self.fill_background();
        self
    }

    #[inline]
    pub fn width_px(&self) -> u32 {
        self.width
    }

    /// Check if coordinates are within bounds
    #[inline]
    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32
    }

    /// Calculate byte offset for pixel at (x, y)
    #[inline]
    fn pixel_index(&self, x: u32, y: u32) -> usize {
        ((y * self.width + x) * 4) as usize
    }

    /// Paint the whole buffer with the background colour
    pub fn fill_background(&mut self) {
        let (r, g, b) = self.background;
        for chunk in self.pixels.chunks_exact_mut(4) {
            chunk.copy_from_slice(&[255, b, g, r]);
        }
    }

    /// Set pixel with alpha blending
    #[inline]
    pub fn blend_pixel(&mut self, x: i32, y: i32, r: u8, g: u8, b: u8, a: u8) {
        if a == 0 || !self.in_bounds(x, y) {
            return;
        }
        let idx = self.pixel_index(x as u32, y as u32);
        blend_into(&mut self.pixels[idx..idx + 4], r, g, b, a as u16);
    }

    /// Read a pixel from the buffer (bounds checked)
    #[cfg(test)]
    pub fn get_pixel(&self, x: i32, y: i32) -> Option<(u8, u8, u8)> {
        if self.in_bounds(x, y) {
            let idx = self.pixel_index(x as u32, y as u32);
            Some((
                self.pixels[idx + 3], // R
                self.pixels[idx + 2], // G
                self.pixels[idx + 1], // B
            ))
        } else {
            None
        }
    }

    /// Horizontal span with alpha blending, clipped to the buffer
    pub fn hline_blend(&mut self, x1: i32, x2: i32, y: i32, r: u8, g: u8, b: u8, a: u8) {
        if a == 0 || y < 0 || y >= self.height as i32 {
            return;
        }
        let (x1, x2) = if x1 <= x2 { (x1, x2) } else { (x2, x1) };
        let start = x1.max(0);
        let end = x2.min(self.width as i32 - 1);
        if start > end {
            return;
        }

        let alpha = a as u16;
        let mut idx = self.pixel_index(start as u32, y as u32);
        for _ in start..=end {
            blend_into(&mut self.pixels[idx..idx + 4], r, g, b, alpha);
            idx += 4;
        }
    }

    /// Vertical span with alpha blending, clipped to the buffer
    pub fn vline_blend(&mut self, x: i32, y1: i32, y2: i32, r: u8, g: u8, b: u8, a: u8) {
        if a == 0 || x < 0 || x >= self.width as i32 {
            return;
        }
        let (y1, y2) = if y1 <= y2 { (y1, y2) } else { (y2, y1) };
        let start = y1.max(0);
        let end = y2.min(self.height as i32 - 1);
        if start > end {
            return;
        }

        let alpha = a as u16;
        let stride = (self.width * 4) as usize;
        let mut idx = self.pixel_index(x as u32, start as u32);
        for _ in start..=end {
            blend_into(&mut self.pixels[idx..idx + 4], r, g, b, alpha);
            idx += stride;
        }
    }

    /// Filled circle with alpha blending, drawn as horizontal spans.
    /// Each row is blended once so overlapping octants do not double up.
    pub fn fill_circle_blend(&mut self, cx: i32, cy: i32, radius: i32, r: u8, g: u8, b: u8, a: u8) {
        if radius <= 0 {
            if radius == 0 {
                self.blend_pixel(cx, cy, r, g, b, a);
            }
            return;
        }

        let r2 = radius * radius + radius;
        for dy in -radius..=radius {
            let half = ((r2 - dy * dy) as f32).sqrt() as i32;
            self.hline_blend(cx - half, cx + half, cy + dy, r, g, b, a);
        }
    }

    /// Raw bytes for SDL texture upload
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }
}

/// Float rectangle to clipped integer pixel bounds (x0, y0, x1, y1), inclusive
fn pixel_bounds(rect: Rect) -> (i32, i32, i32, i32) {
    let x0 = rect.x.round() as i32;
    let y0 = rect.y.round() as i32;
    let x1 = (rect.x + rect.w).round() as i32 - 1;
    let y1 = (rect.y + rect.h).round() as i32 - 1;
    (x0, y0, x1, y1)
}

impl RenderSurface for PixelBuffer {
    fn width(&self) -> f32 {
        self.width as f32
    }

    fn height(&self) -> f32 {
        self.height as f32
    }

    fn clear(&mut self, region: Rect) {
        let (r, g, b) = self.background;
        let (x0, y0, x1, y1) = pixel_bounds(region);
        for y in y0.max(0)..=y1.min(self.height as i32 - 1) {
            self.hline_blend(x0, x1, y, r, g, b, 255);
        }
    }

    fn fill_circle(&mut self, x: f32, y: f32, radius: f32, color: Rgba) {
        self.fill_circle_blend(
            x.round() as i32,
            y.round() as i32,
            radius.round() as i32,
            color.r,
            color.g,
            color.b,
            color.alpha_u8(),
        );
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        let (x0, y0, x1, y1) = pixel_bounds(rect);
        let a = color.alpha_u8();
        for y in y0.max(0)..=y1.min(self.height as i32 - 1) {
            self.hline_blend(x0, x1, y, color.r, color.g, color.b, a);
        }
    }

    fn stroke_rect(&mut self, rect: Rect, color: Rgba) {
        let (x0, y0, x1, y1) = pixel_bounds(rect);
        let a = color.alpha_u8();
        self.hline_blend(x0, x1, y0, color.r, color.g, color.b, a);
        self.hline_blend(x0, x1, y1, color.r, color.g, color.b, a);
        // Corners already covered by the horizontal edges
        self.vline_blend(x0, y0 + 1, y1 - 1, color.r, color.g, color.b, a);
        self.vline_blend(x1, y0 + 1, y1 - 1, color.r, color.g, color.b, a);
    }

    /// `y` is the text baseline, as on an HTML canvas
    fn fill_text(&mut self, text: &str, x: f32, y: f32, color: Rgba) {
        let top = y.round() as i32 - GLYPH_HEIGHT as i32;
        draw_text(self, x.round() as i32, top, text, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BG: (u8, u8, u8) = PixelBuffer::DEFAULT_BACKGROUND;

    #[test]
    fn test_starts_with_background() {
        let buf = PixelBuffer::with_size(8, 8);
        assert_eq!(buf.get_pixel(0, 0), Some(BG));
        assert_eq!(buf.get_pixel(7, 7), Some(BG));
        assert_eq!(buf.get_pixel(8, 0), None);
    }

    #[test]
    fn test_opaque_circle_and_clear() {
        let mut buf = PixelBuffer::with_size(32, 32);
        buf.fill_circle(16.0, 16.0, 4.0, Rgba::new(255, 0, 0, 1.0));
        assert_eq!(buf.get_pixel(16, 16), Some((255, 0, 0)));
        assert_eq!(buf.get_pixel(20, 16), Some((255, 0, 0)));
        assert_eq!(buf.get_pixel(16, 22), Some(BG));

        buf.clear_all();
        assert_eq!(buf.get_pixel(16, 16), Some(BG));
    }

    #[test]
    fn test_half_alpha_blends() {
        let mut buf = PixelBuffer::with_size(4, 4).with_background(0, 0, 0);
        buf.fill_rect(Rect::new(0.0, 0.0, 2.0, 2.0), Rgba::new(200, 100, 0, 0.5));
        let (r, g, b) = buf.get_pixel(1, 1).unwrap();
        assert!((99..=101).contains(&r), "r={}", r);
        assert!((49..=51).contains(&g), "g={}", g);
        assert_eq!(b, 0);
        assert_eq!(buf.get_pixel(2, 2), Some((0, 0, 0)));
    }

    #[test]
    fn test_clipping_off_surface() {
        let mut buf = PixelBuffer::with_size(10, 10);
        buf.fill_circle(-50.0, 400.0, 5.0, Rgba::WHITE);
        buf.fill_rect(Rect::new(-5.0, -5.0, 3.0, 3.0), Rgba::WHITE);
        for y in 0..10 {
            for x in 0..10 {
                assert_eq!(buf.get_pixel(x, y), Some(BG));
            }
        }
    }

    #[test]
    fn test_stroke_rect_outline_only() {
        let mut buf = PixelBuffer::with_size(10, 10).with_background(0, 0, 0);
        buf.stroke_rect(Rect::new(2.0, 2.0, 5.0, 5.0), Rgba::WHITE);
        assert_eq!(buf.get_pixel(2, 2), Some((255, 255, 255)));
        assert_eq!(buf.get_pixel(6, 6), Some((255, 255, 255)));
        assert_eq!(buf.get_pixel(2, 4), Some((255, 255, 255)));
        assert_eq!(buf.get_pixel(4, 4), Some((0, 0, 0)));
    }
}
