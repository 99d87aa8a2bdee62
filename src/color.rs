//! Structured RGBA colour

use serde::{Deserialize, Serialize};

/// 8-bit RGB channels with a fractional alpha in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::new(255, 255, 255, 1.0);

    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Same colour at a different alpha (clamped to [0, 1])
    #[inline]
    pub fn with_alpha(self, a: f32) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }

    /// Alpha as a 0-255 byte for blending
    #[inline]
    pub fn alpha_u8(&self) -> u8 {
        (self.a.clamp(0.0, 1.0) * 255.0).round() as u8
    }

    /// Build from HSL + alpha.
    /// h: degrees (wraps), s/l/a: 0-1
    pub fn from_hsla(h: f32, s: f32, l: f32, a: f32) -> Self {
        let (r, g, b) = hsl_to_rgb(h, s, l);
        Self::new(r, g, b, a.clamp(0.0, 1.0))
    }
}

/// HSL to RGB colour conversion
/// h: 0-360, s: 0-1, l: 0-1
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> (u8, u8, u8) {
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let h_prime = h.rem_euclid(360.0) / 60.0;
    let x = c * (1.0 - ((h_prime % 2.0) - 1.0).abs());
    let m = l - c / 2.0;

    let (r1, g1, b1) = match h_prime as i32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    (
        ((r1 + m) * 255.0).round() as u8,
        ((g1 + m) * 255.0).round() as u8,
        ((b1 + m) * 255.0).round() as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_alpha_keeps_channels() {
        let c = Rgba::new(40, 200, 255, 0.6);
        let faded = c.with_alpha(0.25);
        assert_eq!((faded.r, faded.g, faded.b), (40, 200, 255));
        assert_eq!(faded.a, 0.25);
        assert_eq!(c.with_alpha(3.0).a, 1.0);
        assert_eq!(c.with_alpha(-1.0).a, 0.0);
    }

    #[test]
    fn test_hsl_primaries() {
        assert_eq!(hsl_to_rgb(0.0, 1.0, 0.5), (255, 0, 0));
        assert_eq!(hsl_to_rgb(120.0, 1.0, 0.5), (0, 255, 0));
        assert_eq!(hsl_to_rgb(240.0, 1.0, 0.5), (0, 0, 255));
        assert_eq!(hsl_to_rgb(360.0, 1.0, 0.5), (255, 0, 0));
    }

    #[test]
    fn test_hsl_lightness_60() {
        // hsl(240, 100%, 60%) = rgb(51, 51, 255)
        assert_eq!(hsl_to_rgb(240.0, 1.0, 0.6), (51, 51, 255));
        assert_eq!(hsl_to_rgb(0.0, 0.0, 1.0), (255, 255, 255));
    }

    #[test]
    fn test_alpha_u8() {
        assert_eq!(Rgba::new(0, 0, 0, 0.5).alpha_u8(), 128);
        assert_eq!(Rgba::WHITE.alpha_u8(), 255);
        assert_eq!(Rgba::new(0, 0, 0, 0.0).alpha_u8(), 0);
    }
}
