//! Shared utilities

use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Small deterministic RNG (xorshift64).
/// Seeded explicitly in tests, from the wall clock otherwise.
#[derive(Debug, Clone)]
pub struct Rng {
    state: u64,
}

impl Rng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u64) -> Self {
        // xorshift never leaves zero
        Self { state: seed.max(1) }
    }

    /// Seed from the system clock
    pub fn from_time() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0x9E37_79B9_7F4A_7C15);
        Self::new(nanos ^ 0xA076_1D64_78BD_642F)
    }

    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state
    }

    /// Uniform f32 in [0, 1)
    #[inline]
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }

    /// Uniform f32 in [min, max)
    #[inline]
    pub fn range_f32(&mut self, min: f32, max: f32) -> f32 {
        let v = min + self.next_f32() * (max - min);
        // Rounding can land exactly on max for wide ranges
        if v >= max && max > min {
            min.max(max - (max - min) * f32::EPSILON)
        } else {
            v
        }
    }

    /// Uniform u8 in [min, max)
    #[inline]
    pub fn range_u8(&mut self, min: u8, max: u8) -> u8 {
        if max <= min {
            return min;
        }
        min + (self.next_u64() % u64::from(max - min)) as u8
    }
}

/// Monotonic session clock, seconds since construction
pub struct Clock {
    origin: Instant,
}

impl Clock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    #[inline]
    pub fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rng_deterministic() {
        let mut a = Rng::new(42);
        let mut b = Rng::new(42);
        for _ in 0..100 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn test_zero_seed_still_advances() {
        let mut rng = Rng::new(0);
        assert_ne!(rng.next_u64(), 0);
    }

    #[test]
    fn test_range_f32_half_open() {
        let mut rng = Rng::new(99);
        for _ in 0..10_000 {
            let v = rng.range_f32(0.2, 0.5);
            assert!(v >= 0.2 && v < 0.5, "v={}", v);
            let w = rng.range_f32(-180.0, 180.0);
            assert!(w >= -180.0 && w < 180.0, "w={}", w);
        }
    }

    #[test]
    fn test_range_u8() {
        let mut rng = Rng::new(5);
        for _ in 0..1000 {
            let v = rng.range_u8(150, 250);
            assert!((150..250).contains(&v));
        }
        assert_eq!(rng.range_u8(9, 9), 9);
    }

    #[test]
    fn test_clock_monotonic() {
        let clock = Clock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
