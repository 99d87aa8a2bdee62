//! Geographic to pixel projection
//!
//! Maps (longitude, latitude) in degrees onto a surface of known size.
//! Out-of-range input simply lands off-surface; drawing code clips it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Region code the data service uses for the whole world ocean
pub const GLOBAL_REGION_CODE: &str = "wo";

/// Spatial framing of the projection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Extent {
    /// Equirectangular whole-world mapping, -180..180 x -90..90
    #[default]
    Global,
    /// Zoomed mapping centered on the surface midpoint, 720 x 360 degrees per surface
    Regional,
}

impl Extent {
    /// Pick the extent for a data-service region code.
    /// A missing code falls back to `Global`.
    pub fn from_region(region: Option<&str>) -> Self {
        match region {
            None => Extent::Global,
            Some(code) if code.trim().is_empty() || code == GLOBAL_REGION_CODE => Extent::Global,
            Some(_) => Extent::Regional,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Extent::Global => Extent::Regional,
            Extent::Regional => Extent::Global,
        }
    }
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Extent::Global => write!(f, "global"),
            Extent::Regional => write!(f, "regional"),
        }
    }
}

impl FromStr for Extent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "global" | "world" | GLOBAL_REGION_CODE => Ok(Extent::Global),
            "regional" | "region" | "zoom" => Ok(Extent::Regional),
            other => Err(format!("unknown extent '{}' (expected global or regional)", other)),
        }
    }
}

/// Project a geographic coordinate to pixel space.
/// The world edges map exactly onto the surface edges.
#[inline]
pub fn project(lon: f32, lat: f32, width: f32, height: f32, extent: Extent) -> (f32, f32) {
    match extent {
        Extent::Global => ((lon + 180.0) * width / 360.0, (90.0 - lat) * height / 180.0),
        Extent::Regional => (
            width / 2.0 + lon * width / 720.0,
            height / 2.0 - lat * height / 360.0,
        ),
    }
}
