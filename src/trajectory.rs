//! Trajectory data: model, request/response wire format, sources and the
//! synthetic fallback set.

use crate::error::{Error, Result};
use crate::util::Rng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Speed assumed for a sample that carries none
pub const DEFAULT_SAMPLE_SPEED: f32 = 0.3;

pub const SYNTHETIC_TRAJECTORIES: usize = 100;
pub const SYNTHETIC_SAMPLES: usize = 11;

/// One time-indexed position. Serialized as `[lon, lat, speed]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Option<f64>>", into = "[f32; 3]")]
pub struct Sample {
    pub lon: f32,
    pub lat: f32,
    pub speed: f32,
}

impl Sample {
    pub const fn new(lon: f32, lat: f32, speed: f32) -> Self {
        Self { lon, lat, speed }
    }
}

impl TryFrom<Vec<Option<f64>>> for Sample {
    type Error = String;

    fn try_from(values: Vec<Option<f64>>) -> std::result::Result<Self, Self::Error> {
        let coord = |i: usize| -> std::result::Result<f32, String> {
            match values.get(i).copied().flatten() {
                Some(v) if v.is_finite() => Ok(v as f32),
                _ => Err(format!("sample needs finite lon/lat, got {:?}", values)),
            }
        };
        let lon = coord(0)?;
        let lat = coord(1)?;
        let speed = match values.get(2).copied().flatten() {
            Some(v) if v.is_finite() => v as f32,
            _ => DEFAULT_SAMPLE_SPEED,
        };
        Ok(Self { lon, lat, speed })
    }
}

impl From<Sample> for [f32; 3] {
    fn from(s: Sample) -> Self {
        [s.lon, s.lat, s.speed]
    }
}

/// The path of one particle through the forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub id: i64,
    #[serde(default)]
    pub points: Vec<Sample>,
}

impl Trajectory {
    /// Sample at a time index, if this trajectory reaches it
    #[inline]
    pub fn sample(&self, index: usize) -> Option<&Sample> {
        self.points.get(index)
    }
}

/// Parameters of a trajectory request. All values travel as strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrajectoryRequest {
    pub date: String,
    pub depth_index: String,
    pub forecast_range: String,
    pub region: String,
    pub particle_count: String,
}

impl Default for TrajectoryRequest {
    fn default() -> Self {
        Self {
            date: "2024-01-15".to_string(),
            depth_index: "0".to_string(),
            forecast_range: "240".to_string(),
            region: "wo".to_string(),
            particle_count: "1000".to_string(),
        }
    }
}

impl TrajectoryRequest {
    /// Forecast span in hours, when the field parses
    pub fn forecast_hours(&self) -> Option<f32> {
        self.forecast_range
            .trim()
            .parse::<f32>()
            .ok()
            .filter(|h| h.is_finite() && *h > 0.0)
    }
}

/// Response document of the trajectory service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrajectoryResponse {
    pub success: bool,
    #[serde(default)]
    pub trajectories: Vec<Trajectory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TrajectoryResponse {
    pub fn parse(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::DataFetch(format!("malformed response: {}", e)))
    }

    /// Accept the trajectory set or explain why it is unusable
    pub fn into_trajectories(self) -> Result<Vec<Trajectory>> {
        if !self.success {
            return Err(Error::DataFetch(
                self.error.unwrap_or_else(|| "service reported failure".to_string()),
            ));
        }
        if self.trajectories.iter().all(|t| t.points.is_empty()) {
            return Err(Error::DataFetch("response carries no trajectory samples".to_string()));
        }
        Ok(self.trajectories)
    }
}

/// Seconds to wait for an answer that does not arrive with the request
pub const DEFAULT_RESPONSE_TIMEOUT_SECS: u64 = 10;

/// What a source has to say right after a request is issued
#[derive(Debug)]
pub enum Fetch {
    /// Answered on the spot
    Ready(Result<TrajectoryResponse>),
    /// Answer arrives later through `poll`
    Pending,
}

/// Anything that can answer a trajectory request.
/// No method may block the frame loop waiting on a remote service.
pub trait TrajectorySource {
    fn request(&mut self, request: &TrajectoryRequest) -> Fetch;

    /// Answer to the last pending request, if it has arrived
    fn poll(&mut self) -> Option<Result<TrajectoryResponse>> {
        None
    }

    /// How long a pending request may stay unanswered
    fn timeout(&self) -> Duration {
        Duration::from_secs(DEFAULT_RESPONSE_TIMEOUT_SECS)
    }

    /// Short label for logs
    fn describe(&self) -> String;
}

/// Reads a response document from disk
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn read(&self) -> Result<TrajectoryResponse> {
        let json = fs::read_to_string(&self.path)
            .map_err(|e| Error::DataFetch(format!("{}: {}", self.path.display(), e)))?;
        TrajectoryResponse::parse(&json)
    }
}

impl TrajectorySource for FileSource {
    fn request(&mut self, _request: &TrajectoryRequest) -> Fetch {
        Fetch::Ready(self.read())
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

/// No data service configured; every load takes the synthetic path
pub struct Offline;

impl TrajectorySource for Offline {
    fn request(&mut self, _request: &TrajectoryRequest) -> Fetch {
        Fetch::Ready(Err(Error::DataFetch("no trajectory source configured".to_string())))
    }

    fn describe(&self) -> String {
        "offline".to_string()
    }
}

/// Random stand-in set used when real data is unavailable
pub fn synthetic(rng: &mut Rng) -> Vec<Trajectory> {
    (0..SYNTHETIC_TRAJECTORIES)
        .map(|id| Trajectory {
            id: id as i64,
            points: (0..SYNTHETIC_SAMPLES)
                .map(|_| {
                    Sample::new(
                        rng.range_f32(-180.0, 180.0),
                        rng.range_f32(-85.0, 85.0),
                        rng.range_f32(0.2, 0.5),
                    )
                })
                .collect(),
        })
        .collect()
}
