//! Run configuration
//!
//! `AppConfig` is an optional JSON document; command line flags override it.

use crate::cli::Cli;
use crate::display::PixelBuffer;
use crate::error::{Error, Result};
use crate::projection::Extent;
use crate::trajectory::TrajectoryRequest;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_WIDTH: u32 = 960;
pub const DEFAULT_HEIGHT: u32 = 480;

/// Particle field parameters, fixed for the lifetime of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Population cap
    pub max_particles: usize,
    /// Base lifetime before the +/-30% randomization
    pub particle_lifetime_secs: f32,
    /// Velocity component range, pixels per 1/60 s
    pub base_speed: f32,
    /// Base draw radius before the +/-20% randomization
    pub particle_size: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_particles: 300,
            particle_lifetime_secs: 4.0,
            base_speed: 0.0001,
            particle_size: 2.5,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_particles == 0 {
            return Err(Error::Config("max_particles must be at least 1".to_string()));
        }
        if !(self.particle_lifetime_secs.is_finite() && self.particle_lifetime_secs > 0.0) {
            return Err(Error::Config(format!(
                "particle_lifetime_secs must be positive, got {}",
                self.particle_lifetime_secs
            )));
        }
        if !(self.base_speed.is_finite() && self.base_speed >= 0.0) {
            return Err(Error::Config(format!(
                "base_speed must be non-negative, got {}",
                self.base_speed
            )));
        }
        if !(self.particle_size.is_finite() && self.particle_size > 0.0) {
            return Err(Error::Config(format!(
                "particle_size must be positive, got {}",
                self.particle_size
            )));
        }
        Ok(())
    }
}

/// Which subsystem the window shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Procedural particle field
    #[default]
    Field,
    /// Forecast trajectory playback
    Trajectories,
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "field" | "particles" => Ok(Mode::Field),
            "trajectories" | "trajectory" | "forecast" => Ok(Mode::Trajectories),
            other => Err(format!("unknown mode '{}' (expected field or trajectories)", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
    /// Opaque colour surfaces are cleared to, as `[r, g, b]`
    pub background: (u8, u8, u8),
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            vsync: true,
            background: PixelBuffer::DEFAULT_BACKGROUND,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// Broker host; no MQTT source when unset
    pub host: Option<String>,
    pub port: Option<u16>,
    pub topic: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Everything a session needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub mode: Mode,
    pub simulation: SimulationConfig,
    pub request: TrajectoryRequest,
    /// Explicit extent; derived from `request.region` when unset
    pub extent: Option<Extent>,
    /// Response document on disk, used when no MQTT host is set
    pub data_file: Option<PathBuf>,
    pub mqtt: MqttConfig,
    /// RNG seed; clock-seeded when unset
    pub seed: Option<u64>,
    /// Listen for remote commands on the Unix socket
    pub control_socket: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            mode: Mode::default(),
            simulation: SimulationConfig::default(),
            request: TrajectoryRequest::default(),
            extent: None,
            data_file: None,
            mqtt: MqttConfig::default(),
            seed: None,
            control_socket: true,
        }
    }
}

impl AppConfig {
    /// Load from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Save to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// File config (if any) with command line overrides applied
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply(cli);
        config.simulation.validate()?;
        if config.window.width == 0 || config.window.height == 0 {
            return Err(Error::MissingSurface(format!(
                "window size {}x{} has no drawable area",
                config.window.width, config.window.height
            )));
        }
        Ok(config)
    }

    fn apply(&mut self, cli: &Cli) {
        if let Some(w) = cli.width {
            self.window.width = w;
        }
        if let Some(h) = cli.height {
            self.window.height = h;
        }
        if cli.no_vsync {
            self.window.vsync = false;
        }
        if let Some(mode) = cli.mode {
            self.mode = mode;
        }
        if let Some(extent) = cli.extent {
            self.extent = Some(extent);
        }
        if let Some(path) = &cli.data {
            self.data_file = Some(path.clone());
        }
        if let Some(host) = &cli.mqtt_host {
            self.mqtt.host = Some(host.clone());
        }
        if let Some(topic) = &cli.mqtt_topic {
            self.mqtt.topic = Some(topic.clone());
        }
        if let Some(date) = &cli.date {
            self.request.date = date.clone();
        }
        if let Some(region) = &cli.region {
            self.request.region = region.clone();
        }
        if let Some(depth) = cli.depth_index {
            self.request.depth_index = depth.to_string();
        }
        if let Some(count) = cli.particle_count {
            self.request.particle_count = count.to_string();
        }
        if let Some(max) = cli.max_particles {
            self.simulation.max_particles = max;
        }
        if let Some(lifetime) = cli.lifetime {
            self.simulation.particle_lifetime_secs = lifetime;
        }
        if let Some(speed) = cli.base_speed {
            self.simulation.base_speed = speed;
        }
        if let Some(size) = cli.particle_size {
            self.simulation.particle_size = size;
        }
        if cli.seed.is_some() {
            self.seed = cli.seed;
        }
        if cli.no_control {
            self.control_socket = false;
        }
    }

    /// Extent to project with: explicit choice, else from the request region
    pub fn effective_extent(&self) -> Extent {
        self.extent
            .unwrap_or_else(|| Extent::from_region(Some(self.request.region.as_str())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_defaults_are_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let base = SimulationConfig::default();
        for bad in [
            SimulationConfig { max_particles: 0, ..base.clone() },
            SimulationConfig { particle_lifetime_secs: -1.0, ..base.clone() },
            SimulationConfig { particle_lifetime_secs: f32::NAN, ..base.clone() },
            SimulationConfig { base_speed: -0.5, ..base.clone() },
            SimulationConfig { particle_size: 0.0, ..base.clone() },
        ] {
            assert!(matches!(bad.validate(), Err(Error::Config(_))), "{:?}", bad);
        }
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"simulation": {"max_particles": 50}, "extent": "regional"}"#)
                .unwrap();
        assert_eq!(config.simulation.max_particles, 50);
        assert_eq!(config.simulation.particle_size, 2.5);
        assert_eq!(config.extent, Some(Extent::Regional));
        assert_eq!(config.request.forecast_range, "240");
        assert_eq!(config.mode, Mode::Field);
        assert_eq!(config.window.background, PixelBuffer::DEFAULT_BACKGROUND);
    }

    #[test]
    fn test_background_from_json_array() {
        let config: AppConfig =
            serde_json::from_str(r#"{"window": {"background": [0, 0, 0]}}"#).unwrap();
        assert_eq!(config.window.background, (0, 0, 0));
        assert_eq!(config.window.width, DEFAULT_WIDTH);
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "currentfield",
            "--mode",
            "trajectories",
            "--region",
            "bs",
            "--max-particles",
            "120",
            "--seed",
            "9",
            "--no-control",
        ]);
        let config = AppConfig::from_cli(&cli).unwrap();
        assert_eq!(config.mode, Mode::Trajectories);
        assert_eq!(config.simulation.max_particles, 120);
        assert_eq!(config.seed, Some(9));
        assert!(!config.control_socket);
        assert_eq!(config.effective_extent(), Extent::Regional);
    }

    #[test]
    fn test_cli_rejects_invalid_simulation() {
        let cli = Cli::parse_from(["currentfield", "--lifetime", "0"]);
        assert!(AppConfig::from_cli(&cli).is_err());
    }

    #[test]
    fn test_explicit_extent_wins() {
        let config = AppConfig {
            extent: Some(Extent::Global),
            request: TrajectoryRequest {
                region: "bs".to_string(),
                ..TrajectoryRequest::default()
            },
            ..AppConfig::default()
        };
        assert_eq!(config.effective_extent(), Extent::Global);
        assert_eq!(AppConfig::default().effective_extent(), Extent::Global);
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("currentfield-config-{}.json", std::process::id()));
        let config = AppConfig {
            mode: Mode::Trajectories,
            seed: Some(4),
            ..AppConfig::default()
        };
        config.save(&path).unwrap();
        let loaded = AppConfig::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, config);
    }
}
