//! Command line interface

use crate::config::Mode;
use crate::projection::Extent;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "currentfield")]
#[command(about = "Animated ocean-current particles: forecast trajectory playback and a live particle field", long_about = None)]
#[command(version)]
pub struct Cli {
    /// JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Window width in pixels
    #[arg(short = 'W', long)]
    pub width: Option<u32>,

    /// Window height in pixels
    #[arg(short = 'H', long)]
    pub height: Option<u32>,

    /// Disable VSync for uncapped framerate
    #[arg(long)]
    pub no_vsync: bool,

    /// Start in `field` or `trajectories` mode
    #[arg(short, long)]
    pub mode: Option<Mode>,

    /// Projection extent (`global` or `regional`); defaults from --region
    #[arg(short, long)]
    pub extent: Option<Extent>,

    /// Trajectory response document to load
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// MQTT broker serving trajectory requests
    #[arg(long)]
    pub mqtt_host: Option<String>,

    /// MQTT base topic (`<topic>/request`, `<topic>/response`)
    #[arg(long)]
    pub mqtt_topic: Option<String>,

    /// Forecast date (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<String>,

    /// Region code (`wo` for the whole world ocean)
    #[arg(long)]
    pub region: Option<String>,

    /// Depth level index
    #[arg(long)]
    pub depth_index: Option<u32>,

    /// Trajectories to request
    #[arg(long)]
    pub particle_count: Option<u32>,

    /// Particle field population cap
    #[arg(long)]
    pub max_particles: Option<usize>,

    /// Base particle lifetime in seconds
    #[arg(long)]
    pub lifetime: Option<f32>,

    /// Particle velocity range, pixels per 1/60 s
    #[arg(long)]
    pub base_speed: Option<f32>,

    /// Base particle radius in pixels
    #[arg(long)]
    pub particle_size: Option<f32>,

    /// RNG seed for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,

    /// Write the effective configuration as JSON and exit
    #[arg(long, value_name = "FILE")]
    pub write_config: Option<PathBuf>,

    /// Do not listen on the remote control socket
    #[arg(long)]
    pub no_control: bool,

    /// Verbosity level (can be repeated for more detail)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Log level implied by -v / -q
    pub fn log_level(&self) -> Option<log::LevelFilter> {
        if self.verbose > 0 {
            Some(match self.verbose {
                1 => log::LevelFilter::Info,
                2 => log::LevelFilter::Debug,
                _ => log::LevelFilter::Trace,
            })
        } else if self.quiet {
            Some(log::LevelFilter::Error)
        } else {
            None
        }
    }
}
