//! Error types for currentfield.

use std::io;
use thiserror::Error;

/// Errors that can occur while setting up or driving a visualization session
#[derive(Debug, Error)]
pub enum Error {
    /// Render surface is absent or has no usable area
    #[error("Render surface unavailable: {0}")]
    MissingSurface(String),

    /// Trajectory request failed (transport, parse or unsuccessful response)
    #[error("Trajectory fetch failed: {0}")]
    DataFetch(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// SDL2 window or texture failure
    #[error("Display error: {0}")]
    Display(String),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
