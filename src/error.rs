use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the beat/motor core and its collaborators.
#[derive(Error, Debug)]
pub enum Error {
    /// At least one frequency band is required.
    #[error("frequency band count must be at least 1")]
    ZeroBands,

    /// The energy history must retain at least one sample.
    #[error("retained sample count must be at least 1")]
    ZeroRetention,

    /// The spectrum is too short to be split into the requested bands.
    #[error("spectrum has {bins} bins, fewer than the {bands} frequency bands")]
    TooFewBins { bins: usize, bands: usize },

    /// A detection threshold is out of range.
    #[error("invalid {name}: {value}")]
    InvalidThreshold { name: &'static str, value: f32 },

    #[error("failed to read config {path:?}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Actuator transport failure.
    #[error("device {path:?}: {source}")]
    Device {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A command was issued to an actuator that is not open.
    #[error("actuator is not open")]
    DeviceClosed,
}

pub type Result<T> = std::result::Result<T, Error>;
