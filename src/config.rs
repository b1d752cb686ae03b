//! Configuration file management.
//!
//! Loads detector, audio and actuator settings from `~/.rezvibe.toml`.
//! Every field may be omitted; missing values take the built-in defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::error::{Error, Result};

const CONFIG_TEMPLATE: &str = r#"# rezvibe configuration file

# log_file = "/tmp/rezvibe.log"

# =============================================================================
# Beat detection
# =============================================================================
[beat]
# retain_samples = 20     # Energy history length per band
# retain_ms = 500         # Span of the history; tick = retain_ms / retain_samples
# sensitivity = 1.8       # Instant energy must exceed this multiple of the average
# min_peak = 1.5          # ... and exceed the average by at least this much
# frequency_bands = 9     # Number of power-law bands
# decay = 10              # Speed lost per tick without a beat
# falloff = 90            # Speed lost across the band range (bass is strongest)
# spectrum_bins = 512     # Bins per spectrum channel

# =============================================================================
# Audio capture
# =============================================================================
[audio]
# channels = 2            # Spectrum channels per snapshot
# gain = 0.2
# floor_db = -60.0        # Magnitudes at or below this map to 0

# =============================================================================
# Actuator
# =============================================================================
[actuator]
# device = "/dev/rezvibe0"  # Character device taking one speed byte per write
# dry_run = false           # Log intensities instead of writing a device
# timeout_ms = 10
"#;

/// Detector and motor constants.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct BeatConfig {
    pub retain_samples: usize,
    pub retain_ms: u64,
    pub sensitivity: f32,
    pub min_peak: f32,
    pub frequency_bands: usize,
    pub decay: u8,
    pub falloff: f32,
    pub spectrum_bins: usize,
}

impl Default for BeatConfig {
    fn default() -> Self {
        Self {
            retain_samples: 20,
            retain_ms: 500,
            sensitivity: 1.8,
            min_peak: 1.5,
            frequency_bands: 9,
            decay: 10,
            falloff: 90.0,
            spectrum_bins: 512,
        }
    }
}

impl BeatConfig {
    /// Rejects settings the detector cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.frequency_bands == 0 {
            return Err(Error::ZeroBands);
        }
        if self.retain_samples == 0 {
            return Err(Error::ZeroRetention);
        }
        if self.spectrum_bins < self.frequency_bands {
            return Err(Error::TooFewBins {
                bins: self.spectrum_bins,
                bands: self.frequency_bands,
            });
        }
        if !self.sensitivity.is_finite() || self.sensitivity <= 0.0 {
            return Err(Error::InvalidThreshold {
                name: "sensitivity",
                value: self.sensitivity,
            });
        }
        if !self.min_peak.is_finite() || self.min_peak < 0.0 {
            return Err(Error::InvalidThreshold {
                name: "min_peak",
                value: self.min_peak,
            });
        }
        if !self.falloff.is_finite() {
            return Err(Error::InvalidThreshold {
                name: "falloff",
                value: self.falloff,
            });
        }
        Ok(())
    }

    /// How often the host should deliver a spectrum.
    pub fn tick_interval(&self) -> Duration {
        let samples = self.retain_samples.max(1) as u64;
        Duration::from_millis((self.retain_ms / samples).max(1))
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub channels: usize,
    pub gain: f32,
    pub floor_db: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            channels: 2,
            gain: 0.2,
            floor_db: -60.0,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ActuatorConfig {
    pub device: Option<PathBuf>,
    pub dry_run: bool,
    pub timeout_ms: u64,
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            device: None,
            dry_run: false,
            timeout_ms: 10,
        }
    }
}

impl ActuatorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub beat: BeatConfig,
    pub audio: AudioConfig,
    pub actuator: ActuatorConfig,
    pub log_file: Option<PathBuf>,
}

impl Config {
    fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".rezvibe.toml"))
    }

    /// Loads the user config, writing a template on first run.
    ///
    /// Never fails: an unreadable or invalid file yields the defaults.
    pub fn load() -> Self {
        let path = match Self::path() {
            Some(p) => p,
            None => return Self::default(),
        };

        if !path.exists() {
            match fs::write(&path, CONFIG_TEMPLATE) {
                Ok(()) => info!("created config template at {:?}", path),
                Err(e) => warn!("could not write config template {:?}: {}", path, e),
            }
        }

        Self::load_from(&path).unwrap_or_else(|e| {
            warn!("using default configuration: {}", e);
            Self::default()
        })
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| Error::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&text)?)
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_file.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("rezvibe.log")
        })
    }
}
