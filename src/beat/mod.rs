//! Spectral beat detection: band layout, per-band history and the detector.

mod detector;
mod history;
mod partition;

pub use detector::{Beat, BeatDetector, band_energy};
pub use history::EnergyHistory;
pub use partition::BandPartition;
