use std::ops::Range;

use tracing::debug;

use super::history::EnergyHistory;
use super::partition::BandPartition;
use crate::config::BeatConfig;
use crate::error::Result;
use crate::types::Snapshot;

/// The dominant band of one snapshot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Beat {
    pub band: usize,
    pub ratio: f32,
}

/// Mean magnitude over every channel and every bin in `range`.
///
/// Bins past the end of a channel are ignored; zero samples yields 0.
pub fn band_energy(snapshot: &Snapshot, range: Range<usize>) -> f32 {
    let mut total = 0.0f32;
    let mut weight = 0usize;
    for channel in &snapshot.channels {
        let end = range.end.min(channel.len());
        let start = range.start.min(end);
        for &sample in &channel[start..end] {
            total += sample;
            weight += 1;
        }
    }
    if weight == 0 {
        0.0
    } else {
        total / weight as f32
    }
}

/// Per-band energy comparison against each band's recent history.
pub struct BeatDetector {
    partition: BandPartition,
    histories: Vec<EnergyHistory>,
    energies: Vec<f32>,
    sensitivity: f32,
    min_peak: f32,
}

impl BeatDetector {
    pub fn new(config: &BeatConfig) -> Result<Self> {
        config.validate()?;
        let partition = BandPartition::new(config.spectrum_bins, config.frequency_bands)?;
        let bands = partition.len();
        Ok(Self {
            partition,
            histories: vec![EnergyHistory::new(config.retain_samples); bands],
            energies: vec![0.0; bands],
            sensitivity: config.sensitivity,
            min_peak: config.min_peak,
        })
    }

    /// Runs one detection pass and records each band's energy.
    ///
    /// Bands are compared against their history before this snapshot's
    /// energy is added. A snapshot without samples records silence in every
    /// band. One whose channels disagree in length, or do not match the
    /// configured bin count, is skipped without touching any history.
    pub fn process(&mut self, snapshot: &Snapshot) -> Option<Beat> {
        let bins = match snapshot.bins() {
            Some(0) => self.partition.bins(),
            Some(bins) => bins,
            None => {
                debug!("skipping snapshot with ragged channels");
                return None;
            }
        };
        if bins != self.partition.bins() {
            debug!(
                "skipping snapshot with {} bins, expected {}",
                bins,
                self.partition.bins()
            );
            return None;
        }

        let mut dominant: Option<Beat> = None;
        for (band, range) in self.partition.ranges().iter().enumerate() {
            let energy = band_energy(snapshot, range.clone());
            let average = self.histories[band].average();

            if let Some(ratio) = self.trigger_ratio(energy, average) {
                if dominant.is_none_or(|best| ratio > best.ratio) {
                    dominant = Some(Beat { band, ratio });
                }
            }

            self.histories[band].push(energy);
            self.energies[band] = energy;
        }

        if let Some(beat) = dominant {
            debug!("beat in band {} (ratio {:.2})", beat.band, beat.ratio);
        }
        dominant
    }

    fn trigger_ratio(&self, energy: f32, average: Option<f32>) -> Option<f32> {
        let average = average.filter(|h| *h > 0.0)?;
        let ratio = energy / average;
        (energy > average + self.min_peak && ratio > self.sensitivity).then_some(ratio)
    }

    pub fn bands(&self) -> usize {
        self.partition.len()
    }

    pub fn partition(&self) -> &BandPartition {
        &self.partition
    }

    pub fn history(&self, band: usize) -> Option<&EnergyHistory> {
        self.histories.get(band)
    }

    /// Instantaneous energies from the last accepted snapshot.
    pub fn energies(&self) -> &[f32] {
        &self.energies
    }

    pub fn reset(&mut self) {
        for history in &mut self.histories {
            history.clear();
        }
        self.energies.fill(0.0);
    }
}
