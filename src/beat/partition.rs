//! Power-law split of a spectrum into frequency bands.
//!
//! Band `i` of `B` ends at `floor(N^((i+1)/B))`, so the low bands cover a
//! handful of bins each while the top band spans half the spectrum.

use std::ops::Range;

use crate::error::{Error, Result};

/// Slack for `powf` landing just under an exact integer boundary.
const BOUNDARY_EPSILON: f64 = 1e-9;

#[derive(Clone, Debug, PartialEq)]
pub struct BandPartition {
    bins: usize,
    ranges: Vec<Range<usize>>,
}

impl BandPartition {
    pub fn new(bins: usize, bands: usize) -> Result<Self> {
        if bands == 0 {
            return Err(Error::ZeroBands);
        }
        if bins < bands {
            return Err(Error::TooFewBins { bins, bands });
        }

        let mut ranges = Vec::with_capacity(bands);
        let mut start = 0;
        for band in 0..bands {
            let end = if band + 1 == bands {
                bins
            } else {
                let exponent = (band + 1) as f64 / bands as f64;
                let bound = ((bins as f64).powf(exponent) + BOUNDARY_EPSILON).floor() as usize;
                bound.clamp(start, bins)
            };
            ranges.push(start..end);
            start = end;
        }

        Ok(Self { bins, ranges })
    }

    pub fn bins(&self) -> usize {
        self.bins
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn range(&self, band: usize) -> Option<Range<usize>> {
        self.ranges.get(band).cloned()
    }

    pub fn ranges(&self) -> &[Range<usize>] {
        &self.ranges
    }
}
