/// One spectrum delivery: per-channel magnitudes, all of equal length.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    pub channels: Vec<Vec<f32>>,
}

impl Snapshot {
    pub fn new(channels: Vec<Vec<f32>>) -> Snapshot {
        Snapshot { channels }
    }

    /// A single-channel snapshot.
    pub fn mono(samples: Vec<f32>) -> Snapshot {
        Snapshot {
            channels: vec![samples],
        }
    }

    /// Common channel length, or `None` when channel lengths differ.
    ///
    /// A snapshot without channels has zero bins.
    pub fn bins(&self) -> Option<usize> {
        let mut lens = self.channels.iter().map(Vec::len);
        let first = lens.next().unwrap_or(0);
        lens.all(|len| len == first).then_some(first)
    }
}
