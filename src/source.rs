use crossbeam_channel::Receiver;

use crate::types::Snapshot;

/// Supplies spectrum snapshots to the render loop.
pub trait SpectrumSource {
    /// Newest available snapshot, or `None` when nothing arrived since the
    /// last call.
    fn snapshot(&mut self) -> Option<Snapshot>;
}

/// Reads snapshots from an analyzer thread, keeping only the newest.
pub struct ChannelSource {
    rx: Receiver<Snapshot>,
}

impl ChannelSource {
    pub fn new(rx: Receiver<Snapshot>) -> Self {
        Self { rx }
    }
}

impl SpectrumSource for ChannelSource {
    fn snapshot(&mut self) -> Option<Snapshot> {
        self.rx.try_iter().last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel as chan;

    #[test]
    fn drains_to_the_newest_snapshot() {
        let (tx, rx) = chan::bounded(8);
        let mut source = ChannelSource::new(rx);
        assert_eq!(source.snapshot(), None);

        tx.send(Snapshot::mono(vec![1.0])).unwrap();
        tx.send(Snapshot::mono(vec![2.0])).unwrap();
        assert_eq!(source.snapshot(), Some(Snapshot::mono(vec![2.0])));
        assert_eq!(source.snapshot(), None);
    }
}
