use std::collections::VecDeque;

/// Bounded FIFO of recent band energies with a running sum.
///
/// `push` evicts the oldest entry once `capacity` is reached; the sum is
/// adjusted by the evicted and inserted values only, so `average` is O(1).
/// Once every retained value is zero the sum is exactly zero again.
#[derive(Clone, Debug)]
pub struct EnergyHistory {
    values: VecDeque<f32>,
    capacity: usize,
    aggregate: f64,
    nonzero: usize,
}

impl EnergyHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
            aggregate: 0.0,
            nonzero: 0,
        }
    }

    pub fn push(&mut self, value: f32) {
        if self.values.len() >= self.capacity {
            if let Some(evicted) = self.values.pop_front() {
                self.aggregate -= f64::from(evicted);
                if evicted != 0.0 {
                    self.nonzero -= 1;
                }
            }
        }
        self.values.push_back(value);
        self.aggregate += f64::from(value);
        if value != 0.0 {
            self.nonzero += 1;
        }
        if self.nonzero == 0 {
            // rounding leftovers from evicted values
            self.aggregate = 0.0;
        }
    }

    /// Mean of the retained values; `None` before the first push.
    pub fn average(&self) -> Option<f32> {
        if self.values.is_empty() {
            None
        } else {
            Some((self.aggregate / self.values.len() as f64) as f32)
        }
    }

    pub fn aggregate(&self) -> f32 {
        self.aggregate as f32
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        self.values.iter().copied()
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.aggregate = 0.0;
        self.nonzero = 0;
    }
}
