/// Append-only per-track record of measured throughput, in bits per second.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ThroughputHistory {
    samples: Vec<u64>,
}

impl ThroughputHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sample_bps: u64) {
        self.samples.push(sample_bps);
    }

    #[must_use]
    pub fn samples(&self) -> &[u64] {
        &self.samples
    }

    /// The most recent `count` samples, oldest first.
    #[must_use]
    pub fn tail(&self, count: usize) -> &[u64] {
        let start = self.samples.len().saturating_sub(count);
        &self.samples[start..]
    }

    #[must_use]
    pub fn last(&self) -> Option<u64> {
        self.samples.last().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl From<Vec<u64>> for ThroughputHistory {
    fn from(samples: Vec<u64>) -> Self {
        Self { samples }
    }
}
