use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};

/// Manifest and segment number of the next download.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NextSegment {
    pub manifest: usize,
    pub segment: u64,
}

/// Picks the manifest of each next segment when a stream is offered with
/// several segment durations.
#[derive(Debug)]
pub struct ManifestSelector {
    rng: StdRng,
}

impl ManifestSelector {
    /// Seeded selection repeats across runs; `None` seeds from entropy.
    #[must_use]
    pub fn new(seed: Option<u64>) -> Self {
        let rng = seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        Self { rng }
    }

    /// Chooses among manifests whose segment duration divides the last
    /// segment duration or the media downloaded so far, and whose next
    /// segment still fits in the stream. `None` ends the track.
    pub fn next(
        &mut self,
        durations_ms: &[u64],
        last_duration_ms: u64,
        played_ms: u64,
        stream_ms: u64,
    ) -> Option<NextSegment> {
        let candidates: Vec<NextSegment> = durations_ms
            .iter()
            .enumerate()
            .filter(|(_, d)| **d > 0)
            .filter(|(_, d)| last_duration_ms % **d == 0 || played_ms % **d == 0)
            .filter(|(_, d)| played_ms + **d <= stream_ms)
            .map(|(manifest, d)| NextSegment {
                manifest,
                segment: played_ms / d + 1,
            })
            .collect();

        match candidates.as_slice() {
            [] => None,
            [only] => Some(*only),
            _ => candidates.choose(&mut self.rng).copied(),
        }
    }
}
