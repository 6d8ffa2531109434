use tracing::debug;

use crate::{AbrError, AbrResult};

/// One quality level of a track.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rendition {
    /// Declared bitrate in bits per second.
    pub bandwidth_bps: u64,
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
    /// Codec string as declared by the manifest (e.g. `avc1.64001f`).
    pub codec: String,
}

impl Rendition {
    /// Rendition carrying only a bitrate, used for audio tracks and fixtures.
    #[must_use]
    pub fn with_bandwidth(bandwidth_bps: u64) -> Self {
        Self {
            bandwidth_bps,
            width: 0,
            height: 0,
            frame_rate: 0,
            codec: String::new(),
        }
    }
}

/// Renditions ordered best first.
///
/// Bitrate strictly decreases with the index: index 0 is the highest quality
/// and `len() - 1` the lowest. The constructor is the only place where
/// direction is checked; every selection helper relies on this ordering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ladder {
    renditions: Vec<Rendition>,
}

impl Ladder {
    /// Builds a ladder, reversing ascending input.
    ///
    /// # Errors
    ///
    /// Returns [`AbrError::EmptyLadder`] for an empty list and
    /// [`AbrError::NonMonotonicLadder`] when bitrates are not strictly ordered
    /// in either direction.
    pub fn new(mut renditions: Vec<Rendition>) -> AbrResult<Self> {
        let (Some(first), Some(last)) = (renditions.first(), renditions.last()) else {
            return Err(AbrError::EmptyLadder);
        };

        if first.bandwidth_bps < last.bandwidth_bps {
            debug!(
                renditions = renditions.len(),
                "ascending ladder, reversing to best-first order"
            );
            renditions.reverse();
        }

        for (index, pair) in renditions.windows(2).enumerate() {
            if pair[1].bandwidth_bps >= pair[0].bandwidth_bps {
                return Err(AbrError::NonMonotonicLadder {
                    index: index + 1,
                    previous: pair[0].bandwidth_bps,
                    current: pair[1].bandwidth_bps,
                });
            }
        }

        Ok(Self { renditions })
    }

    /// Builds a ladder from bare bitrates.
    ///
    /// # Errors
    ///
    /// Same as [`Ladder::new`].
    pub fn from_bandwidths(bandwidths: &[u64]) -> AbrResult<Self> {
        Self::new(
            bandwidths
                .iter()
                .copied()
                .map(Rendition::with_bandwidth)
                .collect(),
        )
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.renditions.len()
    }

    /// Always false: construction rejects empty ladders.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.renditions.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Rendition> {
        self.renditions.get(index)
    }

    /// # Errors
    ///
    /// Returns [`AbrError::RenditionOutOfRange`] for an unknown index.
    pub fn rendition(&self, index: usize) -> AbrResult<&Rendition> {
        self.renditions
            .get(index)
            .ok_or(AbrError::RenditionOutOfRange {
                index,
                len: self.renditions.len(),
            })
    }

    /// Bitrate of `index`, clamped to the lowest rendition when out of range.
    #[must_use]
    pub fn bandwidth(&self, index: usize) -> u64 {
        self.renditions
            .get(index.min(self.lowest_index()))
            .map_or(0, |r| r.bandwidth_bps)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rendition> {
        self.renditions.iter()
    }

    /// Index of the lowest quality.
    #[must_use]
    pub fn lowest_index(&self) -> usize {
        self.renditions.len().saturating_sub(1)
    }

    #[must_use]
    pub fn highest_bandwidth(&self) -> u64 {
        self.bandwidth(0)
    }

    #[must_use]
    pub fn lowest_bandwidth(&self) -> u64 {
        self.bandwidth(self.lowest_index())
    }

    /// Highest quality affordable at `target_bps`.
    ///
    /// Scans from index 0 up to the penultimate rendition and returns the
    /// first one whose bitrate is strictly below the target (truncated to an
    /// integer). Falls back to the lowest rendition when nothing qualifies,
    /// including for negative or NaN targets.
    #[must_use]
    #[expect(clippy::cast_precision_loss)] // bitrates stay far below 2^52
    pub fn select(&self, target_bps: f64) -> usize {
        let target = target_bps.trunc();
        let lowest = self.lowest_index();

        self.renditions[..lowest]
            .iter()
            .position(|r| (r.bandwidth_bps as f64) < target)
            .unwrap_or(lowest)
    }

    /// Best rendition whose height does not exceed `max_height`.
    ///
    /// Returns the lowest rendition when every rendition is taller.
    #[must_use]
    pub fn ceiling_index(&self, max_height: u32) -> usize {
        self.renditions
            .iter()
            .position(|r| r.height <= max_height)
            .unwrap_or_else(|| self.lowest_index())
    }
}
