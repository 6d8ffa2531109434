use crate::{AbrError, AbrResult};

/// Source of upcoming segment sizes for lookahead-based strategies.
///
/// Implemented by the fetch layer (HEAD requests, byte-range tables) or by a
/// preloaded [`SizeTable`]. Segment numbers are 1-based.
#[expect(async_fn_in_trait)]
pub trait SegmentSizeProbe {
    /// Size in bytes of `segment` encoded at `rendition`.
    async fn segment_size(&self, rendition: usize, segment: u64) -> AbrResult<u64>;
}

/// Preloaded segment sizes, indexed by rendition then segment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SizeTable {
    sizes: Vec<Vec<u64>>,
}

impl SizeTable {
    /// `sizes[rendition][segment - 1]` is the size of that segment in bytes.
    #[must_use]
    pub fn new(sizes: Vec<Vec<u64>>) -> Self {
        Self { sizes }
    }

    #[must_use]
    pub fn get(&self, rendition: usize, segment: u64) -> Option<u64> {
        let slot = usize::try_from(segment.checked_sub(1)?).ok()?;
        self.sizes.get(rendition)?.get(slot).copied()
    }
}

impl SegmentSizeProbe for SizeTable {
    async fn segment_size(&self, rendition: usize, segment: u64) -> AbrResult<u64> {
        self.get(rendition, segment)
            .ok_or(AbrError::MissingSegmentSize { rendition, segment })
    }
}
