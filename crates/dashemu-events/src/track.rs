use dashemu_abr::AbrReason;

/// Per-track playback events. `track` is the position of the track in the
/// session, `segment` the 1-based segment number.
#[derive(Clone, Debug, PartialEq)]
pub enum TrackEvent {
    /// A segment finished downloading and was added to the buffer.
    SegmentComplete {
        track: usize,
        segment: u64,
        rendition: usize,
        bytes: u64,
        delivery_ms: u64,
        throughput_bps: u64,
        buffer_ms: u64,
    },
    /// The strategy picked a different rendition for the next segment.
    RenditionSwitch {
        track: usize,
        from: usize,
        to: usize,
        reason: AbrReason,
    },
    /// Buffer ran dry before the segment arrived.
    Stall {
        track: usize,
        segment: u64,
        stall_ms: u64,
    },
    /// Buffer exceeded its maximum; downloading paused.
    Backpressure {
        track: usize,
        segment: u64,
        sleep_ms: u64,
    },
    /// An earlier segment was fetched again and the buffer history rewritten.
    SegmentReplaced {
        track: usize,
        segment: u64,
        rendition: usize,
        buffer_difference_ms: i64,
    },
    /// Next segment comes from a different manifest.
    ManifestSwitch {
        track: usize,
        from: usize,
        to: usize,
        next_segment: u64,
    },
    /// Session clock passed the scheduled play time of a segment.
    PlayoutReady { track: usize, segment: u64 },
    /// Stream duration exhausted for this track.
    EndOfTrack { track: usize, segments: u64 },
}
