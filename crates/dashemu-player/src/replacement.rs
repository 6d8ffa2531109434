use dashemu_abr::Rendition;

use crate::{
    ReplacementRule,
    fetch::FetchedSegment,
    log::{SegmentLog, SegmentLogEntry, offset},
    manifest::TrackKind,
    state::{StreamState, millis},
};

/// Whether the step about to download `segment_number` re-fetches first.
pub(crate) fn triggers(rule: &ReplacementRule, kind: TrackKind, segment_number: u64) -> bool {
    kind == TrackKind::Video && segment_number > 1 && segment_number == rule.at_segment
}

/// Scratch state a re-fetched segment is absorbed into: the track rewound
/// to the level its predecessor left, with initial buffering over.
pub(crate) fn rewind(state: &StreamState, previous_buffer_ms: u64) -> StreamState {
    StreamState {
        buffer_ms: previous_buffer_ms,
        stall_total_ms: 0,
        wait_to_play: 0,
        ..state.clone()
    }
}

/// Overwrites the download fields of `entry` with the re-fetch and marks it
/// replaced. Returns the delivery rate.
pub(crate) fn refill(
    entry: &mut SegmentLogEntry,
    current: &Rendition,
    rendition: usize,
    fetched: FetchedSegment,
    delivery_ms: u64,
) -> u64 {
    let bits = fetched.size.saturating_mul(8 * 1000);
    entry.delivery_ms = delivery_ms;
    entry.rendition = rendition;
    entry.bandwidth_bps = current.bandwidth_bps;
    entry.delivery_rate_bps = bits / delivery_ms.max(1);
    entry.actual_rate_bps = bits / entry.segment_duration_ms.max(1);
    entry.size_bytes = fetched.size;
    entry.codec.clone_from(&current.codec);
    entry.width = current.width;
    entry.height = current.height;
    entry.frame_rate = current.frame_rate;
    entry.rtt_ms = millis(fetched.rtt);
    entry.protocol = fetched.protocol;
    entry.replaced = true;
    entry.delivery_rate_bps
}

/// Splices a re-fetched segment into the track history.
///
/// The difference is the level recorded by the first download minus the
/// level of `replacement`. The current buffer pays for `runtime_ms` plus the
/// difference, every record between the replaced segment and the next
/// download is lowered by the difference, and the running QoE counters are
/// recounted from the replaced segment on. Returns the difference.
pub(crate) fn splice(
    log: &mut SegmentLog,
    state: &mut StreamState,
    replacement: SegmentLogEntry,
    runtime_ms: u64,
) -> i64 {
    let segment = replacement.segment;
    let (old_buffer_ms, old_stall_ms) = log
        .get(segment)
        .map_or((replacement.buffer_ms, replacement.stall_ms), |e| {
            (e.buffer_ms, e.stall_ms)
        });
    let difference_ms = signed(old_buffer_ms) - signed(replacement.buffer_ms);
    state.buffer_ms = offset(state.buffer_ms, signed(runtime_ms) + difference_ms);
    state.stall_total_ms =
        state.stall_total_ms.saturating_sub(old_stall_ms) + replacement.stall_ms;
    log.shift_buffer(segment, state.segment_number, difference_ms);
    log.record(replacement);
    log.recount_qoe(segment);
    difference_ms
}

fn signed(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
