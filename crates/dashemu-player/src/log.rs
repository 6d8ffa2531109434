use std::collections::BTreeMap;

use dashemu_abr::Algorithm;

/// Running quality-of-experience counters, cumulative up to one segment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QoeCounters {
    pub rate_sum_bps: u64,
    pub stall_total_ms: u64,
    pub stall_count: u64,
    pub switch_count: u64,
    /// Absolute bitrate change from the previous segment.
    pub rate_change_bps: u64,
    pub rate_change_sum_bps: u64,
}

impl QoeCounters {
    /// Counters after a segment at `rate_bps` that stalled for `stall_ms`.
    #[must_use]
    pub fn advance(previous: Option<(&Self, u64)>, rate_bps: u64, stall_ms: u64) -> Self {
        let (base, previous_rate) = match previous {
            Some((counters, rate)) => (*counters, Some(rate)),
            None => (Self::default(), None),
        };
        let rate_change_bps = previous_rate.map_or(0, |rate| rate.abs_diff(rate_bps));
        Self {
            rate_sum_bps: base.rate_sum_bps + rate_bps,
            stall_total_ms: base.stall_total_ms + stall_ms,
            stall_count: base.stall_count + u64::from(stall_ms > 0),
            switch_count: base.switch_count + u64::from(rate_change_bps > 0),
            rate_change_bps,
            rate_change_sum_bps: base.rate_change_sum_bps + rate_change_bps,
        }
    }
}

/// Record of one downloaded segment.
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentLogEntry {
    pub segment: u64,
    /// Session clock when the download completed.
    pub arrival_ms: u64,
    pub delivery_ms: u64,
    pub stall_ms: u64,
    pub rendition: usize,
    /// Declared bitrate of the rendition.
    pub bandwidth_bps: u64,
    /// Measured throughput of the download.
    pub delivery_rate_bps: u64,
    /// Bitrate implied by the segment size and duration.
    pub actual_rate_bps: u64,
    pub size_bytes: u64,
    /// Buffer level after the segment was added.
    pub buffer_ms: u64,
    pub algorithm: Algorithm,
    pub segment_duration_ms: u64,
    pub codec: String,
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
    /// Media time covered once this segment is played.
    pub play_start_ms: u64,
    /// Playback position when the segment arrived; extended log only.
    pub play_position_ms: Option<u64>,
    pub rtt_ms: u64,
    pub protocol: String,
    pub manifest_index: usize,
    pub track: usize,
    pub replaced: bool,
    pub played: bool,
    pub qoe: QoeCounters,
}

/// Segment records of one track, ordered by segment number.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SegmentLog {
    entries: BTreeMap<u64, SegmentLogEntry>,
}

impl SegmentLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `entry`, replacing any earlier record of the same segment.
    pub fn record(&mut self, entry: SegmentLogEntry) {
        self.entries.insert(entry.segment, entry);
    }

    #[must_use]
    pub fn get(&self, segment: u64) -> Option<&SegmentLogEntry> {
        self.entries.get(&segment)
    }

    pub fn get_mut(&mut self, segment: u64) -> Option<&mut SegmentLogEntry> {
        self.entries.get_mut(&segment)
    }

    #[must_use]
    pub fn last(&self) -> Option<&SegmentLogEntry> {
        self.entries.values().next_back()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SegmentLogEntry> {
        self.entries.values()
    }

    /// Declared bitrate of every segment, in order.
    #[must_use]
    pub fn rates(&self) -> Vec<u64> {
        self.iter().map(|e| e.bandwidth_bps).collect()
    }

    /// Lowers the buffer level of every segment strictly between `after` and
    /// `before` by `difference_ms` (a negative difference raises it).
    pub fn shift_buffer(&mut self, after: u64, before: u64, difference_ms: i64) {
        if before <= after + 1 {
            return;
        }
        for entry in self.entries.range_mut(after + 1..before).map(|(_, e)| e) {
            entry.buffer_ms = offset(entry.buffer_ms, difference_ms);
        }
    }

    /// Recomputes the running QoE counters of `from` and every later segment.
    pub fn recount_qoe(&mut self, from: u64) {
        let mut previous = self
            .entries
            .range(..from)
            .next_back()
            .map(|(_, e)| (e.qoe, e.bandwidth_bps));
        for entry in self.entries.range_mut(from..).map(|(_, e)| e) {
            entry.qoe = QoeCounters::advance(
                previous.as_ref().map(|(qoe, rate)| (qoe, *rate)),
                entry.bandwidth_bps,
                entry.stall_ms,
            );
            previous = Some((entry.qoe, entry.bandwidth_bps));
        }
    }
}

pub(crate) fn offset(value: u64, lower_by: i64) -> u64 {
    if lower_by >= 0 {
        value.saturating_sub(lower_by.unsigned_abs())
    } else {
        value.saturating_add(lower_by.unsigned_abs())
    }
}

#[cfg(test)]
pub(crate) fn entry(segment: u64, buffer_ms: u64) -> SegmentLogEntry {
    SegmentLogEntry {
        segment,
        arrival_ms: 0,
        delivery_ms: 0,
        stall_ms: 0,
        rendition: 0,
        bandwidth_bps: 0,
        delivery_rate_bps: 0,
        actual_rate_bps: 0,
        size_bytes: 0,
        buffer_ms,
        algorithm: Algorithm::Conventional,
        segment_duration_ms: 2000,
        codec: String::new(),
        width: 0,
        height: 0,
        frame_rate: 0,
        play_start_ms: segment * 2000,
        play_position_ms: None,
        rtt_ms: 0,
        protocol: String::new(),
        manifest_index: 0,
        track: 0,
        replaced: false,
        played: false,
        qoe: QoeCounters::default(),
    }
}
