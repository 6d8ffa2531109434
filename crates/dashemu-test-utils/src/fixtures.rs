//! Reference data shared by strategy and session tests.

/// Throughput samples (bps) from the emulator's original strategy tests.
pub const THROUGHPUT: [u64; 10] = [
    2_843_157, 6_690_325, 12_242_549, 13_067_956, 15_247_213, 20_917_735, 26_063_698, 27_587_342,
    26_106_059, 23_265_265,
];

/// 13-rung ladder (bps), best first.
pub const BANDWIDTHS: [u64; 13] = [
    40_276_548, 25_312_752, 15_193_504, 4_354_160, 3_894_826, 3_046_114, 2_386_043, 1_826_811,
    1_089_489, 767_717, 576_208, 390_172, 247_230,
];

/// Input of the exponentially weighted average reference sequence.
pub const EWMA_INPUT: [u64; 9] = [642, 545, 629, 721, 494, 1066, 761, 674, 1107];

/// Truncated averages for [`EWMA_INPUT`] with ratio 0.4 and window 10.
pub const EWMA_EXPECTED: [u64; 9] = [642, 581, 605, 658, 587, 788, 776, 735, 885];

/// Bytes in a segment of `duration_ms` encoded at `bandwidth_bps`.
#[must_use]
pub fn segment_bytes(bandwidth_bps: u64, duration_ms: u64) -> usize {
    usize::try_from(bandwidth_bps * duration_ms / 8000).unwrap()
}
