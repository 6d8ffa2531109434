use crate::Ladder;

/// `thr = 0.8 * thr_prev + 0.2 * sample` in integer arithmetic; the first
/// sample seeds the smoothed value.
pub(crate) fn smooth(previous: Option<u64>, sample_bps: u64) -> u64 {
    match previous {
        None => sample_bps,
        Some(prev) => (8 * prev) / 10 + (2 * sample_bps) / 10,
    }
}

#[expect(clippy::cast_precision_loss)]
pub(crate) fn decide(smoothed_bps: &mut Option<u64>, sample_bps: u64, ladder: &Ladder) -> usize {
    let next = smooth(*smoothed_bps, sample_bps);
    *smoothed_bps = Some(next);
    ladder.select(next as f64)
}
