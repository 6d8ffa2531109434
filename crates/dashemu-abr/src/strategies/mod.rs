//! One module per strategy. Each returns the rendition for the next segment.

pub(crate) mod arbiter;
pub(crate) mod averaging;
pub(crate) mod bba;
pub(crate) mod conventional;
pub(crate) mod elastic;
pub(crate) mod logistic;

/// Moves from `last` toward `optimal` by at most one rung, never above
/// `ceiling` nor below `lowest`.
pub(crate) fn step_toward(optimal: usize, last: usize, ceiling: usize, lowest: usize) -> usize {
    let best = last.saturating_sub(1).max(ceiling);
    let worst = (last + 1).min(lowest).max(best);
    optimal.clamp(best, worst)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0, 5, 0, 12, 4)]
    #[case(12, 5, 0, 12, 6)]
    #[case(5, 5, 0, 12, 5)]
    #[case(0, 0, 0, 12, 0)]
    #[case(12, 12, 0, 12, 12)]
    #[case(0, 5, 5, 12, 5)]
    #[case(0, 2, 5, 12, 5)]
    fn moves_at_most_one_rung(
        #[case] optimal: usize,
        #[case] last: usize,
        #[case] ceiling: usize,
        #[case] lowest: usize,
        #[case] expected: usize,
    ) {
        assert_eq!(step_toward(optimal, last, ceiling, lowest), expected);
    }
}
