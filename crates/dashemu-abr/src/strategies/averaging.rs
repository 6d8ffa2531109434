use crate::{Ladder, ThroughputHistory, stats};

/// Statistic used by the history-averaging strategies.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Average {
    Mean,
    Geometric,
    Exponential { ratio: f64, window: usize },
}

/// Selects on the chosen average of the whole history, or on the raw sample
/// while fewer than two samples exist.
#[expect(clippy::cast_precision_loss)]
pub(crate) fn decide(average: Average, history: &ThroughputHistory, ladder: &Ladder) -> usize {
    let samples = history.samples();
    let Some(&newest) = samples.last() else {
        return ladder.lowest_index();
    };
    if samples.len() < 2 {
        return ladder.select(newest as f64);
    }

    let estimate = match average {
        Average::Mean => stats::mean(samples),
        Average::Geometric => stats::geometric_mean(samples),
        Average::Exponential { ratio, window } => stats::exp_average(samples, ratio, window),
    };
    ladder.select(estimate.unwrap_or(newest as f64))
}

#[cfg(test)]
mod tests {
    use dashemu_test_utils::{BANDWIDTHS, THROUGHPUT};
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(Average::Mean, 2)]
    #[case(Average::Geometric, 2)]
    #[case(Average::Exponential { ratio: 0.4, window: 3 }, 2)]
    fn fixture_history_selects_expected_rung(#[case] average: Average, #[case] expected: usize) {
        let ladder = Ladder::from_bandwidths(&BANDWIDTHS).unwrap();
        let mut history = ThroughputHistory::from(THROUGHPUT.to_vec());
        history.push(26_106_059);
        assert_eq!(decide(average, &history, &ladder), expected);
    }

    #[rstest]
    #[case(Average::Mean)]
    #[case(Average::Geometric)]
    #[case(Average::Exponential { ratio: 0.4, window: 3 })]
    fn single_sample_uses_raw_throughput(#[case] average: Average) {
        let ladder = Ladder::from_bandwidths(&BANDWIDTHS).unwrap();
        let history = ThroughputHistory::from(vec![4_000_000]);
        assert_eq!(decide(average, &history, &ladder), 4);
    }
}
