//! Averages over throughput samples.
//!
//! Every helper returns `None` for an empty input.

/// Arithmetic mean.
#[must_use]
#[expect(clippy::cast_precision_loss)]
pub fn mean(samples: &[u64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let sum: f64 = samples.iter().map(|&s| s as f64).sum();
    Some(sum / samples.len() as f64)
}

/// Geometric mean, computed in log space so long histories cannot overflow.
#[must_use]
#[expect(clippy::cast_precision_loss)]
pub fn geometric_mean(samples: &[u64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    if samples.contains(&0) {
        return Some(0.0);
    }
    let log_sum: f64 = samples.iter().map(|&s| (s as f64).ln()).sum();
    Some((log_sum / samples.len() as f64).exp())
}

/// Harmonic mean of the last `window` samples (all of them if fewer).
///
/// A zero sample makes the mean zero.
#[must_use]
#[expect(clippy::cast_precision_loss)]
pub fn harmonic_mean(samples: &[u64], window: usize) -> Option<f64> {
    let start = samples.len().saturating_sub(window);
    let tail = &samples[start..];
    if tail.is_empty() {
        return None;
    }
    if tail.contains(&0) {
        return Some(0.0);
    }
    let inverse_sum: f64 = tail.iter().map(|&s| 1.0 / s as f64).sum();
    Some(tail.len() as f64 / inverse_sum)
}

/// Exponentially weighted mean of the last `window` samples.
///
/// The k-th most recent sample (k = 0 for the newest) weighs
/// `ratio * (1 - ratio)^k`, normalised by `1 - (1 - ratio)^len` so the
/// weights sum to one.
#[must_use]
#[expect(
    clippy::cast_precision_loss,
    clippy::cast_possible_wrap,
    clippy::cast_possible_truncation
)]
pub fn exp_average(samples: &[u64], ratio: f64, window: usize) -> Option<f64> {
    let start = samples.len().saturating_sub(window);
    let tail = &samples[start..];
    if tail.is_empty() {
        return None;
    }

    let decay = 1.0 - ratio;
    let weight_sum = 1.0 - decay.powi(tail.len() as i32);
    if weight_sum <= 0.0 {
        return mean(tail);
    }

    let weighted: f64 = tail
        .iter()
        .rev()
        .enumerate()
        .map(|(age, &s)| ratio * decay.powi(age as i32) / weight_sum * s as f64)
        .sum();
    Some(weighted)
}

#[cfg(test)]
mod tests {
    use dashemu_test_utils::{EWMA_EXPECTED, EWMA_INPUT, THROUGHPUT};
    use rstest::rstest;

    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        let tolerance = expected.abs() * 1e-12;
        assert!(
            (actual - expected).abs() <= tolerance,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn mean_of_fixture() {
        assert_close(mean(&THROUGHPUT).unwrap(), 17_403_129.9);
    }

    #[test]
    fn geometric_mean_of_fixture() {
        assert_close(geometric_mean(&THROUGHPUT).unwrap(), 14_545_303.609_233_964);
    }

    #[test]
    fn harmonic_mean_uses_most_recent_window() {
        assert_close(harmonic_mean(&THROUGHPUT, 5).unwrap(), 24_544_673.172_274_47);
        assert_close(harmonic_mean(&THROUGHPUT[..5], 5).unwrap(), {
            let inverse: f64 = THROUGHPUT[..5].iter().map(|&s| 1.0 / s as f64).sum();
            5.0 / inverse
        });
    }

    #[test]
    fn harmonic_mean_with_short_history_uses_everything() {
        assert_close(harmonic_mean(&[100, 300], 5).unwrap(), 150.0);
    }

    #[test]
    fn exp_average_reproduces_reference_sequence() {
        let input = EWMA_INPUT;
        let expected = EWMA_EXPECTED;

        let produced: Vec<u64> = (1..=input.len())
            .map(|n| exp_average(&input[..n], 0.4, 10).unwrap() as u64)
            .collect();

        assert_eq!(produced, expected);
    }

    #[rstest]
    #[case(&[1_000], 1_000.0)]
    #[case(&[7, 7, 7, 7], 7.0)]
    fn single_value_averages_are_identity(#[case] samples: &[u64], #[case] expected: f64) {
        assert_close(mean(samples).unwrap(), expected);
        assert_close(geometric_mean(samples).unwrap(), expected);
        assert_close(harmonic_mean(samples, 5).unwrap(), expected);
        assert_close(exp_average(samples, 0.4, 3).unwrap(), expected);
    }

    #[test]
    fn empty_input_has_no_average() {
        assert_eq!(mean(&[]), None);
        assert_eq!(geometric_mean(&[]), None);
        assert_eq!(harmonic_mean(&[], 5), None);
        assert_eq!(exp_average(&[], 0.4, 3), None);
    }
}
