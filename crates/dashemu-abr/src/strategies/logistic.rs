use super::step_toward;
use crate::{DecisionContext, Ladder};

const FULL_BUFFER_RATIO: f64 = 0.97;
const STEEPNESS: f64 = 0.05;

/// Maps buffer level to a bitrate along a sigmoid between the lowest and
/// highest rungs, then moves at most one rung from the last choice.
#[expect(clippy::cast_precision_loss)]
pub(crate) fn decide(ladder: &Ladder, ctx: &DecisionContext) -> usize {
    let whole_buffer_secs = (ctx.buffer_ms / 1000) as f64;

    let optimal = if whole_buffer_secs >= FULL_BUFFER_RATIO * ctx.max_buffer_secs as f64 {
        0
    } else {
        let low = ladder.lowest_bandwidth() as f64 / 1024.0;
        let high = ladder.highest_bandwidth() as f64 / 1024.0;
        let buffer_secs = ctx.buffer_ms as f64 / 1000.0;
        let target = (high / (1.0 + (high / low - 1.0) * (-STEEPNESS * buffer_secs).exp())).ceil();
        ladder.select((target + 1.0) * 1000.0)
    };

    step_toward(optimal, ctx.last_index, ctx.ceiling_index, ladder.lowest_index())
}

#[cfg(test)]
mod tests {
    use dashemu_test_utils::BANDWIDTHS;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(60_000, 5, 4)]
    #[case(0, 5, 6)]
    #[case(0, 12, 12)]
    #[case(58_500, 0, 1)]
    fn moves_one_rung_toward_the_sigmoid(
        #[case] buffer_ms: u64,
        #[case] last_index: usize,
        #[case] expected: usize,
    ) {
        let ladder = Ladder::from_bandwidths(&BANDWIDTHS).unwrap();
        let ctx = DecisionContext {
            buffer_ms,
            max_buffer_secs: 60,
            last_index,
            ..DecisionContext::default()
        };
        assert_eq!(decide(&ladder, &ctx), expected);
    }

    #[test]
    fn full_buffer_respects_ceiling() {
        let ladder = Ladder::from_bandwidths(&BANDWIDTHS).unwrap();
        let ctx = DecisionContext {
            buffer_ms: 60_000,
            max_buffer_secs: 60,
            last_index: 4,
            ceiling_index: 4,
            ..DecisionContext::default()
        };
        assert_eq!(decide(&ladder, &ctx), 4);
    }
}
