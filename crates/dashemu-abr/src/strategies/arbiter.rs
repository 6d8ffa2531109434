use tracing::trace;

use crate::{
    AbrResult, ArbiterOptions, DecisionContext, Ladder, SegmentSizeProbe, ThroughputHistory,
    stats,
};

/// Base margin of the switch-revert threshold.
const REVERT_MARGIN: f64 = 1.065;
/// Margin removed per rung between the candidate and the top of the ladder.
const REVERT_STEP: f64 = 0.015;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ArbiterState {
    pub(crate) buffering_factor: f64,
    pub(crate) damped_switches: u32,
}

/// Buffer-scaled exponential estimate, followed by switch damping and a
/// lookahead over the real sizes of upcoming segments.
#[expect(clippy::cast_precision_loss)]
pub(crate) async fn decide<P: SegmentSizeProbe>(
    state: &mut ArbiterState,
    history: &ThroughputHistory,
    ladder: &Ladder,
    ctx: &DecisionContext,
    options: &ArbiterOptions,
    probe: &P,
) -> AbrResult<usize> {
    let max_buffer_ms = ctx.max_buffer_ms().max(1) as f64;
    let fullness = (ctx.buffer_ms as f64 / max_buffer_ms).min(1.0);

    let estimate = if history.len() < 2 {
        ctx.sample_bps as f64
    } else {
        stats::exp_average(history.samples(), options.exponent, options.history_window)
            .unwrap_or(ctx.sample_bps as f64)
    };

    if options.buffer_scaling {
        state.buffering_factor = options.min_buffer_factor
            + (options.max_buffer_factor - options.min_buffer_factor) * fullness;
    }
    let target = estimate * state.buffering_factor;
    let mut index = ladder.select(target);

    if options.switching_control && ctx.last_index > index {
        let jump = ctx.last_index - index;
        let rungs_above = (ladder.len() - index) as f64;
        let threshold =
            (REVERT_MARGIN - rungs_above * REVERT_STEP) * ladder.bandwidth(index) as f64;

        if jump == 1 && target < threshold {
            index += 1;
            state.damped_switches += 1;
        } else if jump > options.maximum_switch {
            index = ctx.last_index - options.maximum_switch;
            state.damped_switches += 1;
        }
    }

    if options.lookahead {
        let window = options.predictive_window.min(ctx.remaining_segments());
        if window > 0 {
            while index < ladder.lowest_index() {
                let actual = actual_rate(probe, index, ctx, window).await?;
                if actual <= target {
                    break;
                }
                trace!(index, actual, target, "lookahead refused rendition");
                index += 1;
            }
        }
    }

    Ok(index)
}

/// Average bitrate of the next `window` segments of `rendition`.
#[expect(clippy::cast_precision_loss)]
async fn actual_rate<P: SegmentSizeProbe>(
    probe: &P,
    rendition: usize,
    ctx: &DecisionContext,
    window: u64,
) -> AbrResult<f64> {
    let mut total_bits: u64 = 0;
    for segment in ctx.segment_number + 1..=ctx.segment_number + window {
        total_bits += 8 * probe.segment_size(rendition, segment).await?;
    }
    let seconds = ctx.segment_duration_ms as f64 / 1000.0 * window as f64;
    Ok(total_bits as f64 / seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SizeTable;

    fn ladder() -> Ladder {
        Ladder::from_bandwidths(&[4_000_000, 2_000_000, 1_000_000, 500_000]).unwrap()
    }

    fn context(buffer_ms: u64, last_index: usize) -> DecisionContext {
        DecisionContext {
            sample_bps: 0,
            delivery_ms: 1000,
            buffer_ms,
            max_buffer_secs: 10,
            segment_duration_ms: 2000,
            segment_number: 4,
            stream_duration_ms: 40_000,
            last_index,
            ceiling_index: 0,
        }
    }

    fn fresh() -> ArbiterState {
        ArbiterState {
            buffering_factor: 1.0,
            damped_switches: 0,
        }
    }

    fn without_lookahead() -> ArbiterOptions {
        ArbiterOptions {
            lookahead: false,
            ..ArbiterOptions::default()
        }
    }

    #[tokio::test]
    async fn marginal_up_switch_is_reverted() {
        let history = ThroughputHistory::from(vec![1_360_000, 1_360_000]);
        let mut state = fresh();

        let index = decide(
            &mut state,
            &history,
            &ladder(),
            &context(0, 3),
            &without_lookahead(),
            &SizeTable::default(),
        )
        .await
        .unwrap();

        assert_eq!(index, 3);
        assert_eq!(state.damped_switches, 1);
        assert!((state.buffering_factor - 0.75).abs() < 1e-12);
    }

    #[tokio::test]
    async fn large_up_switch_is_limited() {
        let history = ThroughputHistory::from(vec![50_000_000, 50_000_000]);
        let mut state = fresh();

        let index = decide(
            &mut state,
            &history,
            &ladder(),
            &context(10_000, 3),
            &without_lookahead(),
            &SizeTable::default(),
        )
        .await
        .unwrap();

        assert_eq!(index, 1);
        assert_eq!(state.damped_switches, 1);
    }

    #[tokio::test]
    async fn lookahead_skips_renditions_with_heavy_segments() {
        let history = ThroughputHistory::from(vec![3_000_000, 3_000_000]);
        let mut state = fresh();
        let probe = SizeTable::new(vec![
            vec![2_000_000; 20],
            vec![1_000_000; 20],
            vec![250_000; 20],
            vec![125_000; 20],
        ]);

        let index = decide(
            &mut state,
            &history,
            &ladder(),
            &context(10_000, 1),
            &ArbiterOptions::default(),
            &probe,
        )
        .await
        .unwrap();

        // Target is 3.45 Mbps; rendition 1 really streams at 4 Mbps.
        assert_eq!(index, 2);
        assert_eq!(state.damped_switches, 0);
    }

    #[tokio::test]
    async fn disabled_buffer_scaling_keeps_factor() {
        let history = ThroughputHistory::from(vec![3_000_000, 3_000_000]);
        let mut state = fresh();
        let options = ArbiterOptions {
            buffer_scaling: false,
            ..without_lookahead()
        };

        let index = decide(
            &mut state,
            &history,
            &ladder(),
            &context(0, 1),
            &options,
            &SizeTable::default(),
        )
        .await
        .unwrap();

        assert_eq!(index, 1);
        assert!((state.buffering_factor - 1.0).abs() < 1e-12);
    }
}
