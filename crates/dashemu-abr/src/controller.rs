use tracing::debug;

use crate::{
    AbrOptions, AbrResult, AlgorithmState, Ladder, SegmentSizeProbe, ThroughputHistory,
    strategies::{
        arbiter,
        averaging::{self, Average},
        bba, conventional, elastic, logistic,
    },
};

/// Measurements of the segment that just finished, plus stream geometry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecisionContext {
    /// Throughput of the finished segment, in bits per second.
    pub sample_bps: u64,
    /// Time spent downloading the finished segment.
    pub delivery_ms: u64,
    /// Buffer level after the finished segment was added.
    pub buffer_ms: u64,
    pub max_buffer_secs: u64,
    pub segment_duration_ms: u64,
    /// 1-based number of the finished segment.
    pub segment_number: u64,
    pub stream_duration_ms: u64,
    /// Rendition the finished segment was fetched at.
    pub last_index: usize,
    /// Best rendition allowed by the quality ceiling.
    pub ceiling_index: usize,
}

impl DecisionContext {
    #[must_use]
    pub fn max_buffer_ms(&self) -> u64 {
        self.max_buffer_secs.saturating_mul(1000)
    }

    /// Segments left in the stream after the finished one.
    #[must_use]
    pub fn remaining_segments(&self) -> u64 {
        if self.segment_duration_ms == 0 {
            return 0;
        }
        (self.stream_duration_ms / self.segment_duration_ms).saturating_sub(self.segment_number)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AbrReason {
    /// Too few samples for a history-based estimate.
    ColdStart,
    UpSwitch,
    DownSwitch,
    AlreadyOptimal,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AbrDecision {
    pub target_rendition: usize,
    pub reason: AbrReason,
    pub changed: bool,
}

/// Dispatches a decision to the strategy held in [`AlgorithmState`].
#[derive(Clone, Debug, Default)]
pub struct AbrController {
    options: AbrOptions,
}

impl AbrController {
    #[must_use]
    pub fn new(options: AbrOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub fn options(&self) -> &AbrOptions {
        &self.options
    }

    /// Records `ctx.sample_bps` and picks the rendition for the next segment.
    ///
    /// The result never exceeds `ctx.ceiling_index` in quality.
    ///
    /// # Errors
    ///
    /// Fails when `ctx.last_index` is not a rung of `ladder` or when a
    /// lookahead strategy cannot probe an upcoming segment size.
    pub async fn decide<P: SegmentSizeProbe>(
        &self,
        state: &mut AlgorithmState,
        history: &mut ThroughputHistory,
        ladder: &Ladder,
        ctx: &DecisionContext,
        probe: &P,
    ) -> AbrResult<AbrDecision> {
        ladder.rendition(ctx.last_index)?;
        history.push(ctx.sample_bps);
        let cold_start = history.len() < 2;

        let selected = match state {
            AlgorithmState::Conventional { smoothed_bps } => {
                conventional::decide(smoothed_bps, ctx.sample_bps, ladder)
            }
            AlgorithmState::Mean => averaging::decide(Average::Mean, history, ladder),
            AlgorithmState::Geometric => averaging::decide(Average::Geometric, history, ladder),
            AlgorithmState::ExponentialWeighted => averaging::decide(
                Average::Exponential {
                    ratio: self.options.exp_ratio,
                    window: self.options.exp_window,
                },
                history,
                ladder,
            ),
            AlgorithmState::Elastic { integrator } => {
                elastic::decide(integrator, history, ladder, ctx, &self.options)
            }
            AlgorithmState::Logistic => logistic::decide(ladder, ctx),
            AlgorithmState::Bba { reservoir_ms } => {
                bba::decide(reservoir_ms, ladder, ctx, probe).await?
            }
            AlgorithmState::Arbiter {
                buffering_factor,
                damped_switches,
            } => {
                let mut arbiter_state = arbiter::ArbiterState {
                    buffering_factor: *buffering_factor,
                    damped_switches: *damped_switches,
                };
                let index = arbiter::decide(
                    &mut arbiter_state,
                    history,
                    ladder,
                    ctx,
                    &self.options.arbiter,
                    probe,
                )
                .await?;
                *buffering_factor = arbiter_state.buffering_factor;
                *damped_switches = arbiter_state.damped_switches;
                index
            }
        };

        let target = selected.max(ctx.ceiling_index).min(ladder.lowest_index());
        let reason = if cold_start && state.uses_history() {
            AbrReason::ColdStart
        } else if target < ctx.last_index {
            AbrReason::UpSwitch
        } else if target > ctx.last_index {
            AbrReason::DownSwitch
        } else {
            AbrReason::AlreadyOptimal
        };

        debug!(
            algorithm = %state.algorithm(),
            sample_bps = ctx.sample_bps,
            buffer_ms = ctx.buffer_ms,
            last = ctx.last_index,
            selected,
            target,
            ?reason,
            "ABR decide"
        );

        Ok(AbrDecision {
            target_rendition: target,
            reason,
            changed: target != ctx.last_index,
        })
    }
}
