//! Buffer-based allocation with a reservoir sized from upcoming segments.

use super::step_toward;
use crate::{AbrResult, DecisionContext, Ladder, SegmentSizeProbe};

/// Upper end of the rate map as a share of the maximum buffer.
const CUSHION_RATIO: f64 = 0.9;
/// Largest reservoir as a share of the maximum buffer.
const MAX_RESERVOIR_RATIO: f64 = 0.6;

pub(crate) async fn decide<P: SegmentSizeProbe>(
    reservoir_ms: &mut Option<u64>,
    ladder: &Ladder,
    ctx: &DecisionContext,
    probe: &P,
) -> AbrResult<usize> {
    let reservoir = update_reservoir(ladder, ctx, probe).await?;
    *reservoir_ms = Some(reservoir);

    let segment_ms = ctx.segment_duration_ms;
    let lowest = ladder.lowest_index();
    let best_step = ctx.last_index.saturating_sub(1);
    let slow = ctx.delivery_ms > segment_ms;

    if ctx.buffer_ms < reservoir {
        return Ok(if slow {
            lowest
        } else if ctx.delivery_ms.saturating_mul(8) < segment_ms {
            best_step
        } else {
            ctx.last_index
        });
    }

    let mapped = rate_map(ladder, ctx, reservoir);
    if slow {
        return Ok(mapped);
    }
    let cap = if ctx.delivery_ms.saturating_mul(2) <= segment_ms {
        best_step
    } else {
        lowest
    };
    Ok(mapped.min(cap))
}

/// Reservoir in milliseconds: time needed to absorb the upcoming segments
/// that are larger than average at the last rendition, bounded to
/// `[2 * segment, 0.6 * max_buffer]`.
#[expect(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub(crate) async fn update_reservoir<P: SegmentSizeProbe>(
    ladder: &Ladder,
    ctx: &DecisionContext,
    probe: &P,
) -> AbrResult<u64> {
    let segment_ms = ctx.segment_duration_ms.max(1);
    let max_buffer_ms = ctx.max_buffer_ms();
    let window = (2 * max_buffer_ms / segment_ms).min(ctx.remaining_segments());

    let bandwidth = ladder.bandwidth(ctx.last_index);
    let average_bytes = bandwidth.saturating_mul(segment_ms) / 8000;

    let mut large: u64 = 0;
    let mut small: u64 = 0;
    for segment in ctx.segment_number + 1..=ctx.segment_number + window {
        let size = probe.segment_size(ctx.last_index, segment).await?;
        if size > average_bytes {
            large += size;
        } else {
            small += size;
        }
    }

    let bits_per_ms = (bandwidth as f64 / 1000.0).max(1.0);
    let cushion = 8.0 * (large as f64 - small as f64) / bits_per_ms;
    let floor = 2.0 * segment_ms as f64;
    let ceiling = MAX_RESERVOIR_RATIO * max_buffer_ms as f64;

    let reservoir = if cushion < floor {
        floor
    } else if cushion > ceiling {
        ceiling
    } else {
        cushion
    };
    Ok(reservoir as u64)
}

/// Linear map from the buffer region above the reservoir onto the bitrate
/// range, damped to one rung per decision.
#[expect(clippy::cast_precision_loss)]
fn rate_map(ladder: &Ladder, ctx: &DecisionContext, reservoir_ms: u64) -> usize {
    let max_buffer_ms = ctx.max_buffer_ms() as f64;
    let buffer_ms = ctx.buffer_ms as f64;

    let optimal = if buffer_ms >= CUSHION_RATIO * max_buffer_ms {
        0
    } else {
        let low = ladder.lowest_bandwidth() as f64;
        let high = ladder.highest_bandwidth() as f64;
        let span = (CUSHION_RATIO * max_buffer_ms - reservoir_ms as f64).max(1.0);
        let fraction = ((buffer_ms - reservoir_ms as f64) / span).clamp(0.0, 1.0);
        ladder.select(low + (high - low) * fraction)
    };

    step_toward(optimal, ctx.last_index, ctx.ceiling_index, ladder.lowest_index())
}
