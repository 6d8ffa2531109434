use crate::{AbrOptions, DecisionContext, Ladder, ThroughputHistory, stats};

/// PI controller over the harmonic throughput estimate.
///
/// The integrator accumulates `delivery_s * (buffer_s - max_buffer_s)` on
/// every call, including cold-start ones.
#[expect(clippy::cast_precision_loss)]
pub(crate) fn decide(
    integrator: &mut f64,
    history: &ThroughputHistory,
    ladder: &Ladder,
    ctx: &DecisionContext,
    options: &AbrOptions,
) -> usize {
    let delivery_secs = ctx.delivery_ms as f64 / 1000.0;
    let buffer_secs = ctx.buffer_ms as f64 / 1000.0;
    *integrator += delivery_secs * (buffer_secs - ctx.max_buffer_secs as f64);

    if history.len() < 2 {
        return ladder.select(ctx.sample_bps as f64);
    }

    let Some(estimate) = stats::harmonic_mean(history.samples(), options.elastic_window) else {
        return ladder.lowest_index();
    };
    let whole_buffer_secs = (ctx.buffer_ms / 1000) as f64;
    let damping = options.elastic_kp * whole_buffer_secs + options.elastic_ki * *integrator;
    let target = estimate / (1.0 - damping);
    ladder.select(target)
}
