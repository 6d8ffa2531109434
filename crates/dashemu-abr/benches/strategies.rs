#![forbid(unsafe_code)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use dashemu_abr::{
    AbrController, AbrOptions, Algorithm, AlgorithmState, DecisionContext, Ladder, SizeTable,
    ThroughputHistory, stats,
};
use dashemu_test_utils::BANDWIDTHS;

fn samples(count: u64) -> Vec<u64> {
    (0..count).map(|i| 2_000_000 + (i * 7_919 % 5_000) * 1_000).collect()
}

fn bench_averages(c: &mut Criterion) {
    let mut group = c.benchmark_group("abr_averages");

    for count in [16_u64, 256, 4096] {
        let history = samples(count);
        group.bench_with_input(BenchmarkId::new("geometric", count), &history, |b, h| {
            b.iter(|| black_box(stats::geometric_mean(black_box(h))));
        });
        group.bench_with_input(BenchmarkId::new("exponential", count), &history, |b, h| {
            b.iter(|| black_box(stats::exp_average(black_box(h), 0.4, 10)));
        });
    }

    group.finish();
}

fn bench_decide(c: &mut Criterion) {
    let Ok(runtime) = tokio::runtime::Builder::new_current_thread().build() else {
        return;
    };
    let Ok(ladder) = Ladder::from_bandwidths(&BANDWIDTHS) else {
        return;
    };
    let controller = AbrController::new(AbrOptions::default());
    let sizes = SizeTable::new(vec![vec![400_000; 200]; BANDWIDTHS.len()]);
    let mut group = c.benchmark_group("abr_decide");

    for algorithm in Algorithm::ALL {
        group.bench_function(BenchmarkId::from_parameter(algorithm), |b| {
            b.iter(|| {
                let mut state = AlgorithmState::new(algorithm);
                let mut history = ThroughputHistory::from(samples(32));
                let ctx = DecisionContext {
                    sample_bps: 3_500_000,
                    delivery_ms: 900,
                    buffer_ms: 12_000,
                    max_buffer_secs: 60,
                    segment_duration_ms: 2000,
                    segment_number: 33,
                    stream_duration_ms: 300_000,
                    last_index: 6,
                    ceiling_index: 0,
                };
                runtime.block_on(controller.decide(
                    &mut state,
                    &mut history,
                    &ladder,
                    &ctx,
                    &sizes,
                ))
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_averages, bench_decide);
criterion_main!(benches);
