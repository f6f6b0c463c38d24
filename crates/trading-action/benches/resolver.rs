//! Benchmarks for close resolution.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use trading_action::{resolve, CloseSplitPolicy};
use trading_core::types::{Direction, Exchange, Position};

fn benchmark_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");
    let position = Position::new("rb2110", Exchange::Shfe, Direction::Long, 1000, 400);

    for policy in [
        CloseSplitPolicy::Plain,
        CloseSplitPolicy::TodayFirst,
        CloseSplitPolicy::YesterdayFirst,
    ] {
        group.bench_with_input(
            BenchmarkId::new(format!("{:?}", policy), 700),
            &position,
            |b, position| {
                b.iter(|| {
                    resolve(
                        black_box(Some(position)),
                        Direction::Long,
                        black_box(700),
                        true,
                        policy,
                    )
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, benchmark_resolve);
criterion_main!(benches);
