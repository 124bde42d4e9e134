// ============================================================================
// Precision Benchmarks
// ============================================================================
//
// Benchmark Categories:
// 1. Series Quotients - Division by long integer products and powers
// 2. Evaluator Pipeline - Shortcuts, rearrangement and lossy fallback
// 3. Ownership Cells - Snapshot sharing versus cloning
// ============================================================================

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use precise_eval::prelude::*;
use std::hint::black_box;
use std::sync::Arc;

// ============================================================================
// Series Quotient Benchmarks
// ============================================================================

fn benchmark_series_quotient(c: &mut Criterion) {
    let mut group = c.benchmark_group("series_quotient");
    let series = SeriesProductEvaluator::new(UnderflowPolicy::Graceful);

    for hi in [10u64, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("f64", hi), hi, |b, &hi| {
            b.iter(|| {
                black_box(series.quotient_by_series_product(black_box(1e300f64), IntegerRange::new(1, hi)))
            });
        });

        group.bench_with_input(BenchmarkId::new("naive_f64", hi), hi, |b, &hi| {
            b.iter(|| black_box((1..=hi).fold(black_box(1e300f64), |acc, k| acc / k as f64)));
        });

        let interval = Interval::point(1e300f64).unwrap();
        group.bench_with_input(BenchmarkId::new("interval", hi), hi, |b, &hi| {
            b.iter(|| {
                black_box(series.quotient_by_series_product(black_box(interval), IntegerRange::new(1, hi)))
            });
        });
    }

    let term = PowerTerm::new(10.0f64, 400);
    group.bench_function("power_over_factorial", |b| {
        b.iter(|| black_box(series.quotient_of_series_products(&term, IntegerRange::new(1, 250))));
    });

    group.finish();
}

// ============================================================================
// Evaluator Pipeline Benchmarks
// ============================================================================

fn benchmark_evaluator(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluator");
    let evaluator = EvaluatorBuilder::new()
        .build(Arc::new(NoOpEventHandler))
        .unwrap();

    let cases = [
        ("exact_fold", 1.5f64, 0.25f64),
        ("lossy_sum", 0.1, 0.2),
        ("identity", 0.0, 3.25),
    ];
    for (name, a, b) in cases.iter() {
        group.bench_function(BenchmarkId::new("sum", name), |bench| {
            bench.iter(|| {
                black_box(evaluator.sum(
                    MagnitudeCell::from_value(*a),
                    MagnitudeCell::from_value(*b),
                ))
            });
        });
    }

    group.bench_function("product_interval", |bench| {
        let lhs = Interval::new(1.0f64, 3.0).unwrap();
        let rhs = Interval::new(0.1f64, 0.7).unwrap();
        bench.iter(|| {
            black_box(evaluator.product(MagnitudeCell::from_value(lhs), MagnitudeCell::from_value(rhs)))
        });
    });

    group.bench_function("quotient_integer_to_decimal", |bench| {
        bench.iter(|| {
            black_box(evaluator.quotient(MagnitudeCell::from_value(7i64), MagnitudeCell::from_value(3i64)))
        });
    });

    group.finish();
}

// ============================================================================
// Ownership Cell Benchmarks
// ============================================================================

fn benchmark_ownership_cell(c: &mut Criterion) {
    let mut group = c.benchmark_group("ownership_cell");

    group.bench_function("snapshot", |b| {
        let mut cell = MagnitudeCell::from_value(Interval::new(1.0f64, 2.0).unwrap());
        b.iter(|| black_box(cell.snapshot()));
    });

    group.bench_function("snapshot_then_write", |b| {
        let mut cell = MagnitudeCell::from_value(Interval::new(1.0f64, 2.0).unwrap());
        b.iter(|| {
            let mut copy = cell.snapshot();
            black_box(copy.get_mut().is_some())
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_series_quotient,
    benchmark_evaluator,
    benchmark_ownership_cell
);
criterion_main!(benches);
