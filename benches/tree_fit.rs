//! Benchmark for the dominant per-product cost: tree-regressor fitting.

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use demand_forecast::core::TimeSeries;
use demand_forecast::models::{DemandModel, TreeRegressor};

fn synthetic_series(days: usize) -> TimeSeries {
    let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    let values = (0..days)
        .map(|i| {
            let weekly = if i % 7 < 5 { 18.0 } else { 6.0 };
            weekly + 0.02 * i as f64 + ((i * 37) % 11) as f64 * 0.3
        })
        .collect();
    TimeSeries::daily(start, values).unwrap()
}

fn bench_tree_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree_fit");
    for days in [60, 180, 365] {
        let series = synthetic_series(days);
        group.bench_with_input(BenchmarkId::from_parameter(days), &series, |b, series| {
            b.iter(|| {
                let mut model = TreeRegressor::new(42);
                model.fit(black_box(series)).unwrap();
                model
            })
        });
    }
    group.finish();
}

fn bench_tree_predict(c: &mut Criterion) {
    let series = synthetic_series(180);
    let mut model = TreeRegressor::new(42);
    model.fit(&series).unwrap();

    c.bench_function("tree_predict_30", |b| {
        b.iter(|| model.predict(black_box(30)).unwrap())
    });
}

criterion_group!(benches, bench_tree_fit, bench_tree_predict);
criterion_main!(benches);
