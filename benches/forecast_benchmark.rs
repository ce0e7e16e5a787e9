//! Forecast benchmarks
//!
//! Model fit and prediction over synthetic daily series of several lengths,
//! plus the two-branch comparison.

use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use forecast_dash::forecast::{AdditiveParams, Seasonality};
use forecast_dash::reshape::{SeriesPoint, TrainingSeries};
use forecast_dash::{ComparisonEngine, ForecastRunner};

/// Trend plus weekly and yearly cycles with deterministic noise
fn synthetic_series(name: &str, days: i64) -> TrainingSeries {
    let start = NaiveDate::from_ymd_opt(2017, 9, 1).unwrap();
    let mut rng_state: u64 = 42;
    let points = (0..days)
        .map(|i| {
            rng_state = rng_state.wrapping_mul(6364136223846793005).wrapping_add(1);
            let noise = (rng_state >> 33) as f64 / u32::MAX as f64 - 0.5;
            let t = i as f64;
            SeriesPoint {
                ds: start + Duration::days(i),
                y: 100.0
                    + 0.1 * t
                    + 5.0 * (t * std::f64::consts::TAU / 7.0).sin()
                    + 10.0 * (t * std::f64::consts::TAU / 365.25).sin()
                    + noise,
            }
        })
        .collect();
    TrainingSeries::new(name, points).unwrap()
}

fn bench_fit_predict(c: &mut Criterion) {
    let mut group = c.benchmark_group("fit_predict");
    group.sample_size(20);

    let runner = ForecastRunner::additive(AdditiveParams {
        weekly_seasonality: Seasonality::Enabled,
        yearly_seasonality: Seasonality::Enabled,
        ..AdditiveParams::default()
    });
    for days in [90, 365, 730] {
        let series = synthetic_series("bench", days);
        group.bench_with_input(BenchmarkId::new("days", days), &series, |b, series| {
            b.iter(|| runner.run(black_box(series), 365).unwrap())
        });
    }
    group.finish();
}

fn bench_horizon(c: &mut Criterion) {
    let mut group = c.benchmark_group("horizon");
    group.sample_size(20);

    let runner = ForecastRunner::default();
    let series = synthetic_series("bench", 365);
    for years in 1..=4 {
        group.bench_with_input(BenchmarkId::new("years", years), &years, |b, &years| {
            b.iter(|| runner.run(&series, black_box(years * 365)).unwrap())
        });
    }
    group.finish();
}

fn bench_two_branch_comparison(c: &mut Criterion) {
    let runner = ForecastRunner::default();
    let engine = ComparisonEngine::default();
    let a = synthetic_series("A", 365);
    let b = synthetic_series("B", 365);

    c.bench_function("two_branch_comparison", |bencher| {
        bencher.iter(|| {
            let (fa, fb) = rayon::join(|| runner.run(&a, 365), || runner.run(&b, 365));
            let (fa, fb) = (fa.unwrap(), fb.unwrap());
            engine
                .compare(&fa, a.last_value(), "A", &fb, b.last_value(), "B")
                .unwrap()
        })
    });
}

criterion_group!(benches, bench_fit_predict, bench_horizon, bench_two_branch_comparison);
criterion_main!(benches);
