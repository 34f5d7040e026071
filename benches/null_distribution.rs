use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use kulgap::statistics::KernelDensity;
use kulgap::{cross_divergences, BandwidthSearch, Config, LinearInterpolant, TreatmentCondition};
use nalgebra::DMatrix;

fn controls(n: usize) -> Vec<TreatmentCondition> {
    let days: Vec<f64> = (0..12).map(|i| 3.0 * i as f64).collect();
    (0..n)
        .map(|k| {
            let means = days.iter().map(|&t| 100.0 + (1.0 + 0.05 * k as f64) * t).collect();
            let variances = days.iter().map(|&t| 4.0 + 0.1 * t).collect();
            let model = LinearInterpolant::new(days.clone(), means, variances).unwrap();
            TreatmentCondition::from_parts(
                format!("ctrl-{k}"),
                days.clone(),
                DMatrix::from_element(3, days.len(), 100.0),
                0,
                days.len() - 1,
                3.0,
                Arc::new(model),
            )
            .unwrap()
        })
        .collect()
}

fn bench_null(c: &mut Criterion) {
    let mut group = c.benchmark_group("null_distribution");
    group.sample_size(20);

    let conditions = controls(24);
    group.bench_function("cross_divergences_24", |b| {
        b.iter(|| black_box(cross_divergences(&conditions, &Config::default())));
    });

    let serial = Config {
        parallel: false,
        ..Config::default()
    };
    group.bench_function("cross_divergences_24_serial", |b| {
        b.iter(|| black_box(cross_divergences(&conditions, &serial)));
    });

    let values = cross_divergences(&conditions, &Config::default());
    let search = BandwidthSearch::default();
    group.bench_function("kde_fit_276", |b| {
        b.iter(|| black_box(KernelDensity::fit(&values, &search).map(|k| k.bandwidth())));
    });
    group.finish();
}

criterion_group!(benches, bench_null);
criterion_main!(benches);
