use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::path::Path;
use std::str::FromStr;

use chrono::DateTime;
use serde_json::json;

use ensemble_quantile::ensemble::Ensemble;
use ensemble_quantile::quantile::empirical_quantile_sorted;
use ensemble_quantile::resample::{resample, QuantileRequest};
use ensemble_quantile::summary::SummaryCase;

/// In-memory ensemble with hourly native points and two vectors per case.
fn build_ensemble(case_count: usize, native_points: usize) -> Ensemble {
    let times: Vec<String> = (0..native_points)
        .map(|j| {
            DateTime::from_timestamp(j as i64 * 3600, 0)
                .unwrap()
                .to_rfc3339()
        })
        .collect();
    let mut ensemble = Ensemble::new();
    for i in 0..case_count {
        let values: Vec<f64> = (0..native_points)
            .map(|j| (i * 7 + j) as f64 * 0.5)
            .collect();
        let case = json!({
            "time": times,
            "vectors": {
                "FOPT": {"unit": "SM3", "kind": "field", "values": values},
                "WOPR:OP_1": {
                    "unit": "SM3/DAY",
                    "kind": "well",
                    "wgname": "OP_1",
                    "rate": true,
                    "values": values,
                },
            },
        });
        let data = serde_json::to_vec(&case).unwrap();
        let case = SummaryCase::parse(Path::new("bench.json"), &data).unwrap();
        ensemble.add_case(case);
    }
    ensemble.finalize(50).unwrap();
    ensemble
}

fn bench_resample(c: &mut Criterion) {
    let mut group = c.benchmark_group("resample");

    let requests: Vec<QuantileRequest> = ["FOPT:0.10", "FOPT:0.50", "WOPR:OP_1:0.90"]
        .iter()
        .map(|token| QuantileRequest::from_str(token).unwrap())
        .collect();

    for cases in [12, 100].iter() {
        for points in [50, 500].iter() {
            let ensemble = build_ensemble(*cases, *points);
            group.bench_with_input(
                format!("cases={}, native={}", cases, points),
                &ensemble,
                |b, ensemble| {
                    b.iter(|| resample(black_box(ensemble), black_box(&requests)));
                },
            );
        }
    }

    group.finish();
}

fn bench_quantile_kernel(c: &mut Criterion) {
    let mut group = c.benchmark_group("empirical_quantile_sorted");

    for n in [10, 1_000, 100_000].iter() {
        let sorted: Vec<f64> = (0..*n).map(|i| i as f64).collect();
        group.bench_with_input(format!("n={}", n), &sorted, |b, sorted| {
            b.iter(|| empirical_quantile_sorted(black_box(sorted), black_box(0.9)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_resample, bench_quantile_kernel);
criterion_main!(benches);
