//! Benchmarks for weights construction, Moran's I and the permutation test

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use geomoran_algorithms::spatial::{knn_weights, KnnWeightsParams};
use geomoran_algorithms::statistics::{global_morans_i, permutation_test, PermutationParams};
use geomoran_core::{GeoPoint, PointSet};
use geomoran_parallel::ProcessingMode;

fn create_points(n: usize) -> PointSet {
    // Deterministic spiral over the globe
    (0..n)
        .map(|i| {
            let t = i as f64 / n as f64;
            let lat = -80.0 + 160.0 * t;
            let lng = ((i * 137) % 360) as f64 - 180.0;
            GeoPoint::new(lat, lng).unwrap()
        })
        .collect()
}

fn create_values(points: &PointSet) -> Vec<f64> {
    points
        .iter()
        .map(|p| if p.lng() < -30.0 { 1.0 } else { 0.0 })
        .collect()
}

fn bench_weights(c: &mut Criterion) {
    let mut group = c.benchmark_group("knn_weights");

    for size in [100, 250, 500].iter() {
        let points = create_points(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| knn_weights(black_box(&points), KnnWeightsParams::default()).unwrap())
        });
    }

    group.finish();
}

fn bench_morans_i(c: &mut Criterion) {
    let mut group = c.benchmark_group("global_morans_i");

    for size in [100, 250, 500].iter() {
        let points = create_points(*size);
        let weights = knn_weights(&points, KnnWeightsParams::default()).unwrap();
        let values = create_values(&points);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| global_morans_i(black_box(&values), black_box(&weights)).unwrap())
        });
    }

    group.finish();
}

fn bench_permutation(c: &mut Criterion) {
    let mut group = c.benchmark_group("permutation_test_99");
    group.sample_size(10);

    let points = create_points(250);
    let weights = knn_weights(&points, KnnWeightsParams::default()).unwrap();
    let values = create_values(&points);

    for (name, mode) in [
        ("sequential", ProcessingMode::Sequential),
        ("parallel", ProcessingMode::Parallel),
    ] {
        let params = PermutationParams {
            permutations: 99,
            mode,
            ..Default::default()
        };
        group.bench_function(name, |b| {
            b.iter(|| permutation_test(black_box(&values), &weights, &params).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_weights, bench_morans_i, bench_permutation);
criterion_main!(benches);
