//! Scaling benchmark for RuLSIF: design matrices, one ratio fit, and the
//! full cross-validated training run.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ndarray::Array2;
use rand::prelude::*;
use rulsif::{Config, DensityRatioEstimator, GaussianKernel, Rulsif};

fn create_data(dim: usize, n: usize, shift: f64) -> Array2<f64> {
    let mut rng = rand::rng();
    Array2::from_shape_fn((dim, n), |_| rng.random::<f64>() + shift)
}

fn bench_design_matrix(c: &mut Criterion) {
    let mut group = c.benchmark_group("gaussian_design_matrix");
    let dim = 8;

    for n in [64usize, 128, 256, 512] {
        let samples = create_data(dim, n, 0.0);
        let kernel = GaussianKernel::new(0.5).unwrap();

        group.throughput(Throughput::Elements((n * n) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| black_box(kernel.evaluate(black_box(samples.view()), samples.view()).unwrap()))
        });
    }
    group.finish();
}

fn bench_ratio_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("ratio_fit");
    let dim = 2;

    for n in [64usize, 128, 256] {
        let reference = create_data(dim, n, 0.0);
        let test = create_data(dim, n, 0.3);
        let estimator = DensityRatioEstimator::new(0.1, 0.4, 0.01).unwrap();

        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                black_box(
                    estimator
                        .fit_and_evaluate(reference.view(), test.view(), reference.view())
                        .unwrap(),
                )
            })
        });
    }
    group.finish();
}

fn bench_train(c: &mut Criterion) {
    let mut group = c.benchmark_group("train_cross_validated");
    group.sample_size(10);
    let dim = 2;

    for n in [50usize, 100, 200] {
        let reference = create_data(dim, n, 0.0);
        let test = create_data(dim, n, 0.3);

        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                let mut model = Rulsif::new(Config::default().with_alpha(0.1)).unwrap();
                model.train(black_box(reference.view()), test.view()).unwrap();
                black_box(model)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_design_matrix, bench_ratio_fit, bench_train);
criterion_main!(benches);
