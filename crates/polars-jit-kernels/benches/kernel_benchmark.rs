use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use polars::prelude::*;
use polars_jit_kernels::from_series;
use polars_jit_kernels::kernels::{add_one_e2e, weighted_sum};

fn create_test_series(rows: usize) -> Series {
    Series::new("values".into(), (0..rows as i64).collect::<Vec<_>>())
}

fn bench_from_series(c: &mut Criterion) {
    let mut group = c.benchmark_group("from_series");

    for rows in [1_000, 10_000, 100_000] {
        let series = create_test_series(rows);
        group.bench_with_input(BenchmarkId::from_parameter(rows), &series, |b, series| {
            b.iter(|| black_box(from_series(black_box(series)).unwrap()));
        });
    }

    group.finish();
}

fn bench_weighted_sum(c: &mut Criterion) {
    let series = create_test_series(1_000_000);
    let kernel = weighted_sum();

    let mut group = c.benchmark_group("sum_1m");

    group.bench_function("kernel", |b| {
        b.iter(|| {
            let out = kernel.evaluate(&[black_box(&series).into()]).unwrap();
            black_box(out);
        });
    });

    group.bench_function("native_polars", |b| {
        b.iter(|| black_box(black_box(&series).sum::<f64>().unwrap()));
    });

    group.finish();
}

fn bench_add_one(c: &mut Criterion) {
    let series = create_test_series(100_000);

    c.bench_function("add_one_e2e_100k", |b| {
        b.iter(|| black_box(add_one_e2e(black_box(&series)).unwrap()));
    });
}

criterion_group!(benches, bench_from_series, bench_weighted_sum, bench_add_one);
criterion_main!(benches);
