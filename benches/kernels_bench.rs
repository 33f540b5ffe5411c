//! Criterion benches for the family kernels and `multiply`, at a few square
//! sizes, on the crate's default-detected ISA tag and thread pool.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use densekernel::ops::{Add, Mul};
use densekernel::{broadcast, fused_reduce, multiply, reduce, transpose, zeros};

const SIZES: [usize; 3] = [64, 128, 256];

fn bench_broadcast(c: &mut Criterion) {
    let mut group = c.benchmark_group("broadcast");
    for &n in &SIZES {
        let mut data = vec![0.0f64; n * n];
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |bencher, &n| {
            bencher.iter(|| broadcast("broadcast", black_box(&mut data), n, n, 1.5).unwrap());
        });
    }
    group.finish();
}

fn bench_transpose(c: &mut Criterion) {
    let mut group = c.benchmark_group("transpose");
    for &n in &SIZES {
        let a: Vec<f64> = (0..n * n).map(|i| i as f64).collect();
        let mut b = vec![0.0f64; n * n];
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |bencher, &n| {
            bencher.iter(|| transpose("transpose", &a, black_box(&mut b), n, n).unwrap());
        });
    }
    group.finish();
}

fn bench_reduce(c: &mut Criterion) {
    let mut group = c.benchmark_group("reduce_add");
    for &n in &SIZES {
        let a: Vec<f64> = (0..n * n).map(|i| (i % 17) as f64).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |bencher, &n| {
            bencher.iter(|| reduce::<f64, Add>("reduce", black_box(&a), 0.0, n, n).unwrap());
        });
    }
    group.finish();
}

fn bench_fused_reduce_dot(c: &mut Criterion) {
    let mut group = c.benchmark_group("fused_reduce_dot");
    for &n in &SIZES {
        let a: Vec<f64> = (0..n * n).map(|i| (i % 13) as f64 * 0.5).collect();
        let b: Vec<f64> = (0..n * n).map(|i| (i % 11) as f64 * 0.25).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |bencher, &n| {
            bencher.iter(|| fused_reduce::<f64, Mul, Add>("fused_reduce", black_box(&a), black_box(&b), 0.0, n, n).unwrap());
        });
    }
    group.finish();
}

fn bench_multiply(c: &mut Criterion) {
    let mut group = c.benchmark_group("multiply");
    for &n in &SIZES {
        let mut a = vec![0.0f64; n * n];
        let mut b = vec![0.0f64; n * n];
        zeros("multiply_bench", &mut a, n, n).unwrap();
        zeros("multiply_bench", &mut b, n, n).unwrap();
        for (i, v) in a.iter_mut().enumerate() {
            *v = (i % 97) as f64;
        }
        for (i, v) in b.iter_mut().enumerate() {
            *v = (i % 89) as f64;
        }
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |bencher, &n| {
            let mut out = vec![0.0f64; n * n];
            bencher.iter(|| {
                out.iter_mut().for_each(|v| *v = 0.0);
                multiply("multiply", black_box(&a), black_box(&b), &mut out, n, n, n).unwrap();
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_broadcast, bench_transpose, bench_reduce, bench_fused_reduce_dot, bench_multiply);
criterion_main!(benches);
