//! Property-based correctness suite (invariants 1-10) plus the S1-S6
//! scenario tests are covered as `#[cfg(test)]` units colocated with each
//! family module; this file holds only the properties that need to range
//! over many shapes.

use densekernel::ops::{Add, Div, Mul, Sub};
use densekernel::{broadcast, fused_reduce, identity, matrix, multiply, reduce, transpose, zeros};
use proptest::prelude::*;

fn naive_ikj(a: &[f64], b: &[f64], c: &mut [f64], m: usize, n: usize, p: usize) {
    for i in 0..m {
        for k in 0..n {
            let aik = a[i * n + k];
            for j in 0..p {
                c[i * p + j] += aik * b[k * p + j];
            }
        }
    }
}

fn dims() -> impl Strategy<Value = (usize, usize)> {
    (1usize..=64, 1usize..=64)
}

fn matrix_values(len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-100.0f64..100.0, len)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // 1. Broadcast correctness.
    #[test]
    fn broadcast_fills_every_element((rows, cols) in dims(), value in -50.0f64..50.0) {
        let mut a = vec![0.0f64; rows * cols];
        broadcast("broadcast", &mut a, rows, cols, value).unwrap();
        prop_assert!(a.iter().all(|&v| v == value));
    }

    // 2. Transpose involution.
    #[test]
    fn transpose_is_involutive((rows, cols) in dims(), data in matrix_values(64 * 64)) {
        let data = &data[..rows * cols];
        let mut b = vec![0.0f64; rows * cols];
        transpose("transpose", data, &mut b, rows, cols).unwrap();
        let mut c = vec![0.0f64; rows * cols];
        transpose("transpose", &b, &mut c, cols, rows).unwrap();
        prop_assert_eq!(data.to_vec(), c);
    }

    // 3. Unite agreement, one op per test to keep strategy shapes simple.
    #[test]
    fn unite_add_matches_naive((rows, cols) in dims(), a in matrix_values(64 * 64), b in matrix_values(64 * 64)) {
        let a = &a[..rows * cols];
        let b = &b[..rows * cols];
        let mut c = vec![0.0f64; rows * cols];
        matrix::unite::<f64, Add>("unite", a, b, &mut c, rows, cols).unwrap();
        for i in 0..a.len() {
            prop_assert!((c[i] - (a[i] + b[i])).abs() < 1e-9);
        }
    }

    #[test]
    fn unite_sub_matches_naive((rows, cols) in dims(), a in matrix_values(64 * 64), b in matrix_values(64 * 64)) {
        let a = &a[..rows * cols];
        let b = &b[..rows * cols];
        let mut c = vec![0.0f64; rows * cols];
        matrix::unite::<f64, Sub>("unite", a, b, &mut c, rows, cols).unwrap();
        for i in 0..a.len() {
            prop_assert!((c[i] - (a[i] - b[i])).abs() < 1e-9);
        }
    }

    #[test]
    fn unite_mul_matches_naive((rows, cols) in dims(), a in matrix_values(64 * 64), b in matrix_values(64 * 64)) {
        let a = &a[..rows * cols];
        let b = &b[..rows * cols];
        let mut c = vec![0.0f64; rows * cols];
        matrix::unite::<f64, Mul>("unite", a, b, &mut c, rows, cols).unwrap();
        for i in 0..a.len() {
            prop_assert!((c[i] - a[i] * b[i]).abs() < 1e-6 * (1.0 + a[i].abs() * b[i].abs()));
        }
    }

    #[test]
    fn unite_div_matches_naive((rows, cols) in dims(), a in matrix_values(64 * 64), b in prop::collection::vec(1.0f64..100.0, 64 * 64)) {
        let a = &a[..rows * cols];
        let b = &b[..rows * cols];
        let mut c = vec![0.0f64; rows * cols];
        matrix::unite::<f64, Div>("unite", a, b, &mut c, rows, cols).unwrap();
        for i in 0..a.len() {
            prop_assert!((c[i] - a[i] / b[i]).abs() < 1e-6 * (1.0 + (a[i] / b[i]).abs()));
        }
    }

    // 4. Reduce stability.
    #[test]
    fn reduce_add_matches_naive_fold((rows, cols) in dims(), data in matrix_values(64 * 64)) {
        let data = &data[..rows * cols];
        let naive: f64 = data.iter().fold(0.0, |acc, &x| acc + x);
        let got = reduce::<f64, Add>("reduce", data, 0.0, rows, cols).unwrap();
        let tolerance = (rows * cols) as f64 * f64::EPSILON * 1000.0;
        prop_assert!((got - naive).abs() <= tolerance.max(1e-9));
    }

    // 6. Dot-product consistency: fused_reduce<mul, add> == reduce<add>(unite<mul>(...)).
    #[test]
    fn fused_reduce_matches_two_step((rows, cols) in dims(), a in matrix_values(64 * 64), b in matrix_values(64 * 64)) {
        let a = &a[..rows * cols];
        let b = &b[..rows * cols];
        let via_fused = fused_reduce::<f64, Mul, Add>("fused_reduce", a, b, 0.0, rows, cols).unwrap();

        let mut unite_out = vec![0.0f64; rows * cols];
        matrix::unite::<f64, Mul>("unite", a, b, &mut unite_out, rows, cols).unwrap();
        let via_two_step = reduce::<f64, Add>("reduce", &unite_out, 0.0, rows, cols).unwrap();

        let tolerance = (rows * cols) as f64 * f64::EPSILON * 1000.0;
        prop_assert!((via_fused - via_two_step).abs() <= tolerance.max(1e-6));
    }

    // 7. Multiply identity.
    #[test]
    fn multiply_by_identity_preserves_operand(n in 1usize..=32, data in matrix_values(32 * 32)) {
        let a = &data[..n * n];
        let mut eye = vec![0.0f64; n * n];
        identity("identity", &mut eye, n, n).unwrap();

        let mut c1 = vec![0.0f64; n * n];
        multiply("multiply", a, &eye, &mut c1, n, n, n).unwrap();
        prop_assert_eq!(&c1, a);

        let mut c2 = vec![0.0f64; n * n];
        multiply("multiply", &eye, a, &mut c2, n, n, n).unwrap();
        prop_assert_eq!(&c2, a);
    }

    // 8. Multiply associativity-via-transpose: multiply(A,B) == transpose(multiply(transpose(B), transpose(A))).
    #[test]
    fn multiply_matches_transposed_form((m, n) in (1usize..=24, 1usize..=24), p in 1usize..=24, a in matrix_values(24 * 24), b in matrix_values(24 * 24)) {
        let a = &a[..m * n];
        let b = &b[..n * p];

        let mut direct = vec![0.0f64; m * p];
        multiply("multiply", a, b, &mut direct, m, n, p).unwrap();

        let mut at = vec![0.0f64; n * m];
        transpose("transpose", a, &mut at, m, n).unwrap();
        let mut bt = vec![0.0f64; p * n];
        transpose("transpose", b, &mut bt, n, p).unwrap();

        let mut via_transpose = vec![0.0f64; p * m];
        multiply("multiply", &bt, &at, &mut via_transpose, p, n, m).unwrap();
        let mut restored = vec![0.0f64; m * p];
        transpose("transpose", &via_transpose, &mut restored, p, m).unwrap();

        for i in 0..direct.len() {
            prop_assert!((direct[i] - restored[i]).abs() < 1e-6 * (1.0 + direct[i].abs()));
        }
    }

    // 10. Edge-tile parity for add: exact match across every residual shape, naive vs kernel.
    #[test]
    fn unite_add_exact_at_every_residual((rows, cols) in dims(), a in matrix_values(64 * 64), b in matrix_values(64 * 64)) {
        let a = &a[..rows * cols];
        let b = &b[..rows * cols];
        let mut c = vec![0.0f64; rows * cols];
        matrix::unite::<f64, Add>("unite", a, b, &mut c, rows, cols).unwrap();
        for i in 0..a.len() {
            prop_assert_eq!(c[i], a[i] + b[i]);
        }
    }
}

// 9. Thread-count invariance: run reduce through a single-threaded and a
// 4-way executor directly and diff, rather than as a proptest, since it
// needs two distinct executors rather than a shape strategy.
#[test]
fn reduce_agrees_across_thread_counts() {
    use densekernel::family::reduce::reduce as reduce_with_executor;
    use densekernel::parallel::{RayonExecutor, SequentialExecutor};
    use densekernel::IsaTag;
    use std::marker::PhantomData;

    let data: Vec<f64> = (0..40 * 40).map(|i| (i % 23) as f64 * 0.5).collect();
    let single = reduce_with_executor::<f64, Add>("reduce", &data, 0.0, 40, 40, IsaTag::None, &SequentialExecutor, PhantomData).unwrap();
    let multi = reduce_with_executor::<f64, Add>("reduce", &data, 0.0, 40, 40, IsaTag::None, &RayonExecutor::new(4).unwrap(), PhantomData).unwrap();
    assert!((single - multi).abs() < 1e-6 * (40.0 * 40.0));
}

#[test]
fn multiply_matches_naive_across_shapes() {
    let cases = [(32, 64, 48), (64, 32, 48), (13, 17, 19), (48, 48, 100)];
    for (m, n, p) in cases {
        let a: Vec<f64> = (0..m * n).map(|i| (i % 10) as f64).collect();
        let b: Vec<f64> = (0..n * p).map(|i| (i % 10) as f64).collect();

        let mut c_naive = vec![0.0; m * p];
        naive_ikj(&a, &b, &mut c_naive, m, n, p);

        let mut c_fast = vec![0.0; m * p];
        multiply("multiply", &a, &b, &mut c_fast, m, n, p).unwrap();

        for i in 0..c_naive.len() {
            assert!((c_naive[i] - c_fast[i]).abs() < 1e-6, "mismatch at {m}x{n}x{p}[{i}]");
        }
    }
}

#[test]
fn multiply_accumulates_onto_nonzero_c() {
    let size = 64;
    let a: Vec<f64> = (0..size * size).map(|i| (i % 10) as f64).collect();
    let b: Vec<f64> = (0..size * size).map(|i| (i % 10) as f64).collect();

    let mut c_naive = vec![5.0; size * size];
    naive_ikj(&a, &b, &mut c_naive, size, size, size);

    let mut c_fast = vec![5.0; size * size];
    multiply("multiply", &a, &b, &mut c_fast, size, size, size).unwrap();

    for i in 0..c_naive.len() {
        assert!((c_naive[i] - c_fast[i]).abs() < 1e-6);
    }
    assert!(c_fast[0] > 5.0, "should accumulate, not overwrite");
}
