//! Blocked, vectorized, multi-threaded dense matrix kernels.
//!
//! Six family kernels — `broadcast` (and its `zeros`/`ones`/`identity`
//! derivatives), `transpose`, `unite`, `reduce`, `fused_union`,
//! `fused_reduce` — plus general matrix multiply, each cache-blocked
//! (`blocking`), vectorized across a runtime-detected [`isa::IsaTag`]
//! (`vector`), and driven across a thread pool (`parallel`) with a scalar
//! edge-tile fallback for whatever a kernel's register tile doesn't evenly
//! divide. Element types are `f32`, `f64`, `num_complex::Complex<f32>`, and
//! `Complex<f64>`.
//!
//! The functions at the crate root and in [`matrix`]/[`scalar`] detect the
//! widest ISA this build can execute and dispatch on a shared default
//! thread pool. Callers who want to pin the ISA tag or supply their own
//! [`Executor`] — a single-threaded one for deterministic tests, say — call
//! straight into the `family` module these wrap.
//!
//! ## Example
//!
//! ```
//! use densekernel::multiply;
//!
//! let a = vec![1.0f64, 2.0, 3.0, 4.0];
//! let b = vec![5.0f64, 6.0, 7.0, 8.0];
//! let mut c = vec![0.0f64; 4];
//! multiply("multiply", &a, &b, &mut c, 2, 2, 2).unwrap();
//! assert_eq!(c, [19.0, 22.0, 43.0, 50.0]);
//! ```

pub mod blocking;
pub mod composites;
pub mod config;
pub mod error;
pub mod family;
pub mod isa;
pub mod kernel;
pub mod ops;
pub mod parallel;
pub mod vector;
pub mod view;

pub use error::{Error, Result};
pub use family::fused_union::FusionPolicy;
pub use isa::IsaTag;
pub use ops::{Add, Div, Lanes, Mul, ReduceOp, Scalar, SimdOp, Sub};
pub use parallel::{Executor, RayonExecutor, SequentialExecutor};

use std::marker::PhantomData;
use std::sync::OnceLock;

/// The thread pool every top-level convenience function in this module
/// dispatches on, built once from [`config::real_cores`]. Callers who need a
/// differently-sized or deterministic pool should call into `family`
/// directly with their own [`Executor`].
fn default_executor() -> &'static RayonExecutor {
    static EXECUTOR: OnceLock<RayonExecutor> = OnceLock::new();
    EXECUTOR.get_or_init(|| RayonExecutor::with_default_threads().expect("failed to size default thread pool"))
}

/// `A[i,j] <- value` for all `(i, j)`.
pub fn broadcast<T: Scalar + Lanes>(entry: &'static str, data: &mut [T], rows: usize, cols: usize, value: T) -> Result<()> {
    let isa = IsaTag::detect();
    let span = tracing::info_span!("broadcast", entry, ?isa, rows, cols);
    let _enter = span.enter();
    family::broadcast::broadcast(entry, data, rows, cols, value, isa, default_executor())
}

/// As [`broadcast`], `A` given as `data.len()` row pointers each `cols` long.
pub fn broadcast_row_pointer<'a, T: Scalar + Lanes>(entry: &'static str, data: &'a mut [&'a mut [T]], cols: usize, value: T) -> Result<()> {
    let rows = data.len();
    let flat = view::flatten_rows_mut(entry, data, cols)?;
    broadcast(entry, flat, rows, cols, value)
}

/// `A[i,j] <- 0`.
pub fn zeros<T: Scalar + Lanes>(entry: &'static str, data: &mut [T], rows: usize, cols: usize) -> Result<()> {
    broadcast(entry, data, rows, cols, T::zero())
}

/// As [`zeros`], `A` given as row pointers.
pub fn zeros_row_pointer<'a, T: Scalar + Lanes>(entry: &'static str, data: &'a mut [&'a mut [T]], cols: usize) -> Result<()> {
    broadcast_row_pointer(entry, data, cols, T::zero())
}

/// `A[i,j] <- 1`.
pub fn ones<T: Scalar + Lanes>(entry: &'static str, data: &mut [T], rows: usize, cols: usize) -> Result<()> {
    broadcast(entry, data, rows, cols, T::one())
}

/// As [`ones`], `A` given as row pointers.
pub fn ones_row_pointer<'a, T: Scalar + Lanes>(entry: &'static str, data: &'a mut [&'a mut [T]], cols: usize) -> Result<()> {
    broadcast_row_pointer(entry, data, cols, T::one())
}

/// `A <- 0` then `A[i,i] <- 1` for `i < min(rows, cols)`.
pub fn identity<T: Scalar + Lanes>(entry: &'static str, data: &mut [T], rows: usize, cols: usize) -> Result<()> {
    let isa = IsaTag::detect();
    let span = tracing::info_span!("identity", entry, ?isa, rows, cols);
    let _enter = span.enter();
    family::broadcast::identity(entry, data, rows, cols, isa, default_executor())
}

/// As [`identity`], `A` given as row pointers.
pub fn identity_row_pointer<'a, T: Scalar + Lanes>(entry: &'static str, data: &'a mut [&'a mut [T]], cols: usize) -> Result<()> {
    let rows = data.len();
    let flat = view::flatten_rows_mut(entry, data, cols)?;
    identity(entry, flat, rows, cols)
}

/// `B[j,i] = A[i,j]`; `A` is `rows x cols`, `B` is `cols x rows`.
pub fn transpose<T: Scalar + Lanes>(entry: &'static str, a: &[T], b: &mut [T], rows: usize, cols: usize) -> Result<()> {
    let isa = IsaTag::detect();
    let span = tracing::info_span!("transpose", entry, ?isa, rows, cols);
    let _enter = span.enter();
    family::transpose::transpose(entry, a, b, rows, cols, isa, default_executor())
}

/// As [`transpose`], `A` given as `a.len()` row pointers each `cols` long.
pub fn transpose_row_pointer<'a, T: Scalar + Lanes>(entry: &'static str, a: &'a [&'a [T]], cols: usize, b: &mut [T]) -> Result<()> {
    let rows = a.len();
    let flat_a = view::flatten_rows(entry, a, cols)?;
    transpose(entry, flat_a, b, rows, cols)
}

/// `fold_O over (i,j) of A[i,j]`, seeded with `seed`. `O` is `Add` or `Mul`.
pub fn reduce<T: Scalar + Lanes, O: ReduceOp<T> + SimdOp<T>>(entry: &'static str, a: &[T], seed: T, rows: usize, cols: usize) -> Result<T> {
    let isa = IsaTag::detect();
    let span = tracing::info_span!("reduce", entry, ?isa, rows, cols, op = O::NAME);
    let _enter = span.enter();
    family::reduce::reduce::<T, O>(entry, a, seed, rows, cols, isa, default_executor(), PhantomData)
}

/// As [`reduce`], `A` given as row pointers.
pub fn reduce_row_pointer<'a, T: Scalar + Lanes, O: ReduceOp<T> + SimdOp<T>>(entry: &'static str, a: &'a [&'a [T]], cols: usize, seed: T) -> Result<T> {
    let rows = a.len();
    let flat_a = view::flatten_rows(entry, a, cols)?;
    reduce::<T, O>(entry, flat_a, seed, rows, cols)
}

/// `fold_R over (i,j) of U(A[i,j], B[i,j])`, seeded with `seed`. `U` is any
/// binary op; `R` is `Add` or `Mul`.
pub fn fused_reduce<T: Scalar + Lanes + family::fused_reduce::FmaDot, U: SimdOp<T>, R: ReduceOp<T> + SimdOp<T>>(
    entry: &'static str,
    a: &[T],
    b: &[T],
    seed: T,
    rows: usize,
    cols: usize,
) -> Result<T> {
    let isa = IsaTag::detect();
    let span = tracing::info_span!("fused_reduce", entry, ?isa, rows, cols, union_op = U::NAME, reduce_op = R::NAME);
    let _enter = span.enter();
    family::fused_reduce::fused_reduce::<T, U, R>(entry, a, b, seed, rows, cols, isa, default_executor(), PhantomData)
}

/// As [`fused_reduce`], `A` and `B` given as row pointers.
#[allow(clippy::too_many_arguments)]
pub fn fused_reduce_row_pointer<'a, T: Scalar + Lanes + family::fused_reduce::FmaDot, U: SimdOp<T>, R: ReduceOp<T> + SimdOp<T>>(
    entry: &'static str,
    a: &'a [&'a [T]],
    b: &'a [&'a [T]],
    cols: usize,
    seed: T,
) -> Result<T> {
    let rows = a.len();
    let flat_a = view::flatten_rows(entry, a, cols)?;
    let flat_b = view::flatten_rows(entry, b, cols)?;
    fused_reduce::<T, U, R>(entry, flat_a, flat_b, seed, rows, cols)
}

/// `C[i,j] += sum_k A[i,k]*B[k,j]`; `A` is `m x n`, `B` is `n x p`, `C` is `m x p`.
pub fn multiply<T>(entry: &'static str, a: &[T], b: &[T], c: &mut [T], m: usize, n: usize, p: usize) -> Result<()>
where
    T: Scalar + Lanes + std::ops::Add<Output = T> + std::ops::Mul<Output = T>,
{
    let isa = IsaTag::detect();
    let span = tracing::info_span!("multiply", entry, ?isa, m, n, p);
    let _enter = span.enter();
    family::multiply::multiply(entry, a, b, c, m, n, p, isa, default_executor())
}

/// As [`multiply`], `A` and `B` given as row pointers.
pub fn multiply_row_pointer<'a, T>(entry: &'static str, a: &'a [&'a [T]], n: usize, b: &'a [&'a [T]], p: usize, c: &mut [T]) -> Result<()>
where
    T: Scalar + Lanes + std::ops::Add<Output = T> + std::ops::Mul<Output = T>,
{
    let m = a.len();
    let flat_a = view::flatten_rows(entry, a, n)?;
    let flat_b = view::flatten_rows(entry, b, p)?;
    multiply(entry, flat_a, flat_b, c, m, n, p)
}

/// `A[i,i] <- 1` for `i < min(rows, cols)`; off-diagonal elements untouched.
pub fn set_identity<T: Scalar>(entry: &'static str, data: &mut [T], rows: usize, cols: usize) -> Result<()> {
    composites::identity::set_identity(entry, data, rows, cols)
}

/// As [`set_identity`], `A` given as row pointers.
pub fn set_identity_row_pointer<'a, T: Scalar>(entry: &'static str, data: &'a mut [&'a mut [T]], cols: usize) -> Result<()> {
    let rows = data.len();
    let flat = view::flatten_rows_mut(entry, data, cols)?;
    set_identity(entry, flat, rows, cols)
}

/// Solves `L y = b` for lower-triangular `L` (`n x n`, row-major).
pub fn forward_substitution<T>(entry: &'static str, l: &[T], b: &[T], y: &mut [T], n: usize, unit_diag: bool) -> Result<()>
where
    T: Scalar + Lanes + family::fused_reduce::FmaDot + composites::triangular::DiagTolerance + std::ops::Sub<Output = T> + std::ops::Div<Output = T>,
{
    let isa = IsaTag::detect();
    let span = tracing::info_span!("forward_substitution", entry, ?isa, n, unit_diag);
    let _enter = span.enter();
    composites::triangular::forward_substitution(entry, l, b, y, n, unit_diag, isa, default_executor())
}

/// As [`forward_substitution`], `L` given as row pointers.
pub fn forward_substitution_row_pointer<'a, T>(entry: &'static str, l: &'a [&'a [T]], b: &[T], y: &mut [T], unit_diag: bool) -> Result<()>
where
    T: Scalar + Lanes + family::fused_reduce::FmaDot + composites::triangular::DiagTolerance + std::ops::Sub<Output = T> + std::ops::Div<Output = T>,
{
    let n = l.len();
    let flat_l = view::flatten_rows(entry, l, n)?;
    forward_substitution(entry, flat_l, b, y, n, unit_diag)
}

/// Solves `U x = y` for upper-triangular `U` (`n x n`, row-major).
pub fn backward_substitution<T>(entry: &'static str, u: &[T], y: &[T], x: &mut [T], n: usize, unit_diag: bool) -> Result<()>
where
    T: Scalar + Lanes + family::fused_reduce::FmaDot + composites::triangular::DiagTolerance + std::ops::Sub<Output = T> + std::ops::Div<Output = T>,
{
    let isa = IsaTag::detect();
    let span = tracing::info_span!("backward_substitution", entry, ?isa, n, unit_diag);
    let _enter = span.enter();
    composites::triangular::backward_substitution(entry, u, y, x, n, unit_diag, isa, default_executor())
}

/// As [`backward_substitution`], `U` given as row pointers.
pub fn backward_substitution_row_pointer<'a, T>(entry: &'static str, u: &'a [&'a [T]], y: &[T], x: &mut [T], unit_diag: bool) -> Result<()>
where
    T: Scalar + Lanes + family::fused_reduce::FmaDot + composites::triangular::DiagTolerance + std::ops::Sub<Output = T> + std::ops::Div<Output = T>,
{
    let n = u.len();
    let flat_u = view::flatten_rows(entry, u, n)?;
    backward_substitution(entry, flat_u, y, x, n, unit_diag)
}

/// Matrix-operand convenience entry points (`C`/`D` built from two full
/// matrix operands).
pub mod matrix {
    use super::*;

    /// `C[i,j] = O(A[i,j], B[i,j])`.
    pub fn unite<T: Scalar + Lanes, O: SimdOp<T>>(entry: &'static str, a: &[T], b: &[T], c: &mut [T], rows: usize, cols: usize) -> Result<()> {
        let isa = IsaTag::detect();
        let span = tracing::info_span!("unite", entry, ?isa, rows, cols, op = O::NAME);
        let _enter = span.enter();
        family::unite::matrix::unite::<T, O>(entry, a, b, c, rows, cols, isa, default_executor(), PhantomData)
    }

    /// As [`unite`], `A` and `B` given as row pointers.
    pub fn unite_row_pointer<'a, T: Scalar + Lanes, O: SimdOp<T>>(entry: &'static str, a: &'a [&'a [T]], b: &'a [&'a [T]], cols: usize, c: &mut [T]) -> Result<()> {
        let rows = a.len();
        let flat_a = view::flatten_rows(entry, a, cols)?;
        let flat_b = view::flatten_rows(entry, b, cols)?;
        unite::<T, O>(entry, flat_a, flat_b, c, rows, cols)
    }

    /// `D[i,j] = F(A[i,j], B[i,j], C[i,j])`, `F` determined by `(policy, O1, O2)`.
    #[allow(clippy::too_many_arguments)]
    pub fn fused_union<T: Scalar + Lanes + family::fused_union::FusedUnionFma, O1: SimdOp<T>, O2: SimdOp<T>>(
        entry: &'static str,
        a: &[T],
        b: &[T],
        c: &[T],
        d: &mut [T],
        rows: usize,
        cols: usize,
        policy: FusionPolicy,
    ) -> Result<()> {
        let isa = IsaTag::detect();
        let span = tracing::info_span!("fused_union", entry, ?isa, rows, cols, ?policy);
        let _enter = span.enter();
        family::fused_union::matrix::fused_union::<T, O1, O2>(entry, a, b, c, d, rows, cols, policy, isa, default_executor(), PhantomData)
    }

    /// As [`fused_union`], `A`, `B` and `C` given as row pointers.
    #[allow(clippy::too_many_arguments)]
    pub fn fused_union_row_pointer<'a, T: Scalar + Lanes + family::fused_union::FusedUnionFma, O1: SimdOp<T>, O2: SimdOp<T>>(
        entry: &'static str,
        a: &'a [&'a [T]],
        b: &'a [&'a [T]],
        c: &'a [&'a [T]],
        cols: usize,
        d: &mut [T],
        policy: FusionPolicy,
    ) -> Result<()> {
        let rows = a.len();
        let flat_a = view::flatten_rows(entry, a, cols)?;
        let flat_b = view::flatten_rows(entry, b, cols)?;
        let flat_c = view::flatten_rows(entry, c, cols)?;
        fused_union::<T, O1, O2>(entry, flat_a, flat_b, flat_c, d, rows, cols, policy)
    }
}

/// Scalar-operand convenience entry points (one operand replaced by a
/// constant).
pub mod scalar {
    use super::*;

    /// `C[i,j] = O(A[i,j], b)`.
    pub fn unite<T: Scalar + Lanes, O: SimdOp<T>>(entry: &'static str, a: &[T], b: T, c: &mut [T], rows: usize, cols: usize) -> Result<()> {
        let isa = IsaTag::detect();
        let span = tracing::info_span!("unite", entry, ?isa, rows, cols, op = O::NAME);
        let _enter = span.enter();
        family::unite::scalar::unite::<T, O>(entry, a, b, c, rows, cols, isa, default_executor(), PhantomData)
    }

    /// As [`unite`], `A` given as row pointers.
    pub fn unite_row_pointer<'a, T: Scalar + Lanes, O: SimdOp<T>>(entry: &'static str, a: &'a [&'a [T]], b: T, cols: usize, c: &mut [T]) -> Result<()> {
        let rows = a.len();
        let flat_a = view::flatten_rows(entry, a, cols)?;
        unite::<T, O>(entry, flat_a, b, c, rows, cols)
    }

    /// `D[i,j] = F(A[i,j], B[i,j], c)`.
    #[allow(clippy::too_many_arguments)]
    pub fn fused_union_b_matrix<T: Scalar + Lanes + family::fused_union::FusedUnionFma, O1: SimdOp<T>, O2: SimdOp<T>>(
        entry: &'static str,
        a: &[T],
        b: &[T],
        c: T,
        d: &mut [T],
        rows: usize,
        cols: usize,
        policy: FusionPolicy,
    ) -> Result<()> {
        let isa = IsaTag::detect();
        let span = tracing::info_span!("fused_union", entry, ?isa, rows, cols, ?policy);
        let _enter = span.enter();
        family::fused_union::scalar::fused_union_b_matrix::<T, O1, O2>(entry, a, b, c, d, rows, cols, policy, isa, default_executor(), PhantomData)
    }

    /// As [`fused_union_b_matrix`], `A` and `B` given as row pointers.
    #[allow(clippy::too_many_arguments)]
    pub fn fused_union_b_matrix_row_pointer<'a, T: Scalar + Lanes + family::fused_union::FusedUnionFma, O1: SimdOp<T>, O2: SimdOp<T>>(
        entry: &'static str,
        a: &'a [&'a [T]],
        b: &'a [&'a [T]],
        cols: usize,
        c: T,
        d: &mut [T],
        policy: FusionPolicy,
    ) -> Result<()> {
        let rows = a.len();
        let flat_a = view::flatten_rows(entry, a, cols)?;
        let flat_b = view::flatten_rows(entry, b, cols)?;
        fused_union_b_matrix::<T, O1, O2>(entry, flat_a, flat_b, c, d, rows, cols, policy)
    }

    /// `D[i,j] = F(A[i,j], b, C[i,j])`.
    #[allow(clippy::too_many_arguments)]
    pub fn fused_union_c_matrix<T: Scalar + Lanes + family::fused_union::FusedUnionFma, O1: SimdOp<T>, O2: SimdOp<T>>(
        entry: &'static str,
        a: &[T],
        b: T,
        c: &[T],
        d: &mut [T],
        rows: usize,
        cols: usize,
        policy: FusionPolicy,
    ) -> Result<()> {
        let isa = IsaTag::detect();
        let span = tracing::info_span!("fused_union", entry, ?isa, rows, cols, ?policy);
        let _enter = span.enter();
        family::fused_union::scalar::fused_union_c_matrix::<T, O1, O2>(entry, a, b, c, d, rows, cols, policy, isa, default_executor(), PhantomData)
    }

    /// As [`fused_union_c_matrix`], `A` and `C` given as row pointers.
    #[allow(clippy::too_many_arguments)]
    pub fn fused_union_c_matrix_row_pointer<'a, T: Scalar + Lanes + family::fused_union::FusedUnionFma, O1: SimdOp<T>, O2: SimdOp<T>>(
        entry: &'static str,
        a: &'a [&'a [T]],
        b: T,
        c: &'a [&'a [T]],
        cols: usize,
        d: &mut [T],
        policy: FusionPolicy,
    ) -> Result<()> {
        let rows = a.len();
        let flat_a = view::flatten_rows(entry, a, cols)?;
        let flat_c = view::flatten_rows(entry, c, cols)?;
        fused_union_c_matrix::<T, O1, O2>(entry, flat_a, b, flat_c, d, rows, cols, policy)
    }
}
