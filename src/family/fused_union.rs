//! `fused_union`: ternary element-wise union with a fusion policy.
//!
//! Four of the eight `(policy, O1, O2)` marker combinations collapse to a
//! single hardware FMA and are realized concretely through
//! [`FusedUnionFma::try_fma_matrix`]/`try_fma_b_scalar`/`try_fma_c_scalar`,
//! the same per-type-override pattern `fused_reduce` uses for its dot-product
//! fast path: the trait method itself carries no [`crate::vector::FusedOps`]
//! bound, so every `Scalar` can implement it, and only the `f32`/`f64`
//! overrides call out to a `Float`-bounded free function where that bound is
//! satisfiable. The remaining combinations (anything touching `div`, or
//! `add`/`sub` and `mul` in the wrong slot) have no single-instruction form
//! and fall back to the two-step `combine`/`combine_scalar` below, which is
//! also what every complex-element call uses since complex types have no
//! `FusedOps` register family to dispatch through.
//!
//! Column remainder is computed as `N % tile_cols`, not `M % tile_cols` —
//! the remainder being measured is a column count.

use super::with_simd;
use crate::blocking::Blocking;
use crate::config::{DEFAULT_CACHE, DEFAULT_FILL};
use crate::error::{Error, Result};
use crate::isa::IsaTag;
use crate::kernel::FUSED_UNION;
use crate::ops::{Lanes, Scalar, SimdOp};
use crate::parallel::Executor;
use crate::vector::{FusedOps, Simd};
use crate::view::view;
use num_complex::Complex;
use num_traits::Float;
use std::marker::PhantomData;

/// Which binary op applies first inside `fused_union`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FusionPolicy {
    /// `O2(O1(A, B), C)`
    UnionFirst,
    /// `O1(A, O2(B, C))`
    FusionFirst,
}

#[inline]
fn combine<T: Scalar, V: Simd<T>, O1: SimdOp<T>, O2: SimdOp<T>>(policy: FusionPolicy, a: V, b: V, c: V) -> V {
    match policy {
        FusionPolicy::UnionFirst => O2::apply_vec(O1::apply_vec(a, b), c),
        FusionPolicy::FusionFirst => O1::apply_vec(a, O2::apply_vec(b, c)),
    }
}

#[inline]
fn combine_scalar<T: Scalar, O1: SimdOp<T>, O2: SimdOp<T>>(policy: FusionPolicy, a: T, b: T, c: T) -> T {
    match policy {
        FusionPolicy::UnionFirst => O2::apply(O1::apply(a, b), c),
        FusionPolicy::FusionFirst => O1::apply(a, O2::apply(b, c)),
    }
}

fn blocking_for<T: Scalar + Lanes>(isa: IsaTag) -> (usize, Blocking) {
    let lanes = T::lanes(isa);
    let blocking = Blocking::derive(FUSED_UNION.kernel_rows(), FUSED_UNION.kernel_cols(lanes), std::mem::size_of::<T>(), &DEFAULT_CACHE, &DEFAULT_FILL);
    (lanes, blocking)
}

/// The single FMA instruction a `(policy, O1, O2)` combination realizes.
#[derive(Debug, Clone, Copy)]
pub enum FmaKind {
    /// `UnionFirst`, `O1=mul, O2=add`: `(a*b)+c` = `fmadd(a,b,c)`.
    Fmadd,
    /// `UnionFirst`, `O1=mul, O2=sub`: `(a*b)-c` = `fmsub(a,b,c)`.
    Fmsub,
    /// `FusionFirst`, `O1=add, O2=mul`: `a+(b*c)` = `fmadd(b,c,a)`.
    FmaddSwapped,
    /// `FusionFirst`, `O1=sub, O2=mul`: `a-(b*c)` = `fnmadd(b,c,a)`.
    FnmaddSwapped,
}

/// Classifies a `(policy, O1, O2)` combination; `None` means no single FMA
/// realizes it and the caller must fall back to the two-step path.
fn classify_fma(policy: FusionPolicy, o1_name: &'static str, o2_name: &'static str) -> Option<FmaKind> {
    match (policy, o1_name, o2_name) {
        (FusionPolicy::UnionFirst, "mul", "add") => Some(FmaKind::Fmadd),
        (FusionPolicy::UnionFirst, "mul", "sub") => Some(FmaKind::Fmsub),
        (FusionPolicy::FusionFirst, "add", "mul") => Some(FmaKind::FmaddSwapped),
        (FusionPolicy::FusionFirst, "sub", "mul") => Some(FmaKind::FnmaddSwapped),
        _ => None,
    }
}

#[inline]
fn apply_fma<T: Scalar, V: Simd<T> + FusedOps<T>>(kind: FmaKind, a: V, b: V, c: V) -> V {
    match kind {
        FmaKind::Fmadd => a.fmadd(b, c),
        FmaKind::Fmsub => a.fmsub(b, c),
        FmaKind::FmaddSwapped => b.fmadd(c, a),
        FmaKind::FnmaddSwapped => b.fnmadd(c, a),
    }
}

/// Per-type override point for the FMA fast path: only `f32`/`f64` have a
/// register family implementing [`crate::vector::FusedOps`], so complex
/// element types keep the default `None` and fall back to `combine`.
pub trait FusedUnionFma: Scalar {
    #[allow(clippy::too_many_arguments)]
    fn try_fma_matrix(kind: FmaKind, a: &[Self], b: &[Self], c: &[Self], d: &mut [Self], rows: usize, cols: usize, isa: IsaTag, executor: &dyn Executor) -> Option<Result<()>> {
        let _ = (kind, a, b, c, d, rows, cols, isa, executor);
        None
    }

    #[allow(clippy::too_many_arguments)]
    fn try_fma_b_scalar(kind: FmaKind, a: &[Self], b: &[Self], c: Self, d: &mut [Self], rows: usize, cols: usize, isa: IsaTag, executor: &dyn Executor) -> Option<Result<()>> {
        let _ = (kind, a, b, c, d, rows, cols, isa, executor);
        None
    }

    #[allow(clippy::too_many_arguments)]
    fn try_fma_c_scalar(kind: FmaKind, a: &[Self], b: Self, c: &[Self], d: &mut [Self], rows: usize, cols: usize, isa: IsaTag, executor: &dyn Executor) -> Option<Result<()>> {
        let _ = (kind, a, b, c, d, rows, cols, isa, executor);
        None
    }
}

macro_rules! impl_fused_union_fma {
    ($t:ty) => {
        impl FusedUnionFma for $t {
            fn try_fma_matrix(kind: FmaKind, a: &[Self], b: &[Self], c: &[Self], d: &mut [Self], rows: usize, cols: usize, isa: IsaTag, executor: &dyn Executor) -> Option<Result<()>> {
                Some(fma_matrix::<$t>(kind, a, b, c, d, rows, cols, isa, executor))
            }
            fn try_fma_b_scalar(kind: FmaKind, a: &[Self], b: &[Self], c: Self, d: &mut [Self], rows: usize, cols: usize, isa: IsaTag, executor: &dyn Executor) -> Option<Result<()>> {
                Some(fma_b_scalar::<$t>(kind, a, b, c, d, rows, cols, isa, executor))
            }
            fn try_fma_c_scalar(kind: FmaKind, a: &[Self], b: Self, c: &[Self], d: &mut [Self], rows: usize, cols: usize, isa: IsaTag, executor: &dyn Executor) -> Option<Result<()>> {
                Some(fma_c_scalar::<$t>(kind, a, b, c, d, rows, cols, isa, executor))
            }
        }
    };
}

impl_fused_union_fma!(f32);
impl_fused_union_fma!(f64);
impl FusedUnionFma for Complex<f32> {}
impl FusedUnionFma for Complex<f64> {}

fn fma_matrix<T: Scalar + Lanes + Float>(kind: FmaKind, a: &[T], b: &[T], c: &[T], d: &mut [T], rows: usize, cols: usize, isa: IsaTag, executor: &dyn Executor) -> Result<()> {
    let (lanes, blocking) = blocking_for::<T>(isa);
    let row_block = blocking.l2_block;
    let col_block = blocking.l3_block;
    let (ab, bb, cb, db) = (a.as_ptr() as usize, b.as_ptr() as usize, c.as_ptr() as usize, d.as_mut_ptr() as usize);

    executor.parallel_for(rows, row_block, &|row_start| {
        let row_end = (row_start + row_block).min(rows);
        let (ap, bp, cp, dp) = (ab as *const T, bb as *const T, cb as *const T, db as *mut T);
        let mut col_start = 0;
        while col_start < cols {
            let col_end = (col_start + col_block).min(cols);
            with_simd!(lanes, T, V => {
                fma_matrix_rows::<T, V>(kind, ap, bp, cp, dp, cols, row_start, row_end, col_start, col_end);
            });
            col_start = col_end;
        }
    })
}

#[allow(clippy::too_many_arguments)]
fn fma_matrix_rows<T: Scalar, V: Simd<T> + FusedOps<T>>(kind: FmaKind, a: *const T, b: *const T, c: *const T, d: *mut T, cols: usize, row_start: usize, row_end: usize, col_start: usize, col_end: usize) {
    let simd_cols = col_start + ((col_end - col_start) / V::LANES) * V::LANES;
    for r in row_start..row_end {
        let off = r * cols;
        let mut j = col_start;
        while j < simd_cols {
            unsafe {
                let va = V::loadu(a.add(off + j));
                let vb = V::loadu(b.add(off + j));
                let vc = V::loadu(c.add(off + j));
                apply_fma::<T, V>(kind, va, vb, vc).storeu(d.add(off + j));
            }
            j += V::LANES;
        }
        while j < col_end {
            unsafe { *d.add(off + j) = fma_scalar(kind, *a.add(off + j), *b.add(off + j), *c.add(off + j)) };
            j += 1;
        }
    }
}

fn fma_b_scalar<T: Scalar + Lanes + Float>(kind: FmaKind, a: &[T], b: &[T], c: T, d: &mut [T], rows: usize, cols: usize, isa: IsaTag, executor: &dyn Executor) -> Result<()> {
    let (lanes, blocking) = blocking_for::<T>(isa);
    let row_block = blocking.l2_block;
    let col_block = blocking.l3_block;
    let (ab, bb, db) = (a.as_ptr() as usize, b.as_ptr() as usize, d.as_mut_ptr() as usize);

    executor.parallel_for(rows, row_block, &|row_start| {
        let row_end = (row_start + row_block).min(rows);
        let (ap, bp, dp) = (ab as *const T, bb as *const T, db as *mut T);
        let mut col_start = 0;
        while col_start < cols {
            let col_end = (col_start + col_block).min(cols);
            with_simd!(lanes, T, V => {
                let vc = V::splat(c);
                fma_b_scalar_rows::<T, V>(kind, ap, bp, vc, c, dp, cols, row_start, row_end, col_start, col_end);
            });
            col_start = col_end;
        }
    })
}

#[allow(clippy::too_many_arguments)]
fn fma_b_scalar_rows<T: Scalar, V: Simd<T> + FusedOps<T>>(kind: FmaKind, a: *const T, b: *const T, vc: V, c: T, d: *mut T, cols: usize, row_start: usize, row_end: usize, col_start: usize, col_end: usize) {
    let simd_cols = col_start + ((col_end - col_start) / V::LANES) * V::LANES;
    for r in row_start..row_end {
        let off = r * cols;
        let mut j = col_start;
        while j < simd_cols {
            unsafe {
                let va = V::loadu(a.add(off + j));
                let vb = V::loadu(b.add(off + j));
                apply_fma::<T, V>(kind, va, vb, vc).storeu(d.add(off + j));
            }
            j += V::LANES;
        }
        while j < col_end {
            unsafe { *d.add(off + j) = fma_scalar(kind, *a.add(off + j), *b.add(off + j), c) };
            j += 1;
        }
    }
}

fn fma_c_scalar<T: Scalar + Lanes + Float>(kind: FmaKind, a: &[T], b: T, c: &[T], d: &mut [T], rows: usize, cols: usize, isa: IsaTag, executor: &dyn Executor) -> Result<()> {
    let (lanes, blocking) = blocking_for::<T>(isa);
    let row_block = blocking.l2_block;
    let col_block = blocking.l3_block;
    let (ab, cb, db) = (a.as_ptr() as usize, c.as_ptr() as usize, d.as_mut_ptr() as usize);

    executor.parallel_for(rows, row_block, &|row_start| {
        let row_end = (row_start + row_block).min(rows);
        let (ap, cp, dp) = (ab as *const T, cb as *const T, db as *mut T);
        let mut col_start = 0;
        while col_start < cols {
            let col_end = (col_start + col_block).min(cols);
            with_simd!(lanes, T, V => {
                let vb = V::splat(b);
                fma_c_scalar_rows::<T, V>(kind, ap, vb, b, cp, dp, cols, row_start, row_end, col_start, col_end);
            });
            col_start = col_end;
        }
    })
}

#[allow(clippy::too_many_arguments)]
fn fma_c_scalar_rows<T: Scalar, V: Simd<T> + FusedOps<T>>(kind: FmaKind, a: *const T, vb: V, b: T, c: *const T, d: *mut T, cols: usize, row_start: usize, row_end: usize, col_start: usize, col_end: usize) {
    let simd_cols = col_start + ((col_end - col_start) / V::LANES) * V::LANES;
    for r in row_start..row_end {
        let off = r * cols;
        let mut j = col_start;
        while j < simd_cols {
            unsafe {
                let va = V::loadu(a.add(off + j));
                let vc = V::loadu(c.add(off + j));
                apply_fma::<T, V>(kind, va, vb, vc).storeu(d.add(off + j));
            }
            j += V::LANES;
        }
        while j < col_end {
            unsafe { *d.add(off + j) = fma_scalar(kind, *a.add(off + j), b, *c.add(off + j)) };
            j += 1;
        }
    }
}

#[inline]
fn fma_scalar<T: Float>(kind: FmaKind, a: T, b: T, c: T) -> T {
    match kind {
        FmaKind::Fmadd => a.mul_add(b, c),
        FmaKind::Fmsub => a.mul_add(b, -c),
        FmaKind::FmaddSwapped => b.mul_add(c, a),
        FmaKind::FnmaddSwapped => (-b).mul_add(c, a),
    }
}

/// `D[i,j] = F(A[i,j], B[i,j], C[i,j])`, both `B` and `C` matrices.
pub mod matrix {
    use super::*;

    #[allow(clippy::too_many_arguments)]
    pub fn fused_union<T: Scalar + Lanes + FusedUnionFma, O1: SimdOp<T>, O2: SimdOp<T>>(
        entry: &'static str,
        a: &[T],
        b: &[T],
        c: &[T],
        d: &mut [T],
        rows: usize,
        cols: usize,
        policy: FusionPolicy,
        isa: IsaTag,
        executor: &dyn Executor,
        _ops: PhantomData<(O1, O2)>,
    ) -> Result<()> {
        let _ = view(entry, a, rows, cols)?;
        let _ = view(entry, b, rows, cols)?;
        let _ = view(entry, c, rows, cols)?;
        if d.len() < rows * cols {
            return Err(Error::invalid(entry, "output buffer too small"));
        }

        if let Some(kind) = classify_fma(policy, O1::NAME, O2::NAME) {
            if let Some(result) = T::try_fma_matrix(kind, a, b, c, d, rows, cols, isa, executor) {
                return result;
            }
        }

        let (lanes, blocking) = blocking_for::<T>(isa);
        let row_block = blocking.l2_block;
        let col_block = blocking.l3_block;
        let (ab, bb, cb, db) = (a.as_ptr() as usize, b.as_ptr() as usize, c.as_ptr() as usize, d.as_mut_ptr() as usize);

        executor.parallel_for(rows, row_block, &|row_start| {
            let row_end = (row_start + row_block).min(rows);
            let (ap, bp, cp, dp) = (ab as *const T, bb as *const T, cb as *const T, db as *mut T);
            let mut col_start = 0;
            while col_start < cols {
                let col_end = (col_start + col_block).min(cols);
                with_simd!(lanes, T, V => {
                    fused_union_rows::<T, V, O1, O2>(policy, ap, bp, cp, dp, cols, row_start, row_end, col_start, col_end);
                });
                col_start = col_end;
            }
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn fused_union_rows<T: Scalar, V: Simd<T>, O1: SimdOp<T>, O2: SimdOp<T>>(
        policy: FusionPolicy,
        a: *const T,
        b: *const T,
        c: *const T,
        d: *mut T,
        cols: usize,
        row_start: usize,
        row_end: usize,
        col_start: usize,
        col_end: usize,
    ) {
        let simd_cols = col_start + ((col_end - col_start) / V::LANES) * V::LANES;
        for r in row_start..row_end {
            let off = r * cols;
            let mut j = col_start;
            while j < simd_cols {
                unsafe {
                    let va = V::loadu(a.add(off + j));
                    let vb = V::loadu(b.add(off + j));
                    let vc = V::loadu(c.add(off + j));
                    combine::<T, V, O1, O2>(policy, va, vb, vc).storeu(d.add(off + j));
                }
                j += V::LANES;
            }
            // N % tile_cols, not M % tile_cols.
            while j < col_end {
                unsafe {
                    *d.add(off + j) = combine_scalar::<T, O1, O2>(policy, *a.add(off + j), *b.add(off + j), *c.add(off + j));
                }
                j += 1;
            }
        }
    }
}

/// Scalar-operand forms: one of `B`/`C` is replaced by a constant.
pub mod scalar {
    use super::*;

    /// `D[i,j] = F(A[i,j], B[i,j], c)`.
    #[allow(clippy::too_many_arguments)]
    pub fn fused_union_b_matrix<T: Scalar + Lanes + FusedUnionFma, O1: SimdOp<T>, O2: SimdOp<T>>(
        entry: &'static str,
        a: &[T],
        b: &[T],
        c: T,
        d: &mut [T],
        rows: usize,
        cols: usize,
        policy: FusionPolicy,
        isa: IsaTag,
        executor: &dyn Executor,
        _ops: PhantomData<(O1, O2)>,
    ) -> Result<()> {
        let _ = view(entry, a, rows, cols)?;
        let _ = view(entry, b, rows, cols)?;
        if d.len() < rows * cols {
            return Err(Error::invalid(entry, "output buffer too small"));
        }

        if let Some(kind) = classify_fma(policy, O1::NAME, O2::NAME) {
            if let Some(result) = T::try_fma_b_scalar(kind, a, b, c, d, rows, cols, isa, executor) {
                return result;
            }
        }

        let (lanes, blocking) = blocking_for::<T>(isa);
        let row_block = blocking.l2_block;
        let col_block = blocking.l3_block;
        let (ab, bb, db) = (a.as_ptr() as usize, b.as_ptr() as usize, d.as_mut_ptr() as usize);

        executor.parallel_for(rows, row_block, &|row_start| {
            let row_end = (row_start + row_block).min(rows);
            let (ap, bp, dp) = (ab as *const T, bb as *const T, db as *mut T);
            let mut col_start = 0;
            while col_start < cols {
                let col_end = (col_start + col_block).min(cols);
                with_simd!(lanes, T, V => {
                    let vc = V::splat(c);
                    fused_union_b_rows::<T, V, O1, O2>(policy, ap, bp, vc, c, dp, cols, row_start, row_end, col_start, col_end);
                });
                col_start = col_end;
            }
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn fused_union_b_rows<T: Scalar, V: Simd<T>, O1: SimdOp<T>, O2: SimdOp<T>>(
        policy: FusionPolicy,
        a: *const T,
        b: *const T,
        vc: V,
        c: T,
        d: *mut T,
        cols: usize,
        row_start: usize,
        row_end: usize,
        col_start: usize,
        col_end: usize,
    ) {
        let simd_cols = col_start + ((col_end - col_start) / V::LANES) * V::LANES;
        for r in row_start..row_end {
            let off = r * cols;
            let mut j = col_start;
            while j < simd_cols {
                unsafe {
                    let va = V::loadu(a.add(off + j));
                    let vb = V::loadu(b.add(off + j));
                    combine::<T, V, O1, O2>(policy, va, vb, vc).storeu(d.add(off + j));
                }
                j += V::LANES;
            }
            while j < col_end {
                unsafe { *d.add(off + j) = combine_scalar::<T, O1, O2>(policy, *a.add(off + j), *b.add(off + j), c) };
                j += 1;
            }
        }
    }

    /// `D[i,j] = F(A[i,j], b, C[i,j])`.
    #[allow(clippy::too_many_arguments)]
    pub fn fused_union_c_matrix<T: Scalar + Lanes + FusedUnionFma, O1: SimdOp<T>, O2: SimdOp<T>>(
        entry: &'static str,
        a: &[T],
        b: T,
        c: &[T],
        d: &mut [T],
        rows: usize,
        cols: usize,
        policy: FusionPolicy,
        isa: IsaTag,
        executor: &dyn Executor,
        _ops: PhantomData<(O1, O2)>,
    ) -> Result<()> {
        let _ = view(entry, a, rows, cols)?;
        let _ = view(entry, c, rows, cols)?;
        if d.len() < rows * cols {
            return Err(Error::invalid(entry, "output buffer too small"));
        }

        if let Some(kind) = classify_fma(policy, O1::NAME, O2::NAME) {
            if let Some(result) = T::try_fma_c_scalar(kind, a, b, c, d, rows, cols, isa, executor) {
                return result;
            }
        }

        let (lanes, blocking) = blocking_for::<T>(isa);
        let row_block = blocking.l2_block;
        let col_block = blocking.l3_block;
        let (ab, cb, db) = (a.as_ptr() as usize, c.as_ptr() as usize, d.as_mut_ptr() as usize);

        executor.parallel_for(rows, row_block, &|row_start| {
            let row_end = (row_start + row_block).min(rows);
            let (ap, cp, dp) = (ab as *const T, cb as *const T, db as *mut T);
            let mut col_start = 0;
            while col_start < cols {
                let col_end = (col_start + col_block).min(cols);
                with_simd!(lanes, T, V => {
                    let vb = V::splat(b);
                    fused_union_c_rows::<T, V, O1, O2>(policy, ap, vb, b, cp, dp, cols, row_start, row_end, col_start, col_end);
                });
                col_start = col_end;
            }
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn fused_union_c_rows<T: Scalar, V: Simd<T>, O1: SimdOp<T>, O2: SimdOp<T>>(
        policy: FusionPolicy,
        a: *const T,
        vb: V,
        b: T,
        c: *const T,
        d: *mut T,
        cols: usize,
        row_start: usize,
        row_end: usize,
        col_start: usize,
        col_end: usize,
    ) {
        let simd_cols = col_start + ((col_end - col_start) / V::LANES) * V::LANES;
        for r in row_start..row_end {
            let off = r * cols;
            let mut j = col_start;
            while j < simd_cols {
                unsafe {
                    let va = V::loadu(a.add(off + j));
                    let vc = V::loadu(c.add(off + j));
                    combine::<T, V, O1, O2>(policy, va, vb, vc).storeu(d.add(off + j));
                }
                j += V::LANES;
            }
            while j < col_end {
                unsafe { *d.add(off + j) = combine_scalar::<T, O1, O2>(policy, *a.add(off + j), b, *c.add(off + j)) };
                j += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{Add, Div, Mul, Sub};
    use crate::parallel::SequentialExecutor;

    #[test]
    fn fusion_equivalence_against_two_step() {
        let a = [1.0f64, 2.0, 3.0, 4.0, 5.0];
        let b = [2.0f64, 2.0, 2.0, 2.0, 2.0];
        let c = [1.0f64, 1.0, 1.0, 1.0, 1.0];
        let mut d = [0.0f64; 5];
        matrix::fused_union::<f64, Mul, Add>(
            "fused_union",
            &a,
            &b,
            &c,
            &mut d,
            1,
            5,
            FusionPolicy::UnionFirst,
            IsaTag::None,
            &SequentialExecutor,
            PhantomData,
        )
        .unwrap();
        for i in 0..5 {
            assert!((d[i] - (a[i] * b[i] + c[i])).abs() < 1e-12);
        }
    }

    #[test]
    fn fusion_first_matches_formula() {
        let a = [10.0f64];
        let b = [3.0f64];
        let c = [4.0f64];
        let mut d = [0.0f64];
        matrix::fused_union::<f64, Add, Mul>(
            "fused_union",
            &a,
            &b,
            &c,
            &mut d,
            1,
            1,
            FusionPolicy::FusionFirst,
            IsaTag::None,
            &SequentialExecutor,
            PhantomData,
        )
        .unwrap();
        assert_eq!(d[0], 10.0 + 3.0 * 4.0);
    }

    #[test]
    fn fma_fast_path_matches_two_step_union_first() {
        let a: Vec<f32> = (0..40).map(|x| x as f32 * 0.5 - 3.0).collect();
        let b: Vec<f32> = (0..40).map(|x| (x % 5) as f32 + 1.0).collect();
        let c: Vec<f32> = (0..40).map(|x| (x % 3) as f32 - 1.0).collect();

        let mut via_fma = vec![0.0f32; 40];
        matrix::fused_union::<f32, Mul, Add>("fused_union", &a, &b, &c, &mut via_fma, 5, 8, FusionPolicy::UnionFirst, IsaTag::W256, &SequentialExecutor, PhantomData).unwrap();

        let mut via_naive = vec![0.0f32; 40];
        for i in 0..40 {
            via_naive[i] = a[i] * b[i] + c[i];
        }
        for i in 0..40 {
            assert!((via_fma[i] - via_naive[i]).abs() < 1e-4, "mismatch at {i}");
        }
    }

    #[test]
    fn fma_fast_path_matches_two_step_fusion_first() {
        let a: Vec<f64> = (0..17).map(|x| x as f64 * 0.25).collect();
        let b: Vec<f64> = (0..17).map(|x| (x % 4) as f64 + 1.0).collect();
        let c: Vec<f64> = (0..17).map(|x| (x % 3) as f64 + 2.0).collect();

        let mut via_fma = vec![0.0f64; 17];
        matrix::fused_union::<f64, Sub, Mul>("fused_union", &a, &b, &c, &mut via_fma, 1, 17, FusionPolicy::FusionFirst, IsaTag::W256, &SequentialExecutor, PhantomData).unwrap();

        for i in 0..17 {
            assert!((via_fma[i] - (a[i] - b[i] * c[i])).abs() < 1e-9, "mismatch at {i}");
        }
    }

    #[test]
    fn non_fma_combination_still_falls_back_correctly() {
        let a = [6.0f64, 8.0];
        let b = [2.0f64, 4.0];
        let c = [1.0f64, 1.0];
        let mut d = [0.0f64; 2];
        matrix::fused_union::<f64, Div, Sub>("fused_union", &a, &b, &c, &mut d, 1, 2, FusionPolicy::UnionFirst, IsaTag::None, &SequentialExecutor, PhantomData).unwrap();
        assert_eq!(d, [(6.0 / 2.0) - 1.0, (8.0 / 4.0) - 1.0]);
    }

    #[test]
    fn b_scalar_fma_matches_naive() {
        let a = [1.0f32, 2.0, 3.0, 4.0];
        let bmat = [2.0f32, 2.0, 2.0, 2.0];
        let c = 10.0f32;
        let mut d = [0.0f32; 4];
        scalar::fused_union_b_matrix::<f32, Mul, Add>("fused_union", &a, &bmat, c, &mut d, 1, 4, FusionPolicy::UnionFirst, IsaTag::None, &SequentialExecutor, PhantomData).unwrap();
        assert_eq!(d, [12.0, 14.0, 16.0, 18.0]);
    }

    #[test]
    fn c_scalar_fma_matches_naive() {
        let a = [1.0f64, 2.0, 3.0];
        let b = 3.0f64;
        let c = [1.0f64, 1.0, 1.0];
        let mut d = [0.0f64; 3];
        scalar::fused_union_c_matrix::<f64, Add, Mul>("fused_union", &a, b, &c, &mut d, 1, 3, FusionPolicy::FusionFirst, IsaTag::None, &SequentialExecutor, PhantomData).unwrap();
        assert_eq!(d, [1.0 + 3.0 * 1.0, 2.0 + 3.0 * 1.0, 3.0 + 3.0 * 1.0]);
    }
}
