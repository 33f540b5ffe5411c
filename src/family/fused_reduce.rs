//! `fused_reduce`: `fused_reduce<U, R>(A, B, seed, M, N) -> T`.
//!
//! When `U = mul` and `R = add` the inner tile emits `fmadd(a, b, acc)` per
//! lane — the dot-product pattern — via [`FmaDot::try_fma_dot`], which has a
//! real hardware-FMA override for `f32`/`f64` (the only types whose register
//! family, `vector::lanes::X{N}<T>`, implements
//! [`crate::vector::FusedOps`]) and a `None` default for the complex types,
//! falling back to the general two-step path below.

use super::with_simd;
use crate::blocking::Blocking;
use crate::config::{DEFAULT_CACHE, DEFAULT_FILL};
use crate::error::Result;
use crate::isa::IsaTag;
use crate::kernel::FUSED_REDUCE;
use crate::ops::{Lanes, ReduceOp, Scalar, SimdOp};
use crate::parallel::Executor;
use crate::vector::{FusedOps, Simd};
use crate::view::view;
use num_complex::Complex;
use std::marker::PhantomData;
use std::sync::Mutex;

/// Per-type override point for the `mul`/`add` FMA dot-product fast path.
pub trait FmaDot: Scalar {
    fn try_fma_dot(a: &[Self], b: &[Self], seed: Self, rows: usize, cols: usize, isa: IsaTag, executor: &dyn Executor) -> Option<Result<Self>> {
        let _ = (a, b, seed, rows, cols, isa, executor);
        None
    }
}

impl FmaDot for f32 {
    fn try_fma_dot(a: &[Self], b: &[Self], seed: Self, rows: usize, cols: usize, isa: IsaTag, executor: &dyn Executor) -> Option<Result<Self>> {
        Some(fma_dot::<f32>(a, b, seed, rows, cols, isa, executor))
    }
}
impl FmaDot for f64 {
    fn try_fma_dot(a: &[Self], b: &[Self], seed: Self, rows: usize, cols: usize, isa: IsaTag, executor: &dyn Executor) -> Option<Result<Self>> {
        Some(fma_dot::<f64>(a, b, seed, rows, cols, isa, executor))
    }
}
impl FmaDot for Complex<f32> {}
impl FmaDot for Complex<f64> {}

fn fma_dot<T>(a: &[T], b: &[T], seed: T, rows: usize, cols: usize, isa: IsaTag, executor: &dyn Executor) -> Result<T>
where
    T: Scalar + Lanes + num_traits::Float,
{
    let lanes = T::lanes(isa);
    let blocking = Blocking::derive(FUSED_REDUCE.kernel_rows(), FUSED_REDUCE.kernel_cols(lanes), std::mem::size_of::<T>(), &DEFAULT_CACHE, &DEFAULT_FILL);
    let row_block = blocking.l2_block;
    let col_block = blocking.l3_block;
    let (ab, bb) = (a.as_ptr() as usize, b.as_ptr() as usize);
    let acc = Mutex::new(seed);

    executor.parallel_for(rows, row_block, &|row_start| {
        let row_end = (row_start + row_block).min(rows);
        let (ap, bp) = (ab as *const T, bb as *const T);
        let mut col_start = 0;
        while col_start < cols {
            let col_end = (col_start + col_block).min(cols);
            let partial = with_simd!(lanes, T, V => { fma_dot_rows::<T, V>(ap, bp, cols, row_start, row_end, col_start, col_end) });
            let mut guard = acc.lock().unwrap();
            *guard = *guard + partial;
            drop(guard);
            col_start = col_end;
        }
    })?;
    Ok(acc.into_inner().unwrap())
}

fn fma_dot_rows<T, V>(a: *const T, b: *const T, cols: usize, row_start: usize, row_end: usize, col_start: usize, col_end: usize) -> T
where
    T: Scalar + num_traits::Float,
    V: Simd<T> + FusedOps<T>,
{
    let simd_cols = col_start + ((col_end - col_start) / V::LANES) * V::LANES;
    let mut acc = T::zero();
    for r in row_start..row_end {
        let off = r * cols;
        let mut reg_acc = V::zero();
        let mut j = col_start;
        while j < simd_cols {
            unsafe {
                let va = V::loadu(a.add(off + j));
                let vb = V::loadu(b.add(off + j));
                reg_acc = va.fmadd(vb, reg_acc);
            }
            j += V::LANES;
        }
        acc = acc + reg_acc.horizontal_add();
        while j < col_end {
            acc = acc + unsafe { *a.add(off + j) * *b.add(off + j) };
            j += 1;
        }
    }
    acc
}

/// `fold_R over (i,j) of U(A[i,j], B[i,j])`, seeded with `seed`.
pub fn fused_reduce<T: Scalar + Lanes + FmaDot, U: SimdOp<T>, R: ReduceOp<T> + SimdOp<T>>(
    entry: &'static str,
    a: &[T],
    b: &[T],
    seed: T,
    rows: usize,
    cols: usize,
    isa: IsaTag,
    executor: &dyn Executor,
    _ops: PhantomData<(U, R)>,
) -> Result<T> {
    let _ = view(entry, a, rows, cols)?;
    let _ = view(entry, b, rows, cols)?;

    if U::NAME == "mul" && R::NAME == "add" {
        if let Some(result) = T::try_fma_dot(a, b, seed, rows, cols, isa, executor) {
            return result;
        }
    }

    let lanes = T::lanes(isa);
    let blocking = Blocking::derive(FUSED_REDUCE.kernel_rows(), FUSED_REDUCE.kernel_cols(lanes), std::mem::size_of::<T>(), &DEFAULT_CACHE, &DEFAULT_FILL);
    let row_block = blocking.l2_block;
    let col_block = blocking.l3_block;
    let (ab, bb) = (a.as_ptr() as usize, b.as_ptr() as usize);
    let acc: Mutex<T> = Mutex::new(seed);

    executor.parallel_for(rows, row_block, &|row_start| {
        let row_end = (row_start + row_block).min(rows);
        let (ap, bp) = (ab as *const T, bb as *const T);
        let mut col_start = 0;
        while col_start < cols {
            let col_end = (col_start + col_block).min(cols);
            let partial = with_simd!(lanes, T, V => { union_reduce_rows::<T, V, U, R>(ap, bp, cols, row_start, row_end, col_start, col_end) });
            let mut guard = acc.lock().unwrap();
            *guard = R::apply(*guard, partial);
            drop(guard);
            col_start = col_end;
        }
    })?;

    Ok(acc.into_inner().unwrap())
}

#[allow(clippy::too_many_arguments)]
fn union_reduce_rows<T: Scalar, V: Simd<T>, U: SimdOp<T>, R: ReduceOp<T> + SimdOp<T>>(
    a: *const T,
    b: *const T,
    cols: usize,
    row_start: usize,
    row_end: usize,
    col_start: usize,
    col_end: usize,
) -> T {
    let simd_cols = col_start + ((col_end - col_start) / V::LANES) * V::LANES;
    let mut acc = R::seed();
    for r in row_start..row_end {
        let off = r * cols;
        let mut reg_acc = V::splat(R::seed());
        let mut j = col_start;
        while j < simd_cols {
            unsafe {
                let va = V::loadu(a.add(off + j));
                let vb = V::loadu(b.add(off + j));
                reg_acc = R::apply_vec(reg_acc, U::apply_vec(va, vb));
            }
            j += V::LANES;
        }
        let row_partial = match R::NAME {
            "mul" => reg_acc.horizontal_mul(),
            _ => reg_acc.horizontal_add(),
        };
        acc = R::apply(acc, row_partial);
        while j < col_end {
            acc = R::apply(acc, U::apply(unsafe { *a.add(off + j) }, unsafe { *b.add(off + j) }));
            j += 1;
        }
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{Add, Mul};
    use crate::parallel::SequentialExecutor;

    #[test]
    fn s5_dot_product() {
        let a = [1.0f64, 2.0, 3.0, 4.0];
        let b = [4.0f64, 3.0, 2.0, 1.0];
        let r = fused_reduce::<f64, Mul, Add>("fused_reduce", &a, &b, 0.0, 1, 4, IsaTag::None, &SequentialExecutor, PhantomData).unwrap();
        assert_eq!(r, 20.0);
    }

    #[test]
    fn dot_product_consistency_with_unite_then_reduce() {
        let a: Vec<f32> = (0..20).map(|x| x as f32 * 0.5).collect();
        let b: Vec<f32> = (0..20).map(|x| (20 - x) as f32 * 0.25).collect();
        let via_fused = fused_reduce::<f32, Mul, Add>("fused_reduce", &a, &b, 0.0, 4, 5, IsaTag::None, &SequentialExecutor, PhantomData).unwrap();

        let mut unite_out = vec![0.0f32; 20];
        crate::family::unite::matrix::unite::<f32, Mul>("unite", &a, &b, &mut unite_out, 4, 5, IsaTag::None, &SequentialExecutor, PhantomData).unwrap();
        let via_two_step = crate::family::reduce::reduce::<f32, Add>("reduce", &unite_out, 0.0, 4, 5, IsaTag::None, &SequentialExecutor, PhantomData).unwrap();

        assert!((via_fused - via_two_step).abs() < 1e-3);
    }
}
