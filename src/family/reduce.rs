//! `reduce`: `reduce<O>(A, seed, M, N) -> T` for `O in {add, mul}`.
//!
//! `O` is bounded by [`ReduceOp`], sealed to `Add`/`Mul` (see `ops.rs`), so
//! a `sub`/`div` reducer is a compile error rather than the
//! `InvalidArgument` the boundary-validation layer raises for other
//! malformed inputs.

use super::with_simd;
use crate::blocking::Blocking;
use crate::config::{DEFAULT_CACHE, DEFAULT_FILL};
use crate::error::Result;
use crate::isa::IsaTag;
use crate::kernel::REDUCE;
use crate::ops::{Lanes, ReduceOp, Scalar, SimdOp};
use crate::parallel::Executor;
use crate::vector::Simd;
use crate::view::view;
use std::marker::PhantomData;
use std::sync::Mutex;

/// `fold_O over (i,j) of A[i,j]`, seeded with `seed`.
pub fn reduce<T: Scalar + Lanes, O: ReduceOp<T> + SimdOp<T>>(
    entry: &'static str,
    a: &[T],
    seed: T,
    rows: usize,
    cols: usize,
    isa: IsaTag,
    executor: &dyn Executor,
    _op: PhantomData<O>,
) -> Result<T> {
    let _ = view(entry, a, rows, cols)?;

    let lanes = T::lanes(isa);
    let blocking = Blocking::derive(REDUCE.kernel_rows(), REDUCE.kernel_cols(lanes), std::mem::size_of::<T>(), &DEFAULT_CACHE, &DEFAULT_FILL);
    let row_block = blocking.l2_block;
    let col_block = blocking.l3_block;
    let a_base = a.as_ptr() as usize;

    let acc: Mutex<T> = Mutex::new(seed);
    executor.parallel_for(rows, row_block, &|row_start| {
        let row_end = (row_start + row_block).min(rows);
        let ap = a_base as *const T;
        let mut col_start = 0;
        while col_start < cols {
            let col_end = (col_start + col_block).min(cols);
            let partial = with_simd!(lanes, T, V => { reduce_rows::<T, V, O>(ap, cols, row_start, row_end, col_start, col_end) });
            let mut guard = acc.lock().unwrap();
            *guard = O::apply(*guard, partial);
            drop(guard);
            col_start = col_end;
        }
    })?;

    Ok(acc.into_inner().unwrap())
}

fn reduce_rows<T: Scalar, V: Simd<T>, O: ReduceOp<T> + SimdOp<T>>(a: *const T, cols: usize, row_start: usize, row_end: usize, col_start: usize, col_end: usize) -> T {
    let simd_cols = col_start + ((col_end - col_start) / V::LANES) * V::LANES;
    let mut acc = O::seed();
    for r in row_start..row_end {
        let off = r * cols;
        let mut reg_acc = V::splat(O::seed());
        let mut j = col_start;
        while j < simd_cols {
            let v = unsafe { V::loadu(a.add(off + j)) };
            reg_acc = O::apply_vec(reg_acc, v);
            j += V::LANES;
        }
        let row_partial = match O::NAME {
            "mul" => reg_acc.horizontal_mul(),
            _ => reg_acc.horizontal_add(),
        };
        acc = O::apply(acc, row_partial);
        while j < col_end {
            acc = O::apply(acc, unsafe { *a.add(off + j) });
            j += 1;
        }
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::Add;
    use crate::parallel::{RayonExecutor, SequentialExecutor};
    use num_traits::Zero;

    #[test]
    fn s4_reduce_add_of_ones() {
        let a = vec![1.0f32; 32 * 32];
        let r = reduce::<f32, Add>("reduce", &a, f32::zero(), 32, 32, IsaTag::None, &SequentialExecutor, PhantomData).unwrap();
        assert!((r - 1024.0).abs() < 1e-3);
    }

    #[test]
    fn thread_count_invariance_within_tolerance() {
        let a: Vec<f64> = (0..400).map(|i| (i % 7) as f64 * 0.5).collect();
        let single = reduce::<f64, Add>("reduce", &a, 0.0, 20, 20, IsaTag::None, &SequentialExecutor, PhantomData).unwrap();
        let multi = reduce::<f64, Add>("reduce", &a, 0.0, 20, 20, IsaTag::None, &RayonExecutor::new(4).unwrap(), PhantomData).unwrap();
        assert!((single - multi).abs() < 1e-6 * 400.0);
    }
}
