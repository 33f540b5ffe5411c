//! `broadcast` / `zeros` / `ones` / `identity`.

use super::with_simd;
use crate::blocking::Blocking;
use crate::config::{DEFAULT_CACHE, DEFAULT_FILL};
use crate::error::Result;
use crate::isa::IsaTag;
use crate::kernel::BROADCAST;
use crate::ops::{Lanes, Scalar};
use crate::parallel::Executor;
use crate::vector::Simd;
use crate::view::{view_mut, MatrixViewMut};

/// `A[i,j] <- value` for all `(i, j)`.
pub fn broadcast<T: Scalar + Lanes>(
    entry: &'static str,
    data: &mut [T],
    rows: usize,
    cols: usize,
    value: T,
    isa: IsaTag,
    executor: &dyn Executor,
) -> Result<()> {
    {
        let _v: MatrixViewMut<T> = view_mut(entry, data, rows, cols)?;
    }
    let lanes = T::lanes(isa);
    let blocking = Blocking::derive(BROADCAST.kernel_rows(), BROADCAST.kernel_cols(lanes), std::mem::size_of::<T>(), &DEFAULT_CACHE, &DEFAULT_FILL);

    let base = data.as_mut_ptr() as usize;
    let row_block = blocking.l2_block;
    let col_block = blocking.l3_block;

    executor.parallel_for(rows, row_block, &|row_start| {
        let row_end = (row_start + row_block).min(rows);
        // SAFETY: `base` points into `data`, whose length is `rows*cols`
        // (checked above); each dispatched `row_start` covers a disjoint
        // `[row_start, row_end)` row range, so no two calls alias.
        let ptr = base as *mut T;
        let mut col_start = 0;
        while col_start < cols {
            let col_end = (col_start + col_block).min(cols);
            with_simd!(lanes, T, V => {
                broadcast_rows::<T, V>(ptr, cols, row_start, row_end, col_start, col_end, value);
            });
            col_start = col_end;
        }
    })
}

fn broadcast_rows<T: Scalar, V: Simd<T>>(ptr: *mut T, cols: usize, row_start: usize, row_end: usize, col_start: usize, col_end: usize, value: T) {
    let reg = V::splat(value);
    let simd_cols = col_start + ((col_end - col_start) / V::LANES) * V::LANES;
    for r in row_start..row_end {
        let row_base = unsafe { ptr.add(r * cols) };
        let mut c = col_start;
        while c < simd_cols {
            unsafe { reg.storeu(row_base.add(c)) };
            c += V::LANES;
        }
        while c < col_end {
            unsafe { *row_base.add(c) = value };
            c += 1;
        }
    }
}

/// `A[i,j] <- 0`.
pub fn zeros<T: Scalar + Lanes>(entry: &'static str, data: &mut [T], rows: usize, cols: usize, isa: IsaTag, executor: &dyn Executor) -> Result<()> {
    broadcast(entry, data, rows, cols, T::zero(), isa, executor)
}

/// `A[i,j] <- 1`.
pub fn ones<T: Scalar + Lanes>(entry: &'static str, data: &mut [T], rows: usize, cols: usize, isa: IsaTag, executor: &dyn Executor) -> Result<()> {
    broadcast(entry, data, rows, cols, T::one(), isa, executor)
}

/// `A <- 0` then `A[i,i] <- 1` for `i < min(rows, cols)`.
pub fn identity<T: Scalar + Lanes>(entry: &'static str, data: &mut [T], rows: usize, cols: usize, isa: IsaTag, executor: &dyn Executor) -> Result<()> {
    zeros(entry, data, rows, cols, isa, executor)?;
    for i in 0..rows.min(cols) {
        data[i * cols + i] = T::one();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parallel::SequentialExecutor;

    #[test]
    fn s1_broadcast_fills_uniformly() {
        let mut data = [0.0f64; 9];
        broadcast("broadcast", &mut data, 3, 3, 7.0, IsaTag::None, &SequentialExecutor).unwrap();
        assert_eq!(data, [7.0; 9]);
    }

    #[test]
    fn identity_sets_diagonal_only() {
        let mut data = [9.0f64; 9];
        identity("identity", &mut data, 3, 3, IsaTag::None, &SequentialExecutor).unwrap();
        assert_eq!(data, [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn fills_uniformly_at_w256_with_odd_width() {
        let mut data = [0.0f32; 13 * 5];
        broadcast("broadcast", &mut data, 13, 5, 2.5, IsaTag::W256, &SequentialExecutor).unwrap();
        assert!(data.iter().all(|&v| v == 2.5));
    }
}
