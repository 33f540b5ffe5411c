//! `transpose`: out-of-place, cache-blocked (tiles sized by
//! [`crate::blocking::Blocking`], same as every other family kernel) so
//! large matrices don't thrash the cache with the stride-`rows` write
//! pattern a naive transpose has.
//!
//! Row-major-to-row-major transpose has no axis that's simultaneously
//! contiguous on both the read and the write side, so there's no single
//! SIMD load that lands directly in transposed position. Instead each
//! `L x L` tile (`L` = lane count) is loaded a row at a time into a small
//! stack scratch buffer, then re-gathered a column at a time and stored —
//! vectorized I/O on both ends, with the lane permutation itself going
//! through that buffer rather than a hardware shuffle.

use super::with_simd;
use crate::blocking::Blocking;
use crate::config::{DEFAULT_CACHE, DEFAULT_FILL};
use crate::error::{Error, Result};
use crate::isa::IsaTag;
use crate::kernel::TRANSPOSE;
use crate::ops::{Lanes, Scalar};
use crate::parallel::Executor;
use crate::vector::Simd;
use crate::view::{view, view_mut};

/// Widest lane count any [`crate::vector::lanes::X16`] register can hold;
/// sizes the tile's stack scratch buffer.
const MAX_LANES: usize = 16;

/// `B[j,i] = A[i,j]`; `A` is `rows x cols`, `B` is `cols x rows`.
pub fn transpose<T: Scalar + Lanes>(entry: &'static str, a: &[T], b: &mut [T], rows: usize, cols: usize, isa: IsaTag, executor: &dyn Executor) -> Result<()> {
    {
        let _ = view(entry, a, rows, cols)?;
        let _ = view_mut(entry, b, cols, rows)?;
    }
    if b.len() < rows * cols {
        return Err(Error::invalid(entry, "output buffer too small"));
    }

    let lanes = T::lanes(isa);
    let blocking = Blocking::derive(TRANSPOSE.kernel_rows(), TRANSPOSE.kernel_cols(lanes), std::mem::size_of::<T>(), &DEFAULT_CACHE, &DEFAULT_FILL);
    let row_block = blocking.l2_block;
    let col_block = blocking.l3_block;

    let a_base = a.as_ptr() as usize;
    let b_base = b.as_mut_ptr() as usize;

    executor.parallel_for(rows, row_block, &|row_start| {
        let row_end = (row_start + row_block).min(rows);
        let a_ptr = a_base as *const T;
        let b_ptr = b_base as *mut T;
        let mut col_start = 0;
        while col_start < cols {
            let col_end = (col_start + col_block).min(cols);
            transpose_band::<T>(a_ptr, b_ptr, cols, rows, row_start, row_end, col_start, col_end, lanes);
            col_start = col_end;
        }
    })
}

/// Picks the concrete lane width for this band, then sweeps it in `L x L`
/// register tiles.
fn transpose_band<T: Scalar>(a: *const T, b: *mut T, a_stride: usize, b_stride: usize, i0: usize, i1: usize, j0: usize, j1: usize, lanes: usize) {
    with_simd!(lanes, T, V => { transpose_band_generic::<T, V>(a, b, a_stride, b_stride, i0, i1, j0, j1) });
}

fn transpose_band_generic<T: Scalar, V: Simd<T>>(a: *const T, b: *mut T, a_stride: usize, b_stride: usize, i0: usize, i1: usize, j0: usize, j1: usize) {
    let l = V::LANES;
    let mut i = i0;
    while i + l <= i1 {
        let mut j = j0;
        while j + l <= j1 {
            unsafe { transpose_tile::<T, V>(a, b, a_stride, b_stride, i, j) };
            j += l;
        }
        if j < j1 {
            scalar_panel(a, b, a_stride, b_stride, i, i + l, j, j1);
        }
        i += l;
    }
    if i < i1 {
        scalar_panel(a, b, a_stride, b_stride, i, i1, j0, j1);
    }
}

/// Transposes one `L x L` tile starting at `A[i,j]` into `B[j,i]`: loads `L`
/// row registers into a scratch buffer, then gathers each output column
/// back out of that buffer and stores it as one register.
///
/// # Safety
/// `a` must have `L` valid contiguous elements at `(i+r)*a_stride + j` for
/// every `r < L`, and `b` must have `L` valid contiguous elements at
/// `(j+g)*b_stride + i` for every `g < L`.
unsafe fn transpose_tile<T: Scalar, V: Simd<T>>(a: *const T, b: *mut T, a_stride: usize, b_stride: usize, i: usize, j: usize) {
    let l = V::LANES;
    debug_assert!(l <= MAX_LANES);

    let mut scratch = [T::zero(); MAX_LANES * MAX_LANES];
    for r in 0..l {
        let row = unsafe { V::loadu(a.add((i + r) * a_stride + j)) };
        unsafe { row.storeu(scratch.as_mut_ptr().add(r * MAX_LANES)) };
    }

    let mut col_buf = [T::zero(); MAX_LANES];
    for g in 0..l {
        for (r, slot) in col_buf.iter_mut().enumerate().take(l) {
            *slot = scratch[r * MAX_LANES + g];
        }
        let out = unsafe { V::loadu(col_buf.as_ptr()) };
        unsafe { out.storeu(b.add((j + g) * b_stride + i)) };
    }
}

/// Plain element-at-a-time fallback for whatever row/column remainder
/// doesn't fill a complete `L x L` tile.
fn scalar_panel<T: Scalar>(a: *const T, b: *mut T, a_stride: usize, b_stride: usize, i0: usize, i1: usize, j0: usize, j1: usize) {
    for i in i0..i1 {
        for j in j0..j1 {
            unsafe {
                let v = *a.add(i * a_stride + j);
                *b.add(j * b_stride + i) = v;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parallel::SequentialExecutor;

    #[test]
    fn s2_transpose_rectangular() {
        let a = [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0];
        let mut b = [0.0f32; 6];
        transpose("transpose", &a, &mut b, 2, 3, IsaTag::None, &SequentialExecutor).unwrap();
        assert_eq!(b, [1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    }

    #[test]
    fn involution() {
        let a: Vec<f64> = (0..20).map(|x| x as f64).collect();
        let mut b = vec![0.0f64; 20];
        transpose("transpose", &a, &mut b, 4, 5, IsaTag::None, &SequentialExecutor).unwrap();
        let mut c = vec![0.0f64; 20];
        transpose("transpose", &b, &mut c, 5, 4, IsaTag::None, &SequentialExecutor).unwrap();
        assert_eq!(a, c);
    }

    #[test]
    fn involution_vectorized_lane_width() {
        // Big enough to exercise a full L x L register tile at W256 (4 f64
        // lanes) plus a ragged remainder on both axes.
        let (rows, cols) = (10, 9);
        let a: Vec<f64> = (0..rows * cols).map(|x| x as f64 * 0.5).collect();
        let mut b = vec![0.0f64; rows * cols];
        transpose("transpose", &a, &mut b, rows, cols, IsaTag::W256, &SequentialExecutor).unwrap();
        let mut c = vec![0.0f64; rows * cols];
        transpose("transpose", &b, &mut c, cols, rows, IsaTag::W256, &SequentialExecutor).unwrap();
        assert_eq!(a, c);
    }
}
