//! `unite` element-wise binary, matrix and scalar operand forms.

use super::with_simd;
use crate::blocking::Blocking;
use crate::config::{DEFAULT_CACHE, DEFAULT_FILL};
use crate::error::{Error, Result};
use crate::kernel::UNITE;
use crate::ops::{Lanes, Scalar, SimdOp};
use crate::parallel::Executor;
use crate::vector::Simd;
use crate::view::view;
use std::marker::PhantomData;

fn blocking_for<T: Scalar + Lanes>(isa: crate::isa::IsaTag) -> (usize, Blocking) {
    let lanes = T::lanes(isa);
    let blocking = Blocking::derive(UNITE.kernel_rows(), UNITE.kernel_cols(lanes), std::mem::size_of::<T>(), &DEFAULT_CACHE, &DEFAULT_FILL);
    (lanes, blocking)
}

/// Matrix form: `C[i,j] = O(A[i,j], B[i,j])`.
pub mod matrix {
    use super::*;

    pub fn unite<T: Scalar + Lanes, O: SimdOp<T>>(
        entry: &'static str,
        a: &[T],
        b: &[T],
        c: &mut [T],
        rows: usize,
        cols: usize,
        isa: crate::isa::IsaTag,
        executor: &dyn Executor,
        _op: PhantomData<O>,
    ) -> Result<()> {
        let _ = view(entry, a, rows, cols)?;
        let _ = view(entry, b, rows, cols)?;
        if c.len() < rows * cols {
            return Err(Error::invalid(entry, "output buffer too small"));
        }

        let (lanes, blocking) = blocking_for::<T>(isa);
        let row_block = blocking.l2_block;
        let col_block = blocking.l3_block;
        let a_base = a.as_ptr() as usize;
        let b_base = b.as_ptr() as usize;
        let c_base = c.as_mut_ptr() as usize;

        executor.parallel_for(rows, row_block, &|row_start| {
            let row_end = (row_start + row_block).min(rows);
            let (ap, bp, cp) = (a_base as *const T, b_base as *const T, c_base as *mut T);
            let mut col_start = 0;
            while col_start < cols {
                let col_end = (col_start + col_block).min(cols);
                with_simd!(lanes, T, V => {
                    unite_rows::<T, V, O>(ap, bp, cp, cols, row_start, row_end, col_start, col_end);
                });
                col_start = col_end;
            }
        })
    }

    fn unite_rows<T: Scalar, V: Simd<T>, O: SimdOp<T>>(a: *const T, b: *const T, c: *mut T, cols: usize, row_start: usize, row_end: usize, col_start: usize, col_end: usize) {
        let simd_cols = col_start + ((col_end - col_start) / V::LANES) * V::LANES;
        for r in row_start..row_end {
            let off = r * cols;
            let mut j = col_start;
            while j < simd_cols {
                unsafe {
                    let va = V::loadu(a.add(off + j));
                    let vb = V::loadu(b.add(off + j));
                    O::apply_vec(va, vb).storeu(c.add(off + j));
                }
                j += V::LANES;
            }
            while j < col_end {
                unsafe { *c.add(off + j) = O::apply(*a.add(off + j), *b.add(off + j)) };
                j += 1;
            }
        }
    }
}

/// Scalar form: `C[i,j] = O(A[i,j], b)`.
pub mod scalar {
    use super::*;

    pub fn unite<T: Scalar + Lanes, O: SimdOp<T>>(
        entry: &'static str,
        a: &[T],
        b: T,
        c: &mut [T],
        rows: usize,
        cols: usize,
        isa: crate::isa::IsaTag,
        executor: &dyn Executor,
        _op: PhantomData<O>,
    ) -> Result<()> {
        let _ = view(entry, a, rows, cols)?;
        if c.len() < rows * cols {
            return Err(Error::invalid(entry, "output buffer too small"));
        }

        let (lanes, blocking) = blocking_for::<T>(isa);
        let row_block = blocking.l2_block;
        let col_block = blocking.l3_block;
        let a_base = a.as_ptr() as usize;
        let c_base = c.as_mut_ptr() as usize;

        executor.parallel_for(rows, row_block, &|row_start| {
            let row_end = (row_start + row_block).min(rows);
            let (ap, cp) = (a_base as *const T, c_base as *mut T);
            let mut col_start = 0;
            while col_start < cols {
                let col_end = (col_start + col_block).min(cols);
                with_simd!(lanes, T, V => {
                    unite_rows::<T, V, O>(ap, b, cp, cols, row_start, row_end, col_start, col_end);
                });
                col_start = col_end;
            }
        })
    }

    fn unite_rows<T: Scalar, V: Simd<T>, O: SimdOp<T>>(a: *const T, b: T, c: *mut T, cols: usize, row_start: usize, row_end: usize, col_start: usize, col_end: usize) {
        let vb = V::splat(b);
        let simd_cols = col_start + ((col_end - col_start) / V::LANES) * V::LANES;
        for r in row_start..row_end {
            let off = r * cols;
            let mut j = col_start;
            while j < simd_cols {
                unsafe {
                    let va = V::loadu(a.add(off + j));
                    O::apply_vec(va, vb).storeu(c.add(off + j));
                }
                j += V::LANES;
            }
            while j < col_end {
                unsafe { *c.add(off + j) = O::apply(*a.add(off + j), b) };
                j += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{Add, Mul};
    use crate::parallel::SequentialExecutor;
    use num_complex::Complex;

    #[test]
    fn matrix_add_matches_naive() {
        let a = [1.0f64, 2.0, 3.0, 4.0];
        let b = [10.0f64, 20.0, 30.0, 40.0];
        let mut c = [0.0f64; 4];
        matrix::unite::<f64, Add>("unite", &a, &b, &mut c, 2, 2, crate::isa::IsaTag::None, &SequentialExecutor, PhantomData).unwrap();
        assert_eq!(c, [11.0, 22.0, 33.0, 44.0]);
    }

    #[test]
    fn s3_complex_mul() {
        let a = [Complex::new(1.0f64, 1.0)];
        let b = [Complex::new(1.0f64, -1.0)];
        let mut c = [Complex::new(0.0f64, 0.0)];
        matrix::unite::<Complex<f64>, Mul>("unite", &a, &b, &mut c, 1, 1, crate::isa::IsaTag::None, &SequentialExecutor, PhantomData).unwrap();
        assert_eq!(c[0], Complex::new(2.0, 0.0));
    }

    #[test]
    fn scalar_form_matches_naive() {
        let a = [1.0f32, 2.0, 3.0, 4.0];
        let mut c = [0.0f32; 4];
        scalar::unite::<f32, Mul>("unite", &a, 2.0, &mut c, 1, 4, crate::isa::IsaTag::W256, &SequentialExecutor, PhantomData).unwrap();
        assert_eq!(c, [2.0, 4.0, 6.0, 8.0]);
    }
}
