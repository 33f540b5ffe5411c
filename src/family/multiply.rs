//! `multiply`: `C[i,j] += sum_k A[i,k]*B[k,j]`. `C` is not zeroed by this
//! kernel — callers zero it first, typically via `broadcast(C, 0)`.
//!
//! Register-tile outer-product algorithm: for each `k`, `A`'s column `k`
//! broadcasts one scalar per tile row while `B`'s row `k` loads `Rc`
//! registers directly (row-major `B`'s row `k` is already contiguous, so
//! neither operand needs a transpose pass). The `Rr x Rc` accumulator is
//! read from and written back to `C` via [`crate::kernel::tile::load_tile_row`]/
//! [`crate::kernel::tile::store_tile_row`], same as every other family
//! kernel's tile I/O. Blocked at `B2` (rows) and `B3` (columns), same as
//! `transpose`.
//!
//! `f64` additionally gets a genuine `core::arch::x86_64` intrinsic fast
//! path (`vector::x86_f64`) that folds the outer product's broadcast-load-
//! mul-add into one hardware FMA per register, selected via a `TypeId`
//! check — the same technique real generic-numeric Rust crates use to give
//! one concrete type a hardware-specific kernel inside an otherwise fully
//! generic function. Every other element type uses the portable
//! `vector::lanes` path and a plain multiply-then-add.

use super::with_simd;
use crate::blocking::Blocking;
use crate::config::{DEFAULT_CACHE, DEFAULT_FILL};
use crate::error::{Error, Result};
use crate::isa::IsaTag;
use crate::kernel::tile::{load_tile_row, store_tile_row};
use crate::kernel::MULTIPLY;
use crate::ops::{Lanes, Scalar};
use crate::parallel::Executor;
use crate::vector::{x86_f64, FusedOps, Simd};
use crate::view::view;
use std::any::TypeId;
use std::ops::{Add, Mul};

const RR: usize = MULTIPLY.row_registers;
const RC: usize = MULTIPLY.col_registers;

/// `C[i,j] += sum_k A[i,k]*B[k,j]`, `A` is `m x n`, `B` is `n x p`, `C` is `m x p`.
pub fn multiply<T>(entry: &'static str, a: &[T], b: &[T], c: &mut [T], m: usize, n: usize, p: usize, isa: IsaTag, executor: &dyn Executor) -> Result<()>
where
    T: Scalar + Lanes + Add<Output = T> + Mul<Output = T>,
{
    let _ = view(entry, a, m, n)?;
    let _ = view(entry, b, n, p)?;
    if c.len() < m * p {
        return Err(Error::invalid(entry, "output buffer too small"));
    }

    let lanes = T::lanes(isa);
    let blocking = Blocking::derive(MULTIPLY.kernel_rows(), MULTIPLY.kernel_cols(lanes), std::mem::size_of::<T>(), &DEFAULT_CACHE, &DEFAULT_FILL);
    let row_block = blocking.l2_block;
    let col_block = blocking.l3_block;

    let a_base = a.as_ptr() as usize;
    let b_base = b.as_ptr() as usize;
    let c_base = c.as_mut_ptr() as usize;

    executor.parallel_for(m, row_block, &|row_start| {
        let row_end = (row_start + row_block).min(m);
        let ap = a_base as *const T;
        let bp = b_base as *const T;
        let cp = c_base as *mut T;
        let mut col_start = 0;
        while col_start < p {
            let col_end = (col_start + col_block).min(p);
            multiply_band::<T>(ap, bp, cp, n, p, row_start, row_end, col_start, col_end, isa);
            col_start = col_end;
        }
    })
}

/// Dispatches one row/column band to the `f64` intrinsic path when `T = f64`,
/// otherwise the portable `vector::lanes` path.
fn multiply_band<T>(a: *const T, b: *const T, c: *mut T, n: usize, p: usize, i0: usize, i1: usize, j0: usize, j1: usize, isa: IsaTag)
where
    T: Scalar + Lanes + Add<Output = T> + Mul<Output = T>,
{
    if TypeId::of::<T>() == TypeId::of::<f64>() {
        // SAFETY: TypeId equality for 'static T means T and f64 are the same
        // type, so reinterpreting the pointers is a no-op bitwise-identical
        // reborrow, not a real layout change.
        let a64 = a as *const f64;
        let b64 = b as *const f64;
        let c64 = c as *mut f64;
        multiply_band_f64(a64, b64, c64, n, p, i0, i1, j0, j1, isa);
        return;
    }
    let lanes = T::lanes(isa);
    with_simd!(lanes, T, V => { multiply_band_generic::<T, V>(a, b, c, n, p, i0, i1, j0, j1) });
}

/// Sweeps a row/column band in `Rr x (Rc*L)` register tiles, falling back to
/// [`scalar_panel`] for whatever ragged row/column remainder doesn't fill a
/// complete tile.
fn multiply_band_generic<T, V>(a: *const T, b: *const T, c: *mut T, n: usize, p: usize, i0: usize, i1: usize, j0: usize, j1: usize)
where
    T: Scalar + Add<Output = T> + Mul<Output = T>,
    V: Simd<T>,
{
    let tile_cols = RC * V::LANES;
    let mut i = i0;
    while i + RR <= i1 {
        let mut j = j0;
        while j + tile_cols <= j1 {
            multiply_register_tile::<T, V>(a, b, c, n, p, i, j);
            j += tile_cols;
        }
        if j < j1 {
            scalar_panel(a, b, c, n, p, i, i + RR, j, j1);
        }
        i += RR;
    }
    if i < i1 {
        scalar_panel(a, b, c, n, p, i, i1, j0, j1);
    }
}

/// Accumulates one `Rr x Rc` register tile of `C` via the outer-product
/// formula `acc[r][g] += splat(A[i+r,k]) * B_row_k[g]`, then adds the result
/// onto the existing `C` tile (read-modify-write, since `multiply`
/// accumulates rather than overwrites).
fn multiply_register_tile<T, V>(a: *const T, b: *const T, c: *mut T, n: usize, p: usize, i: usize, j: usize)
where
    T: Scalar,
    V: Simd<T>,
{
    let mut acc = [[V::zero(); RC]; RR];
    for k in 0..n {
        let a_bcast: [V; RR] = std::array::from_fn(|r| V::splat(unsafe { *a.add((i + r) * n + k) }));
        let b_regs: [V; RC] = std::array::from_fn(|g| unsafe { V::loadu(b.add(k * p + j + g * V::LANES)) });
        for r in 0..RR {
            for g in 0..RC {
                acc[r][g] = acc[r][g].add(a_bcast[r].mul(b_regs[g]));
            }
        }
    }
    accumulate_tile::<T, V>(acc, c, p, i, j);
}

/// As [`multiply_register_tile`], but folds the broadcast-multiply-add into
/// one hardware FMA per register via [`FusedOps::fmadd`].
#[cfg_attr(not(target_arch = "x86_64"), allow(dead_code))]
fn multiply_register_tile_fma<V>(a: *const f64, b: *const f64, c: *mut f64, n: usize, p: usize, i: usize, j: usize)
where
    V: Simd<f64> + FusedOps<f64>,
{
    let mut acc = [[V::zero(); RC]; RR];
    for k in 0..n {
        let a_bcast: [V; RR] = std::array::from_fn(|r| V::splat(unsafe { *a.add((i + r) * n + k) }));
        let b_regs: [V; RC] = std::array::from_fn(|g| unsafe { V::loadu(b.add(k * p + j + g * V::LANES)) });
        for r in 0..RR {
            for g in 0..RC {
                acc[r][g] = a_bcast[r].fmadd(b_regs[g], acc[r][g]);
            }
        }
    }
    accumulate_tile::<f64, V>(acc, c, p, i, j);
}

/// Reads the existing `Rr x Rc` tile of `C`, adds `acc`, and stores it back.
fn accumulate_tile<T: Scalar, V: Simd<T>>(acc: [[V; RC]; RR], c: *mut T, p: usize, i: usize, j: usize) {
    for g in 0..RC {
        let col = j + g * V::LANES;
        let existing: [V; RR] = unsafe { load_tile_row::<T, V, RR>(c, p, i, col) };
        let updated: [V; RR] = std::array::from_fn(|r| existing[r].add(acc[r][g]));
        unsafe { store_tile_row::<T, V, RR>(updated, c, p, i, col) };
    }
}

/// Plain `i-k-j` triple loop over whatever row/column remainder doesn't fill
/// a complete register tile.
fn scalar_panel<T>(a: *const T, b: *const T, c: *mut T, n: usize, p: usize, i0: usize, i1: usize, j0: usize, j1: usize)
where
    T: Scalar + Add<Output = T> + Mul<Output = T>,
{
    for i in i0..i1 {
        for k in 0..n {
            let aik = unsafe { *a.add(i * n + k) };
            for j in j0..j1 {
                unsafe {
                    let slot = c.add(i * p + j);
                    *slot = *slot + aik * *b.add(k * p + j);
                }
            }
        }
    }
}

#[cfg(target_arch = "x86_64")]
fn multiply_band_f64(a: *const f64, b: *const f64, c: *mut f64, n: usize, p: usize, i0: usize, i1: usize, j0: usize, j1: usize, isa: IsaTag) {
    match isa {
        IsaTag::W512 if is_x86_feature_detected!("avx512f") && is_x86_feature_detected!("avx512dq") => {
            multiply_band_fma::<x86_f64::NativeF64x8>(a, b, c, n, p, i0, i1, j0, j1)
        }
        IsaTag::W512 | IsaTag::W256 if is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma") => {
            multiply_band_fma::<x86_f64::NativeF64x4>(a, b, c, n, p, i0, i1, j0, j1)
        }
        IsaTag::W512 | IsaTag::W256 | IsaTag::W128 if is_x86_feature_detected!("sse2") => multiply_band_fma::<x86_f64::NativeF64x2>(a, b, c, n, p, i0, i1, j0, j1),
        _ => multiply_band_generic::<f64, crate::vector::lanes::X1<f64>>(a, b, c, n, p, i0, i1, j0, j1),
    }
}

#[cfg(not(target_arch = "x86_64"))]
fn multiply_band_f64(a: *const f64, b: *const f64, c: *mut f64, n: usize, p: usize, i0: usize, i1: usize, j0: usize, j1: usize, _isa: IsaTag) {
    multiply_band_generic::<f64, crate::vector::lanes::X1<f64>>(a, b, c, n, p, i0, i1, j0, j1)
}

#[cfg(target_arch = "x86_64")]
fn multiply_band_fma<V: Simd<f64> + FusedOps<f64>>(a: *const f64, b: *const f64, c: *mut f64, n: usize, p: usize, i0: usize, i1: usize, j0: usize, j1: usize) {
    let tile_cols = RC * V::LANES;
    let mut i = i0;
    while i + RR <= i1 {
        let mut j = j0;
        while j + tile_cols <= j1 {
            multiply_register_tile_fma::<V>(a, b, c, n, p, i, j);
            j += tile_cols;
        }
        if j < j1 {
            scalar_panel(a, b, c, n, p, i, i + RR, j, j1);
        }
        i += RR;
    }
    if i < i1 {
        scalar_panel(a, b, c, n, p, i, i1, j0, j1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::family::broadcast::{identity, zeros};
    use crate::parallel::SequentialExecutor;

    #[test]
    fn s6_multiply_2x2() {
        let a = [1.0f64, 2.0, 3.0, 4.0];
        let b = [5.0f64, 6.0, 7.0, 8.0];
        let mut c = [0.0f64; 4];
        multiply("multiply", &a, &b, &mut c, 2, 2, 2, IsaTag::None, &SequentialExecutor).unwrap();
        assert_eq!(c, [19.0, 22.0, 43.0, 50.0]);
    }

    #[test]
    fn identity_multiply_preserves_a() {
        let a = [1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0];
        let mut ident = [0.0f64; 9];
        identity("identity", &mut ident, 3, 3, IsaTag::None, &SequentialExecutor).unwrap();
        let mut c = [0.0f64; 6];
        zeros("zeros", &mut c, 2, 3, IsaTag::None, &SequentialExecutor).unwrap();
        multiply("multiply", &a, &ident, &mut c, 2, 3, 3, IsaTag::None, &SequentialExecutor).unwrap();
        assert_eq!(c, a);
    }

    #[test]
    fn accumulates_rather_than_overwrites() {
        let a = [1.0f64, 0.0, 0.0, 1.0];
        let b = [1.0f64, 0.0, 0.0, 1.0];
        let mut c = [1.0f64, 1.0, 1.0, 1.0];
        multiply("multiply", &a, &b, &mut c, 2, 2, 2, IsaTag::None, &SequentialExecutor).unwrap();
        assert_eq!(c, [2.0, 1.0, 1.0, 2.0]);
    }

    #[test]
    fn w256_fast_path_matches_none() {
        let a: Vec<f64> = (0..16).map(|x| x as f64).collect();
        let b: Vec<f64> = (0..16).map(|x| (16 - x) as f64 * 0.5).collect();
        let mut c1 = vec![0.0f64; 16];
        let mut c2 = vec![0.0f64; 16];
        multiply("multiply", &a, &b, &mut c1, 4, 4, 4, IsaTag::None, &SequentialExecutor).unwrap();
        multiply("multiply", &a, &b, &mut c2, 4, 4, 4, IsaTag::W256, &SequentialExecutor).unwrap();
        for (x, y) in c1.iter().zip(c2.iter()) {
            assert!((x - y).abs() < 1e-9);
        }
    }

    #[test]
    fn ragged_dimensions_not_aligned_to_tile_shape() {
        // m, n, p chosen so none divides evenly into Rr=4 rows or Rc*L columns,
        // exercising scalar_panel on every edge of the tile sweep.
        let (m, n, p) = (9, 7, 11);
        let a: Vec<f64> = (0..m * n).map(|i| (i % 5) as f64 - 2.0).collect();
        let b: Vec<f64> = (0..n * p).map(|i| (i % 7) as f64 - 3.0).collect();

        let mut naive = vec![0.0f64; m * p];
        for i in 0..m {
            for k in 0..n {
                let aik = a[i * n + k];
                for j in 0..p {
                    naive[i * p + j] += aik * b[k * p + j];
                }
            }
        }

        let mut fast = vec![0.0f64; m * p];
        multiply("multiply", &a, &b, &mut fast, m, n, p, IsaTag::W256, &SequentialExecutor).unwrap();

        for i in 0..naive.len() {
            assert!((naive[i] - fast[i]).abs() < 1e-9, "mismatch at {i}");
        }
    }
}
