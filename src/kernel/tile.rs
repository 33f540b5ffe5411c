//! Tile load/store: move a `Rr x Rc` logical register tile between memory
//! and a small array of [`crate::vector::Simd`] registers.
//!
//! Caller guarantees `row + Rr <= rows` and `col + Rc*L <= cols` — partial
//! tiles are the family kernel's edge-fallback responsibility, not this
//! layer's.

use crate::ops::Scalar;
use crate::vector::{is_aligned, Simd};

/// Loads `Rr` registers, one per row starting at `(row, col)`, each holding
/// `V::LANES` contiguous elements of that row.
///
/// # Safety
/// `data` must have at least `rows * stride` elements, and
/// `row + RR <= rows`, `col + V::LANES <= stride` must hold.
#[inline]
pub unsafe fn load_tile_row<T: Scalar, V: Simd<T>, const RR: usize>(
    data: *const T,
    stride: usize,
    row: usize,
    col: usize,
) -> [V; RR] {
    std::array::from_fn(|r| {
        let ptr = unsafe { data.add((row + r) * stride + col) };
        if is_aligned(ptr, std::mem::align_of::<T>() * V::LANES) {
            unsafe { V::loada(ptr) }
        } else {
            unsafe { V::loadu(ptr) }
        }
    })
}

/// Stores `Rr` registers back to the tile at `(row, col)`.
///
/// # Safety
/// As [`load_tile_row`].
#[inline]
pub unsafe fn store_tile_row<T: Scalar, V: Simd<T>, const RR: usize>(
    regs: [V; RR],
    data: *mut T,
    stride: usize,
    row: usize,
    col: usize,
) {
    for (r, v) in regs.into_iter().enumerate() {
        let ptr = unsafe { data.add((row + r) * stride + col) };
        if is_aligned(ptr, std::mem::align_of::<T>() * V::LANES) {
            unsafe { v.storea(ptr) };
        } else {
            unsafe { v.storeu(ptr) };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::lanes::X4;

    #[test]
    fn roundtrip_row_tile() {
        let mut data = [0.0f64; 16];
        for (i, v) in data.iter_mut().enumerate() {
            *v = i as f64;
        }
        let regs: [X4<f64>; 2] = unsafe { load_tile_row(data.as_ptr(), 4, 0, 0) };
        let mut out = [0.0f64; 16];
        unsafe { store_tile_row::<f64, X4<f64>, 2>(regs, out.as_mut_ptr(), 4, 0, 0) };
        assert_eq!(out[0..8], data[0..8]);
    }
}
