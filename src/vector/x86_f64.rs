//! Native `f64` SIMD registers for x86-64, backing `family::multiply`'s hot
//! path. Broadcast-and-FMA over `_mm256_fmadd_pd`/`_mm512_fmadd_pd`,
//! generalized into [`super::Simd`]/[`super::FusedOps`] impls so the
//! blocked-GEMM loop is written once, generically, and instantiated per
//! width.
//!
//! Every other family kernel (`broadcast`, `transpose`, `unite`, `reduce`,
//! `fused_union`, `fused_reduce`) and every other element type (`f32`,
//! `Complex<f32>`, `Complex<f64>`) use the portable `vector::lanes`
//! registers instead; see `DESIGN.md`.

#![cfg(target_arch = "x86_64")]

use super::{FusedOps, Simd};
use std::arch::x86_64::*;

/// `W128`: one `__m128d`, 2 lanes.
#[derive(Clone, Copy)]
pub struct NativeF64x2(__m128d);

/// `W256`: one `__m256d`, 4 lanes.
#[derive(Clone, Copy)]
pub struct NativeF64x4(__m256d);

/// `W512`: one `__m512d`, 8 lanes.
#[derive(Clone, Copy)]
pub struct NativeF64x8(__m512d);

impl Simd<f64> for NativeF64x2 {
    const LANES: usize = 2;

    #[inline]
    fn splat(x: f64) -> Self {
        unsafe { NativeF64x2(_mm_set1_pd(x)) }
    }
    #[inline]
    fn zero() -> Self {
        unsafe { NativeF64x2(_mm_setzero_pd()) }
    }
    #[inline]
    unsafe fn loadu(ptr: *const f64) -> Self {
        unsafe { NativeF64x2(_mm_loadu_pd(ptr)) }
    }
    #[inline]
    unsafe fn loada(ptr: *const f64) -> Self {
        unsafe { NativeF64x2(_mm_load_pd(ptr)) }
    }
    #[inline]
    unsafe fn storeu(self, ptr: *mut f64) {
        unsafe { _mm_storeu_pd(ptr, self.0) }
    }
    #[inline]
    unsafe fn storea(self, ptr: *mut f64) {
        unsafe { _mm_store_pd(ptr, self.0) }
    }
    #[inline]
    fn add(self, o: Self) -> Self {
        unsafe { NativeF64x2(_mm_add_pd(self.0, o.0)) }
    }
    #[inline]
    fn sub(self, o: Self) -> Self {
        unsafe { NativeF64x2(_mm_sub_pd(self.0, o.0)) }
    }
    #[inline]
    fn mul(self, o: Self) -> Self {
        unsafe { NativeF64x2(_mm_mul_pd(self.0, o.0)) }
    }
    #[inline]
    fn div(self, o: Self) -> Self {
        unsafe { NativeF64x2(_mm_div_pd(self.0, o.0)) }
    }
    #[inline]
    fn horizontal_add(self) -> f64 {
        let mut tmp = [0.0f64; 2];
        unsafe { _mm_storeu_pd(tmp.as_mut_ptr(), self.0) };
        tmp[0] + tmp[1]
    }
    #[inline]
    fn horizontal_mul(self) -> f64 {
        let mut tmp = [0.0f64; 2];
        unsafe { _mm_storeu_pd(tmp.as_mut_ptr(), self.0) };
        tmp[0] * tmp[1]
    }
}

impl FusedOps<f64> for NativeF64x2 {
    #[inline]
    fn fmadd(self, b: Self, c: Self) -> Self {
        unsafe { NativeF64x2(_mm_fmadd_pd(self.0, b.0, c.0)) }
    }
    #[inline]
    fn fmsub(self, b: Self, c: Self) -> Self {
        unsafe { NativeF64x2(_mm_fmsub_pd(self.0, b.0, c.0)) }
    }
    #[inline]
    fn fnmadd(self, b: Self, c: Self) -> Self {
        unsafe { NativeF64x2(_mm_fnmadd_pd(self.0, b.0, c.0)) }
    }
    #[inline]
    fn fnmsub(self, b: Self, c: Self) -> Self {
        unsafe { NativeF64x2(_mm_fnmsub_pd(self.0, b.0, c.0)) }
    }
    #[inline]
    fn fmaddsub(self, b: Self, c: Self) -> Self {
        unsafe { NativeF64x2(_mm_fmaddsub_pd(self.0, b.0, c.0)) }
    }
    #[inline]
    fn fmsubadd(self, b: Self, c: Self) -> Self {
        unsafe { NativeF64x2(_mm_fmsubadd_pd(self.0, b.0, c.0)) }
    }
}

impl Simd<f64> for NativeF64x4 {
    const LANES: usize = 4;

    #[inline]
    fn splat(x: f64) -> Self {
        unsafe { NativeF64x4(_mm256_set1_pd(x)) }
    }
    #[inline]
    fn zero() -> Self {
        unsafe { NativeF64x4(_mm256_setzero_pd()) }
    }
    #[inline]
    unsafe fn loadu(ptr: *const f64) -> Self {
        unsafe { NativeF64x4(_mm256_loadu_pd(ptr)) }
    }
    #[inline]
    unsafe fn loada(ptr: *const f64) -> Self {
        unsafe { NativeF64x4(_mm256_load_pd(ptr)) }
    }
    #[inline]
    unsafe fn storeu(self, ptr: *mut f64) {
        unsafe { _mm256_storeu_pd(ptr, self.0) }
    }
    #[inline]
    unsafe fn storea(self, ptr: *mut f64) {
        unsafe { _mm256_store_pd(ptr, self.0) }
    }
    #[inline]
    fn add(self, o: Self) -> Self {
        unsafe { NativeF64x4(_mm256_add_pd(self.0, o.0)) }
    }
    #[inline]
    fn sub(self, o: Self) -> Self {
        unsafe { NativeF64x4(_mm256_sub_pd(self.0, o.0)) }
    }
    #[inline]
    fn mul(self, o: Self) -> Self {
        unsafe { NativeF64x4(_mm256_mul_pd(self.0, o.0)) }
    }
    #[inline]
    fn div(self, o: Self) -> Self {
        unsafe { NativeF64x4(_mm256_div_pd(self.0, o.0)) }
    }
    #[inline]
    fn horizontal_add(self) -> f64 {
        let mut tmp = [0.0f64; 4];
        unsafe { _mm256_storeu_pd(tmp.as_mut_ptr(), self.0) };
        tmp.iter().sum()
    }
    #[inline]
    fn horizontal_mul(self) -> f64 {
        let mut tmp = [0.0f64; 4];
        unsafe { _mm256_storeu_pd(tmp.as_mut_ptr(), self.0) };
        tmp.iter().product()
    }
}

impl FusedOps<f64> for NativeF64x4 {
    #[inline]
    fn fmadd(self, b: Self, c: Self) -> Self {
        unsafe { NativeF64x4(_mm256_fmadd_pd(self.0, b.0, c.0)) }
    }
    #[inline]
    fn fmsub(self, b: Self, c: Self) -> Self {
        unsafe { NativeF64x4(_mm256_fmsub_pd(self.0, b.0, c.0)) }
    }
    #[inline]
    fn fnmadd(self, b: Self, c: Self) -> Self {
        unsafe { NativeF64x4(_mm256_fnmadd_pd(self.0, b.0, c.0)) }
    }
    #[inline]
    fn fnmsub(self, b: Self, c: Self) -> Self {
        unsafe { NativeF64x4(_mm256_fnmsub_pd(self.0, b.0, c.0)) }
    }
    #[inline]
    fn fmaddsub(self, b: Self, c: Self) -> Self {
        unsafe { NativeF64x4(_mm256_fmaddsub_pd(self.0, b.0, c.0)) }
    }
    #[inline]
    fn fmsubadd(self, b: Self, c: Self) -> Self {
        unsafe { NativeF64x4(_mm256_fmsubadd_pd(self.0, b.0, c.0)) }
    }
}

impl Simd<f64> for NativeF64x8 {
    const LANES: usize = 8;

    #[inline]
    fn splat(x: f64) -> Self {
        unsafe { NativeF64x8(_mm512_set1_pd(x)) }
    }
    #[inline]
    fn zero() -> Self {
        unsafe { NativeF64x8(_mm512_setzero_pd()) }
    }
    #[inline]
    unsafe fn loadu(ptr: *const f64) -> Self {
        unsafe { NativeF64x8(_mm512_loadu_pd(ptr)) }
    }
    #[inline]
    unsafe fn loada(ptr: *const f64) -> Self {
        unsafe { NativeF64x8(_mm512_load_pd(ptr)) }
    }
    #[inline]
    unsafe fn storeu(self, ptr: *mut f64) {
        unsafe { _mm512_storeu_pd(ptr, self.0) }
    }
    #[inline]
    unsafe fn storea(self, ptr: *mut f64) {
        unsafe { _mm512_store_pd(ptr, self.0) }
    }
    #[inline]
    fn add(self, o: Self) -> Self {
        unsafe { NativeF64x8(_mm512_add_pd(self.0, o.0)) }
    }
    #[inline]
    fn sub(self, o: Self) -> Self {
        unsafe { NativeF64x8(_mm512_sub_pd(self.0, o.0)) }
    }
    #[inline]
    fn mul(self, o: Self) -> Self {
        unsafe { NativeF64x8(_mm512_mul_pd(self.0, o.0)) }
    }
    #[inline]
    fn div(self, o: Self) -> Self {
        unsafe { NativeF64x8(_mm512_div_pd(self.0, o.0)) }
    }
    #[inline]
    fn horizontal_add(self) -> f64 {
        unsafe { _mm512_reduce_add_pd(self.0) }
    }
    #[inline]
    fn horizontal_mul(self) -> f64 {
        unsafe { _mm512_reduce_mul_pd(self.0) }
    }
}

impl FusedOps<f64> for NativeF64x8 {
    #[inline]
    fn fmadd(self, b: Self, c: Self) -> Self {
        unsafe { NativeF64x8(_mm512_fmadd_pd(self.0, b.0, c.0)) }
    }
    #[inline]
    fn fmsub(self, b: Self, c: Self) -> Self {
        unsafe { NativeF64x8(_mm512_fmsub_pd(self.0, b.0, c.0)) }
    }
    #[inline]
    fn fnmadd(self, b: Self, c: Self) -> Self {
        unsafe { NativeF64x8(_mm512_fnmadd_pd(self.0, b.0, c.0)) }
    }
    #[inline]
    fn fnmsub(self, b: Self, c: Self) -> Self {
        unsafe { NativeF64x8(_mm512_fnmsub_pd(self.0, b.0, c.0)) }
    }
    #[inline]
    fn fmaddsub(self, b: Self, c: Self) -> Self {
        unsafe { NativeF64x8(_mm512_fmaddsub_pd(self.0, b.0, c.0)) }
    }
    #[inline]
    fn fmsubadd(self, b: Self, c: Self) -> Self {
        unsafe { NativeF64x8(_mm512_fmsubadd_pd(self.0, b.0, c.0)) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn avx2_fmadd_matches_scalar() {
        if !is_x86_feature_detected!("avx2") || !is_x86_feature_detected!("fma") {
            return;
        }
        let a = NativeF64x4::splat(2.0);
        let b = NativeF64x4::splat(3.0);
        let c = NativeF64x4::splat(1.0);
        assert_eq!(a.fmadd(b, c).horizontal_add(), 4.0 * 7.0);
    }

    #[test]
    fn avx512_reduce_add() {
        if !is_x86_feature_detected!("avx512f") {
            return;
        }
        let v = NativeF64x8::splat(1.5);
        assert!((v.horizontal_add() - 12.0).abs() < 1e-12);
    }
}
