//! Width-agnostic complex multiply/divide, built from four shuffle-style
//! primitives.
//!
//! The four primitives (`conjugate_sign_mask`, `swap_adjacent_pairs`,
//! `duplicate_even`, `duplicate_odd`) are defined once against the
//! interleaved `(re, im)` representation [`num_complex::Complex`] already
//! gives us, and `mul`/`div` are then a fixed formula over those
//! primitives — no per-ISA code needed, since the register itself
//! (`lanes::X{N}<Complex<T>>`) is already width-generic.
//!
//! [`ComplexLanes::complex_mul`]/[`ComplexLanes::complex_div`] are the
//! formulas [`dispatch_mul`]/[`dispatch_div`] route to from
//! `ops::SimdOp<Complex<T>>::apply_vec` for `Mul`/`Div` — the concrete
//! registers every complex kernel instantiation builds are one of
//! `lanes::X{N}<Complex<f32/f64>>`, recognized by [`std::any::Any`]
//! downcast, with `num_complex::Complex`'s own `Mul`/`Div` kept only as the
//! fallback for any register type that isn't one of those.

use super::lanes::{X1, X16, X2, X4, X8};
use super::Simd;
use crate::ops::{RealScalar, Scalar};
use num_complex::Complex;
use num_traits::Float;
use std::any::Any;

/// The four ISA-agnostic shuffle primitives, plus the `mul`/`div` formulas
/// built from them.
pub trait ComplexLanes<T: RealScalar>: Copy {
    /// A register of `(1, -1)` pairs: multiplying by this negates only the
    /// imaginary lane of each complex value.
    fn conjugate_sign_mask() -> Self;
    /// `(re, im) -> (im, re)` per lane.
    fn swap_adjacent_pairs(self) -> Self;
    /// `(re, im) -> (re, re)` per lane.
    fn duplicate_even(self) -> Self;
    /// `(re, im) -> (im, im)` per lane.
    fn duplicate_odd(self) -> Self;

    /// `(ar + ai*i)(br + bi*i) = (ar*br - ai*bi) + (ar*bi + ai*br)*i`.
    fn complex_mul(self, other: Self) -> Self;
    /// Numerator times conjugate of `other`, divided by `|other|^2`.
    fn complex_div(self, other: Self) -> Self;
}

macro_rules! impl_complex_lanes {
    ($name:ident, $n:expr) => {
        impl<T: RealScalar + Float> ComplexLanes<T> for $name<Complex<T>> {
            #[inline]
            fn conjugate_sign_mask() -> Self {
                $name([Complex::new(T::one(), -T::one()); $n])
            }

            #[inline]
            fn swap_adjacent_pairs(self) -> Self {
                let mut out = self.0;
                for i in 0..$n {
                    out[i] = Complex::new(self.0[i].im, self.0[i].re);
                }
                $name(out)
            }

            #[inline]
            fn duplicate_even(self) -> Self {
                let mut out = self.0;
                for i in 0..$n {
                    out[i] = Complex::new(self.0[i].re, self.0[i].re);
                }
                $name(out)
            }

            #[inline]
            fn duplicate_odd(self) -> Self {
                let mut out = self.0;
                for i in 0..$n {
                    out[i] = Complex::new(self.0[i].im, self.0[i].im);
                }
                $name(out)
            }

            #[inline]
            fn complex_mul(self, other: Self) -> Self {
                // t1 = (ar*br, ar*bi); t2 = (ai*bi, ai*br)
                let t1 = self.duplicate_even().raw_mul(other);
                let swapped_b = other.swap_adjacent_pairs();
                let t2 = self.duplicate_odd().raw_mul(swapped_b);
                // result = (t1.re - t2.re, t1.im + t2.im)
                let mut out = t1.0;
                for i in 0..$n {
                    out[i] = Complex::new(t1.0[i].re - t2.0[i].re, t1.0[i].im + t2.0[i].im);
                }
                $name(out)
            }

            #[inline]
            fn complex_div(self, other: Self) -> Self {
                let mut out = self.0;
                for i in 0..$n {
                    let denom = other.0[i].re * other.0[i].re + other.0[i].im * other.0[i].im;
                    let num = self.0[i] * other.0[i].conj();
                    out[i] = Complex::new(num.re / denom, num.im / denom);
                }
                $name(out)
            }
        }

        impl<T: RealScalar> $name<Complex<T>> {
            #[inline]
            fn raw_mul(self, other: Self) -> Self {
                let mut out = self.0;
                for i in 0..$n {
                    out[i] = Complex::new(self.0[i].re * other.0[i].re, self.0[i].im * other.0[i].im);
                }
                $name(out)
            }
        }
    };
}

impl_complex_lanes!(X1, 1);
impl_complex_lanes!(X2, 2);
impl_complex_lanes!(X4, 4);
impl_complex_lanes!(X8, 8);
impl_complex_lanes!(X16, 16);

macro_rules! try_complex_mul {
    ($a:ident, $b:ident, $width:ident, $component:ty) => {
        if let Some(ca) = (&$a as &dyn Any).downcast_ref::<$width<Complex<$component>>>() {
            let cb = (&$b as &dyn Any).downcast_ref::<$width<Complex<$component>>>().expect("a and b share type V");
            let result = ca.complex_mul(*cb);
            return *(&result as &dyn Any).downcast_ref().expect("V round-trips through its own concrete type");
        }
    };
}

macro_rules! try_complex_div {
    ($a:ident, $b:ident, $width:ident, $component:ty) => {
        if let Some(ca) = (&$a as &dyn Any).downcast_ref::<$width<Complex<$component>>>() {
            let cb = (&$b as &dyn Any).downcast_ref::<$width<Complex<$component>>>().expect("a and b share type V");
            let result = ca.complex_div(*cb);
            return *(&result as &dyn Any).downcast_ref().expect("V round-trips through its own concrete type");
        }
    };
}

/// Routes `Mul::apply_vec` to [`ComplexLanes::complex_mul`] when `V` is
/// concretely one of the `lanes::X{N}<Complex<f32>>`/`X{N}<Complex<f64>>`
/// registers every complex dispatch path instantiates; otherwise falls back
/// to `V::mul` (`num_complex::Complex`'s own `Mul`), which is what every
/// non-complex `T` always hits.
#[inline]
pub fn dispatch_mul<T: Scalar, V: Simd<T>>(a: V, b: V) -> V {
    try_complex_mul!(a, b, X1, f32);
    try_complex_mul!(a, b, X2, f32);
    try_complex_mul!(a, b, X4, f32);
    try_complex_mul!(a, b, X8, f32);
    try_complex_mul!(a, b, X16, f32);
    try_complex_mul!(a, b, X1, f64);
    try_complex_mul!(a, b, X2, f64);
    try_complex_mul!(a, b, X4, f64);
    try_complex_mul!(a, b, X8, f64);
    try_complex_mul!(a, b, X16, f64);
    a.mul(b)
}

/// As [`dispatch_mul`], for `Div::apply_vec`/[`ComplexLanes::complex_div`].
#[inline]
pub fn dispatch_div<T: Scalar, V: Simd<T>>(a: V, b: V) -> V {
    try_complex_div!(a, b, X1, f32);
    try_complex_div!(a, b, X2, f32);
    try_complex_div!(a, b, X4, f32);
    try_complex_div!(a, b, X8, f32);
    try_complex_div!(a, b, X16, f32);
    try_complex_div!(a, b, X1, f64);
    try_complex_div!(a, b, X2, f64);
    try_complex_div!(a, b, X4, f64);
    try_complex_div!(a, b, X8, f64);
    try_complex_div!(a, b, X16, f64);
    a.div(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::Simd;

    #[test]
    fn complex_mul_formula_matches_num_complex() {
        let a = X4::<Complex<f64>>::splat(Complex::new(1.0, 2.0));
        let b = X4::<Complex<f64>>::splat(Complex::new(3.0, -1.0));
        let via_formula = a.complex_mul(b);
        let expected = Complex::new(1.0, 2.0) * Complex::new(3.0, -1.0);
        for v in via_formula.0 {
            assert_eq!(v, expected);
        }
    }

    #[test]
    fn complex_div_matches_num_complex() {
        let a = X2::<Complex<f64>>::splat(Complex::new(2.0, 0.0));
        let b = X2::<Complex<f64>>::splat(Complex::new(1.0, 1.0));
        let via_formula = a.complex_div(b);
        let expected = Complex::new(2.0, 0.0) / Complex::new(1.0, 1.0);
        for v in via_formula.0 {
            assert!((v - expected).norm() < 1e-12);
        }
    }

    #[test]
    fn dispatch_mul_routes_through_complex_lanes() {
        let a = X4::<Complex<f64>>::splat(Complex::new(1.0, 2.0));
        let b = X4::<Complex<f64>>::splat(Complex::new(3.0, -1.0));
        let via_dispatch = dispatch_mul::<Complex<f64>, _>(a, b);
        let expected = Complex::new(1.0, 2.0) * Complex::new(3.0, -1.0);
        for v in via_dispatch.0 {
            assert_eq!(v, expected);
        }
    }

    #[test]
    fn dispatch_mul_falls_back_for_real_registers() {
        let a = X4::<f64>::splat(2.0);
        let b = X4::<f64>::splat(3.0);
        assert_eq!(dispatch_mul::<f64, _>(a, b).0, [6.0; 4]);
    }

    #[test]
    fn s3_unite_complex_mul_scenario() {
        // S3: A = [[1+1i]], B = [[1-1i]], O = mul -> C = [[2+0i]]
        let a = Complex::new(1.0f64, 1.0);
        let b = Complex::new(1.0f64, -1.0);
        assert_eq!(a * b, Complex::new(2.0, 0.0));
    }
}
