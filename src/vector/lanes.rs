//! Generic array-backed vector registers, usable for any element type.
//!
//! `X{N}<T>` wraps `[T; N]` and implements [`super::Simd`] with ordinary
//! iteration. This is the portable fallback for `NONE` (`X1`, lane count 1,
//! degenerating every op to scalar) and for every `(T, ISA)` pair that
//! doesn't have a hand-written intrinsic register, which in this crate is
//! everything except `f64` (see `vector::x86_f64`, used only by
//! `family::multiply`).

use super::{FusedOps, Simd};
use crate::ops::Scalar;
use num_traits::Float;
use std::ops::{Add, Div, Mul, Sub};

macro_rules! define_lanes {
    ($name:ident, $n:expr) => {
        #[derive(Debug, Clone, Copy)]
        pub struct $name<T>(pub [T; $n]);

        impl<T> Simd<T> for $name<T>
        where
            T: Scalar + Add<Output = T> + Sub<Output = T> + Mul<Output = T> + Div<Output = T>,
        {
            const LANES: usize = $n;

            #[inline]
            fn splat(x: T) -> Self {
                $name([x; $n])
            }

            #[inline]
            fn zero() -> Self {
                $name([T::zero(); $n])
            }

            #[inline]
            unsafe fn loadu(ptr: *const T) -> Self {
                let mut out = [T::zero(); $n];
                for i in 0..$n {
                    out[i] = unsafe { ptr.add(i).read_unaligned() };
                }
                $name(out)
            }

            #[inline]
            unsafe fn loada(ptr: *const T) -> Self {
                unsafe { Self::loadu(ptr) }
            }

            #[inline]
            unsafe fn storeu(self, ptr: *mut T) {
                for i in 0..$n {
                    unsafe { ptr.add(i).write_unaligned(self.0[i]) };
                }
            }

            #[inline]
            unsafe fn storea(self, ptr: *mut T) {
                unsafe { self.storeu(ptr) }
            }

            #[inline]
            fn add(self, other: Self) -> Self {
                let mut out = self.0;
                for i in 0..$n {
                    out[i] = out[i] + other.0[i];
                }
                $name(out)
            }

            #[inline]
            fn sub(self, other: Self) -> Self {
                let mut out = self.0;
                for i in 0..$n {
                    out[i] = out[i] - other.0[i];
                }
                $name(out)
            }

            #[inline]
            fn mul(self, other: Self) -> Self {
                let mut out = self.0;
                for i in 0..$n {
                    out[i] = out[i] * other.0[i];
                }
                $name(out)
            }

            #[inline]
            fn div(self, other: Self) -> Self {
                let mut out = self.0;
                for i in 0..$n {
                    out[i] = out[i] / other.0[i];
                }
                $name(out)
            }

            #[inline]
            fn horizontal_add(self) -> T {
                let mut acc = T::zero();
                for i in 0..$n {
                    acc = acc + self.0[i];
                }
                acc
            }

            #[inline]
            fn horizontal_mul(self) -> T {
                let mut acc = T::one();
                for i in 0..$n {
                    acc = acc * self.0[i];
                }
                acc
            }
        }

        impl<T> FusedOps<T> for $name<T>
        where
            T: Scalar + Float,
        {
            #[inline]
            fn fmadd(self, b: Self, c: Self) -> Self {
                let mut out = c.0;
                for i in 0..$n {
                    out[i] = self.0[i].mul_add(b.0[i], c.0[i]);
                }
                $name(out)
            }

            #[inline]
            fn fmsub(self, b: Self, c: Self) -> Self {
                self.fmadd(b, $name(c.0.map(|v| -v)))
            }

            #[inline]
            fn fnmadd(self, b: Self, c: Self) -> Self {
                $name(self.0.map(|v| -v)).fmadd(b, c)
            }

            #[inline]
            fn fnmsub(self, b: Self, c: Self) -> Self {
                $name(self.0.map(|v| -v)).fmadd(b, $name(c.0.map(|v| -v)))
            }

            #[inline]
            fn fmaddsub(self, b: Self, c: Self) -> Self {
                let mut out = [T::zero(); $n];
                for i in 0..$n {
                    let prod = self.0[i] * b.0[i];
                    out[i] = if i % 2 == 0 { prod + c.0[i] } else { prod - c.0[i] };
                }
                $name(out)
            }

            #[inline]
            fn fmsubadd(self, b: Self, c: Self) -> Self {
                let mut out = [T::zero(); $n];
                for i in 0..$n {
                    let prod = self.0[i] * b.0[i];
                    out[i] = if i % 2 == 0 { prod - c.0[i] } else { prod + c.0[i] };
                }
                $name(out)
            }
        }
    };
}

define_lanes!(X1, 1);
define_lanes!(X2, 2);
define_lanes!(X4, 4);
define_lanes!(X8, 8);
define_lanes!(X16, 16);
