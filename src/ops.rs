//! Operator marker types used to parameterize the family kernels.
//!
//! Each operator is a zero-sized marker type implementing [`BinaryOp`], and
//! the reducer restriction (`reduce`/`fused_reduce` accept only
//! associative `Add`/`Mul`) is enforced by the sealed [`ReduceOp`] trait, so
//! a `sub`/`div` reducer is a compile-time rejection rather than a runtime
//! error.

use num_complex::Complex;
use num_traits::{Float, One, Zero};

/// A binary operator usable by `unite`, `fused_union`, and as the `U` in
/// `fused_reduce`.
pub trait BinaryOp<T>: Copy + Send + Sync + 'static {
    const NAME: &'static str;
    fn apply(a: T, b: T) -> T;
}

#[derive(Debug, Clone, Copy)]
pub struct Add;
#[derive(Debug, Clone, Copy)]
pub struct Sub;
#[derive(Debug, Clone, Copy)]
pub struct Mul;
#[derive(Debug, Clone, Copy)]
pub struct Div;

macro_rules! impl_binary_op_real {
    ($op:ty, $name:literal, $expr:expr) => {
        impl BinaryOp<f32> for $op {
            const NAME: &'static str = $name;
            fn apply(a: f32, b: f32) -> f32 {
                let f: fn(f32, f32) -> f32 = $expr;
                f(a, b)
            }
        }
        impl BinaryOp<f64> for $op {
            const NAME: &'static str = $name;
            fn apply(a: f64, b: f64) -> f64 {
                let f: fn(f64, f64) -> f64 = $expr;
                f(a, b)
            }
        }
    };
}

impl_binary_op_real!(Add, "add", |a, b| a + b);
impl_binary_op_real!(Sub, "sub", |a, b| a - b);
impl_binary_op_real!(Mul, "mul", |a, b| a * b);
impl_binary_op_real!(Div, "div", |a, b| a / b);

macro_rules! impl_binary_op_complex {
    ($op:ty, $name:literal, $expr:expr) => {
        impl BinaryOp<Complex<f32>> for $op {
            const NAME: &'static str = $name;
            fn apply(a: Complex<f32>, b: Complex<f32>) -> Complex<f32> {
                let f: fn(Complex<f32>, Complex<f32>) -> Complex<f32> = $expr;
                f(a, b)
            }
        }
        impl BinaryOp<Complex<f64>> for $op {
            const NAME: &'static str = $name;
            fn apply(a: Complex<f64>, b: Complex<f64>) -> Complex<f64> {
                let f: fn(Complex<f64>, Complex<f64>) -> Complex<f64> = $expr;
                f(a, b)
            }
        }
    };
}

impl_binary_op_complex!(Add, "add", |a, b| a + b);
impl_binary_op_complex!(Sub, "sub", |a, b| a - b);
impl_binary_op_complex!(Mul, "mul", |a, b| a * b);
impl_binary_op_complex!(Div, "div", |a, b| a / b);

/// Maps a [`BinaryOp`] marker to the matching [`crate::vector::Simd`]
/// register method, so `unite`/`fused_union` can stay generic over `O`
/// instead of matching on an enum at the hot inner loop.
pub trait SimdOp<T: Scalar>: BinaryOp<T> {
    fn apply_vec<V: crate::vector::Simd<T>>(a: V, b: V) -> V;
}

impl<T: Scalar> SimdOp<T> for Add
where
    Add: BinaryOp<T>,
{
    fn apply_vec<V: crate::vector::Simd<T>>(a: V, b: V) -> V {
        a.add(b)
    }
}
impl<T: Scalar> SimdOp<T> for Sub
where
    Sub: BinaryOp<T>,
{
    fn apply_vec<V: crate::vector::Simd<T>>(a: V, b: V) -> V {
        a.sub(b)
    }
}
impl<T: Scalar> SimdOp<T> for Mul
where
    Mul: BinaryOp<T>,
{
    fn apply_vec<V: crate::vector::Simd<T>>(a: V, b: V) -> V {
        crate::vector::complex::dispatch_mul::<T, V>(a, b)
    }
}
impl<T: Scalar> SimdOp<T> for Div
where
    Div: BinaryOp<T>,
{
    fn apply_vec<V: crate::vector::Simd<T>>(a: V, b: V) -> V {
        crate::vector::complex::dispatch_div::<T, V>(a, b)
    }
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::Add {}
    impl Sealed for super::Mul {}
}

/// The restricted operator set accepted by `reduce` and the `R` of
/// `fused_reduce`: associativity is required for parallel partial
/// combination, so only `Add`/`Mul` implement this trait. `Sub`/`Div`
/// cannot, by construction — attempting to use them as a reducer is a
/// compile error, never a runtime one.
pub trait ReduceOp<T>: BinaryOp<T> + sealed::Sealed {
    /// Left-fold seed: `0` for `Add`, `1` for `Mul`.
    fn seed() -> T;
}

impl ReduceOp<f32> for Add {
    fn seed() -> f32 {
        f32::zero()
    }
}
impl ReduceOp<f64> for Add {
    fn seed() -> f64 {
        f64::zero()
    }
}
impl ReduceOp<f32> for Mul {
    fn seed() -> f32 {
        f32::one()
    }
}
impl ReduceOp<f64> for Mul {
    fn seed() -> f64 {
        f64::one()
    }
}
impl ReduceOp<Complex<f32>> for Add {
    fn seed() -> Complex<f32> {
        Complex::zero()
    }
}
impl ReduceOp<Complex<f64>> for Add {
    fn seed() -> Complex<f64> {
        Complex::zero()
    }
}
impl ReduceOp<Complex<f32>> for Mul {
    fn seed() -> Complex<f32> {
        Complex::one()
    }
}
impl ReduceOp<Complex<f64>> for Mul {
    fn seed() -> Complex<f64> {
        Complex::one()
    }
}

/// Bound satisfied by every element type this crate operates on.
pub trait Scalar: Copy + Send + Sync + Zero + One + PartialEq + std::fmt::Debug + 'static {}
impl Scalar for f32 {}
impl Scalar for f64 {}
impl Scalar for Complex<f32> {}
impl Scalar for Complex<f64> {}

/// Marker for the real (non-complex) float types, used where a kernel needs
/// `Float` (e.g. tolerance comparisons) and isn't meaningful for complex.
pub trait RealScalar: Scalar + Float {}
impl RealScalar for f32 {}
impl RealScalar for f64 {}

/// The register lane count for this element type at a given [`crate::isa::IsaTag`].
/// Real types use `S.bytes / sizeof(T)`; complex types use
/// `S.bytes / (2 * sizeof(component))`.
pub trait Lanes: Scalar {
    fn lanes(isa: crate::isa::IsaTag) -> usize;
}

impl Lanes for f32 {
    fn lanes(isa: crate::isa::IsaTag) -> usize {
        crate::vector::real_lanes(isa, std::mem::size_of::<f32>())
    }
}
impl Lanes for f64 {
    fn lanes(isa: crate::isa::IsaTag) -> usize {
        crate::vector::real_lanes(isa, std::mem::size_of::<f64>())
    }
}
impl Lanes for Complex<f32> {
    fn lanes(isa: crate::isa::IsaTag) -> usize {
        crate::vector::complex_lane_count(isa, std::mem::size_of::<f32>())
    }
}
impl Lanes for Complex<f64> {
    fn lanes(isa: crate::isa::IsaTag) -> usize {
        crate::vector::complex_lane_count(isa, std::mem::size_of::<f64>())
    }
}
