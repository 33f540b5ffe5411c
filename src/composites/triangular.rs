//! `forward_substitution` / `backward_substitution`: solve `L y = b` or
//! `U x = y` one row (resp. column) at a time, each step's dot product over
//! the already-solved prefix built on [`fused_reduce::<mul, add>`].
//!
//! These are the kernel contracts external LU/QR/inverse composites are
//! built against; the composites themselves are out of scope here.

use crate::error::{Error, Result};
use crate::family::fused_reduce::{fused_reduce, FmaDot};
use crate::isa::IsaTag;
use crate::ops::{Add, Lanes, Mul, Scalar};
use crate::parallel::Executor;
use num_complex::Complex;
use std::marker::PhantomData;

/// Per-type diagonal tolerance and magnitude for the `Singular` error
/// (`1e-6` for `f32`, `1e-12` for `f64`; complex types use their component
/// type's tolerance against the modulus).
pub trait DiagTolerance: Scalar {
    fn tolerance() -> f64;
    fn magnitude(self) -> f64;
}

impl DiagTolerance for f32 {
    fn tolerance() -> f64 {
        1e-6
    }
    fn magnitude(self) -> f64 {
        self.abs() as f64
    }
}
impl DiagTolerance for f64 {
    fn tolerance() -> f64 {
        1e-12
    }
    fn magnitude(self) -> f64 {
        self.abs()
    }
}
impl DiagTolerance for Complex<f32> {
    fn tolerance() -> f64 {
        1e-6
    }
    fn magnitude(self) -> f64 {
        self.norm() as f64
    }
}
impl DiagTolerance for Complex<f64> {
    fn tolerance() -> f64 {
        1e-12
    }
    fn magnitude(self) -> f64 {
        self.norm()
    }
}

/// Solves `L y = b` for lower-triangular `L` (`N x N`, row-major). When
/// `unit_diag` is true, `L`'s diagonal is taken to be implicitly `1` and is
/// never read or divided by.
pub fn forward_substitution<T>(entry: &'static str, l: &[T], b: &[T], y: &mut [T], n: usize, unit_diag: bool, isa: IsaTag, executor: &dyn Executor) -> Result<()>
where
    T: Scalar + Lanes + FmaDot + DiagTolerance + std::ops::Sub<Output = T> + std::ops::Div<Output = T>,
{
    if l.len() < n * n || b.len() < n || y.len() < n {
        return Err(Error::invalid(entry, "buffer too small"));
    }
    for i in 0..n {
        let dot = if i == 0 {
            T::zero()
        } else {
            fused_reduce::<T, Mul, Add>(entry, &l[i * n..i * n + i], &y[..i], T::zero(), 1, i, isa, executor, PhantomData)?
        };
        let rhs = b[i] - dot;
        y[i] = if unit_diag {
            rhs
        } else {
            let diag = l[i * n + i];
            if diag.magnitude() < T::tolerance() {
                return Err(Error::Singular { entry, index: i, tolerance: T::tolerance() });
            }
            rhs / diag
        };
    }
    Ok(())
}

/// Solves `U x = y` for upper-triangular `U` (`N x N`, row-major), walking
/// rows from `N-1` down to `0`. When `unit_diag` is true, `U`'s diagonal is
/// taken to be implicitly `1` and is never read or divided by.
pub fn backward_substitution<T>(entry: &'static str, u: &[T], y: &[T], x: &mut [T], n: usize, unit_diag: bool, isa: IsaTag, executor: &dyn Executor) -> Result<()>
where
    T: Scalar + Lanes + FmaDot + DiagTolerance + std::ops::Sub<Output = T> + std::ops::Div<Output = T>,
{
    if u.len() < n * n || y.len() < n || x.len() < n {
        return Err(Error::invalid(entry, "buffer too small"));
    }
    for i in (0..n).rev() {
        let suffix_len = n - 1 - i;
        let dot = if suffix_len == 0 {
            T::zero()
        } else {
            fused_reduce::<T, Mul, Add>(entry, &u[i * n + i + 1..i * n + n], &x[i + 1..n], T::zero(), 1, suffix_len, isa, executor, PhantomData)?
        };
        let rhs = y[i] - dot;
        x[i] = if unit_diag {
            rhs
        } else {
            let diag = u[i * n + i];
            if diag.magnitude() < T::tolerance() {
                return Err(Error::Singular { entry, index: i, tolerance: T::tolerance() });
            }
            rhs / diag
        };
    }
    Ok(())
}
