//! The five family kernels plus `multiply`.
//!
//! Each kernel is generic over the element type `T` and dispatches, at
//! call time, on the lane count [`crate::ops::Lanes::lanes`] returns for the
//! caller's [`crate::isa::IsaTag`] — there is no per-ISA code duplication
//! because [`crate::vector::lanes::X1`]/[`X2`]/[`X4`]/[`X8`]/[`X16`] already
//! cover every lane count that arises, and [`with_simd`] picks the right one
//! at the call site, unrolled by the compiler per arm.

pub mod broadcast;
pub mod fused_reduce;
pub mod fused_union;
pub mod multiply;
pub mod reduce;
pub mod transpose;
pub mod unite;

/// Monomorphizes `$body` once per possible lane count and runs the arm
/// matching `$lanes` at runtime. `$v` is bound inside `$body` as a concrete
/// `Simd<$elem>` register type.
macro_rules! with_simd {
    ($lanes:expr, $elem:ty, $v:ident => $body:block) => {
        match $lanes {
            1 => {
                #[allow(non_camel_case_types)]
                type $v = $crate::vector::lanes::X1<$elem>;
                $body
            }
            2 => {
                #[allow(non_camel_case_types)]
                type $v = $crate::vector::lanes::X2<$elem>;
                $body
            }
            4 => {
                #[allow(non_camel_case_types)]
                type $v = $crate::vector::lanes::X4<$elem>;
                $body
            }
            8 => {
                #[allow(non_camel_case_types)]
                type $v = $crate::vector::lanes::X8<$elem>;
                $body
            }
            16 => {
                #[allow(non_camel_case_types)]
                type $v = $crate::vector::lanes::X16<$elem>;
                $body
            }
            other => unreachable!("unsupported lane count {other}"),
        }
    };
}

pub(crate) use with_simd;
