//! Runtime ISA tag selecting the vector width backend.
//!
//! Family kernels are generic over `IsaTag` via the [`crate::vector::Simd`]
//! trait rather than over a type per width: one generic kernel body is
//! instantiated per concrete register type, dispatched on the tag at call
//! time instead of needing per-ISA code duplication.

/// Vector width, in bytes, selected for a kernel instantiation.
///
/// `NONE` degenerates every [`crate::vector::Simd`] op to a scalar
/// (lane count 1) implementation — see `vector::scalar`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IsaTag {
    None,
    W128,
    W256,
    W512,
}

impl IsaTag {
    /// Byte width of one register at this tag.
    pub const fn bytes(self) -> usize {
        match self {
            IsaTag::None => 8,
            IsaTag::W128 => 16,
            IsaTag::W256 => 32,
            IsaTag::W512 => 64,
        }
    }

    /// Lane count for a real scalar of `elem_size` bytes.
    pub const fn lanes(self, elem_size: usize) -> usize {
        self.bytes() / elem_size
    }

    /// Lane count for an interleaved complex value whose real/imag
    /// component is `component_size` bytes (`sizeof(complex<X>) = 2 * component_size`).
    pub const fn complex_lanes(self, component_size: usize) -> usize {
        self.bytes() / (2 * component_size)
    }

    /// The widest tag this build of the crate can execute, based on runtime
    /// CPU feature detection. Falls back to `None` off x86-64 or when no
    /// relevant feature is present.
    pub fn detect() -> IsaTag {
        #[cfg(target_arch = "x86_64")]
        {
            if is_x86_feature_detected!("avx512f") && is_x86_feature_detected!("avx512dq") {
                return IsaTag::W512;
            }
            if is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma") {
                return IsaTag::W256;
            }
            if is_x86_feature_detected!("sse2") {
                return IsaTag::W128;
            }
        }
        IsaTag::None
    }
}

impl std::fmt::Display for IsaTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            IsaTag::None => "NONE",
            IsaTag::W128 => "W128",
            IsaTag::W256 => "W256",
            IsaTag::W512 => "W512",
        };
        f.write_str(s)
    }
}
