//! Error kinds surfaced by public entry points.
//!
//! Every fallible entry point in this crate returns [`Result<T>`]. Errors
//! carry the originating entry-point label (e.g. `"multiply"`) alongside a
//! short, specific reason, per the boundary-validation contract in
//! `view::validate`.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by this crate's public entry points.
///
/// No partial outputs are guaranteed valid after any error.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// Null base pointer, zero dimension, or an unsupported reducer operator
    /// reached at a boundary that couldn't reject it at compile time.
    #[error("{entry}: invalid argument ({reason})")]
    InvalidArgument {
        entry: &'static str,
        reason: &'static str,
    },

    /// `rows * cols` overflows `usize` or exceeds `usize::MAX / size_of::<T>()`.
    #[error("{entry}: dimension overflow (rows={rows}, cols={cols})")]
    DimensionOverflow {
        entry: &'static str,
        rows: usize,
        cols: usize,
    },

    /// A row-pointer view isn't backed by a single contiguous block, or a
    /// flat pointer's `base + len` wrapped around the address space.
    #[error("{entry}: layout error ({reason})")]
    LayoutError {
        entry: &'static str,
        reason: &'static str,
    },

    /// A pivot or diagonal element fell below tolerance. Raised only by
    /// external composites (LU/QR/inverse) built atop this crate's kernel
    /// contracts — the kernels here never raise it themselves, but
    /// `forward_substitution`/`backward_substitution` do when `unit_diag`
    /// is false and a diagonal entry is effectively zero.
    #[error("{entry}: singular (|diag| < {tolerance:e} at index {index})")]
    Singular {
        entry: &'static str,
        index: usize,
        tolerance: f64,
    },

}

impl Error {
    pub fn invalid(entry: &'static str, reason: &'static str) -> Self {
        Error::InvalidArgument { entry, reason }
    }

    pub fn layout(entry: &'static str, reason: &'static str) -> Self {
        Error::LayoutError { entry, reason }
    }
}
