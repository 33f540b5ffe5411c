//! Kernel contracts consumed by external LU/QR/solve/inverse composites.
//! Those composites themselves are out of scope; only the contracts they're
//! built against live here.

pub mod identity;
pub mod triangular;
