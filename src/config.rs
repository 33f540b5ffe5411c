//! Build-time configuration constants.
//!
//! Default cache sizes and fill factors, expressed as Rust `const`s. A
//! downstream crate can override these by constructing a `CacheInfo`/
//! `FillFactors` directly instead of using [`DEFAULT_CACHE`]/[`DEFAULT_FILL`].

/// Cache budgets and the scratch-allocation alignment floor used by
/// [`crate::blocking::Blocking::derive`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheInfo {
    pub l1_size: usize,
    pub l2_size: usize,
    pub l3_size: usize,
    pub line_size: usize,
}

pub const L1_CACHE_SIZE: usize = 32 * 1024;
pub const L2_CACHE_SIZE: usize = 256 * 1024;
pub const L3_CACHE_SIZE: usize = 8 * 1024 * 1024;
pub const LINE_SIZE: usize = 64;

pub const DEFAULT_CACHE: CacheInfo = CacheInfo {
    l1_size: L1_CACHE_SIZE,
    l2_size: L2_CACHE_SIZE,
    l3_size: L3_CACHE_SIZE,
    line_size: LINE_SIZE,
};

/// Fill fractions applied to each cache level before deriving a block size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillFactors {
    pub l1: f64,
    pub l2: f64,
    pub l3: f64,
}

pub const DEFAULT_FILL: FillFactors = FillFactors {
    l1: 0.80,
    l2: 0.90,
    l3: 0.50,
};

/// Default worker count for the parallel driver, when the caller doesn't
/// override it at the call site.
pub fn real_cores() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
