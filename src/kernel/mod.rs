//! Per-family register-tile geometry.
//!
//! Each family gets a `const KernelPolicy`, and [`KernelPolicy::kernel_cols`]
//! folds in the lane count so callers don't need to recompute `Rc * L` at
//! every call site.

pub mod tile;

/// Register-tile shape for one family: `Rr` rows, `Rc` registers per row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelPolicy {
    pub row_registers: usize,
    pub col_registers: usize,
}

impl KernelPolicy {
    pub const fn register_elements(&self, lanes: usize) -> usize {
        self.row_registers * self.col_registers * lanes
    }

    pub const fn kernel_rows(&self) -> usize {
        self.row_registers
    }

    pub const fn kernel_cols(&self, lanes: usize) -> usize {
        self.col_registers * lanes
    }
}

/// `(Rr, Rc) = (4, 4)`.
pub const BROADCAST: KernelPolicy = KernelPolicy {
    row_registers: 4,
    col_registers: 4,
};
/// `(Rr, Rc) = (4, 4)`.
pub const REDUCE: KernelPolicy = KernelPolicy {
    row_registers: 4,
    col_registers: 4,
};
/// `(Rr, Rc) = (4, 4)`.
pub const MULTIPLY: KernelPolicy = KernelPolicy {
    row_registers: 4,
    col_registers: 4,
};
/// `(Rr, Rc) = (4, 2)`.
pub const UNITE: KernelPolicy = KernelPolicy {
    row_registers: 4,
    col_registers: 2,
};
/// `(Rr, Rc) = (4, 1)`.
pub const TRANSPOSE: KernelPolicy = KernelPolicy {
    row_registers: 4,
    col_registers: 1,
};
/// `(Rr, Rc) = (2, 4)`.
pub const FUSED_UNION: KernelPolicy = KernelPolicy {
    row_registers: 2,
    col_registers: 4,
};
/// `(Rr, Rc) = (2, 8)`.
pub const FUSED_REDUCE: KernelPolicy = KernelPolicy {
    row_registers: 2,
    col_registers: 8,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_elements_folds_lanes() {
        assert_eq!(MULTIPLY.register_elements(4), 4 * 4 * 4);
        assert_eq!(FUSED_REDUCE.kernel_cols(4), 32);
    }
}
