//! `set_identity`: writes `1` on the main diagonal, up to offset
//! `min(M, N)`, and leaves every off-diagonal element untouched.
//!
//! Distinct from [`crate::family::broadcast::identity`], which zeros the
//! whole buffer first — `set_identity` is for composites that already hold
//! a matrix they want to overwrite only along the diagonal (e.g. seeding an
//! accumulator for `A * A^-1 = I` iteration without disturbing scratch data
//! placed elsewhere in the buffer).

use crate::error::Result;
use crate::ops::Scalar;
use crate::view::view_mut;

/// `A[i,i] <- 1` for `i < min(rows, cols)`. Off-diagonal elements of `A` are
/// left exactly as they were.
pub fn set_identity<T: Scalar>(entry: &'static str, data: &mut [T], rows: usize, cols: usize) -> Result<()> {
    let mut view = view_mut(entry, data, rows, cols)?;
    for i in 0..rows.min(cols) {
        view.row_mut(i)[i] = T::one();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sets_diagonal_without_touching_rest() {
        let mut data = [9.0f64, 8.0, 7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0];
        set_identity("set_identity", &mut data, 3, 3).unwrap();
        assert_eq!(data, [1.0, 8.0, 7.0, 6.0, 1.0, 4.0, 3.0, 2.0, 1.0]);
    }

    #[test]
    fn rectangular_stops_at_min_dimension() {
        let mut data = [0.0f64; 2 * 4];
        set_identity("set_identity", &mut data, 2, 4).unwrap();
        assert_eq!(data, [1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
    }
}
