//! Non-owning matrix views and boundary validation.
//!
//! [`validate_one`] checks a single matrix argument (null base, zero
//! dimension, overflow) and returns [`crate::error::Result`]; [`validate`]
//! runs it across every operand in a call, stopping at the first failure
//! with the call-site entry label attached. The row-pointer (`T**`)
//! overload is [`MatrixArg::RowPointer`]; flat (`T*`) is
//! [`MatrixArg::Flat`] — both normalize to a flat
//! [`MatrixView`]/[`MatrixViewMut`] once validated,
//! since Rust slices already are the non-owning view the C++ form is
//! reaching for.

use crate::error::{Error, Result};

/// A non-owning, read-only view of a row-major matrix.
#[derive(Debug, Clone, Copy)]
pub struct MatrixView<'a, T> {
    data: &'a [T],
    rows: usize,
    cols: usize,
}

impl<'a, T> MatrixView<'a, T> {
    pub fn rows(&self) -> usize {
        self.rows
    }
    pub fn cols(&self) -> usize {
        self.cols
    }
    pub fn as_slice(&self) -> &'a [T] {
        self.data
    }
    pub fn row(&self, r: usize) -> &[T] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }
    pub fn get(&self, r: usize, c: usize) -> &T {
        &self.data[r * self.cols + c]
    }
}

/// A non-owning, mutable view of a row-major matrix.
pub struct MatrixViewMut<'a, T> {
    data: &'a mut [T],
    rows: usize,
    cols: usize,
}

impl<'a, T> MatrixViewMut<'a, T> {
    pub fn rows(&self) -> usize {
        self.rows
    }
    pub fn cols(&self) -> usize {
        self.cols
    }
    pub fn as_slice(&self) -> &[T] {
        self.data
    }
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.data
    }
    pub fn row_mut(&mut self, r: usize) -> &mut [T] {
        &mut self.data[r * self.cols..(r + 1) * self.cols]
    }
    pub fn as_view(&self) -> MatrixView<'_, T> {
        MatrixView {
            data: self.data,
            rows: self.rows,
            cols: self.cols,
        }
    }
}

/// One matrix argument to [`validate`], in either supported input form.
pub enum MatrixArg<'a, T> {
    /// Contiguous `rows * cols` elements, row-major.
    Flat { ptr: &'a [T], rows: usize, cols: usize },
    /// `rows` row pointers, each `cols` elements long; must be contiguous
    /// (`rows[rows-1] + cols == rows[0] + rows*cols`) to normalize into a
    /// flat view.
    RowPointer { ptr: &'a [&'a [T]], cols: usize },
}

fn size_checked<T>(entry: &'static str, rows: usize, cols: usize) -> Result<usize> {
    if rows == 0 || cols == 0 {
        return Err(Error::invalid(entry, "zero dimension"));
    }
    let size = rows.checked_mul(cols).ok_or(Error::DimensionOverflow { entry, rows, cols })?;
    if size > usize::MAX / std::mem::size_of::<T>().max(1) {
        return Err(Error::DimensionOverflow { entry, rows, cols });
    }
    Ok(size)
}

/// Validates one matrix argument, per `_right`: null/empty pointer, zero
/// dimension, overflow, contiguity (row-pointer form) or wraparound (flat
/// form). Returns the normalized flat view on success.
pub fn validate_one<'a, T>(entry: &'static str, arg: &MatrixArg<'a, T>) -> Result<(usize, usize)> {
    match arg {
        MatrixArg::Flat { ptr, rows, cols } => {
            let size = size_checked::<T>(entry, *rows, *cols)?;
            if ptr.len() < size {
                return Err(Error::invalid(entry, "slice shorter than rows*cols"));
            }
            let start = ptr.as_ptr() as usize;
            let end = start.wrapping_add(size * std::mem::size_of::<T>());
            if end < start {
                return Err(Error::layout(entry, "memory wraparound"));
            }
            Ok((*rows, *cols))
        }
        MatrixArg::RowPointer { ptr, cols } => {
            let rows = ptr.len();
            let _size = size_checked::<T>(entry, rows, *cols)?;
            for row in ptr.iter() {
                if row.len() != *cols {
                    return Err(Error::invalid(entry, "row shorter than declared cols"));
                }
            }
            if rows > 1 {
                let first = ptr[0].as_ptr() as usize;
                let last = ptr[rows - 1].as_ptr() as usize;
                let stride_bytes = cols * std::mem::size_of::<T>();
                let expected_last = first + (rows - 1) * stride_bytes;
                if last != expected_last {
                    return Err(Error::layout(entry, "not contiguous"));
                }
            }
            Ok((rows, *cols))
        }
    }
}

/// Validates every matrix argument in order, failing on the first error —
/// the Rust analogue of `right(id, matrices...)`'s recursive parameter-pack
/// walk.
pub fn validate<T>(entry: &'static str, args: &[MatrixArg<'_, T>]) -> Result<()> {
    for arg in args {
        validate_one(entry, arg)?;
    }
    Ok(())
}

/// Builds a validated [`MatrixView`] from a flat slice.
pub fn view<'a, T>(entry: &'static str, data: &'a [T], rows: usize, cols: usize) -> Result<MatrixView<'a, T>> {
    let arg = MatrixArg::Flat { ptr: data, rows, cols };
    let (rows, cols) = validate_one(entry, &arg)?;
    Ok(MatrixView { data, rows, cols })
}

/// Builds a validated [`MatrixViewMut`] from a flat mutable slice.
pub fn view_mut<'a, T>(
    entry: &'static str,
    data: &'a mut [T],
    rows: usize,
    cols: usize,
) -> Result<MatrixViewMut<'a, T>> {
    {
        let arg = MatrixArg::Flat { ptr: data, rows, cols };
        validate_one(entry, &arg)?;
    }
    Ok(MatrixViewMut { data, rows, cols })
}

/// Validates a `rows`-long slice of `cols`-long row pointers and reinterprets
/// it as one flat `rows * cols` slice. Safe because
/// [`validate_one`]'s contiguity check on [`MatrixArg::RowPointer`] already
/// guarantees `ptr[0]..ptr[rows-1]+cols` is one unbroken span.
pub fn flatten_rows<'a, T>(entry: &'static str, rows: &'a [&'a [T]], cols: usize) -> Result<&'a [T]> {
    let arg = MatrixArg::RowPointer { ptr: rows, cols };
    let (rows_n, cols_n) = validate_one(entry, &arg)?;
    Ok(unsafe { std::slice::from_raw_parts(rows[0].as_ptr(), rows_n * cols_n) })
}

/// As [`flatten_rows`], for a mutable row-pointer slice. `MatrixArg` has no
/// mutable row-pointer variant, so the checks are replicated directly:
/// uniform row length and address contiguity across `rows`.
pub fn flatten_rows_mut<'a, T>(entry: &'static str, rows: &'a mut [&'a mut [T]], cols: usize) -> Result<&'a mut [T]> {
    let rows_n = rows.len();
    let _size = size_checked::<T>(entry, rows_n, cols)?;
    for row in rows.iter() {
        if row.len() != cols {
            return Err(Error::invalid(entry, "row shorter than declared cols"));
        }
    }
    if rows_n > 1 {
        let first = rows[0].as_ptr() as usize;
        let last = rows[rows_n - 1].as_ptr() as usize;
        let stride_bytes = cols * std::mem::size_of::<T>();
        let expected_last = first + (rows_n - 1) * stride_bytes;
        if last != expected_last {
            return Err(Error::layout(entry, "not contiguous"));
        }
    }
    let base = rows[0].as_mut_ptr();
    Ok(unsafe { std::slice::from_raw_parts_mut(base, rows_n * cols) })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_dimension() {
        let data = [1.0f64; 4];
        assert!(view("test", &data, 0, 4).is_err());
    }

    #[test]
    fn rejects_short_slice() {
        let data = [1.0f64; 3];
        assert!(view("test", &data, 2, 2).is_err());
    }

    #[test]
    fn accepts_well_formed_flat() {
        let data = [1.0f64; 6];
        let v = view("test", &data, 2, 3).unwrap();
        assert_eq!(v.rows(), 2);
        assert_eq!(v.cols(), 3);
        assert_eq!(v.row(1), &[1.0, 1.0, 1.0]);
    }

    #[test]
    fn row_pointer_contiguity_check() {
        let storage = [0.0f64; 6];
        let rows: Vec<&[f64]> = vec![&storage[0..3], &storage[3..6]];
        let arg = MatrixArg::Flat {
            ptr: &storage,
            rows: 2,
            cols: 3,
        };
        assert!(validate_one::<f64>("test", &arg).is_ok());
        let rp = MatrixArg::RowPointer { ptr: &rows, cols: 3 };
        assert!(validate_one::<f64>("test", &rp).is_ok());
    }

    #[test]
    fn row_pointer_rejects_noncontiguous() {
        let a = [0.0f64; 3];
        let b = [0.0f64; 3];
        let rows: Vec<&[f64]> = vec![&a, &b];
        let rp = MatrixArg::RowPointer { ptr: &rows, cols: 3 };
        assert!(validate_one::<f64>("test", &rp).is_err());
    }
}
