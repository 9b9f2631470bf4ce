//! Working buffer allocation and contiguous access to caller arrays.

use std::borrow::Cow;

use ndarray::ArrayViewD;

use crate::error::{DeformError, Result};

/// Reserve a buffer of `len` copies of `value`, reporting failure instead of aborting.
pub fn try_filled<T: Clone>(len: usize, value: T) -> Result<Vec<T>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|source| DeformError::AllocationFailure {
            elements: len,
            source,
        })?;
    buffer.resize(len, value);
    Ok(buffer)
}

/// Borrow the samples of `view` in row-major order, copying only when the
/// view is not already C-contiguous.
pub fn row_major<'v, T: Clone>(view: &'v ArrayViewD<'_, T>) -> Result<Cow<'v, [T]>> {
    if let Some(slice) = view.as_slice() {
        return Ok(Cow::Borrowed(slice));
    }
    let mut samples = Vec::new();
    samples
        .try_reserve_exact(view.len())
        .map_err(|source| DeformError::AllocationFailure {
            elements: view.len(),
            source,
        })?;
    samples.extend(view.iter().cloned());
    Ok(Cow::Owned(samples))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, Axis};

    #[test]
    fn test_try_filled() {
        let buffer = try_filled(5, 1.5f64).unwrap();
        assert_eq!(buffer, vec![1.5; 5]);
    }

    #[test]
    fn test_try_filled_reports_allocation_failure() {
        let err = try_filled(usize::MAX, 0u64).unwrap_err();
        assert!(matches!(
            err,
            DeformError::AllocationFailure { elements: usize::MAX, .. }
        ));
    }

    #[test]
    fn test_row_major_borrows_contiguous() {
        let array = Array2::from_shape_vec((2, 3), vec![1, 2, 3, 4, 5, 6])
            .unwrap()
            .into_dyn();
        let view = array.view();
        let samples = row_major(&view).unwrap();
        assert!(matches!(samples, Cow::Borrowed(_)));
        assert_eq!(&*samples, &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_row_major_copies_transposed() {
        let array = Array2::from_shape_vec((2, 3), vec![1, 2, 3, 4, 5, 6]).unwrap();
        let mut transposed = array.view();
        transposed.swap_axes(0, 1);
        let view = transposed.into_dyn();
        let samples = row_major(&view).unwrap();
        assert!(matches!(samples, Cow::Owned(_)));
        assert_eq!(&*samples, &[1, 4, 2, 5, 3, 6]);
        assert_eq!(view.len_of(Axis(0)), 3);
    }
}
