//! Resample filter.
//!
//! Evaluates a channel's spline representation at every coordinate of a
//! [`CoordinateField`] and writes the results into the channel's output.

use ndarray::parallel::prelude::*;
use ndarray::{ArrayViewMutD, Axis};

use crate::boundary::BoundaryMode;
use crate::element::Sample;
use crate::error::{DeformError, Result};
use crate::interpolation::{SplineInterpolator, SplineOrder, SupportBuffer};
use crate::lattice::Lattice;
use crate::transform::CoordinateField;

/// Spline resampler for one channel.
///
/// The coefficients passed to [`Resampler::resample`] must already be
/// prefiltered when the order is above one; samples are used as-is otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resampler {
    interpolator: SplineInterpolator,
}

impl Resampler {
    pub fn new(order: SplineOrder, mode: BoundaryMode) -> Self {
        Self {
            interpolator: SplineInterpolator::new(order, mode),
        }
    }

    /// Fill `output` by sampling `coefficients` (row-major over `input`) at
    /// the coordinates of `field`.
    ///
    /// The value is accumulated in `f64` and narrowed to `U` with `as`.
    pub fn resample<C: Sample, U: Sample>(
        &self,
        coefficients: &[C],
        input: &Lattice,
        field: &CoordinateField,
        output: &mut ArrayViewMutD<'_, U>,
    ) -> Result<()> {
        if coefficients.len() != input.len() {
            return Err(DeformError::shape_mismatch(format!(
                "coefficient buffer holds {} samples, input shape {:?} needs {}",
                coefficients.len(),
                input.shape(),
                input.len()
            )));
        }
        if field.ndim() != input.ndim() {
            return Err(DeformError::shape_mismatch(format!(
                "coordinate field is {}-dimensional, input is {}-dimensional",
                field.ndim(),
                input.ndim()
            )));
        }
        if output.shape() != field.output_shape() {
            return Err(DeformError::shape_mismatch(format!(
                "output shape {:?} does not match coordinate field shape {:?}",
                output.shape(),
                field.output_shape()
            )));
        }

        let ndim = input.ndim();
        let interpolator = self.interpolator;
        let row_len: usize = field.output_shape()[1..].iter().product();

        // Rows along the first axis are disjoint; each is walked in logical
        // order so the flat index lines up with the field.
        output
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each_init(
                || (SupportBuffer::new(ndim), vec![0.0; ndim]),
                |(support, coord), (row, mut plane)| {
                    let base = row * row_len;
                    for (k, value) in plane.iter_mut().enumerate() {
                        field.point(base + k, coord);
                        let sample = interpolator.sample(coefficients, input, coord, support);
                        *value = U::from_f64(sample);
                    }
                },
            );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::CoordinateFieldBuilder;
    use ndarray::{Array2, Array3, ArrayD, IxDyn};

    fn shift_field(shape: &[usize], shift: [f64; 2]) -> CoordinateField {
        let mut grid = ArrayD::<f64>::zeros(IxDyn(&[2, 2, 2]));
        grid.index_axis_mut(Axis(0), 0).fill(shift[0]);
        grid.index_axis_mut(Axis(0), 1).fill(shift[1]);
        CoordinateFieldBuilder::new(grid.view()).build(shape, shape).unwrap()
    }

    #[test]
    fn test_identity_linear() {
        let input: Vec<f32> = (0..12).map(|v| v as f32 * 0.5).collect();
        let lattice = Lattice::new(&[3, 4]);
        let field = shift_field(&[3, 4], [0.0, 0.0]);
        let mut output = ArrayD::<f32>::zeros(IxDyn(&[3, 4]));
        Resampler::new(SplineOrder::LINEAR, BoundaryMode::Constant(0.0))
            .resample(&input, &lattice, &field, &mut output.view_mut())
            .unwrap();
        assert_eq!(output.iter().copied().collect::<Vec<_>>(), input);
    }

    #[test]
    fn test_integer_output_uses_cast_rule() {
        let input = [2.7f64, -3.0, 300.0, 41.9];
        let lattice = Lattice::new(&[2, 2]);
        let field = shift_field(&[2, 2], [0.0, 0.0]);
        let mut output = ArrayD::<u8>::zeros(IxDyn(&[2, 2]));
        Resampler::new(SplineOrder::LINEAR, BoundaryMode::Nearest)
            .resample(&input, &lattice, &field, &mut output.view_mut())
            .unwrap();
        assert_eq!(output.iter().copied().collect::<Vec<_>>(), vec![2, 0, 255, 41]);
    }

    #[test]
    fn test_fractional_shift() {
        let input: Vec<u8> = vec![0, 10, 20, 30, 40, 50];
        let lattice = Lattice::new(&[2, 3]);
        let field = shift_field(&[2, 3], [0.0, 0.25]);
        let mut output = ArrayD::<f64>::zeros(IxDyn(&[2, 3]));
        Resampler::new(SplineOrder::LINEAR, BoundaryMode::Nearest)
            .resample(&input, &lattice, &field, &mut output.view_mut())
            .unwrap();
        let expected = [2.5, 12.5, 20.0, 32.5, 42.5, 50.0];
        for (value, expected) in output.iter().zip(expected) {
            assert!((value - expected).abs() < 1e-9, "{value} vs {expected}");
        }
    }

    #[test]
    fn test_non_contiguous_output() {
        let input: Vec<f64> = (0..6).map(f64::from).collect();
        let lattice = Lattice::new(&[2, 3]);
        let field = shift_field(&[2, 3], [0.0, 0.0]);
        let mut storage = Array2::<f64>::zeros((3, 2));
        let mut output = storage.view_mut().reversed_axes().into_dyn();
        Resampler::new(SplineOrder::NEAREST, BoundaryMode::Mirror)
            .resample(&input, &lattice, &field, &mut output)
            .unwrap();
        assert_eq!(storage, Array2::from_shape_vec((3, 2), vec![0.0, 3.0, 1.0, 4.0, 2.0, 5.0]).unwrap());
    }

    #[test]
    fn test_one_dimensional() {
        let input = [1.0f64, 2.0, 4.0];
        let lattice = Lattice::new(&[3]);
        let grid = ArrayD::<f64>::from_elem(IxDyn(&[1, 1]), 1.0);
        let field = CoordinateFieldBuilder::new(grid.view()).build(&[3], &[3]).unwrap();
        let mut output = ArrayD::<f64>::zeros(IxDyn(&[3]));
        Resampler::new(SplineOrder::NEAREST, BoundaryMode::Constant(-1.0))
            .resample(&input, &lattice, &field, &mut output.view_mut())
            .unwrap();
        assert_eq!(output.as_slice().unwrap(), &[2.0, 4.0, -1.0]);
    }

    #[test]
    fn test_shape_checks() {
        let lattice = Lattice::new(&[2, 3]);
        let field = shift_field(&[2, 3], [0.0, 0.0]);
        let resampler = Resampler::new(SplineOrder::LINEAR, BoundaryMode::Nearest);

        let mut output = ArrayD::<f64>::zeros(IxDyn(&[3, 2]));
        let err = resampler
            .resample(&[0.0f64; 6], &lattice, &field, &mut output.view_mut())
            .unwrap_err();
        assert!(matches!(err, DeformError::ShapeMismatch(_)));

        let mut output = Array3::<f64>::zeros((2, 3, 1)).into_dyn();
        assert!(resampler
            .resample(&[0.0f64; 5], &lattice, &field, &mut output.view_mut())
            .is_err());
    }
}
