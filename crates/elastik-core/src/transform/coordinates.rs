//! Dense source-coordinate field built from a coarse displacement grid.
//!
//! The displacement grid has shape `[ndim, g_1, ..., g_ndim]` and spans the
//! whole input: grid index 0 sits on input index 0 and grid index `g - 1` on
//! input index `extent - 1`. The grid is upsampled with cubic splines under
//! mirror extension and the result is added to the identity position of
//! every output element.

use ndarray::{ArrayViewD, ArrayViewMutD, Axis, IxDyn};
use rayon::prelude::*;

use crate::boundary::BoundaryMode;
use crate::buffer::{row_major, try_filled};
use crate::error::{DeformError, Result};
use crate::filter::SplinePrefilter;
use crate::interpolation::{SplineInterpolator, SplineOrder, SupportBuffer};
use crate::lattice::Lattice;

/// Output elements handled per parallel work item.
const CHUNK: usize = 4096;

/// Absolute input-space coordinates of every output element.
///
/// Stored component-major with shape `[ndim, *output_shape]`.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateField {
    output: Lattice,
    values: Vec<f64>,
}

impl CoordinateField {
    pub fn ndim(&self) -> usize {
        self.output.ndim()
    }

    pub fn output_shape(&self) -> &[usize] {
        self.output.shape()
    }

    /// Number of output elements.
    pub fn len(&self) -> usize {
        self.output.len()
    }

    pub fn is_empty(&self) -> bool {
        self.output.is_empty()
    }

    /// Coordinates of every output element along `axis`, in row-major order.
    pub fn component(&self, axis: usize) -> &[f64] {
        let len = self.len();
        &self.values[axis * len..(axis + 1) * len]
    }

    /// Write the coordinate vector of the output element at `flat` into `coord`.
    #[inline]
    pub fn point(&self, flat: usize, coord: &mut [f64]) {
        let len = self.len();
        for (axis, value) in coord.iter_mut().enumerate() {
            *value = self.values[axis * len + flat];
        }
    }

    /// The field as an array of shape `[ndim, *output_shape]`.
    pub fn view(&self) -> Result<ArrayViewD<'_, f64>> {
        let mut shape = Vec::with_capacity(self.ndim() + 1);
        shape.push(self.ndim());
        shape.extend_from_slice(self.output_shape());
        Ok(ArrayViewD::from_shape(IxDyn(&shape), &self.values)?)
    }
}

/// Builds a [`CoordinateField`] from a displacement grid.
///
/// # Example
/// ```
/// use elastik_core::transform::CoordinateFieldBuilder;
/// use ndarray::ArrayD;
///
/// let grid = ArrayD::<f64>::zeros(ndarray::IxDyn(&[2, 3, 3]));
/// let field = CoordinateFieldBuilder::new(grid.view())
///     .with_offset(vec![1, 0])
///     .build(&[8, 8], &[4, 8])
///     .unwrap();
/// let mut coord = [0.0; 2];
/// field.point(0, &mut coord);
/// assert_eq!(coord, [1.0, 0.0]);
/// ```
#[derive(Debug, Clone)]
pub struct CoordinateFieldBuilder<'g> {
    displacement: ArrayViewD<'g, f64>,
    offset: Option<Vec<isize>>,
}

impl<'g> CoordinateFieldBuilder<'g> {
    pub fn new(displacement: ArrayViewD<'g, f64>) -> Self {
        Self {
            displacement,
            offset: None,
        }
    }

    /// Set the input-space origin of the output window.
    pub fn with_offset(mut self, offset: Vec<isize>) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Check the grid against an input rank without building anything.
    pub fn validate(&self, ndim: usize) -> Result<()> {
        let shape = self.displacement.shape();
        if shape.len() != ndim + 1 {
            return Err(DeformError::shape_mismatch(format!(
                "displacement has rank {}, expected {} for {ndim}-dimensional inputs",
                shape.len(),
                ndim + 1
            )));
        }
        if shape[0] != ndim {
            return Err(DeformError::shape_mismatch(format!(
                "displacement has {} components along axis 0, expected {ndim}",
                shape[0]
            )));
        }
        if let Some(axis) = shape.iter().position(|&extent| extent == 0) {
            return Err(DeformError::shape_mismatch(format!(
                "displacement grid is empty along axis {axis}"
            )));
        }
        if let Some(offset) = &self.offset {
            if offset.len() != ndim {
                return Err(DeformError::shape_mismatch(format!(
                    "output offset has {} entries, expected {ndim}",
                    offset.len()
                )));
            }
        }
        Ok(())
    }

    /// Evaluate the grid at every element of an output window over an input
    /// of `input_shape`.
    pub fn build(&self, input_shape: &[usize], output_shape: &[usize]) -> Result<CoordinateField> {
        let ndim = input_shape.len();
        self.validate(ndim)?;
        if output_shape.len() != ndim {
            return Err(DeformError::shape_mismatch(format!(
                "output has rank {}, expected {ndim}",
                output_shape.len()
            )));
        }
        let zeros = vec![0; ndim];
        let offset = self.offset.as_deref().unwrap_or(&zeros);

        let grid_shape = &self.displacement.shape()[1..];
        let grid = Lattice::new(grid_shape);
        let coefficients = self.grid_coefficients(ndim)?;

        // Identity positions and grid positions depend on one axis only.
        let identity: Vec<Vec<f64>> = (0..ndim)
            .map(|axis| {
                (0..output_shape[axis])
                    .map(|j| (j as isize + offset[axis]) as f64)
                    .collect()
            })
            .collect();
        let scaled: Vec<Vec<f64>> = (0..ndim)
            .map(|axis| {
                let scale = grid_scale(grid_shape[axis], input_shape[axis]);
                identity[axis].iter().map(|&x| x * scale).collect()
            })
            .collect();

        let output = Lattice::new(output_shape);
        let len = output.len();
        let mut values = try_filled(ndim * len, 0.0)?;
        let interpolator = SplineInterpolator::new(SplineOrder::CUBIC, BoundaryMode::Mirror);

        tracing::debug!(
            "Building coordinate field: grid {:?}, output {:?}, offset {:?}",
            grid_shape,
            output_shape,
            offset
        );

        for (axis, component) in values.chunks_mut(len.max(1)).take(ndim).enumerate() {
            let coeffs = &coefficients[axis * grid.len()..(axis + 1) * grid.len()];
            component
                .par_chunks_mut(CHUNK)
                .enumerate()
                .for_each_init(
                    || (SupportBuffer::new(ndim), vec![0usize; ndim], vec![0.0; ndim]),
                    |(support, index, position), (chunk, cells)| {
                        for (k, value) in cells.iter_mut().enumerate() {
                            output.unravel(chunk * CHUNK + k, index);
                            for a in 0..ndim {
                                position[a] = scaled[a][index[a]];
                            }
                            let shift = interpolator.sample(coeffs, &grid, position, support);
                            *value = identity[axis][index[axis]] + shift;
                        }
                    },
                );
        }

        Ok(CoordinateField { output, values })
    }

    /// Cubic coefficients of every displacement component, component-major.
    fn grid_coefficients(&self, ndim: usize) -> Result<Vec<f64>> {
        let samples = row_major(&self.displacement)?;
        let mut coefficients = try_filled(samples.len(), 0.0)?;
        coefficients.copy_from_slice(&samples);

        let mut view = ArrayViewMutD::from_shape(IxDyn(self.displacement.shape()), &mut coefficients)?;
        let prefilter = SplinePrefilter::new(SplineOrder::CUBIC, BoundaryMode::Mirror);
        for axis in 0..ndim {
            prefilter.apply(&mut view.index_axis_mut(Axis(0), axis))?;
        }
        Ok(coefficients)
    }
}

/// Grid units per input sample along one axis.
fn grid_scale(grid_extent: usize, input_extent: usize) -> f64 {
    if grid_extent < 2 || input_extent < 2 {
        0.0
    } else {
        (grid_extent - 1) as f64 / (input_extent - 1) as f64
    }
}
