//! Separable N-dimensional spline evaluation.
//!
//! Evaluation visits the outer product of the per-axis supports with an
//! odometer, so the cost is `(order + 1)^ndim` lookups per point.

use crate::boundary::BoundaryMode;
use crate::element::Sample;
use crate::lattice::Lattice;

use super::basis::spline_weights;
use super::order::{SplineOrder, MAX_SUPPORT};

/// Per-thread scratch space for one evaluation at a time.
#[derive(Debug, Clone)]
pub struct SupportBuffer {
    offsets: Vec<[Option<usize>; MAX_SUPPORT]>,
    weights: Vec<[f64; MAX_SUPPORT]>,
    counter: Vec<usize>,
}

impl SupportBuffer {
    pub fn new(ndim: usize) -> Self {
        Self {
            offsets: vec![[None; MAX_SUPPORT]; ndim],
            weights: vec![[0.0; MAX_SUPPORT]; ndim],
            counter: vec![0; ndim],
        }
    }

    fn ndim(&self) -> usize {
        self.counter.len()
    }
}

/// Spline evaluator with a fixed order and boundary mode.
///
/// The data handed to [`SplineInterpolator::sample`] must already hold
/// spline coefficients when the order is above one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplineInterpolator {
    order: SplineOrder,
    mode: BoundaryMode,
}

impl SplineInterpolator {
    pub fn new(order: SplineOrder, mode: BoundaryMode) -> Self {
        Self { order, mode }
    }

    pub fn order(&self) -> SplineOrder {
        self.order
    }

    pub fn mode(&self) -> BoundaryMode {
        self.mode
    }

    /// Evaluate the spline over `data` (laid out by `lattice`) at `coord`.
    ///
    /// Support samples that fall outside the lattice are resolved through the
    /// boundary mode; in `constant` mode they contribute the fill value.
    pub fn sample<T: Sample>(
        &self,
        data: &[T],
        lattice: &Lattice,
        coord: &[f64],
        support: &mut SupportBuffer,
    ) -> f64 {
        let ndim = lattice.ndim();
        debug_assert_eq!(coord.len(), ndim);
        debug_assert_eq!(support.ndim(), ndim);

        let width = self.order.support();
        for axis in 0..ndim {
            let (start, weights) = spline_weights(self.order, coord[axis]);
            let extent = lattice.shape()[axis];
            let stride = lattice.strides()[axis];
            let offsets = &mut support.offsets[axis];
            for (k, slot) in offsets.iter_mut().take(width).enumerate() {
                *slot = self
                    .mode
                    .map_index(start.saturating_add(k as isize), extent)
                    .map(|index| index * stride);
            }
            support.weights[axis] = weights;
        }

        let fill = self.mode.fill_value().unwrap_or(0.0);
        support.counter.iter_mut().for_each(|k| *k = 0);

        let mut acc = 0.0;
        loop {
            let mut weight = 1.0;
            let mut flat = Some(0usize);
            for axis in 0..ndim {
                let k = support.counter[axis];
                weight *= support.weights[axis][k];
                flat = match (flat, support.offsets[axis][k]) {
                    (Some(base), Some(offset)) => Some(base + offset),
                    _ => None,
                };
            }
            acc += weight * flat.map_or(fill, |index| data[index].to_f64());

            // Advance the odometer; the last axis moves fastest.
            let mut axis = ndim;
            loop {
                if axis == 0 {
                    return acc;
                }
                axis -= 1;
                support.counter[axis] += 1;
                if support.counter[axis] < width {
                    break;
                }
                support.counter[axis] = 0;
            }
        }
    }
}
