//! Output windows into the deformed input.

use std::ops::Range;

use ndarray::{ArrayViewD, Slice};
use serde::{Deserialize, Serialize};

use crate::error::{AugmentError, Result};

/// Half-open range per axis selecting the part of the deformed input to
/// produce. Rendering a crop gives the same values as cropping the full
/// deformed output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Range<usize>>", into = "Vec<Range<usize>>")]
pub struct Crop {
    ranges: Vec<Range<usize>>,
}

impl Crop {
    pub fn new(ranges: Vec<Range<usize>>) -> Result<Self> {
        if ranges.is_empty() {
            return Err(AugmentError::invalid_configuration("crop needs at least one axis"));
        }
        if let Some(axis) = ranges.iter().position(|range| range.start >= range.end) {
            return Err(AugmentError::invalid_configuration(format!(
                "crop range {:?} on axis {axis} is empty",
                ranges[axis]
            )));
        }
        Ok(Self { ranges })
    }

    pub fn ranges(&self) -> &[Range<usize>] {
        &self.ranges
    }

    pub fn ndim(&self) -> usize {
        self.ranges.len()
    }

    /// Input-space origin of the window.
    pub fn offset(&self) -> Vec<isize> {
        self.ranges.iter().map(|range| range.start as isize).collect()
    }

    /// Shape of the produced output.
    pub fn shape(&self) -> Vec<usize> {
        self.ranges.iter().map(|range| range.len()).collect()
    }

    /// Check the window against an input shape. Windows reaching past the
    /// input are allowed; those samples come from the boundary mode.
    pub fn validate_against(&self, input_shape: &[usize]) -> Result<()> {
        if input_shape.len() != self.ndim() {
            return Err(AugmentError::invalid_configuration(format!(
                "crop has {} axes, input has {}",
                self.ndim(),
                input_shape.len()
            )));
        }
        if self
            .ranges
            .iter()
            .zip(input_shape)
            .any(|(range, &extent)| range.end > extent)
        {
            tracing::warn!(
                "Crop {:?} extends past input shape {:?}",
                self.ranges,
                input_shape
            );
        }
        Ok(())
    }

    /// Narrow a view of an array that covers the window to the window.
    pub fn view<'a, T>(&self, array: ArrayViewD<'a, T>) -> Result<ArrayViewD<'a, T>> {
        if array.ndim() != self.ndim()
            || self
                .ranges
                .iter()
                .zip(array.shape())
                .any(|(range, &extent)| range.end > extent)
        {
            return Err(AugmentError::invalid_configuration(format!(
                "crop {:?} does not fit array of shape {:?}",
                self.ranges,
                array.shape()
            )));
        }
        let mut array = array;
        array.slice_each_axis_inplace(|axis| {
            let range = &self.ranges[axis.axis.index()];
            Slice::from(range.start..range.end)
        });
        Ok(array)
    }
}

impl TryFrom<Vec<Range<usize>>> for Crop {
    type Error = AugmentError;

    fn try_from(ranges: Vec<Range<usize>>) -> Result<Self> {
        Self::new(ranges)
    }
}

impl From<Crop> for Vec<Range<usize>> {
    fn from(crop: Crop) -> Self {
        crop.ranges
    }
}
