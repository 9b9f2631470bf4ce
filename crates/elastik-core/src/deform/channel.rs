//! Channels and their per-channel interpolation settings.

use ndarray::{ArrayViewD, ArrayViewMutD, IxDyn};
use serde::{Deserialize, Serialize};

use crate::boundary::BoundaryMode;
use crate::element::Sample;
use crate::error::{DeformError, Result};
use crate::filter::{Resampler, SplinePrefilter};
use crate::interpolation::SplineOrder;
use crate::lattice::Lattice;
use crate::transform::CoordinateField;

/// Interpolation settings of one channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelParams {
    /// Spline degree.
    pub order: SplineOrder,
    /// Boundary extension, carrying the fill value for `constant`.
    pub mode: BoundaryMode,
    /// Convert samples to spline coefficients before sampling. Disable when
    /// the input already holds coefficients.
    pub prefilter: bool,
}

impl Default for ChannelParams {
    fn default() -> Self {
        Self {
            order: SplineOrder::CUBIC,
            mode: BoundaryMode::default(),
            prefilter: true,
        }
    }
}

impl ChannelParams {
    pub fn new(order: SplineOrder, mode: BoundaryMode) -> Self {
        Self {
            order,
            mode,
            prefilter: true,
        }
    }

    /// Decode the integer order and mode codes used at the coded boundary.
    pub fn from_codes(order: i64, mode: i64, cval: f64) -> Result<Self> {
        Ok(Self::new(
            SplineOrder::from_code(order)?,
            BoundaryMode::from_code(mode, cval)?,
        ))
    }

    pub fn with_order(mut self, order: SplineOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_mode(mut self, mode: BoundaryMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_prefilter(mut self, prefilter: bool) -> Self {
        self.prefilter = prefilter;
        self
    }

    /// Whether rendering converts the input to coefficients first.
    pub fn filters(&self) -> bool {
        self.prefilter && self.order.needs_prefilter()
    }
}

/// One input/output pair deformed under the shared coordinate field.
///
/// Implemented by [`Channel`] for every element type pairing, and by boxes
/// and mutable references to channels so batches may mix element types.
pub trait DeformChannel: Send {
    fn input_shape(&self) -> &[usize];

    fn output_shape(&self) -> &[usize];

    fn params(&self) -> &ChannelParams;

    /// Length of the `f64` working buffer [`DeformChannel::render`] expects.
    fn scratch_len(&self) -> usize;

    /// Sample the input at every coordinate of `field` into the output.
    fn render(&mut self, field: &CoordinateField, scratch: &mut [f64]) -> Result<()>;
}

/// A borrowed input array and the output array it is deformed into.
#[derive(Debug)]
pub struct Channel<'a, T, U> {
    input: ArrayViewD<'a, T>,
    output: ArrayViewMutD<'a, U>,
    params: ChannelParams,
}

impl<'a, T: Sample, U: Sample> Channel<'a, T, U> {
    pub fn new(input: ArrayViewD<'a, T>, output: ArrayViewMutD<'a, U>, params: ChannelParams) -> Self {
        Self {
            input,
            output,
            params,
        }
    }

    pub fn input(&self) -> &ArrayViewD<'a, T> {
        &self.input
    }

    pub fn output(&self) -> &ArrayViewMutD<'a, U> {
        &self.output
    }
}

impl<'a, T: Sample, U: Sample> DeformChannel for Channel<'a, T, U> {
    fn input_shape(&self) -> &[usize] {
        self.input.shape()
    }

    fn output_shape(&self) -> &[usize] {
        self.output.shape()
    }

    fn params(&self) -> &ChannelParams {
        &self.params
    }

    fn scratch_len(&self) -> usize {
        if self.params.filters() || !self.input.is_standard_layout() {
            self.input.len()
        } else {
            0
        }
    }

    fn render(&mut self, field: &CoordinateField, scratch: &mut [f64]) -> Result<()> {
        let lattice = Lattice::new(self.input.shape());
        let resampler = Resampler::new(self.params.order, self.params.mode);

        if !self.params.filters() {
            if let Some(samples) = self.input.as_slice() {
                return resampler.resample(samples, &lattice, field, &mut self.output);
            }
        }

        if scratch.len() != self.input.len() {
            return Err(DeformError::shape_mismatch(format!(
                "working buffer holds {} values, input has {}",
                scratch.len(),
                self.input.len()
            )));
        }
        scratch
            .iter_mut()
            .zip(self.input.iter())
            .for_each(|(slot, value)| *slot = value.to_f64());

        if self.params.filters() {
            let mut coefficients = ArrayViewMutD::from_shape(IxDyn(self.input.shape()), &mut *scratch)?;
            SplinePrefilter::new(self.params.order, self.params.mode).apply(&mut coefficients)?;
        }
        resampler.resample(&*scratch, &lattice, field, &mut self.output)
    }
}

impl<C: DeformChannel + ?Sized> DeformChannel for Box<C> {
    fn input_shape(&self) -> &[usize] {
        (**self).input_shape()
    }

    fn output_shape(&self) -> &[usize] {
        (**self).output_shape()
    }

    fn params(&self) -> &ChannelParams {
        (**self).params()
    }

    fn scratch_len(&self) -> usize {
        (**self).scratch_len()
    }

    fn render(&mut self, field: &CoordinateField, scratch: &mut [f64]) -> Result<()> {
        (**self).render(field, scratch)
    }
}

impl<C: DeformChannel + ?Sized> DeformChannel for &mut C {
    fn input_shape(&self) -> &[usize] {
        (**self).input_shape()
    }

    fn output_shape(&self) -> &[usize] {
        (**self).output_shape()
    }

    fn params(&self) -> &ChannelParams {
        (**self).params()
    }

    fn scratch_len(&self) -> usize {
        (**self).scratch_len()
    }

    fn render(&mut self, field: &CoordinateField, scratch: &mut [f64]) -> Result<()> {
        (**self).render(field, scratch)
    }
}
