//! Random elastic deformation transform.

use elastik_core::{deform_grid, Channel, DeformChannel, Sample};
use ndarray::{ArrayD, ArrayViewD, IxDyn};
use rand::Rng;

use crate::config::ElasticConfig;
use crate::error::{AugmentError, Result};

/// Deformed arrays together with the grid that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct Deformed<T> {
    pub outputs: Vec<ArrayD<T>>,
    pub displacement: ArrayD<f64>,
}

/// Warps batches of same-shaped arrays by a freshly drawn random grid.
///
/// # Example
/// ```
/// use elastik_augment::{ElasticConfig, ElasticDeform};
/// use ndarray::Array2;
///
/// let image = Array2::<f32>::from_shape_fn((16, 16), |(r, c)| (r + c) as f32).into_dyn();
/// let deform = ElasticDeform::new(ElasticConfig::new(2.0, 3).with_seed(5)).unwrap();
/// let result = deform.apply(&[image.view()]).unwrap();
/// assert_eq!(result.outputs[0].shape(), &[16, 16]);
/// assert_eq!(result.displacement.shape(), &[2, 3, 3]);
/// ```
#[derive(Debug, Clone)]
pub struct ElasticDeform {
    config: ElasticConfig,
}

impl ElasticDeform {
    pub fn new(config: ElasticConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(Self {
            config: ElasticConfig::from_json(text)?,
        })
    }

    pub fn config(&self) -> &ElasticConfig {
        &self.config
    }

    /// Draw a grid (seeded from the configuration) and deform `inputs`.
    pub fn apply<T: Sample>(&self, inputs: &[ArrayViewD<'_, T>]) -> Result<Deformed<T>> {
        let ndim = Self::batch_ndim(inputs)?;
        let displacement = self.config.random_grid().sample(ndim)?;
        self.apply_with_grid(inputs, displacement)
    }

    /// Like [`ElasticDeform::apply`], drawing the grid from `rng`.
    pub fn apply_with_rng<T: Sample, R: Rng + ?Sized>(
        &self,
        inputs: &[ArrayViewD<'_, T>],
        rng: &mut R,
    ) -> Result<Deformed<T>> {
        let ndim = Self::batch_ndim(inputs)?;
        let displacement = self.config.random_grid().sample_with(ndim, rng)?;
        self.apply_with_grid(inputs, displacement)
    }

    /// Deform `inputs` by a given grid of shape `[ndim, points...]`.
    pub fn apply_with_grid<T: Sample>(
        &self,
        inputs: &[ArrayViewD<'_, T>],
        displacement: ArrayD<f64>,
    ) -> Result<Deformed<T>> {
        let ndim = Self::batch_ndim(inputs)?;
        let params = self.config.channel_params(inputs.len())?;
        let output_shape = match &self.config.crop {
            Some(crop) => {
                crop.validate_against(inputs[0].shape())?;
                crop.shape()
            }
            None => inputs[0].shape().to_vec(),
        };
        debug_assert_eq!(output_shape.len(), ndim);

        let mut outputs: Vec<ArrayD<T>> = inputs
            .iter()
            .map(|_| ArrayD::from_elem(IxDyn(&output_shape), T::from_f64(0.0)))
            .collect();
        {
            let mut channels: Vec<Channel<'_, T, T>> = inputs
                .iter()
                .zip(outputs.iter_mut())
                .zip(params)
                .map(|((input, output), params)| Channel::new(input.view(), output.view_mut(), params))
                .collect();
            self.deform(&mut channels, &displacement)?;
        }
        Ok(Deformed {
            outputs,
            displacement,
        })
    }

    /// Deform caller-built channels, which may mix element types, and return
    /// the grid that was drawn. Channel parameters come from the channels
    /// themselves; the configured crop sets the output offset.
    pub fn apply_channels<C: DeformChannel>(&self, channels: &mut [C]) -> Result<ArrayD<f64>> {
        let ndim = channels
            .first()
            .map(|channel| channel.input_shape().len())
            .ok_or_else(|| AugmentError::invalid_configuration("no channels to deform"))?;
        let displacement = self.config.random_grid().sample(ndim)?;
        self.deform(channels, &displacement)?;
        Ok(displacement)
    }

    fn deform<C: DeformChannel>(&self, channels: &mut [C], displacement: &ArrayD<f64>) -> Result<()> {
        let offset = self.config.crop.as_ref().map(|crop| crop.offset());
        deform_grid(channels, &displacement.view(), offset.as_deref())?;
        Ok(())
    }

    fn batch_ndim<T>(inputs: &[ArrayViewD<'_, T>]) -> Result<usize> {
        inputs
            .first()
            .map(|input| input.ndim())
            .ok_or_else(|| AugmentError::invalid_configuration("no arrays to deform"))
    }
}
