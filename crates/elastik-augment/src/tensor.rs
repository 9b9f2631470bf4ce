//! Adapter for deforming Burn tensors.

use anyhow::{anyhow, ensure, Context, Result};
use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};
use elastik_core::{deform_grid, Channel, ChannelParams};
use ndarray::{ArrayD, ArrayViewD, IxDyn};

use crate::crop::Crop;
use crate::elastic::ElasticDeform;

/// Deform same-shaped float tensors by a shared displacement grid.
///
/// Each tensor is interpolated with its own entry of `params`; a single
/// entry is shared by every tensor. Results are created on the device of
/// the first tensor.
pub fn deform_tensors<B: Backend, const D: usize>(
    tensors: &[Tensor<B, D>],
    displacement: &ArrayViewD<'_, f64>,
    params: &[ChannelParams],
    crop: Option<&Crop>,
) -> Result<Vec<Tensor<B, D>>> {
    ensure!(!tensors.is_empty(), "Cannot deform an empty list of tensors");
    ensure!(
        params.len() == 1 || params.len() == tensors.len(),
        "{} channel settings given for {} tensors",
        params.len(),
        tensors.len()
    );

    let dims = tensors[0].dims();
    for (i, tensor) in tensors.iter().enumerate().skip(1) {
        ensure!(
            tensor.dims() == dims,
            "Tensor {} shape mismatch: {:?} vs {:?}",
            i,
            tensor.dims(),
            dims
        );
    }

    let inputs = tensors
        .iter()
        .map(tensor_to_array)
        .collect::<Result<Vec<_>>>()?;

    let output_shape = match crop {
        Some(crop) => {
            crop.validate_against(&dims)?;
            crop.shape()
        }
        None => dims.to_vec(),
    };
    let mut outputs: Vec<ArrayD<f32>> = inputs
        .iter()
        .map(|_| ArrayD::zeros(IxDyn(&output_shape)))
        .collect();

    {
        let mut channels: Vec<Channel<'_, f32, f32>> = inputs
            .iter()
            .zip(outputs.iter_mut())
            .enumerate()
            .map(|(i, (input, output))| {
                let params = if params.len() == 1 { params[0] } else { params[i] };
                Channel::new(input.view(), output.view_mut(), params)
            })
            .collect();
        let offset = crop.map(Crop::offset);
        deform_grid(&mut channels, displacement, offset.as_deref())
            .context("Failed to deform tensors")?;
    }

    let device = tensors[0].device();
    Ok(outputs
        .into_iter()
        .map(|output| {
            let shape = output.shape().to_vec();
            let values: Vec<f32> = output.iter().copied().collect();
            Tensor::<B, D>::from_data(TensorData::new(values, shape), &device)
        })
        .collect())
}

/// Deform tensors with a grid drawn from the transform's configuration.
///
/// Returns the deformed tensors and the grid used.
pub fn deform_tensors_random<B: Backend, const D: usize>(
    deform: &ElasticDeform,
    tensors: &[Tensor<B, D>],
) -> Result<(Vec<Tensor<B, D>>, ArrayD<f64>)> {
    let config = deform.config();
    let displacement = config.random_grid().sample(D)?;
    let params = config.channel_params(tensors.len())?;
    let outputs = deform_tensors(tensors, &displacement.view(), &params, config.crop.as_ref())?;
    Ok((outputs, displacement))
}

/// Copy a tensor's values into an `f32` array of the same shape.
pub fn tensor_to_array<B: Backend, const D: usize>(tensor: &Tensor<B, D>) -> Result<ArrayD<f32>> {
    let dims = tensor.dims();
    let values = tensor
        .to_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|err| anyhow!("Failed to read tensor data: {:?}", err))?;
    ArrayD::from_shape_vec(IxDyn(&dims), values).context("Tensor data does not match its shape")
}
