//! Elastic Deformation Example
//!
//! Warps a synthetic checkerboard image and its label mask by one random
//! grid, as a segmentation augmentation pipeline would, then repeats the
//! warp on Burn tensors.
//!
//! Usage:
//!   RUST_LOG=debug cargo run --example elastic_demo

use burn::tensor::{Tensor, TensorData};
use burn_ndarray::NdArray;
use elastik_augment::{deform_tensors, tensor_to_array, Crop, ElasticConfig, ElasticDeform};
use elastik_core::{BoundaryMode, Channel, ChannelParams, DeformChannel, SplineOrder};
use ndarray::{Array2, ArrayD, IxDyn};
use tracing_subscriber::EnvFilter;

type Backend = NdArray<f32>;

const SIZE: usize = 64;

fn main() -> anyhow::Result<()> {
    println!("Elastic Deformation Demo");
    println!("========================\n");

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let image = Array2::from_shape_fn((SIZE, SIZE), |(r, c)| {
        if (r / 8 + c / 8) % 2 == 0 { 1.0f32 } else { 0.0 }
    })
    .into_dyn();
    let mask = Array2::from_shape_fn((SIZE, SIZE), |(r, c)| {
        let (dr, dc) = (r as f64 - 32.0, c as f64 - 32.0);
        u8::from(dr * dr + dc * dc < 400.0)
    })
    .into_dyn();

    // 1. Image and mask under one grid
    let config = ElasticConfig::new(4.0, 5).with_seed(2024);
    println!("Config:\n{}\n", config.to_json()?);
    let deform = ElasticDeform::new(config)?;

    let mut warped_image = ArrayD::<f32>::zeros(IxDyn(&[SIZE, SIZE]));
    let mut warped_mask = ArrayD::<u8>::zeros(IxDyn(&[SIZE, SIZE]));
    let grid = {
        let mut channels: Vec<Box<dyn DeformChannel + '_>> = vec![
            Box::new(Channel::new(
                image.view(),
                warped_image.view_mut(),
                ChannelParams::new(SplineOrder::CUBIC, BoundaryMode::Mirror),
            )),
            Box::new(Channel::new(
                mask.view(),
                warped_mask.view_mut(),
                ChannelParams::new(SplineOrder::NEAREST, BoundaryMode::Constant(0.0)),
            )),
        ];
        deform.apply_channels(&mut channels)?
    };
    let max_shift = grid.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
    println!("Grid shape {:?}, largest control displacement {:.2}", grid.shape(), max_shift);

    let area = |m: &ArrayD<u8>| m.iter().filter(|&&v| v == 1).count();
    println!("Mask area: {} -> {}", area(&mask), area(&warped_mask));
    let changed = image
        .iter()
        .zip(warped_image.iter())
        .filter(|(a, b)| (*a - *b).abs() > 0.5)
        .count();
    println!("Image pixels flipped by the warp: {}\n", changed);

    // 2. Tensors, producing only a centre crop
    let device = Default::default();
    let values: Vec<f32> = image.iter().copied().collect();
    let tensor = Tensor::<Backend, 2>::from_data(TensorData::new(values, vec![SIZE, SIZE]), &device);
    let crop = Crop::new(vec![16..48, 16..48])?;
    let outputs = deform_tensors(
        &[tensor],
        &grid.view(),
        &[ChannelParams::new(SplineOrder::CUBIC, BoundaryMode::Mirror)],
        Some(&crop),
    )?;
    let cropped = tensor_to_array(&outputs[0])?;
    let expected = crop.view(warped_image.view())?;
    let max_diff = cropped
        .iter()
        .zip(expected.iter())
        .fold(0.0f32, |acc, (a, b)| acc.max((a - b).abs()));
    println!("Cropped tensor shape {:?}, max difference to full warp {:.2e}", cropped.shape(), max_diff);

    Ok(())
}
