//! Batch validation of a deformation call.
//!
//! Every structural invariant is checked before anything is allocated or
//! written, so a rejected call leaves all outputs untouched.

use ndarray::ArrayViewD;

use crate::error::{DeformError, Result};
use crate::transform::CoordinateFieldBuilder;

use super::channel::DeformChannel;

/// Shapes shared by every channel of a validated call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallGeometry {
    pub input_shape: Vec<usize>,
    pub output_shape: Vec<usize>,
    pub offset: Vec<isize>,
}

impl CallGeometry {
    pub fn ndim(&self) -> usize {
        self.input_shape.len()
    }

    /// Whether the output window reaches outside the input on any axis.
    pub fn window_exceeds_input(&self) -> bool {
        self.input_shape
            .iter()
            .zip(&self.output_shape)
            .zip(&self.offset)
            .any(|((&input, &output), &offset)| {
                offset < 0 || offset.saturating_add(output as isize) > input as isize
            })
    }
}

/// Validate channels, displacement grid and offset as one batch.
pub fn validate_call<C: DeformChannel>(
    channels: &[C],
    displacement: &ArrayViewD<'_, f64>,
    offset: Option<&[isize]>,
) -> Result<CallGeometry> {
    let first = channels
        .first()
        .ok_or_else(|| DeformError::shape_mismatch("at least one channel is required"))?;
    let input_shape = first.input_shape().to_vec();
    let output_shape = first.output_shape().to_vec();
    let ndim = input_shape.len();

    validate_extent("input", &input_shape)?;
    validate_extent("output", &output_shape)?;

    // One coordinate field serves every channel, so equal element counts
    // are not enough: the shapes themselves must agree.
    for (index, channel) in channels.iter().enumerate().skip(1) {
        if channel.input_shape() != input_shape.as_slice() {
            return Err(DeformError::shape_mismatch(format!(
                "all inputs must have identical shape: channel {index} input is {:?}, channel 0 input is {:?}",
                channel.input_shape(),
                input_shape
            )));
        }
        if channel.output_shape() != output_shape.as_slice() {
            return Err(DeformError::shape_mismatch(format!(
                "all outputs must have identical shape: channel {index} output is {:?}, channel 0 output is {:?}",
                channel.output_shape(),
                output_shape
            )));
        }
    }

    if output_shape.len() != ndim {
        return Err(DeformError::shape_mismatch(format!(
            "outputs have rank {}, inputs have rank {ndim}",
            output_shape.len()
        )));
    }

    let offset = match offset {
        Some(offset) => offset.to_vec(),
        None => {
            if output_shape != input_shape {
                return Err(DeformError::shape_mismatch(format!(
                    "output shape {output_shape:?} differs from input shape {input_shape:?} \
                     and no output offset was given"
                )));
            }
            vec![0; ndim]
        }
    };

    CoordinateFieldBuilder::new(displacement.view())
        .with_offset(offset.clone())
        .validate(ndim)?;

    Ok(CallGeometry {
        input_shape,
        output_shape,
        offset,
    })
}

fn validate_extent(role: &str, shape: &[usize]) -> Result<()> {
    if shape.is_empty() {
        return Err(DeformError::shape_mismatch(format!(
            "{role} arrays have rank 0"
        )));
    }
    if let Some(axis) = shape.iter().position(|&extent| extent == 0) {
        return Err(DeformError::shape_mismatch(format!(
            "{role} arrays are empty along axis {axis}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deform::{Channel, ChannelParams};
    use ndarray::{ArrayD, IxDyn};

    fn zeros(shape: &[usize]) -> ArrayD<f64> {
        ArrayD::zeros(IxDyn(shape))
    }

    #[test]
    fn test_accepts_matching_batch() {
        let input = zeros(&[4, 5]);
        let (mut a, mut b) = (zeros(&[4, 5]), zeros(&[4, 5]));
        let grid = zeros(&[2, 3, 3]);
        let channels = vec![
            Channel::new(input.view(), a.view_mut(), ChannelParams::default()),
            Channel::new(input.view(), b.view_mut(), ChannelParams::default()),
        ];
        let geometry = validate_call(&channels, &grid.view(), None).unwrap();
        assert_eq!(geometry.offset, vec![0, 0]);
        assert!(!geometry.window_exceeds_input());
    }

    #[test]
    fn test_rejects_empty_batch() {
        let grid = zeros(&[2, 3, 3]);
        let channels: Vec<Channel<'_, f64, f64>> = Vec::new();
        assert!(matches!(
            validate_call(&channels, &grid.view(), None),
            Err(DeformError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_rejects_mismatched_inputs() {
        let (a_in, b_in) = (zeros(&[4, 4]), zeros(&[2, 8]));
        let (mut a, mut b) = (zeros(&[4, 4]), zeros(&[4, 4]));
        let grid = zeros(&[2, 3, 3]);
        let channels = vec![
            Channel::new(a_in.view(), a.view_mut(), ChannelParams::default()),
            Channel::new(b_in.view(), b.view_mut(), ChannelParams::default()),
        ];
        let err = validate_call(&channels, &grid.view(), None).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("identical shape"), "{message}");
        assert!(message.contains("channel 1 input is [2, 8]"), "{message}");
        assert!(!message.contains("elements"), "{message}");
    }

    #[test]
    fn test_rejects_mismatched_outputs() {
        let input = zeros(&[4, 4]);
        let (mut a, mut b) = (zeros(&[4, 4]), zeros(&[2, 8]));
        let grid = zeros(&[2, 3, 3]);
        let channels = vec![
            Channel::new(input.view(), a.view_mut(), ChannelParams::default()),
            Channel::new(input.view(), b.view_mut(), ChannelParams::default()),
        ];
        let err = validate_call(&channels, &grid.view(), Some(&[0, 0])).unwrap_err();
        assert!(err.to_string().contains("all outputs must have identical shape"));
    }

    #[test]
    fn test_offset_rules() {
        let input = zeros(&[6, 6]);
        let mut out = zeros(&[3, 6]);
        let grid = zeros(&[2, 2, 2]);
        let channels = vec![Channel::new(input.view(), out.view_mut(), ChannelParams::default())];

        assert!(validate_call(&channels, &grid.view(), None).is_err());
        assert!(validate_call(&channels, &grid.view(), Some(&[1])).is_err());

        let geometry = validate_call(&channels, &grid.view(), Some(&[2, 0])).unwrap();
        assert!(!geometry.window_exceeds_input());
        let geometry = validate_call(&channels, &grid.view(), Some(&[4, 0])).unwrap();
        assert!(geometry.window_exceeds_input());
        let geometry = validate_call(&channels, &grid.view(), Some(&[-1, 0])).unwrap();
        assert!(geometry.window_exceeds_input());
    }

    #[test]
    fn test_rejects_bad_displacement() {
        let input = zeros(&[4, 4]);
        let mut out = zeros(&[4, 4]);
        let channels = vec![Channel::new(input.view(), out.view_mut(), ChannelParams::default())];
        for shape in [&[2, 3][..], &[3, 3, 3], &[2, 0, 3], &[2, 3, 3, 3]] {
            let grid = zeros(shape);
            assert!(
                validate_call(&channels, &grid.view(), None).is_err(),
                "grid {shape:?} accepted"
            );
        }
    }

    #[test]
    fn test_rejects_rank_zero_and_empty_axes() {
        let grid = zeros(&[0]);
        let input = zeros(&[]);
        let mut out = zeros(&[]);
        let channels = vec![Channel::new(input.view(), out.view_mut(), ChannelParams::default())];
        assert!(validate_call(&channels, &grid.view(), None).is_err());

        let grid = zeros(&[1, 2]);
        let input = zeros(&[0]);
        let mut out = zeros(&[0]);
        let channels = vec![Channel::new(input.view(), out.view_mut(), ChannelParams::default())];
        assert!(validate_call(&channels, &grid.view(), None).is_err());
    }
}
