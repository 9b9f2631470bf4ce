//! Entry point taking element-type tagged arrays and parallel parameter
//! lists, as handed over by a marshalling layer.
//!
//! Orders are plain integers in `0..=5`; modes use the fixed code table of
//! [`BoundaryMode`](crate::boundary::BoundaryMode) (`0` constant, `1` nearest,
//! `2` mirror, `3` reflect, `4` wrap).

use ndarray::{ArrayViewD, ArrayViewMutD};

use crate::element::Sample;
use crate::error::{DeformError, Result};

use super::channel::{Channel, ChannelParams, DeformChannel};
use super::orchestrator::deform_grid;

macro_rules! tagged_arrays {
    ($($variant:ident => $ty:ty),+ $(,)?) => {
        /// Read-only array tagged with its element type.
        #[derive(Debug, Clone)]
        pub enum InputArray<'a> {
            $($variant(ArrayViewD<'a, $ty>),)+
        }

        /// Writable array tagged with its element type.
        #[derive(Debug)]
        pub enum OutputArray<'a> {
            $($variant(ArrayViewMutD<'a, $ty>),)+
        }

        impl InputArray<'_> {
            pub fn shape(&self) -> &[usize] {
                match self {
                    $(Self::$variant(array) => array.shape(),)+
                }
            }

            pub fn dtype(&self) -> &'static str {
                match self {
                    $(Self::$variant(_) => stringify!($ty),)+
                }
            }
        }

        impl OutputArray<'_> {
            pub fn shape(&self) -> &[usize] {
                match self {
                    $(Self::$variant(array) => array.shape(),)+
                }
            }

            pub fn dtype(&self) -> &'static str {
                match self {
                    $(Self::$variant(_) => stringify!($ty),)+
                }
            }
        }

        $(
            impl<'a> From<ArrayViewD<'a, $ty>> for InputArray<'a> {
                fn from(array: ArrayViewD<'a, $ty>) -> Self {
                    Self::$variant(array)
                }
            }

            impl<'a> From<ArrayViewMutD<'a, $ty>> for OutputArray<'a> {
                fn from(array: ArrayViewMutD<'a, $ty>) -> Self {
                    Self::$variant(array)
                }
            }
        )+

        fn pair_with_output<'a, T: Sample>(
            input: ArrayViewD<'a, T>,
            output: OutputArray<'a>,
            params: ChannelParams,
        ) -> Box<dyn DeformChannel + 'a> {
            match output {
                $(OutputArray::$variant(output) => Box::new(Channel::new(input, output, params)),)+
            }
        }

        fn boxed_channel<'a>(
            input: InputArray<'a>,
            output: OutputArray<'a>,
            params: ChannelParams,
        ) -> Box<dyn DeformChannel + 'a> {
            match input {
                $(InputArray::$variant(input) => pair_with_output(input, output, params),)+
            }
        }
    };
}

tagged_arrays! {
    U8 => u8,
    I8 => i8,
    U16 => u16,
    I16 => i16,
    U32 => u32,
    I32 => i32,
    U64 => u64,
    I64 => i64,
    F32 => f32,
    F64 => f64,
}

/// Output handed over by the caller, which may lack write access.
#[derive(Debug)]
pub enum OutputBuffer<'a> {
    Writeable(OutputArray<'a>),
    ReadOnly(InputArray<'a>),
}

impl<'a> From<OutputArray<'a>> for OutputBuffer<'a> {
    fn from(array: OutputArray<'a>) -> Self {
        Self::Writeable(array)
    }
}

/// Deform `inputs` into `outputs` with per-channel parameters given as
/// parallel lists.
///
/// The lists are decoded into [`ChannelParams`] records and the call is
/// forwarded to [`deform_grid`]. Every check runs before any output is
/// written.
pub fn deform_grid_coded<'a>(
    inputs: Vec<InputArray<'a>>,
    displacement: &ArrayViewD<'_, f64>,
    output_offset: Option<&[isize]>,
    outputs: Vec<OutputBuffer<'a>>,
    orders: &[i64],
    modes: &[i64],
    cvals: &[f64],
) -> Result<()> {
    let count = inputs.len();
    if count == 0 {
        return Err(DeformError::shape_mismatch("no input arrays were given"));
    }
    if outputs.len() != count {
        return Err(DeformError::shape_mismatch(format!(
            "{count} input arrays but {} output arrays",
            outputs.len()
        )));
    }
    for (name, len) in [("orders", orders.len()), ("modes", modes.len()), ("cvals", cvals.len())] {
        if len != count {
            return Err(DeformError::invalid_parameter(format!(
                "{name} has {len} entries, expected one per channel ({count})"
            )));
        }
    }
    if let Some(channel) = outputs
        .iter()
        .position(|output| matches!(output, OutputBuffer::ReadOnly(_)))
    {
        return Err(DeformError::ReadOnlyOutput { channel });
    }

    let params = orders
        .iter()
        .zip(modes)
        .zip(cvals)
        .enumerate()
        .map(|(channel, ((&order, &mode), &cval))| {
            ChannelParams::from_codes(order, mode, cval).map_err(|err| match err {
                DeformError::InvalidParameter(msg) => {
                    DeformError::invalid_parameter(format!("channel {channel}: {msg}"))
                }
                other => other,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut channels: Vec<Box<dyn DeformChannel + 'a>> = inputs
        .into_iter()
        .zip(outputs)
        .zip(params)
        .filter_map(|((input, output), params)| match output {
            OutputBuffer::Writeable(output) => Some(boxed_channel(input, output, params)),
            OutputBuffer::ReadOnly(_) => None,
        })
        .collect();

    deform_grid(&mut channels, displacement, output_offset)
}
