//! Spline order (degree) and its recursive-filter poles.

use serde::{Deserialize, Serialize};

use crate::error::{DeformError, Result};

/// Highest supported spline degree.
pub const MAX_ORDER: u8 = 5;

/// Number of samples in the widest 1-D support (`MAX_ORDER + 1`).
pub const MAX_SUPPORT: usize = MAX_ORDER as usize + 1;

/// Degree of the B-spline basis, validated to `0..=5`.
///
/// 0 is nearest-neighbour, 1 is linear, 2..=5 are smooth splines that need
/// their input converted to coefficients first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct SplineOrder(u8);

impl SplineOrder {
    pub const NEAREST: Self = Self(0);
    pub const LINEAR: Self = Self(1);
    pub const CUBIC: Self = Self(3);

    pub fn new(order: u8) -> Result<Self> {
        if order > MAX_ORDER {
            return Err(DeformError::invalid_parameter(format!(
                "spline order must be in 0..={MAX_ORDER}, got {order}"
            )));
        }
        Ok(Self(order))
    }

    /// Decode an order handed over as a plain integer.
    pub fn from_code(order: i64) -> Result<Self> {
        u8::try_from(order)
            .map_err(|_| {
                DeformError::invalid_parameter(format!(
                    "spline order must be in 0..={MAX_ORDER}, got {order}"
                ))
            })
            .and_then(Self::new)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Number of samples each axis contributes to one evaluation.
    pub fn support(self) -> usize {
        self.0 as usize + 1
    }

    /// Whether samples must be converted to coefficients before evaluation.
    pub fn needs_prefilter(self) -> bool {
        self.0 > 1
    }

    /// Poles of the cardinal B-spline prefilter of this degree.
    pub fn poles(self) -> Vec<f64> {
        match self.0 {
            2 => vec![8.0f64.sqrt() - 3.0],
            3 => vec![3.0f64.sqrt() - 2.0],
            4 => vec![
                (664.0 - 438976.0f64.sqrt()).sqrt() + 304.0f64.sqrt() - 19.0,
                (664.0 + 438976.0f64.sqrt()).sqrt() - 304.0f64.sqrt() - 19.0,
            ],
            5 => vec![
                (67.5 - 4436.25f64.sqrt()).sqrt() + 26.25f64.sqrt() - 6.5,
                (67.5 + 4436.25f64.sqrt()).sqrt() - 26.25f64.sqrt() - 6.5,
            ],
            _ => Vec::new(),
        }
    }
}

impl Default for SplineOrder {
    fn default() -> Self {
        Self::CUBIC
    }
}

impl TryFrom<u8> for SplineOrder {
    type Error = DeformError;

    fn try_from(order: u8) -> Result<Self> {
        Self::new(order)
    }
}

impl From<SplineOrder> for u8 {
    fn from(order: SplineOrder) -> Self {
        order.0
    }
}
