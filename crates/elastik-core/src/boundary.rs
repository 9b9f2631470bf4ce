//! Boundary extension modes.
//!
//! A mode decides which sample stands in for an index that falls outside
//! `[0, extent)`. The integer code table used by the coded entry point is
//! fixed:
//!
//! | code | mode       |
//! |------|------------|
//! | 0    | `constant` |
//! | 1    | `nearest`  |
//! | 2    | `mirror`   |
//! | 3    | `reflect`  |
//! | 4    | `wrap`     |

use serde::{Deserialize, Serialize};

use crate::error::{DeformError, Result};

/// Policy for sampling outside the array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryMode {
    /// Out-of-range samples take the fill value.
    Constant(f64),
    /// Clamp to the edge sample.
    Nearest,
    /// Reflect about the edge sample without repeating it (`d c b | a b c d | c b a`).
    Mirror,
    /// Reflect about the array edge, repeating the edge sample (`c b a | a b c d | d c b`).
    Reflect,
    /// Periodic extension (`b c d | a b c d | a b c`).
    Wrap,
}

impl Default for BoundaryMode {
    fn default() -> Self {
        Self::Constant(0.0)
    }
}

impl BoundaryMode {
    pub const CONSTANT_CODE: i64 = 0;
    pub const NEAREST_CODE: i64 = 1;
    pub const MIRROR_CODE: i64 = 2;
    pub const REFLECT_CODE: i64 = 3;
    pub const WRAP_CODE: i64 = 4;

    /// Decode a mode from the fixed code table. `cval` is kept only for `constant`.
    pub fn from_code(code: i64, cval: f64) -> Result<Self> {
        match code {
            Self::CONSTANT_CODE => Ok(Self::Constant(cval)),
            Self::NEAREST_CODE => Ok(Self::Nearest),
            Self::MIRROR_CODE => Ok(Self::Mirror),
            Self::REFLECT_CODE => Ok(Self::Reflect),
            Self::WRAP_CODE => Ok(Self::Wrap),
            other => Err(DeformError::invalid_parameter(format!(
                "unknown boundary mode code {other}, expected 0..=4"
            ))),
        }
    }

    /// The code of this mode in the fixed table.
    pub fn code(&self) -> i64 {
        match self {
            Self::Constant(_) => Self::CONSTANT_CODE,
            Self::Nearest => Self::NEAREST_CODE,
            Self::Mirror => Self::MIRROR_CODE,
            Self::Reflect => Self::REFLECT_CODE,
            Self::Wrap => Self::WRAP_CODE,
        }
    }

    /// Fill value used for out-of-range samples, if any.
    pub fn fill_value(&self) -> Option<f64> {
        match self {
            Self::Constant(cval) => Some(*cval),
            _ => None,
        }
    }

    /// Map a possibly out-of-range index onto `[0, extent)`.
    ///
    /// Returns `None` when the sample must be taken from the fill value,
    /// which only happens in `constant` mode (or for an empty axis).
    #[inline]
    pub fn map_index(&self, index: isize, extent: usize) -> Option<usize> {
        if extent == 0 {
            return None;
        }
        let n = extent as isize;
        if (0..n).contains(&index) {
            return Some(index as usize);
        }
        let mapped = match self {
            Self::Constant(_) => return None,
            Self::Nearest => index.clamp(0, n - 1),
            Self::Mirror => {
                if n == 1 {
                    0
                } else {
                    let period = 2 * (n - 1);
                    let folded = index.rem_euclid(period);
                    if folded >= n {
                        period - folded
                    } else {
                        folded
                    }
                }
            }
            Self::Reflect => {
                let period = 2 * n;
                let folded = index.rem_euclid(period);
                if folded >= n {
                    period - 1 - folded
                } else {
                    folded
                }
            }
            Self::Wrap => index.rem_euclid(n),
        };
        Some(mapped as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapped(mode: BoundaryMode, extent: usize, range: std::ops::Range<isize>) -> Vec<Option<usize>> {
        range.map(|i| mode.map_index(i, extent)).collect()
    }

    #[test]
    fn test_in_range_is_identity() {
        for mode in [
            BoundaryMode::Constant(7.0),
            BoundaryMode::Nearest,
            BoundaryMode::Mirror,
            BoundaryMode::Reflect,
            BoundaryMode::Wrap,
        ] {
            for i in 0..5 {
                assert_eq!(mode.map_index(i, 5), Some(i as usize));
            }
        }
    }

    #[test]
    fn test_constant_outside_is_fill() {
        assert_eq!(
            mapped(BoundaryMode::Constant(1.0), 4, -2..6),
            vec![None, None, Some(0), Some(1), Some(2), Some(3), None, None]
        );
    }

    #[test]
    fn test_nearest_clamps() {
        assert_eq!(
            mapped(BoundaryMode::Nearest, 4, -2..6),
            vec![Some(0), Some(0), Some(0), Some(1), Some(2), Some(3), Some(3), Some(3)]
        );
    }

    #[test]
    fn test_mirror_skips_edge() {
        // d c b | a b c d | c b a
        assert_eq!(
            mapped(BoundaryMode::Mirror, 4, -3..7),
            vec![Some(3), Some(2), Some(1), Some(0), Some(1), Some(2), Some(3), Some(2), Some(1), Some(0)]
        );
    }

    #[test]
    fn test_reflect_repeats_edge() {
        // c b a | a b c d | d c b
        assert_eq!(
            mapped(BoundaryMode::Reflect, 4, -3..7),
            vec![Some(2), Some(1), Some(0), Some(0), Some(1), Some(2), Some(3), Some(3), Some(2), Some(1)]
        );
    }

    #[test]
    fn test_wrap_is_periodic() {
        assert_eq!(
            mapped(BoundaryMode::Wrap, 4, -3..7),
            vec![Some(1), Some(2), Some(3), Some(0), Some(1), Some(2), Some(3), Some(0), Some(1), Some(2)]
        );
    }

    #[test]
    fn test_single_sample_axis() {
        assert_eq!(BoundaryMode::Mirror.map_index(-5, 1), Some(0));
        assert_eq!(BoundaryMode::Reflect.map_index(3, 1), Some(0));
        assert_eq!(BoundaryMode::Wrap.map_index(-1, 1), Some(0));
    }

    #[test]
    fn test_code_table() {
        for code in 0..5 {
            let mode = BoundaryMode::from_code(code, 2.5).unwrap();
            assert_eq!(mode.code(), code);
        }
        assert_eq!(BoundaryMode::from_code(0, 2.5).unwrap().fill_value(), Some(2.5));
        assert_eq!(BoundaryMode::from_code(2, 2.5).unwrap().fill_value(), None);
        assert!(matches!(
            BoundaryMode::from_code(5, 0.0),
            Err(DeformError::InvalidParameter(_))
        ));
        assert!(BoundaryMode::from_code(-1, 0.0).is_err());
    }

    #[test]
    fn test_serde_representation() {
        let json = serde_json::to_string(&BoundaryMode::Constant(1.5)).unwrap();
        assert_eq!(json, r#"{"constant":1.5}"#);
        let mode: BoundaryMode = serde_json::from_str(r#""mirror""#).unwrap();
        assert_eq!(mode, BoundaryMode::Mirror);
    }
}
