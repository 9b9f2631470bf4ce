//! Numeric element conversion.
//!
//! Sampling always accumulates in `f64`. Values are narrowed back to the
//! output element type with Rust's `as` rule: saturating at the type bounds,
//! truncating toward zero, NaN mapping to zero for integers.

use num_traits::AsPrimitive;

/// Array element that can be read into and written from the `f64` accumulator.
pub trait Sample: Copy + Send + Sync + 'static {
    /// Widen to the accumulator type.
    fn to_f64(self) -> f64;

    /// Narrow an accumulated value to this element type.
    fn from_f64(value: f64) -> Self;
}

impl<T> Sample for T
where
    T: AsPrimitive<f64> + Send + Sync,
    f64: AsPrimitive<T>,
{
    #[inline]
    fn to_f64(self) -> f64 {
        self.as_()
    }

    #[inline]
    fn from_f64(value: f64) -> Self {
        value.as_()
    }
}
