//! 1-D B-spline basis weights.

use super::order::{SplineOrder, MAX_SUPPORT};

/// First support index and basis weights for evaluating at coordinate `x`.
///
/// Odd orders centre the support on `floor(x)`, even orders on the nearest
/// integer, so the support is `start..start + order + 1`. Only the first
/// `order + 1` weights are meaningful and they sum to one.
#[inline]
pub fn spline_weights(order: SplineOrder, x: f64) -> (isize, [f64; MAX_SUPPORT]) {
    let degree = order.get();
    let center = if degree % 2 == 1 {
        x.floor()
    } else {
        (x + 0.5).floor()
    };
    let start = (center as isize).saturating_sub((degree / 2) as isize);
    let t = x - center;

    let mut w = [0.0; MAX_SUPPORT];
    match degree {
        0 => {}
        1 => {
            w[0] = 1.0 - t;
        }
        2 => {
            // -0.5 <= t < 0.5
            w[1] = 0.75 - t * t;
            let y = 0.5 - t;
            w[0] = 0.5 * y * y;
        }
        3 => {
            // 0 <= t < 1
            let z = 1.0 - t;
            w[1] = (t * t * (t - 2.0) * 3.0 + 4.0) / 6.0;
            w[2] = (z * z * (z - 2.0) * 3.0 + 4.0) / 6.0;
            w[0] = z * z * z / 6.0;
        }
        4 => {
            let z = 1.0 - t;
            let t2 = t * t;
            w[2] = t2 * (t2 * 0.25 - 0.625) + 115.0 / 192.0;
            let y = 1.0 + t;
            w[1] = y * (y * (y * (5.0 - y) / 6.0 - 1.25) + 5.0 / 24.0) + 55.0 / 96.0;
            w[3] = z * (z * (z * (5.0 - z) / 6.0 - 1.25) + 5.0 / 24.0) + 55.0 / 96.0;
            let y = 0.5 - t;
            let y2 = y * y;
            w[0] = y2 * y2 / 24.0;
        }
        _ => {
            let t2 = t * t;
            w[2] = t2 * (t2 * (0.25 - t / 12.0) - 0.5) + 0.55;
            let z = 1.0 - t;
            let z2 = z * z;
            w[3] = z2 * (z2 * (0.25 - z / 12.0) - 0.5) + 0.55;
            let y = t + 1.0;
            w[1] = y * (y * (y * (y * (y / 24.0 - 0.375) + 1.25) - 1.75) + 0.625) + 0.425;
            let z = z + 1.0;
            w[4] = z * (z * (z * (z * (z / 24.0 - 0.375) + 1.25) - 1.75) + 0.625) + 0.425;
            let y = 1.0 - t;
            let y2 = y * y;
            w[0] = y * y2 * y2 / 120.0;
        }
    }

    // The weights form a partition of unity; the last one closes the sum.
    let last = degree as usize;
    w[last] = 1.0 - w[..last].iter().sum::<f64>();
    (start, w)
}
