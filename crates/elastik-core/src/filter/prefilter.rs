//! B-spline prefilter.
//!
//! Converts sampled values into B-spline coefficients so that evaluating the
//! spline at integer coordinates reproduces the samples. How a line is
//! converted depends on how the resampler extends it past the edges:
//!
//! | mode                  | conversion                                        |
//! |-----------------------|---------------------------------------------------|
//! | `mirror`              | recursive, whole-sample symmetric initialisation  |
//! | `reflect`             | recursive, half-sample symmetric initialisation   |
//! | `wrap`                | recursive, periodic initialisation                |
//! | `constant`, `nearest` | direct solve of the banded interpolation system   |
//!
//! The recursive filter runs one causal and one anti-causal first-order
//! recursion per pole. Its initial values sum the signal as the symmetric or
//! periodic extension continues it. Fill values and clamped edges are not
//! such extensions, so for those modes the interpolation equations are built
//! from the resampler's own index mapping and solved by banded elimination.

use ndarray::{ArrayViewMut1, ArrayViewMutD, Axis, Zip};

use crate::boundary::BoundaryMode;
use crate::error::{DeformError, Result};
use crate::interpolation::{spline_weights, SplineOrder, MAX_SUPPORT};

/// Extension assumed while initialising the recursions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Extension {
    WholeSample,
    HalfSample,
    Periodic,
}

/// How one line of samples is turned into coefficients.
#[derive(Debug, Clone, PartialEq)]
enum Method {
    Recursive { poles: Vec<f64>, extension: Extension },
    Banded(BandedSystem),
}

impl Method {
    fn new(order: SplineOrder, mode: BoundaryMode) -> Self {
        let extension = match mode {
            BoundaryMode::Mirror => Extension::WholeSample,
            BoundaryMode::Reflect => Extension::HalfSample,
            BoundaryMode::Wrap => Extension::Periodic,
            BoundaryMode::Constant(_) | BoundaryMode::Nearest => {
                return Self::Banded(BandedSystem::new(order, mode));
            }
        };
        Self::Recursive {
            poles: order.poles(),
            extension,
        }
    }

    /// Lines this short are their own coefficients.
    fn skips(&self, len: usize) -> bool {
        match self {
            Self::Recursive { .. } => len < 2,
            Self::Banded(_) => false,
        }
    }

    fn filter(&self, line: &mut [f64]) {
        match self {
            Self::Recursive { poles, extension } => filter_line(line, poles, *extension),
            Self::Banded(system) => system.solve(line),
        }
    }
}

/// Interpolation equations of a line under `constant` or `nearest` extension.
///
/// Row `i` holds the basis weights of the taps read when evaluating at `i`,
/// each added to the column the resampler maps that tap to. Taps past the
/// edge in `constant` mode read the fill value, which is moved to the right
/// hand side by solving for `coefficients - fill`. The matrix is strictly
/// diagonally dominant for every order, so elimination needs no pivoting.
#[derive(Debug, Clone, PartialEq)]
struct BandedSystem {
    mode: BoundaryMode,
    start: isize,
    weights: [f64; MAX_SUPPORT],
    width: usize,
    half_band: usize,
}

impl BandedSystem {
    fn new(order: SplineOrder, mode: BoundaryMode) -> Self {
        let (start, weights) = spline_weights(order, 0.0);
        let width = order.support();
        let last_offset = start + width as isize - 1;
        let half_band = start.unsigned_abs().max(last_offset.unsigned_abs());
        Self {
            mode,
            start,
            weights,
            width,
            half_band,
        }
    }

    fn solve(&self, line: &mut [f64]) {
        let n = line.len();
        let h = self.half_band;
        let band = 2 * h + 1;
        // Entry (i, j) lives at i * band + j + h - i.
        let at = |i: usize, j: usize| i * band + j + h - i;

        let fill = self.mode.fill_value().unwrap_or(0.0);
        line.iter_mut().for_each(|value| *value -= fill);

        let mut matrix = vec![0.0; n * band];
        for i in 0..n {
            for (k, &weight) in self.weights[..self.width].iter().enumerate() {
                let tap = (i as isize).saturating_add(self.start + k as isize);
                if let Some(j) = self.mode.map_index(tap, n) {
                    matrix[at(i, j)] += weight;
                }
            }
        }

        for p in 0..n {
            let pivot = matrix[at(p, p)];
            let last = n.min(p + h + 1);
            for r in p + 1..last {
                let factor = matrix[at(r, p)] / pivot;
                if factor == 0.0 {
                    continue;
                }
                for c in p..last {
                    matrix[at(r, c)] -= factor * matrix[at(p, c)];
                }
                line[r] -= factor * line[p];
            }
        }
        for p in (0..n).rev() {
            let last = n.min(p + h + 1);
            let mut value = line[p];
            for c in p + 1..last {
                value -= matrix[at(p, c)] * line[c];
            }
            line[p] = value / matrix[at(p, p)];
        }

        line.iter_mut().for_each(|value| *value += fill);
    }
}

/// Separable in-place spline prefilter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplinePrefilter {
    order: SplineOrder,
    mode: BoundaryMode,
}

impl SplinePrefilter {
    pub fn new(order: SplineOrder, mode: BoundaryMode) -> Self {
        Self { order, mode }
    }

    pub fn order(&self) -> SplineOrder {
        self.order
    }

    /// Replace the samples in `data` with spline coefficients.
    ///
    /// Orders 0 and 1 leave the data untouched. Axes of length one are
    /// skipped except in `constant` mode, where the fill value takes part in
    /// every evaluation and the single coefficient has to make up for it.
    ///
    /// # Errors
    /// `ShapeMismatch` when `data` has rank zero or an empty axis.
    pub fn apply(&self, data: &mut ArrayViewMutD<'_, f64>) -> Result<()> {
        if data.ndim() == 0 {
            return Err(DeformError::shape_mismatch(
                "cannot prefilter a rank-0 array",
            ));
        }
        if let Some(axis) = data.shape().iter().position(|&extent| extent == 0) {
            return Err(DeformError::shape_mismatch(format!(
                "axis {axis} has no samples, the spline support needs at least one"
            )));
        }
        if !self.order.needs_prefilter() {
            return Ok(());
        }

        let method = Method::new(self.order, self.mode);
        for axis in 0..data.ndim() {
            if method.skips(data.len_of(Axis(axis))) {
                continue;
            }
            Zip::from(data.lanes_mut(Axis(axis))).par_for_each(|mut lane| {
                filter_lane(&mut lane, &method);
            });
        }
        Ok(())
    }
}

fn filter_lane(lane: &mut ArrayViewMut1<'_, f64>, method: &Method) {
    match lane.as_slice_mut() {
        Some(line) => method.filter(line),
        None => {
            let mut line = lane.to_vec();
            method.filter(&mut line);
            lane.iter_mut()
                .zip(line)
                .for_each(|(slot, value)| *slot = value);
        }
    }
}

/// Convert one line of samples to coefficients. Requires `line.len() >= 2`.
fn filter_line(line: &mut [f64], poles: &[f64], extension: Extension) {
    let gain: f64 = poles.iter().map(|&z| (1.0 - z) * (1.0 - 1.0 / z)).product();
    line.iter_mut().for_each(|value| *value *= gain);

    let n = line.len();
    for &z in poles {
        line[0] = causal_initial(line, z, extension);
        for i in 1..n {
            line[i] += z * line[i - 1];
        }
        line[n - 1] = anticausal_initial(line, z, extension);
        for i in (0..n - 1).rev() {
            line[i] = z * (line[i + 1] - line[i]);
        }
    }
}

fn causal_initial(line: &[f64], z: f64, extension: Extension) -> f64 {
    let n = line.len();
    match extension {
        Extension::WholeSample => {
            let z_n1 = z.powf((n - 1) as f64);
            let mut z_i = z;
            let mut sum = line[0] + z_n1 * line[n - 1];
            for i in 1..n - 1 {
                sum += z_i * (line[i] + z_n1 * line[n - 1 - i]);
                z_i *= z;
            }
            sum / (1.0 - z_n1 * z_n1)
        }
        Extension::HalfSample => {
            let z_n = z.powf(n as f64);
            let mut z_i = z;
            let mut sum = line[0] + z_n * line[n - 1];
            for i in 1..n {
                sum += z_i * (line[i] + z_n * line[n - 1 - i]);
                z_i *= z;
            }
            line[0] + sum * z / (1.0 - z_n * z_n)
        }
        Extension::Periodic => {
            let mut z_i = z;
            let mut sum = line[0];
            for i in 1..n {
                sum += z_i * line[n - i];
                z_i *= z;
            }
            // z_i == z^n
            sum / (1.0 - z_i)
        }
    }
}

fn anticausal_initial(line: &[f64], z: f64, extension: Extension) -> f64 {
    let n = line.len();
    match extension {
        Extension::WholeSample => (z * line[n - 2] + line[n - 1]) * z / (z * z - 1.0),
        Extension::HalfSample => line[n - 1] * z / (z - 1.0),
        Extension::Periodic => {
            let mut z_i = z;
            let mut sum = line[n - 1];
            for &value in &line[..n - 1] {
                sum += z_i * value;
                z_i *= z;
            }
            sum * z / (z_i - 1.0)
        }
    }
}
