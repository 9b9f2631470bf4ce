//! Random displacement grids.

use ndarray::{ArrayD, IxDyn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::error::{AugmentError, Result};

/// Control points per axis: one count for every axis, or one count each.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GridPoints {
    Uniform(usize),
    PerAxis(Vec<usize>),
}

impl Default for GridPoints {
    fn default() -> Self {
        Self::Uniform(3)
    }
}

impl From<usize> for GridPoints {
    fn from(points: usize) -> Self {
        Self::Uniform(points)
    }
}

impl From<Vec<usize>> for GridPoints {
    fn from(points: Vec<usize>) -> Self {
        Self::PerAxis(points)
    }
}

impl GridPoints {
    /// Control point counts for an `ndim`-dimensional input.
    pub fn resolve(&self, ndim: usize) -> Result<Vec<usize>> {
        let points = match self {
            Self::Uniform(points) => vec![*points; ndim],
            Self::PerAxis(points) => {
                if points.len() != ndim {
                    return Err(AugmentError::invalid_configuration(format!(
                        "{} control point counts given for {ndim} axes",
                        points.len()
                    )));
                }
                points.clone()
            }
        };
        if let Some(axis) = points.iter().position(|&count| count == 0) {
            return Err(AugmentError::invalid_configuration(format!(
                "axis {axis} needs at least one control point"
            )));
        }
        Ok(points)
    }
}

/// Normally distributed displacement grid generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomGrid {
    /// Standard deviation of every displacement, in samples.
    pub sigma: f64,
    pub points: GridPoints,
    /// Fixed seed for reproducible grids.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for RandomGrid {
    fn default() -> Self {
        Self {
            sigma: 25.0,
            points: GridPoints::default(),
            seed: None,
        }
    }
}

impl RandomGrid {
    pub fn new(sigma: f64, points: impl Into<GridPoints>) -> Self {
        Self {
            sigma,
            points: points.into(),
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.sigma.is_finite() || self.sigma < 0.0 {
            return Err(AugmentError::invalid_configuration(format!(
                "sigma must be finite and non-negative, got {}",
                self.sigma
            )));
        }
        if let GridPoints::PerAxis(points) = &self.points {
            if points.contains(&0) {
                return Err(AugmentError::invalid_configuration(
                    "every axis needs at least one control point",
                ));
            }
        }
        if self.points == GridPoints::Uniform(0) {
            return Err(AugmentError::invalid_configuration(
                "every axis needs at least one control point",
            ));
        }
        Ok(())
    }

    /// Grid shape `[ndim, points...]` for an `ndim`-dimensional input.
    pub fn shape(&self, ndim: usize) -> Result<Vec<usize>> {
        let mut shape = Vec::with_capacity(ndim + 1);
        shape.push(ndim);
        shape.extend(self.points.resolve(ndim)?);
        Ok(shape)
    }

    /// Draw a grid, seeded from `seed` when set and from entropy otherwise.
    pub fn sample(&self, ndim: usize) -> Result<ArrayD<f64>> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.sample_with(ndim, &mut rng)
    }

    /// Draw a grid from a caller-provided generator.
    pub fn sample_with<R: Rng + ?Sized>(&self, ndim: usize, rng: &mut R) -> Result<ArrayD<f64>> {
        self.validate()?;
        let shape = self.shape(ndim)?;
        let normal = Normal::new(0.0, self.sigma)
            .map_err(|err| AugmentError::invalid_configuration(err.to_string()))?;
        tracing::debug!("Drawing displacement grid {:?} with sigma {}", shape, self.sigma);
        Ok(ArrayD::from_shape_simple_fn(IxDyn(&shape), || normal.sample(rng)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_resolution() {
        assert_eq!(RandomGrid::new(1.0, 3).shape(2).unwrap(), vec![2, 3, 3]);
        assert_eq!(RandomGrid::new(1.0, vec![2, 4, 5]).shape(3).unwrap(), vec![3, 2, 4, 5]);
        assert!(RandomGrid::new(1.0, vec![2, 4]).shape(3).is_err());
    }

    #[test]
    fn test_seeded_grids_repeat() {
        let grid = RandomGrid::new(4.0, 3).with_seed(17);
        assert_eq!(grid.sample(2).unwrap(), grid.sample(2).unwrap());
        let other = RandomGrid::new(4.0, 3).with_seed(18);
        assert_ne!(grid.sample(2).unwrap(), other.sample(2).unwrap());
    }

    #[test]
    fn test_zero_sigma_gives_zero_grid() {
        let grid = RandomGrid::new(0.0, 4).with_seed(1).sample(3).unwrap();
        assert_eq!(grid.shape(), &[3, 4, 4, 4]);
        assert!(grid.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_sample_spread_follows_sigma() {
        let grid = RandomGrid::new(5.0, 40).with_seed(3).sample(2).unwrap();
        let n = grid.len() as f64;
        let mean = grid.sum() / n;
        let std = (grid.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
        assert!(mean.abs() < 0.5, "mean {mean}");
        assert!((std - 5.0).abs() < 0.5, "std {std}");
    }

    #[test]
    fn test_validation() {
        assert!(RandomGrid::new(-1.0, 3).validate().is_err());
        assert!(RandomGrid::new(f64::NAN, 3).validate().is_err());
        assert!(RandomGrid::new(1.0, 0).validate().is_err());
        assert!(RandomGrid::new(1.0, vec![3, 0]).validate().is_err());
    }

    #[test]
    fn test_serde_forms() {
        let grid: RandomGrid = serde_json::from_str(r#"{"sigma": 2.0, "points": 5}"#).unwrap();
        assert_eq!(grid.points, GridPoints::Uniform(5));
        assert_eq!(grid.seed, None);
        let grid: RandomGrid =
            serde_json::from_str(r#"{"sigma": 2.0, "points": [3, 4], "seed": 9}"#).unwrap();
        assert_eq!(grid.points, GridPoints::PerAxis(vec![3, 4]));
        assert_eq!(grid.seed, Some(9));
    }
}
