//! Elastic deformation configuration.

use elastik_core::ChannelParams;
use serde::{Deserialize, Serialize};

use crate::crop::Crop;
use crate::error::{AugmentError, Result};
use crate::random::{GridPoints, RandomGrid};

/// Settings of an [`ElasticDeform`](crate::ElasticDeform) transform.
///
/// # Example
/// ```
/// use elastik_augment::ElasticConfig;
///
/// let config = ElasticConfig::from_json(
///     r#"{
///         "sigma": 4.0,
///         "points": [3, 5],
///         "channels": [
///             {"order": 3, "mode": {"constant": 0.0}},
///             {"order": 0, "mode": "nearest"}
///         ],
///         "seed": 7
///     }"#,
/// )
/// .unwrap();
/// assert_eq!(config.channels.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElasticConfig {
    /// Standard deviation of the control point displacements, in samples.
    pub sigma: f64,
    pub points: GridPoints,
    /// One entry per channel, or a single entry shared by every channel.
    pub channels: Vec<ChannelParams>,
    pub crop: Option<Crop>,
    pub seed: Option<u64>,
}

impl Default for ElasticConfig {
    fn default() -> Self {
        let grid = RandomGrid::default();
        Self {
            sigma: grid.sigma,
            points: grid.points,
            channels: vec![ChannelParams::default()],
            crop: None,
            seed: None,
        }
    }
}

impl ElasticConfig {
    pub fn new(sigma: f64, points: impl Into<GridPoints>) -> Self {
        Self {
            sigma,
            points: points.into(),
            ..Self::default()
        }
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn with_channels(mut self, channels: Vec<ChannelParams>) -> Self {
        self.channels = channels;
        self
    }

    pub fn with_crop(mut self, crop: Crop) -> Self {
        self.crop = Some(crop);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.random_grid().validate()?;
        if self.channels.is_empty() {
            return Err(AugmentError::invalid_configuration(
                "at least one channel must be configured",
            ));
        }
        Ok(())
    }

    /// The grid generator described by this configuration.
    pub fn random_grid(&self) -> RandomGrid {
        RandomGrid {
            sigma: self.sigma,
            points: self.points.clone(),
            seed: self.seed,
        }
    }

    /// Parameters for each of `count` channels, broadcasting a single entry.
    pub fn channel_params(&self, count: usize) -> Result<Vec<ChannelParams>> {
        match self.channels.as_slice() {
            [shared] => Ok(vec![*shared; count]),
            channels if channels.len() == count => Ok(channels.to_vec()),
            channels => Err(AugmentError::invalid_configuration(format!(
                "{} channel settings configured for {count} channels",
                channels.len()
            ))),
        }
    }
}
