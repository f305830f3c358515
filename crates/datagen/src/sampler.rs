//! Gaussian target sampling around a nominal reaching position.

use crate::error::DatagenError;
use crate::types::TargetPose;
use glam::Vec3;
use rand::Rng;
use rand_distr::{Distribution, Normal};

#[derive(Clone, Debug, PartialEq)]
pub struct SamplerConfig {
    pub nominal: Vec3,
    /// Per-axis standard deviation of the offset from `nominal`.
    pub std_dev: Vec3,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self { nominal: Vec3::new(0.5, 0.0, 0.3), std_dev: Vec3::new(0.2, 0.5, 0.1) }
    }
}

/// Draws target positions. Reachability is not checked here; see
/// [`crate::kinematics::sample_reachable`].
#[derive(Clone, Debug)]
pub struct PoseSampler {
    nominal: Vec3,
    axes: [Normal<f32>; 3],
}

impl PoseSampler {
    pub fn new(config: &SamplerConfig) -> Result<Self, DatagenError> {
        let axis = |sd: f32| {
            if !(sd.is_finite() && sd >= 0.0) {
                return Err(DatagenError::InvalidConfig(format!(
                    "standard deviation must be finite and non-negative, got {sd}"
                )));
            }
            Normal::new(0.0, sd)
                .map_err(|e| DatagenError::InvalidConfig(format!("standard deviation {sd}: {e}")))
        };
        Ok(Self {
            nominal: config.nominal,
            axes: [axis(config.std_dev.x)?, axis(config.std_dev.y)?, axis(config.std_dev.z)?],
        })
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> TargetPose {
        let offset = Vec3::new(self.axes[0].sample(rng), self.axes[1].sample(rng), self.axes[2].sample(rng));
        TargetPose { position: self.nominal + offset }
    }
}
