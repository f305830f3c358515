//! Linear joint-space interpolation with a randomized step count.

use crate::error::DatagenError;
use crate::types::JointConfiguration;
use rand::Rng;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrajectoryConfig {
    /// Fewest interpolated steps in an episode. Must be at least 2.
    pub base_steps: usize,
    /// Step count is drawn from `base_steps .. base_steps + step_jitter`.
    pub step_jitter: usize,
    /// Copies of the final frame appended after the approach.
    pub settle_frames: usize,
}

impl Default for TrajectoryConfig {
    fn default() -> Self {
        Self { base_steps: 100, step_jitter: 10, settle_frames: 30 }
    }
}

impl TrajectoryConfig {
    pub fn validate(&self) -> Result<(), DatagenError> {
        if self.base_steps < 2 {
            return Err(DatagenError::InvalidConfig(format!(
                "base_steps must be at least 2, got {}",
                self.base_steps
            )));
        }
        Ok(())
    }

    pub fn draw_step_count<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        if self.step_jitter == 0 {
            self.base_steps
        } else {
            self.base_steps + rng.gen_range(0..self.step_jitter)
        }
    }
}

/// `steps` equally spaced configurations from `start` to `target`, both
/// endpoints included.
///
/// # Errors
///
/// [`DatagenError::InvalidConfig`] for `steps < 2` and
/// [`DatagenError::ShapeMismatch`] when the endpoints differ in length.
pub fn interpolate(
    start: &JointConfiguration,
    target: &JointConfiguration,
    steps: usize,
) -> Result<Vec<JointConfiguration>, DatagenError> {
    if steps < 2 {
        return Err(DatagenError::InvalidConfig(format!("trajectory needs at least 2 steps, got {steps}")));
    }
    target.expect_len(start.len())?;
    let span = (steps - 1) as f32;
    let delta: Vec<f32> = start
        .as_slice()
        .iter()
        .zip(target.as_slice())
        .map(|(s, t)| (t - s) / span)
        .collect();
    Ok((0..steps)
        .map(|i| {
            let k = i as f32;
            JointConfiguration::new(start.as_slice().iter().zip(&delta).map(|(s, d)| s + d * k).collect())
        })
        .collect())
}
