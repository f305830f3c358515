//! Generation settings. Defaults reproduce the reference KUKA reaching run.

use crate::error::DatagenError;
use crate::recorder::EpisodeRecorder;
use crate::sampler::SamplerConfig;
use crate::trajectory::TrajectoryConfig;

#[derive(Clone, Debug, PartialEq)]
pub struct GenerationConfig {
    /// Side length of the square captured images, in pixels.
    pub resolution: u32,
    pub with_depth: bool,
    /// Configuration the robot is reset to before each episode.
    pub home: Vec<f32>,
    pub max_ik_attempts: usize,
    pub seed: u64,
    pub sampler: SamplerConfig,
    pub trajectory: TrajectoryConfig,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            resolution: 224,
            with_depth: false,
            home: vec![0.2; 7],
            max_ik_attempts: 1000,
            seed: 1,
            sampler: SamplerConfig::default(),
            trajectory: TrajectoryConfig::default(),
        }
    }
}

impl GenerationConfig {
    pub fn validate(&self) -> Result<(), DatagenError> {
        if self.resolution == 0 {
            return Err(DatagenError::InvalidConfig("resolution must be positive".into()));
        }
        if self.max_ik_attempts == 0 {
            return Err(DatagenError::InvalidConfig("max_ik_attempts must be positive".into()));
        }
        if self.home.is_empty() {
            return Err(DatagenError::InvalidConfig("home configuration is empty".into()));
        }
        self.trajectory.validate()
    }

    /// Same settings, seeded for worker `worker`.
    ///
    /// The worker seed is a splitmix64 mix of the base seed and the worker
    /// id, so neighbouring base seeds do not share worker streams.
    #[must_use]
    pub fn for_worker(&self, worker: usize) -> Self {
        Self { seed: worker_seed(self.seed, worker), ..self.clone() }
    }

    #[must_use]
    pub fn recorder(&self) -> EpisodeRecorder {
        EpisodeRecorder {
            resolution: self.resolution,
            with_depth: self.with_depth,
            settle_frames: self.trajectory.settle_frames,
        }
    }
}

fn worker_seed(seed: u64, worker: usize) -> u64 {
    let mut z = seed ^ (worker as u64).wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
