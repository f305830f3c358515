//! # Episode Recording
//!
//! [`EpisodeRecorder`] walks a scene through a joint trajectory and captures
//! one [`Frame`] per step, then pads the episode with a settle tail.
//! [`EpisodeGenerator`] is the full per-episode loop: reset the robot, find a
//! reachable target, mark it, interpolate and record.

use crate::config::GenerationConfig;
use crate::error::DatagenError;
use crate::kinematics::{sample_reachable, KinematicsAdapter};
use crate::sampler::PoseSampler;
use crate::scene::SceneController;
use crate::trajectory::interpolate;
use crate::types::{Episode, Frame, JointConfiguration, TargetPose};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EpisodeRecorder {
    pub resolution: u32,
    pub with_depth: bool,
    pub settle_frames: usize,
}

impl EpisodeRecorder {
    /// Capture image, optional depth and joint angles at the current instant.
    pub fn capture_frame<S: SceneController + ?Sized>(&self, scene: &mut S) -> Result<Frame, DatagenError> {
        let (rgb, depth) = scene.capture(self.resolution)?;
        Ok(Frame { rgb, depth: self.with_depth.then_some(depth), angles: scene.joint_configuration() })
    }

    /// Apply each configuration of `trajectory` in turn, capturing a frame
    /// after each, and append `settle_frames` copies of the last frame.
    pub fn record<S: SceneController + ?Sized>(
        &self,
        scene: &mut S,
        target: TargetPose,
        trajectory: &[JointConfiguration],
    ) -> Result<Episode, DatagenError> {
        let mut frames = Vec::with_capacity(trajectory.len() + self.settle_frames);
        for cfg in trajectory {
            scene.set_joint_configuration(cfg)?;
            frames.push(self.capture_frame(scene)?);
        }
        let last = frames.last().cloned().ok_or(DatagenError::EmptyEpisode)?;
        frames.extend(std::iter::repeat(last).take(self.settle_frames));
        Episode::new(target, frames, self.settle_frames)
    }
}

/// Per-worker episode source. Owns the randomness and the IK adapter; the
/// scene is borrowed per call so the caller keeps ownership of it.
pub struct EpisodeGenerator<K> {
    config: GenerationConfig,
    sampler: PoseSampler,
    recorder: EpisodeRecorder,
    ik: K,
    rng: StdRng,
    generated: usize,
}

impl<K: KinematicsAdapter> EpisodeGenerator<K> {
    pub fn new(config: GenerationConfig, ik: K) -> Result<Self, DatagenError> {
        config.validate()?;
        let sampler = PoseSampler::new(&config.sampler)?;
        let recorder = config.recorder();
        let rng = StdRng::seed_from_u64(config.seed);
        Ok(Self { config, sampler, recorder, ik, rng, generated: 0 })
    }

    /// Record one reaching episode in `scene`.
    ///
    /// # Errors
    ///
    /// [`DatagenError::RetriesExhausted`] when no reachable target turned up
    /// within `max_ik_attempts` draws, [`DatagenError::ShapeMismatch`] when the
    /// home configuration does not fit the robot, and any render failure.
    pub fn generate<S: SceneController + ?Sized>(&mut self, scene: &mut S) -> Result<Episode, DatagenError> {
        scene.set_joint_configuration(&JointConfiguration::new(self.config.home.clone()))?;
        let start = scene.joint_configuration();

        let solution =
            sample_reachable(&self.sampler, &mut self.rng, &mut self.ik, &start, self.config.max_ik_attempts)?;
        debug!(attempts = solution.attempts, target = ?solution.target.position, "target solved");
        scene.place_marker(solution.target.position)?;

        let steps = self.config.trajectory.draw_step_count(&mut self.rng);
        let path = interpolate(&start, &solution.angles, steps)?;
        let episode = self.recorder.record(scene, solution.target, &path)?;

        self.generated += 1;
        info!(
            episode = self.generated,
            frames = episode.len(),
            steps,
            target = ?solution.target.position,
            "episode recorded"
        );
        Ok(episode)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::trajectory::TrajectoryConfig;
    use glam::Vec3;
    use render::{DepthImage, RgbImage};

    /// Scene that "renders" the first joint angle into every pixel so frames
    /// can be told apart without a renderer.
    pub(crate) struct FakeScene {
        pub angles: Vec<f32>,
        pub markers: Vec<Vec3>,
        pub captures: usize,
    }

    impl FakeScene {
        pub(crate) fn new(joints: usize) -> Self {
            Self { angles: vec![0.0; joints], markers: Vec::new(), captures: 0 }
        }
    }

    impl SceneController for FakeScene {
        fn joint_count(&self) -> usize {
            self.angles.len()
        }

        fn set_joint_configuration(&mut self, cfg: &JointConfiguration) -> Result<(), DatagenError> {
            cfg.expect_len(self.angles.len())?;
            self.angles.copy_from_slice(cfg.as_slice());
            Ok(())
        }

        fn joint_configuration(&self) -> JointConfiguration {
            JointConfiguration::new(self.angles.clone())
        }

        fn place_marker(&mut self, position: Vec3) -> Result<(), DatagenError> {
            self.markers.push(position);
            Ok(())
        }

        fn capture(&mut self, resolution: u32) -> Result<(RgbImage, DepthImage), DatagenError> {
            self.captures += 1;
            let n = (resolution * resolution) as usize;
            let shade = (self.angles[0] * 100.0).clamp(0.0, 255.0) as u8;
            Ok((RgbImage::new(resolution, vec![shade; n * 3])?, DepthImage::new(resolution, vec![self.angles[0]; n])?))
        }
    }

    /// IK that returns the target's coordinates as joint angles.
    pub(crate) struct EchoIk;

    impl KinematicsAdapter for EchoIk {
        fn solve(&mut self, target: &TargetPose, current: &JointConfiguration) -> Result<JointConfiguration, DatagenError> {
            Ok(JointConfiguration::new(
                (0..current.len()).map(|i| target.position.to_array()[i % 3].abs()).collect(),
            ))
        }
    }

    fn recorder(settle_frames: usize) -> EpisodeRecorder {
        EpisodeRecorder { resolution: 4, with_depth: false, settle_frames }
    }

    #[test]
    fn settle_tail_repeats_final_frame() {
        let mut scene = FakeScene::new(2);
        let path = interpolate(&JointConfiguration::uniform(2, 0.0), &JointConfiguration::uniform(2, 1.0), 5).unwrap();
        let target = TargetPose { position: Vec3::ONE };
        let episode = recorder(30).record(&mut scene, target, &path).unwrap();

        assert_eq!(episode.len(), 5 + 30);
        assert_eq!(episode.approach_len(), 5);
        assert_eq!(scene.captures, 5);
        let last = &episode.frames()[4];
        assert!(episode.frames()[5..].iter().all(|f| f == last));
        assert_ne!(episode.frames()[0], *last);
    }

    #[test]
    fn two_step_trajectory_from_zero_to_one() {
        let mut scene = FakeScene::new(2);
        let path = interpolate(&JointConfiguration::new(vec![0.0, 0.0]), &JointConfiguration::new(vec![1.0, 1.0]), 2)
            .unwrap();
        let episode = recorder(30).record(&mut scene, TargetPose { position: Vec3::ZERO }, &path).unwrap();
        let angles: Vec<_> = episode.frames().iter().map(|f| f.angles.as_slice().to_vec()).collect();
        assert_eq!(angles.len(), 32);
        assert_eq!(angles[0], [0.0, 0.0]);
        assert!(angles[1..].iter().all(|a| a == &[1.0, 1.0]));
    }

    #[test]
    fn depth_is_kept_only_when_requested() {
        let mut scene = FakeScene::new(1);
        let with = EpisodeRecorder { with_depth: true, ..recorder(0) };
        assert!(with.capture_frame(&mut scene).unwrap().depth.is_some());
        assert!(recorder(0).capture_frame(&mut scene).unwrap().depth.is_none());
    }

    #[test]
    fn generator_resets_to_home_and_marks_target() {
        let config = GenerationConfig {
            resolution: 4,
            home: vec![0.2; 3],
            trajectory: TrajectoryConfig { base_steps: 10, step_jitter: 5, settle_frames: 3 },
            ..GenerationConfig::default()
        };
        let mut generator = EpisodeGenerator::new(config, EchoIk).unwrap();
        let mut scene = FakeScene::new(3);

        for _ in 0..3 {
            let episode = generator.generate(&mut scene).unwrap();
            assert_eq!(episode.frames()[0].angles.as_slice(), &[0.2; 3]);
            assert!((10..15).contains(&episode.approach_len()));
            assert_eq!(episode.len(), episode.approach_len() + 3);
            assert_eq!(scene.markers.last().copied(), Some(episode.target().position));
        }
        assert_eq!(scene.markers.len(), 3);
    }

    #[test]
    fn generator_is_reproducible_for_a_seed() {
        let config = GenerationConfig {
            resolution: 2,
            home: vec![0.0; 3],
            trajectory: TrajectoryConfig { base_steps: 4, step_jitter: 4, settle_frames: 1 },
            ..GenerationConfig::default()
        };
        let run = || {
            let mut generator = EpisodeGenerator::new(config.clone(), EchoIk).unwrap();
            let mut scene = FakeScene::new(3);
            (0..4).map(|_| generator.generate(&mut scene).unwrap()).collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn mismatched_home_is_fatal() {
        let config = GenerationConfig { resolution: 2, home: vec![0.2; 7], ..GenerationConfig::default() };
        let mut generator = EpisodeGenerator::new(config, EchoIk).unwrap();
        let err = generator.generate(&mut FakeScene::new(3)).unwrap_err();
        assert!(matches!(err, DatagenError::ShapeMismatch { expected: 3, actual: 7 }));
    }
}
