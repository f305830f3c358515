#![deny(clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
//! # Reaching Data Generation
//!
//! Produces datasets of a simulated arm reaching toward randomly placed
//! targets, for training visuomotor sequence models.
//!
//! ## Pipeline
//!
//! For each episode an [`EpisodeGenerator`]:
//!
//! 1.  resets the robot to its home configuration,
//! 2.  draws Gaussian targets from a [`PoseSampler`] until the
//!     [`KinematicsAdapter`] solves one (at most `max_ik_attempts` draws),
//! 3.  places a marker at the target through the [`SceneController`],
//! 4.  interpolates linearly from home to the IK solution over a randomized
//!     number of steps, and
//! 5.  captures one [`Frame`] per step with an [`EpisodeRecorder`], padding
//!     the end with a settle tail.
//!
//! [`generate_sequential`] and [`generate_parallel`] turn that into a
//! [`Dataset`], which a [`ProjectStore`] persists per project.
//! [`FeedbackDriver`] replays a [`SequencePredictor`] in closed loop against
//! the same scene.
//!
//! ```rust,ignore
//! use datagen::{ArmIk, EpisodeGenerator, GenerationConfig, SimScene};
//! use physics::{ArmDescription, ArmModel};
//!
//! let model = ArmModel::from_description(ArmDescription::kuka_iiwa())?;
//! let ik = ArmIk::new(model.clone(), "lbr_iiwa_link_7")?;
//! let mut scene = SimScene::new(model);
//! let mut generator = EpisodeGenerator::new(GenerationConfig::default(), ik)?;
//! let episode = generator.generate(&mut scene)?;
//! ```

pub mod aggregator;
pub mod config;
pub mod error;
pub mod feedback;
pub mod kinematics;
pub mod predictor;
pub mod recorder;
pub mod sampler;
pub mod scene;
pub mod store;
pub mod trajectory;
pub mod types;

pub use aggregator::{
    generate_parallel, generate_sequential, partition, GenerationSummary, WorkerOutcome, WorkerReport,
};
pub use config::GenerationConfig;
pub use error::DatagenError;
pub use feedback::FeedbackDriver;
pub use kinematics::{sample_reachable, ArmIk, KinematicsAdapter, ReachSolution};
pub use predictor::{NearestNeighborPropagator, SequencePredictor};
pub use recorder::{EpisodeGenerator, EpisodeRecorder};
pub use sampler::{PoseSampler, SamplerConfig};
pub use scene::{SceneController, SimScene};
pub use store::{Manifest, ProjectStore};
pub use trajectory::{interpolate, TrajectoryConfig};
pub use types::{Dataset, Episode, Frame, JointConfiguration, TargetPose};
