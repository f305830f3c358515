//! Inverse-kinematics adapter and the resample-until-reachable loop.

use crate::error::DatagenError;
use crate::sampler::PoseSampler;
use crate::types::{JointConfiguration, TargetPose};
use physics::{ArmModel, IkSolver, PhysicsError};
use rand::Rng;
use tracing::debug;

/// Turns a target position into joint angles.
pub trait KinematicsAdapter {
    /// # Errors
    ///
    /// [`DatagenError::UnreachablePose`] when no solution exists within the
    /// solver tolerance; [`DatagenError::ShapeMismatch`] when `current` has
    /// the wrong number of joints.
    fn solve(&mut self, target: &TargetPose, current: &JointConfiguration) -> Result<JointConfiguration, DatagenError>;
}

/// [`KinematicsAdapter`] over the physics crate's damped-least-squares solver.
/// Holds its own copy of the arm model, independent of any scene.
#[derive(Clone, Debug)]
pub struct ArmIk {
    model: ArmModel,
    solver: IkSolver,
    effector: usize,
}

impl ArmIk {
    pub fn new(model: ArmModel, end_effector: &str) -> Result<Self, DatagenError> {
        let effector = model.link_index(end_effector)?;
        Ok(Self { model, solver: IkSolver::default(), effector })
    }
}

impl KinematicsAdapter for ArmIk {
    fn solve(&mut self, target: &TargetPose, current: &JointConfiguration) -> Result<JointConfiguration, DatagenError> {
        current.expect_len(self.model.joint_count())?;
        match self.solver.solve(&self.model, target.position, current.as_slice(), self.effector) {
            Ok(angles) => Ok(JointConfiguration::new(angles)),
            Err(PhysicsError::IkFailed { residual, .. }) => {
                Err(DatagenError::UnreachablePose { target: target.position.to_array(), residual })
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// A sampled target together with the configuration that reaches it.
#[derive(Clone, Debug)]
pub struct ReachSolution {
    pub target: TargetPose,
    pub angles: JointConfiguration,
    /// Targets drawn, including the successful one.
    pub attempts: usize,
}

/// Draw targets until one is reachable from `current`.
///
/// Unreachable targets are discarded and resampled; any other error aborts.
///
/// # Errors
///
/// [`DatagenError::RetriesExhausted`] after `max_attempts` unreachable draws.
pub fn sample_reachable<K, R>(
    sampler: &PoseSampler,
    rng: &mut R,
    ik: &mut K,
    current: &JointConfiguration,
    max_attempts: usize,
) -> Result<ReachSolution, DatagenError>
where
    K: KinematicsAdapter + ?Sized,
    R: Rng + ?Sized,
{
    for attempt in 1..=max_attempts {
        let target = sampler.sample(rng);
        match ik.solve(&target, current) {
            Ok(angles) => return Ok(ReachSolution { target, angles, attempts: attempt }),
            Err(DatagenError::UnreachablePose { residual, .. }) => {
                debug!(attempt, target = ?target.position, residual, "target unreachable, resampling");
            }
            Err(e) => return Err(e),
        }
    }
    Err(DatagenError::RetriesExhausted { attempts: max_attempts })
}
