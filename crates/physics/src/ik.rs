//! Position-only inverse kinematics.
//!
//! Damped least squares over the positional Jacobian of a revolute chain:
//! `dq = Jᵀ (J Jᵀ + λ² I)⁻¹ e`. Orientation of the end effector is left
//! unconstrained. Joint limits are enforced by clamping after every step.

use crate::arm::ArmModel;
use crate::error::PhysicsError;
use glam::{Mat3, Vec3};

#[derive(Clone, Debug)]
pub struct IkSolver {
    /// Accepted end-effector position error in meters.
    pub tolerance: f32,
    pub max_iterations: usize,
    /// Damping factor λ.
    pub damping: f32,
    /// Largest joint update applied in one iteration, in radians.
    pub max_step: f32,
}

impl Default for IkSolver {
    fn default() -> Self {
        Self { tolerance: 1e-3, max_iterations: 300, damping: 0.05, max_step: 0.2 }
    }
}

impl IkSolver {
    /// Solve for a configuration placing link `effector` at `target`,
    /// starting the search from `seed`.
    ///
    /// # Errors
    ///
    /// [`PhysicsError::IkFailed`] when the residual is still above
    /// `tolerance` after `max_iterations`, and
    /// [`PhysicsError::JointCountMismatch`] when `seed` has the wrong length.
    pub fn solve(
        &self,
        model: &ArmModel,
        target: Vec3,
        seed: &[f32],
        effector: usize,
    ) -> Result<Vec<f32>, PhysicsError> {
        model.check_arity(seed)?;
        let mut q: Vec<f32> = seed
            .iter()
            .enumerate()
            .map(|(i, &a)| model.clamp_joint(i, a))
            .collect();
        let lambda_sq = self.damping * self.damping;
        let mut residual = f32::INFINITY;

        for _ in 0..self.max_iterations {
            let pose = model.forward_kinematics_to(&q, effector)?;
            let error = target - pose.end_effector;
            residual = error.length();
            if residual < self.tolerance {
                return Ok(q);
            }

            // Only joints up to the effector link move it.
            let active = (effector + 1).min(q.len());
            let columns: Vec<Vec3> = (0..active)
                .map(|i| pose.joint_axes[i].cross(pose.end_effector - pose.joint_positions[i]))
                .collect();

            let mut jjt = Mat3::ZERO;
            for c in &columns {
                jjt += outer(*c, *c);
            }
            jjt += Mat3::IDENTITY * lambda_sq;
            if jjt.determinant().abs() < f32::EPSILON {
                break;
            }
            let w = jjt.inverse() * error;

            for (i, c) in columns.iter().enumerate() {
                let dq = c.dot(w).clamp(-self.max_step, self.max_step);
                q[i] = model.clamp_joint(i, q[i] + dq);
            }
        }

        let pose = model.forward_kinematics_to(&q, effector)?;
        residual = residual.min((target - pose.end_effector).length());
        if residual < self.tolerance {
            return Ok(q);
        }
        tracing::debug!(residual, "IK did not converge");
        Err(PhysicsError::IkFailed { residual, iterations: self.max_iterations })
    }
}

fn outer(a: Vec3, b: Vec3) -> Mat3 {
    Mat3::from_cols(a * b.x, a * b.y, a * b.z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arm::ArmDescription;

    #[test]
    fn outer_product_matches_definition() {
        let m = outer(Vec3::new(1.0, 2.0, 3.0), Vec3::new(4.0, 5.0, 6.0));
        // column j is a * b[j]
        assert_eq!(m.col(0), Vec3::new(4.0, 8.0, 12.0));
        assert_eq!(m.col(2), Vec3::new(6.0, 12.0, 18.0));
    }

    #[test]
    fn out_of_reach_target_fails() {
        let model = ArmModel::from_description(ArmDescription::kuka_iiwa()).unwrap();
        let solver = IkSolver { max_iterations: 50, ..IkSolver::default() };
        let result = solver.solve(&model, Vec3::new(5.0, 0.0, 0.3), &[0.2; 7], model.end_effector_index());
        assert!(matches!(result, Err(PhysicsError::IkFailed { .. })));
    }
}
