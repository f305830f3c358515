//! # Kinematic Arm Simulation
//!
//! [`ArmSim`] owns the arm's joint state, the static environment and any
//! visual markers. Setting joints teleports the arm; there is no integration
//! step, so joint velocities are always zero.

use crate::arm::{ArmModel, ChainPose};
use crate::error::PhysicsError;
use crate::ik::IkSolver;
use crate::types::{BoxBody, Capsule, Color, MarkerId, Plane, SceneBodies, Sphere};
use glam::Vec3;
use tracing::debug;

const LINK_COLORS: [Color; 2] = [[0.95, 0.55, 0.1], [0.85, 0.85, 0.85]];
const JOINT_COLOR: Color = [0.2, 0.2, 0.25];

pub struct ArmSim {
    model: ArmModel,
    angles: Vec<f32>,
    planes: Vec<Plane>,
    markers: Vec<(MarkerId, BoxBody)>,
    next_marker: u32,
    solver: IkSolver,
}

impl ArmSim {
    /// Create a simulation with the arm at the zero configuration standing on
    /// a ground plane.
    #[must_use]
    pub fn new(model: ArmModel) -> Self {
        let angles = vec![0.0; model.joint_count()];
        debug!(arm = model.name(), joints = angles.len(), "arm simulation created");
        Self {
            model,
            angles,
            planes: vec![Plane::ground()],
            markers: Vec::new(),
            next_marker: 0,
            solver: IkSolver::default(),
        }
    }

    #[must_use]
    pub fn model(&self) -> &ArmModel {
        &self.model
    }

    #[must_use]
    pub fn joint_angles(&self) -> &[f32] {
        &self.angles
    }

    /// Teleport every joint to `angles` with zero velocity.
    pub fn set_joint_angles(&mut self, angles: &[f32]) -> Result<(), PhysicsError> {
        self.model.check_arity(angles)?;
        self.angles.copy_from_slice(angles);
        Ok(())
    }

    pub fn pose(&self) -> Result<ChainPose, PhysicsError> {
        self.model.forward_kinematics(&self.angles)
    }

    /// Solve IK for `target` starting from the current joint state.
    pub fn solve_ik(&self, target: Vec3, end_effector: &str) -> Result<Vec<f32>, PhysicsError> {
        let effector = self.model.link_index(end_effector)?;
        self.solver.solve(&self.model, target, &self.angles, effector)
    }

    /// Add a visual-only box. It never collides with anything.
    pub fn add_marker(&mut self, center: Vec3, half_extents: Vec3, color: Color) -> MarkerId {
        let id = MarkerId(self.next_marker);
        self.next_marker += 1;
        self.markers.push((id, BoxBody { center, half_extents, color }));
        id
    }

    /// Returns `false` when no marker with that id exists.
    pub fn remove_marker(&mut self, id: MarkerId) -> bool {
        let before = self.markers.len();
        self.markers.retain(|(m, _)| *m != id);
        self.markers.len() != before
    }

    #[must_use]
    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    /// Everything the renderer needs to draw the current state.
    pub fn bodies(&self) -> Result<SceneBodies, PhysicsError> {
        let pose = self.pose()?;
        let radius = self.model.link_radius();
        let mut bodies = SceneBodies { planes: self.planes.clone(), ..SceneBodies::default() };

        let mut start = self.model.base();
        for (i, joint) in pose.joint_positions.iter().enumerate() {
            if (*joint - start).length_squared() > 1e-8 {
                bodies.capsules.push(Capsule { a: start, b: *joint, radius, color: LINK_COLORS[i % 2] });
            }
            bodies.spheres.push(Sphere { center: *joint, radius: radius * 1.15, color: JOINT_COLOR });
            start = *joint;
        }
        // flange
        bodies.capsules.push(Capsule {
            a: start,
            b: pose.tip,
            radius: radius * 0.8,
            color: LINK_COLORS[pose.joint_positions.len() % 2],
        });
        bodies.boxes.extend(self.markers.iter().map(|(_, b)| *b));
        Ok(bodies)
    }
}
