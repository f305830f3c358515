//! # Serial Arm Model
//!
//! A robot is described as a chain of revolute joints. Each link carries the
//! translation from its parent joint origin and the axis it rotates about,
//! both expressed in the parent frame. Descriptions are JSON documents so
//! alternative arms can be swapped in without recompiling:
//!
//! ```json
//! {
//!   "name": "two_link",
//!   "end_effector": "tip",
//!   "links": [
//!     { "name": "upper", "joint": "shoulder", "offset": [0, 0, 0.1], "axis": [0, 1, 0] },
//!     { "name": "tip",   "joint": "elbow",    "offset": [0, 0, 0.5], "axis": [0, 1, 0] }
//!   ],
//!   "tool": [0, 0, 0.5]
//! }
//! ```

use crate::error::PhysicsError;
use glam::{Affine3A, Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ArmDescription {
    pub name: String,
    pub end_effector: String,
    pub links: Vec<LinkDef>,
    #[serde(default = "zero_vec")]
    pub base: [f32; 3],
    /// Offset from the last joint origin to the end-effector point.
    #[serde(default = "zero_vec")]
    pub tool: [f32; 3],
    #[serde(default = "default_link_radius")]
    pub link_radius: f32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LinkDef {
    pub name: String,
    pub joint: String,
    pub offset: [f32; 3],
    pub axis: [f32; 3],
    #[serde(default)]
    pub limits: Option<[f32; 2]>,
}

fn zero_vec() -> [f32; 3] {
    [0.0, 0.0, 0.0]
}

fn default_link_radius() -> f32 {
    0.06
}

impl ArmDescription {
    pub fn from_json(json: &str) -> Result<Self, PhysicsError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PhysicsError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Seven-joint arm with the link lengths and joint limits of a KUKA LBR
    /// iiwa 7, mounted at the origin with `z` up.
    #[must_use]
    pub fn kuka_iiwa() -> Self {
        const Z: [f32; 3] = [0.0, 0.0, 1.0];
        const Y: [f32; 3] = [0.0, 1.0, 0.0];
        const NEG_Y: [f32; 3] = [0.0, -1.0, 0.0];
        let link = |i: usize, offset: f32, axis: [f32; 3], limit: f32| LinkDef {
            name: format!("lbr_iiwa_link_{i}"),
            joint: format!("lbr_iiwa_joint_{i}"),
            offset: [0.0, 0.0, offset],
            axis,
            limits: Some([-limit, limit]),
        };
        Self {
            name: "kuka_iiwa".to_owned(),
            end_effector: "lbr_iiwa_link_7".to_owned(),
            links: vec![
                link(1, 0.1575, Z, 2.96),
                link(2, 0.2025, Y, 2.09),
                link(3, 0.2045, Z, 2.96),
                link(4, 0.2155, NEG_Y, 2.09),
                link(5, 0.1845, Z, 2.96),
                link(6, 0.2155, Y, 2.09),
                link(7, 0.0810, Z, 3.05),
            ],
            base: zero_vec(),
            tool: [0.0, 0.0, 0.045],
            link_radius: default_link_radius(),
        }
    }
}

#[derive(Clone, Debug)]
struct Link {
    name: String,
    joint: String,
    offset: Vec3,
    axis: Vec3,
    limits: Option<[f32; 2]>,
}

/// Validated, ready-to-evaluate arm.
#[derive(Clone, Debug)]
pub struct ArmModel {
    name: String,
    links: Vec<Link>,
    base: Vec3,
    tool: Vec3,
    link_radius: f32,
    end_effector: usize,
}

/// Result of evaluating the chain at one joint configuration.
#[derive(Clone, Debug)]
pub struct ChainPose {
    /// World position of each joint origin.
    pub joint_positions: Vec<Vec3>,
    /// World rotation axis of each joint.
    pub joint_axes: Vec<Vec3>,
    /// End-effector point of the link named in the description.
    pub end_effector: Vec3,
    /// Tip of the full chain (last joint origin plus tool offset).
    pub tip: Vec3,
}

impl ArmModel {
    pub fn from_description(desc: ArmDescription) -> Result<Self, PhysicsError> {
        if desc.links.is_empty() {
            return Err(PhysicsError::InvalidDescription("arm has no links".into()));
        }
        let mut links = Vec::with_capacity(desc.links.len());
        for def in desc.links {
            let axis = Vec3::from(def.axis);
            if axis.length_squared() < 1e-12 {
                return Err(PhysicsError::InvalidDescription(format!(
                    "joint `{}` has a zero rotation axis",
                    def.joint
                )));
            }
            if let Some([lo, hi]) = def.limits {
                if lo > hi {
                    return Err(PhysicsError::InvalidDescription(format!(
                        "joint `{}` has inverted limits",
                        def.joint
                    )));
                }
            }
            links.push(Link {
                name: def.name,
                joint: def.joint,
                offset: Vec3::from(def.offset),
                axis: axis.normalize(),
                limits: def.limits,
            });
        }
        let end_effector = links
            .iter()
            .position(|l| l.name == desc.end_effector)
            .ok_or_else(|| PhysicsError::UnknownLink(desc.end_effector.clone()))?;
        Ok(Self {
            name: desc.name,
            links,
            base: Vec3::from(desc.base),
            tool: Vec3::from(desc.tool),
            link_radius: desc.link_radius,
            end_effector,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn joint_count(&self) -> usize {
        self.links.len()
    }

    pub fn joint_names(&self) -> impl Iterator<Item = &str> {
        self.links.iter().map(|l| l.joint.as_str())
    }

    #[must_use]
    pub fn link_radius(&self) -> f32 {
        self.link_radius
    }

    #[must_use]
    pub fn base(&self) -> Vec3 {
        self.base
    }

    /// Index of the link whose name is `name`.
    pub fn link_index(&self, name: &str) -> Result<usize, PhysicsError> {
        self.links
            .iter()
            .position(|l| l.name == name)
            .ok_or_else(|| PhysicsError::UnknownLink(name.to_owned()))
    }

    /// Index of the configured end-effector link.
    #[must_use]
    pub fn end_effector_index(&self) -> usize {
        self.end_effector
    }

    /// Clamp `q` into the joint's limits, if it has any.
    #[must_use]
    pub fn clamp_joint(&self, joint: usize, q: f32) -> f32 {
        match self.links.get(joint).and_then(|l| l.limits) {
            Some([lo, hi]) => q.clamp(lo, hi),
            None => q,
        }
    }

    pub fn check_arity(&self, angles: &[f32]) -> Result<(), PhysicsError> {
        if angles.len() == self.links.len() {
            Ok(())
        } else {
            Err(PhysicsError::JointCountMismatch { expected: self.links.len(), actual: angles.len() })
        }
    }

    /// Evaluate the chain. `effector` selects which link's origin counts as
    /// the end effector; the configured one is used by
    /// [`ArmModel::forward_kinematics`].
    pub fn forward_kinematics_to(&self, angles: &[f32], effector: usize) -> Result<ChainPose, PhysicsError> {
        self.check_arity(angles)?;
        let mut frame = Affine3A::from_translation(self.base);
        let mut joint_positions = Vec::with_capacity(self.links.len());
        let mut joint_axes = Vec::with_capacity(self.links.len());
        let mut end_effector = self.base;

        for (i, (link, &q)) in self.links.iter().zip(angles).enumerate() {
            frame = frame * Affine3A::from_translation(link.offset);
            joint_positions.push(Vec3::from(frame.translation));
            joint_axes.push(frame.transform_vector3(link.axis).normalize());
            frame = frame * Affine3A::from_quat(Quat::from_axis_angle(link.axis, q));
            if i == effector {
                end_effector = if i + 1 == self.links.len() {
                    frame.transform_point3(self.tool)
                } else {
                    Vec3::from(frame.translation)
                };
            }
        }
        let tip = frame.transform_point3(self.tool);
        Ok(ChainPose { joint_positions, joint_axes, end_effector, tip })
    }

    pub fn forward_kinematics(&self, angles: &[f32]) -> Result<ChainPose, PhysicsError> {
        self.forward_kinematics_to(angles, self.end_effector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn straight_arm_points_up() {
        let model = ArmModel::from_description(ArmDescription::kuka_iiwa()).unwrap();
        let pose = model.forward_kinematics(&[0.0; 7]).unwrap();
        let height: f32 = 0.1575 + 0.2025 + 0.2045 + 0.2155 + 0.1845 + 0.2155 + 0.081 + 0.045;
        assert!((pose.end_effector - Vec3::new(0.0, 0.0, height)).length() < 1e-5);
        assert_eq!(pose.joint_positions.len(), 7);
    }

    #[test]
    fn wrong_arity_is_rejected() {
        let model = ArmModel::from_description(ArmDescription::kuka_iiwa()).unwrap();
        let err = model.forward_kinematics(&[0.0; 6]).unwrap_err();
        assert!(matches!(err, PhysicsError::JointCountMismatch { expected: 7, actual: 6 }));
    }

    #[test]
    fn unknown_end_effector_is_rejected() {
        let mut desc = ArmDescription::kuka_iiwa();
        desc.end_effector = "gripper".into();
        assert!(matches!(ArmModel::from_description(desc), Err(PhysicsError::UnknownLink(_))));
    }
}
