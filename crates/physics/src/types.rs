//! Plain value types describing what is in the scene.
//!
//! Bodies here have no dynamics: the arm is driven kinematically and markers
//! are visual only. The renderer consumes these through
//! [`crate::ArmSim::bodies`].

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Linear RGB color in `[0, 1]`.
pub type Color = [f32; 3];

/// A link segment between two joint origins.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Capsule {
    pub a: Vec3,
    pub b: Vec3,
    pub radius: f32,
    pub color: Color,
}

/// Axis-aligned box, used for target markers.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoxBody {
    pub center: Vec3,
    pub half_extents: Vec3,
    pub color: Color,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
    pub color: Color,
}

/// Infinite plane `dot(normal, p) = d`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub normal: [f32; 3],
    pub d: f32,
    #[serde(default = "ground_color")]
    pub color: Color,
}

impl Plane {
    /// The `z = 0` floor the arm is mounted on.
    #[must_use]
    pub fn ground() -> Self {
        Self { normal: [0.0, 0.0, 1.0], d: 0.0, color: ground_color() }
    }
}

fn ground_color() -> Color {
    [0.55, 0.55, 0.5]
}

/// Snapshot of every renderable body at one instant.
#[derive(Clone, Debug, Default)]
pub struct SceneBodies {
    pub capsules: Vec<Capsule>,
    pub spheres: Vec<Sphere>,
    pub boxes: Vec<BoxBody>,
    pub planes: Vec<Plane>,
}

/// Identifier of a marker created with [`crate::ArmSim::add_marker`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct MarkerId(pub(crate) u32);
