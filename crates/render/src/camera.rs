//! Fixed pinhole camera and depth-buffer conversion.

use glam::{Mat4, Vec3};

/// A fixed camera placement. Unlike an interactive camera there is no yaw or
/// pitch state; the view is fully determined by `eye`, `target` and `up`.
#[derive(Clone, Debug, PartialEq)]
pub struct CameraSpec {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees
    pub fov_y_degrees: f32,
    /// Near clipping plane distance
    pub znear: f32,
    /// Far clipping plane distance
    pub zfar: f32,
}

impl Default for CameraSpec {
    fn default() -> Self {
        Self {
            eye: Vec3::new(1.0, -2.0, 2.5),
            target: Vec3::new(0.3, 0.0, 0.0),
            up: Vec3::Y,
            fov_y_degrees: 45.0,
            znear: 0.01,
            zfar: 5.1,
        }
    }
}

impl CameraSpec {
    #[must_use]
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    #[must_use]
    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_degrees.to_radians(), aspect, self.znear, self.zfar)
    }

    #[must_use]
    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection(aspect) * self.view()
    }

    /// Unit vector the camera looks along.
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        (self.target - self.eye).normalize()
    }

    /// Depth-buffer value in `[0, 1]` for a point `z` meters in front of the
    /// camera, as an OpenGL-style perspective projection stores it.
    #[must_use]
    pub fn normalized_depth(&self, z: f32) -> f32 {
        let (n, f) = (self.znear, self.zfar);
        (f * (z - n) / (z * (f - n))).clamp(0.0, 1.0)
    }

    /// Metric distance for a depth-buffer value.
    #[must_use]
    pub fn linearize_depth(&self, depth_ndc: f32) -> f32 {
        linearize_depth(depth_ndc, self.znear, self.zfar)
    }
}

/// Inverse of the perspective depth mapping:
/// `far * near / (far - (far - near) * depth_ndc)`.
#[must_use]
pub fn linearize_depth(depth_ndc: f32, near: f32, far: f32) -> f32 {
    far * near / (far - (far - near) * depth_ndc)
}
