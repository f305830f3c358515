//! # Scene Controller
//!
//! The [`SceneController`] trait is everything the episode loop needs from a
//! simulator: teleport joints, read them back, move the target marker and
//! take a picture. [`SimScene`] implements it over the kinematic
//! [`physics::ArmSim`] and the offscreen [`render::SdfRenderer`].
//!
//! A scene is owned by exactly one worker for its whole lifetime. Nothing
//! here is `Sync`-shared; parallel generation builds one scene per worker.

use crate::error::DatagenError;
use crate::types::JointConfiguration;
use glam::Vec3;
use physics::{ArmModel, ArmSim, MarkerId};
use render::{CameraSpec, DepthImage, RgbImage, SdfRenderer};
use tracing::debug;

const MARKER_HALF_EXTENT: f32 = 0.05;
const MARKER_COLOR: [f32; 3] = [0.0, 1.0, 0.0];

pub trait SceneController {
    fn joint_count(&self) -> usize;

    /// Teleport the robot to `cfg` with zero velocity.
    ///
    /// # Errors
    ///
    /// [`DatagenError::ShapeMismatch`] when `cfg.len() != joint_count()`.
    fn set_joint_configuration(&mut self, cfg: &JointConfiguration) -> Result<(), DatagenError>;

    fn joint_configuration(&self) -> JointConfiguration;

    /// Replace the visual target marker. Markers never interact physically.
    fn place_marker(&mut self, position: Vec3) -> Result<(), DatagenError>;

    /// Render the current state at `resolution × resolution`. The depth image
    /// holds metric distance from the camera.
    fn capture(&mut self, resolution: u32) -> Result<(RgbImage, DepthImage), DatagenError>;
}

pub struct SimScene {
    sim: ArmSim,
    renderer: SdfRenderer,
    marker: Option<MarkerId>,
}

impl SimScene {
    #[must_use]
    pub fn new(model: ArmModel) -> Self {
        Self::with_camera(model, CameraSpec::default())
    }

    #[must_use]
    pub fn with_camera(model: ArmModel, camera: CameraSpec) -> Self {
        debug!(arm = model.name(), "opening scene");
        Self { sim: ArmSim::new(model), renderer: SdfRenderer::new(camera), marker: None }
    }

    #[must_use]
    pub fn camera(&self) -> &CameraSpec {
        &self.renderer.camera
    }

    /// Current world position of the arm's end effector.
    pub fn end_effector(&self) -> Result<Vec3, DatagenError> {
        Ok(self.sim.pose()?.end_effector)
    }

    #[must_use]
    pub fn marker_count(&self) -> usize {
        self.sim.marker_count()
    }
}

impl SceneController for SimScene {
    fn joint_count(&self) -> usize {
        self.sim.model().joint_count()
    }

    fn set_joint_configuration(&mut self, cfg: &JointConfiguration) -> Result<(), DatagenError> {
        cfg.expect_len(self.joint_count())?;
        self.sim.set_joint_angles(cfg.as_slice())?;
        Ok(())
    }

    fn joint_configuration(&self) -> JointConfiguration {
        JointConfiguration::new(self.sim.joint_angles().to_vec())
    }

    fn place_marker(&mut self, position: Vec3) -> Result<(), DatagenError> {
        if let Some(old) = self.marker.take() {
            self.sim.remove_marker(old);
        }
        self.marker = Some(self.sim.add_marker(position, Vec3::splat(MARKER_HALF_EXTENT), MARKER_COLOR));
        Ok(())
    }

    fn capture(&mut self, resolution: u32) -> Result<(RgbImage, DepthImage), DatagenError> {
        let bodies = self.sim.bodies()?;
        let raw = self.renderer.capture(&bodies, resolution)?;
        let camera = &self.renderer.camera;
        let metric = raw.depth_buffer.iter().map(|d| camera.linearize_depth(*d)).collect();
        Ok((raw.rgb, DepthImage::new(resolution, metric)?))
    }
}
