#![deny(clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
//! # Reacher Render
//!
//! Offscreen rendering of a [`physics::SceneBodies`] snapshot from a fixed
//! camera. Produces an RGB image and an OpenGL-style normalized depth buffer;
//! [`linearize_depth`] converts the latter to metric distance.

pub mod buffer;
pub mod camera;
pub mod error;
pub mod sdf_renderer;

pub use buffer::{write_gif, DepthImage, RgbImage};
pub use camera::{linearize_depth, CameraSpec};
pub use error::RenderError;
pub use sdf_renderer::{RawCapture, SdfRenderer};
