#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! # Reacher Physics
//!
//! Kinematic model of a serial robot arm and the scene it lives in.
//!
//! The arm is never integrated forward in time: joint angles are written
//! directly and the link geometry follows by forward kinematics. This is all
//! a reaching-data generator needs, and it keeps the scene deterministic.
//!
//! ## Key Components
//!
//! -   **Robot descriptions:** [`ArmDescription`] is a JSON-loadable chain of
//!     revolute joints; [`ArmModel`] is its validated form and evaluates
//!     forward kinematics.
//! -   **Simulation:** [`ArmSim`] holds joint state, the ground plane and
//!     visual markers, and exports a [`SceneBodies`] snapshot for rendering.
//! -   **Inverse kinematics:** [`IkSolver`] places an end effector at a 3D
//!     position by damped least squares.
//!
//! ```rust,ignore
//! use physics::{ArmDescription, ArmModel, ArmSim};
//!
//! let model = ArmModel::from_description(ArmDescription::kuka_iiwa())?;
//! let mut sim = ArmSim::new(model);
//! sim.set_joint_angles(&[0.2; 7])?;
//! let q = sim.solve_ik(glam::Vec3::new(0.5, 0.0, 0.3), "lbr_iiwa_link_7")?;
//! ```

pub mod arm;
pub mod error;
pub mod ik;
pub mod simulation;
pub mod types;

pub use arm::{ArmDescription, ArmModel, ChainPose, LinkDef};
pub use error::PhysicsError;
pub use ik::IkSolver;
pub use simulation::ArmSim;
pub use types::{BoxBody, Capsule, Color, MarkerId, Plane, SceneBodies, Sphere};
pub use glam::Vec3;
