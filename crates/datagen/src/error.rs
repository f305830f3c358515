use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatagenError {
    /// The IK solver found no configuration within tolerance. Recovered by
    /// resampling the target.
    #[error("no IK solution for target {target:?} (residual {residual:.4} m)")]
    UnreachablePose { target: [f32; 3], residual: f32 },
    /// A joint vector does not match the robot's joint count.
    #[error("joint configuration has {actual} entries, robot has {expected} joints")]
    ShapeMismatch { expected: usize, actual: usize },
    #[error("no reachable target found after {attempts} attempts")]
    RetriesExhausted { attempts: usize },
    #[error("frame resolution {actual} differs from episode resolution {expected}")]
    ResolutionMismatch { expected: u32, actual: u32 },
    #[error("episode modalities differ from the rest of the dataset (depth: {expected} vs {actual})")]
    ModalityMismatch { expected: bool, actual: bool },
    #[error("episode has no frames")]
    EmptyEpisode,
    #[error("dataset has no episodes")]
    EmptyDataset,
    #[error("predictor has not been fed an observation")]
    NoObservation,
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("worker pool: {0}")]
    WorkerPool(String),
    #[error("no dataset at {}", .0.display())]
    ProjectNotFound(PathBuf),
    #[error(transparent)]
    Render(#[from] render::RenderError),
    #[error(transparent)]
    Physics(#[from] physics::PhysicsError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("dataset encoding: {0}")]
    Serialization(#[from] bincode::Error),
    #[error("manifest encoding: {0}")]
    Manifest(#[from] serde_json::Error),
}
