use thiserror::Error;

#[derive(Error, Debug)]
pub enum PhysicsError {
    #[error("joint vector has {actual} entries, arm has {expected} joints")]
    JointCountMismatch { expected: usize, actual: usize },
    #[error("unknown link `{0}`")]
    UnknownLink(String),
    #[error("invalid robot description: {0}")]
    InvalidDescription(String),
    #[error("inverse kinematics did not converge (residual {residual:.4} m after {iterations} iterations)")]
    IkFailed { residual: f32, iterations: usize },
    #[error("failed to parse robot description: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read robot description: {0}")]
    Io(#[from] std::io::Error),
}
