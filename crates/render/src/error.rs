use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("resolution must be positive, got {0}")]
    InvalidResolution(u32),
    #[error("buffer holds {actual} values, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
    #[error("no frames to encode")]
    NoFrames,
    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
