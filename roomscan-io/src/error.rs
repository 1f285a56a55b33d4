//! Error types for I/O operations

use thiserror::Error;

/// Errors that can occur while reading scan inputs
#[derive(Error, Debug)]
pub enum IoError {
    #[error("Image decode error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Depth map size mismatch: expected {expected} samples, got {actual}")]
    DepthSize { expected: usize, actual: usize },

    #[error("Invalid trajectory JSON: {0}")]
    TrajectoryJson(#[from] serde_json::Error),

    #[error("Invalid trajectory structure: {message}")]
    TrajectoryStructure { message: String },

    #[error("Parse error: {message}")]
    ParseError { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for roomscan-io operations
pub type IoResult<T> = std::result::Result<T, IoError>;
