//! Error types for scan processing

use thiserror::Error;

/// Errors returned by [`crate::ScanProcessor`] and configuration loading.
///
/// Validation errors are raised before any geometry runs. Sparse or empty
/// input is not an error; it produces zero-valued results instead.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("At least one frame is required")]
    NoFrames,

    #[error("Too many frames: {count} (max {max})")]
    TooManyFrames { count: usize, max: usize },

    #[error("Depth count must match frames count: {depth} depth maps for {frames} frames")]
    DepthCountMismatch { frames: usize, depth: usize },

    #[error("Frame {index} is not a JPEG image")]
    UnsupportedFrameFormat { index: usize },

    #[error("Invalid trajectory: {0}")]
    InvalidTrajectory(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Geometry error: {0}")]
    Geometry(#[from] roomscan_core::Error),
}

pub type Result<T> = std::result::Result<T, ScanError>;
