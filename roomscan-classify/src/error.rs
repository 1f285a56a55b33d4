//! Error types for plane classification

use thiserror::Error;

/// Errors raised while loading or running a plane classifier
#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid model file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Feature count mismatch: model expects {expected}, features have {actual}")]
    FeatureCount { expected: usize, actual: usize },

    #[error("Invalid tree {tree}: {message}")]
    InvalidTree { tree: usize, message: String },

    #[error("Classifier returned {actual} labels for {expected} planes")]
    LabelCount { expected: usize, actual: usize },

    #[error("Empty model: {0}")]
    EmptyModel(String),
}

pub type Result<T> = std::result::Result<T, ClassifyError>;
