//! Plane classification for roomscan
//!
//! Labels room planes from their feature vectors and turns door, window,
//! reveal and frame planes into measurement records. Two classifiers are
//! available behind [`PlaneClassifier`]: fixed threshold rules and a
//! decision forest loaded from a model directory.

pub mod classifier;
pub mod error;
pub mod inference;
pub mod labels;
pub mod selection;
pub mod trained;

pub use classifier::*;
pub use error::*;
pub use inference::*;
pub use labels::*;
pub use selection::*;
pub use trained::{DecisionTree, Forest, ModelMeta, TrainedClassifier, TreeNode, FOREST_FILE, META_FILE};
