//! # Roomscan Algorithms
//!
//! Geometry algorithms for turning a fused room cloud into a room model.
//!
//! This crate provides voxel filtering, neighbor search, normal estimation,
//! RANSAC plane segmentation, plane junctions, top-down coverage analysis,
//! dimension estimation, triangle rules and per-plane features.

pub mod coverage;
pub mod dimensions;
pub mod features;
pub mod filtering;
pub mod junctions;
pub mod nearest_neighbor;
pub mod normals;
pub mod segmentation;
pub mod triangles;

// Re-export commonly used items
pub use coverage::*;
pub use dimensions::*;
pub use features::*;
pub use filtering::*;
pub use junctions::*;
pub use nearest_neighbor::*;
pub use normals::*;
pub use segmentation::*;
pub use triangles::*;
