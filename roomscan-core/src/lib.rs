//! Core data structures and traits for roomscan
//!
//! This crate provides the fundamental types shared by the room scanning
//! pipeline: points, point clouds, camera poses, rigid transforms and the
//! common error type.

pub mod point;
pub mod point_cloud;
pub mod pose;
pub mod traits;
pub mod transform;
pub mod error;

pub use point::*;
pub use point_cloud::*;
pub use pose::*;
pub use traits::*;
pub use transform::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3, Matrix3, Matrix4, Isometry3, UnitQuaternion};
