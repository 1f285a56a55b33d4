//! Point types and related functionality

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// A 3D point with floating point coordinates
pub type Point3f = Point3<f32>;

/// A 3D vector with floating point components
pub type Vector3f = Vector3<f32>;

/// A point with color information
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColoredPoint3f {
    pub position: Point3f,
    pub color: [u8; 3],
}

/// A fused scan point: position and color, plus a normal once estimated
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanPoint {
    pub position: Point3f,
    pub normal: Option<Vector3f>,
    pub color: Option<[u8; 3]>,
}

impl ColoredPoint3f {
    pub fn new(position: Point3f, color: [u8; 3]) -> Self {
        Self { position, color }
    }
}

impl ScanPoint {
    /// Create a bare point without color or normal
    pub fn from_position(position: Point3f) -> Self {
        Self {
            position,
            normal: None,
            color: None,
        }
    }
}

impl Default for ColoredPoint3f {
    fn default() -> Self {
        Self {
            position: Point3f::origin(),
            color: [255, 255, 255],
        }
    }
}

impl From<ColoredPoint3f> for ScanPoint {
    fn from(point: ColoredPoint3f) -> Self {
        Self {
            position: point.position,
            normal: None,
            color: Some(point.color),
        }
    }
}

impl From<Point3f> for ScanPoint {
    fn from(position: Point3f) -> Self {
        Self::from_position(position)
    }
}
