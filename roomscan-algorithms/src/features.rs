//! Per-plane geometric features
//!
//! Every room plane is described by a fixed 14-element vector computed from
//! the cloud points lying on it. The vector is the only input of the plane
//! classifiers.

use crate::segmentation::PlaneModel;
use rayon::prelude::*;
use roomscan_core::{Point3f, Vector3f};

/// Length of [`PlaneFeatures::to_vector`]
pub const FEATURE_COUNT: usize = 14;

/// Default inlier distance for feature extraction (meters)
pub const DEFAULT_FEATURE_DISTANCE: f32 = 0.05;

/// Names of the feature vector entries, in order
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "normal_x",
    "normal_y",
    "normal_z",
    "centroid_x",
    "centroid_y",
    "centroid_z",
    "height_y",
    "extent_x",
    "extent_z",
    "area",
    "aspect",
    "is_horizontal",
    "is_vertical",
    "log_inliers",
];

/// Geometric description of one plane
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneFeatures {
    /// Unit normal
    pub normal: Vector3f,
    pub centroid: Point3f,
    /// Vertical extent of the inliers
    pub height_y: f32,
    pub extent_x: f32,
    pub extent_z: f32,
    /// Approximate surface area
    pub area: f32,
    pub aspect: f32,
    pub is_horizontal: bool,
    pub is_vertical: bool,
    pub inlier_count: usize,
    /// Cloud points within the distance threshold
    pub inliers: Vec<Point3f>,
}

impl PlaneFeatures {
    /// Features of `plane` over the inlier points
    pub fn from_inliers(plane: &PlaneModel, inliers: Vec<Point3f>) -> Self {
        let normal = plane.normal();
        let is_horizontal = plane.is_horizontal();
        let is_vertical = plane.is_vertical();

        let (centroid, [extent_x, height_y, extent_z]) = centroid_and_extents(&inliers);

        let widest = extent_x.max(extent_z);
        let area = if is_vertical {
            height_y * widest.max(1e-6)
        } else if extent_x > 1e-6 && extent_z > 1e-6 {
            extent_x * extent_z
        } else {
            0.0
        };
        let aspect = if is_vertical {
            height_y / widest.max(1e-6)
        } else {
            widest / height_y.max(1e-6)
        };

        Self {
            normal,
            centroid,
            height_y,
            extent_x,
            extent_z,
            area,
            aspect,
            is_horizontal,
            is_vertical,
            inlier_count: inliers.len(),
            inliers,
        }
    }

    /// Extents of the inliers along X, Y and Z
    pub fn extents(&self) -> [f32; 3] {
        [self.extent_x, self.height_y, self.extent_z]
    }

    /// The fixed-length classifier input
    pub fn to_vector(&self) -> [f32; FEATURE_COUNT] {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        [
            self.normal.x,
            self.normal.y,
            self.normal.z,
            self.centroid.x,
            self.centroid.y,
            self.centroid.z,
            self.height_y,
            self.extent_x,
            self.extent_z,
            self.area,
            self.aspect,
            flag(self.is_horizontal),
            flag(self.is_vertical),
            (self.inlier_count as f32).ln_1p(),
        ]
    }
}

/// Centroid and per-axis extents; origin and zeros for an empty set
fn centroid_and_extents(points: &[Point3f]) -> (Point3f, [f32; 3]) {
    if points.is_empty() {
        return (Point3f::origin(), [0.0; 3]);
    }

    let mut min = points[0];
    let mut max = points[0];
    let mut sum = Vector3f::zeros();
    for p in points {
        min = min.inf(p);
        max = max.sup(p);
        sum += p.coords;
    }

    let extent = max - min;
    (
        Point3f::from(sum / points.len() as f32),
        [extent.x, extent.y, extent.z],
    )
}

/// Feature vectors for each plane over the points of `cloud` within
/// `distance_threshold` of it.
///
/// An empty cloud yields no features. Planes with a zero normal are skipped;
/// the others are renormalized first.
pub fn extract_plane_features(cloud: &[Point3f], planes: &[PlaneModel], distance_threshold: f32) -> Vec<PlaneFeatures> {
    if cloud.is_empty() {
        return Vec::new();
    }

    planes
        .par_iter()
        .filter_map(|plane| PlaneModel::from_normal_offset(plane.normal(), plane.offset()))
        .map(|plane| {
            let inliers: Vec<Point3f> = cloud
                .iter()
                .filter(|p| plane.distance_to_point(p) <= distance_threshold)
                .copied()
                .collect();
            PlaneFeatures::from_inliers(&plane, inliers)
        })
        .collect()
}
