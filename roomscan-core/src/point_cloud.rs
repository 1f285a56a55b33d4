//! Point cloud data structures and functionality

use crate::point::*;
use crate::traits::Positioned;
use crate::transform::Transform3D;
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// A generic point cloud container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointCloud<T> {
    pub points: Vec<T>,
}

/// A point cloud with bare 3D points
pub type PointCloud3f = PointCloud<Point3f>;

/// A point cloud with colored points, as produced by back-projection
pub type ColoredPointCloud3f = PointCloud<ColoredPoint3f>;

/// The fused cloud handed to the analysis stages
pub type ScanCloud = PointCloud<ScanPoint>;

impl<T> PointCloud<T> {
    /// Create a new empty point cloud
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Create a new point cloud with specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    /// Create a point cloud from a vector of points
    pub fn from_points(points: Vec<T>) -> Self {
        Self { points }
    }

    /// Get the number of points in the cloud
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the point cloud is empty
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Add a point to the cloud
    pub fn push(&mut self, point: T) {
        self.points.push(point);
    }

    /// Get an iterator over the points
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.points.iter()
    }

    /// Get a mutable iterator over the points
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.points.iter_mut()
    }

    /// Move every point of `other` into this cloud
    pub fn append(&mut self, other: &mut PointCloud<T>) {
        self.points.append(&mut other.points);
    }
}

impl<T: Positioned> PointCloud<T> {
    /// Copy out the bare positions of every point
    pub fn positions(&self) -> Vec<Point3f> {
        self.points.iter().map(Positioned::position).collect()
    }
}

impl<T> Default for PointCloud<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<usize> for PointCloud<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        &self.points[index]
    }
}

impl<T> IndexMut<usize> for PointCloud<T> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.points[index]
    }
}

impl<T> IntoIterator for PointCloud<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a PointCloud<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

impl<T> Extend<T> for PointCloud<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.points.extend(iter);
    }
}

impl<T> FromIterator<T> for PointCloud<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            points: Vec::from_iter(iter),
        }
    }
}

impl PointCloud<Point3f> {
    /// Apply a transformation to all points in the cloud
    pub fn transform(&mut self, transform: &Transform3D) {
        for point in &mut self.points {
            *point = transform.transform_point(point);
        }
    }
}

impl PointCloud<ColoredPoint3f> {
    /// Apply a transformation to all point positions; colors are untouched
    pub fn transform(&mut self, transform: &Transform3D) {
        for point in &mut self.points {
            point.position = transform.transform_point(&point.position);
        }
    }
}

impl PointCloud<ScanPoint> {
    /// Apply a transformation to positions and rotate normals alongside
    pub fn transform(&mut self, transform: &Transform3D) {
        for point in &mut self.points {
            point.position = transform.transform_point(&point.position);
            if let Some(normal) = point.normal.as_mut() {
                *normal = transform.transform_vector(normal);
            }
        }
    }
}
