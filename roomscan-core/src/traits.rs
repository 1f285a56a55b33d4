//! Core traits for roomscan

use crate::{point::*, point_cloud::*};

/// Trait for nearest neighbor search functionality
pub trait NearestNeighborSearch {
    /// Find the k nearest neighbors to a query point, closest first
    /// Find the k nearest neighbors to a query point, closest first
    fn find_k_nearest(&self, query: &Point3f, k: usize) -> Vec<(usize, f32)>;
}

/// Anything that has a location in world space
pub trait Positioned {
    fn position(&self) -> Point3f;
}

impl Positioned for Point3f {
    fn position(&self) -> Point3f {
        *self
    }
}

impl Positioned for ColoredPoint3f {
    fn position(&self) -> Point3f {
        self.position
    }
}

impl Positioned for ScanPoint {
    fn position(&self) -> Point3f {
        self.position
    }
}

/// Trait for objects with an axis-aligned extent
pub trait Bounded {
    /// Get the axis-aligned bounding box, or `None` when there is nothing to bound
    fn bounding_box(&self) -> Option<(Point3f, Point3f)>;
}

impl Bounded for [Point3f] {
    fn bounding_box(&self) -> Option<(Point3f, Point3f)> {
        let first = *self.first()?;
        let mut min = first;
        let mut max = first;

        for p in self {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            min.z = min.z.min(p.z);

            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
            max.z = max.z.max(p.z);
        }

        Some((min, max))
    }
}

impl<T: Positioned> Bounded for PointCloud<T> {
    fn bounding_box(&self) -> Option<(Point3f, Point3f)> {
        self.positions().bounding_box()
    }
}
