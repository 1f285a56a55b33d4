//! Segmentation algorithms
//!
//! Single-plane RANSAC plus a sequential extractor that peels the dominant
//! planes of a room off a fused cloud one at a time and orders them as
//! floor, ceiling, walls.

use crate::normals::fit_normal;
use nalgebra::Vector4;
use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use roomscan_core::{Error, Point3f, Result, Vector3f};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// |n_y| at or above which a plane counts as horizontal (floor/ceiling)
pub const HORIZONTAL_NORMAL_Y: f32 = 0.8;

/// |n_y| below which a plane counts as strictly vertical
pub const VERTICAL_NORMAL_Y: f32 = 0.35;

/// A 3D plane model defined by the equation ax + by + cz + d = 0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaneModel {
    /// Plane coefficients [a, b, c, d] where ax + by + cz + d = 0
    pub coefficients: Vector4<f32>,
}

impl PlaneModel {
    /// Create a new plane model from coefficients
    pub fn new(a: f32, b: f32, c: f32, d: f32) -> Self {
        Self {
            coefficients: Vector4::new(a, b, c, d),
        }
    }

    /// Create a plane from a normal and offset, rescaled so the normal has unit length.
    /// Returns `None` for a zero (or non-finite) normal.
    pub fn from_normal_offset(normal: Vector3f, offset: f32) -> Option<Self> {
        let magnitude = normal.magnitude();
        if magnitude < 1e-10 || !magnitude.is_finite() {
            return None;
        }
        let n = normal / magnitude;
        Some(Self::new(n.x, n.y, n.z, offset / magnitude))
    }

    /// Create a plane model from three points
    pub fn from_points(p1: &Point3f, p2: &Point3f, p3: &Point3f) -> Option<Self> {
        let v1 = p2 - p1;
        let v2 = p3 - p1;
        let normal = v1.cross(&v2);

        // Collinear points
        if normal.magnitude() < 1e-8 {
            return None;
        }

        let normal = normal.normalize();
        let d = -normal.dot(&p1.coords);

        Some(PlaneModel::new(normal.x, normal.y, normal.z, d))
    }

    /// Least-squares plane through a sample of more than three points
    pub fn fit(points: &[Point3f]) -> Option<Self> {
        match points {
            [p1, p2, p3] => Self::from_points(p1, p2, p3),
            _ => {
                let normal = fit_normal(points)?;
                let centroid = points.iter().fold(Vector3f::zeros(), |acc, p| acc + p.coords)
                    / points.len() as f32;
                Self::from_normal_offset(normal, -normal.dot(&centroid))
            }
        }
    }

    /// Get the normal vector of the plane
    pub fn normal(&self) -> Vector3f {
        Vector3f::new(self.coefficients.x, self.coefficients.y, self.coefficients.z)
    }

    /// Get the offset `d` of the plane equation
    pub fn offset(&self) -> f32 {
        self.coefficients.w
    }

    /// Calculate the distance from a point to the plane
    pub fn distance_to_point(&self, point: &Point3f) -> f32 {
        let normal = self.normal();
        let normal_magnitude = normal.magnitude();

        if normal_magnitude < 1e-8 {
            return f32::INFINITY;
        }

        (normal.dot(&point.coords) + self.coefficients.w).abs() / normal_magnitude
    }

    /// Count inliers within a distance threshold
    pub fn count_inliers(&self, points: &[Point3f], threshold: f32) -> usize {
        points
            .par_iter()
            .filter(|point| self.distance_to_point(point) <= threshold)
            .count()
    }

    /// Get indices of inlier points within a distance threshold
    pub fn get_inliers(&self, points: &[Point3f], threshold: f32) -> Vec<usize> {
        points
            .iter()
            .enumerate()
            .filter(|(_, point)| self.distance_to_point(point) <= threshold)
            .map(|(i, _)| i)
            .collect()
    }

    /// |n_y| >= 0.8: floor or ceiling
    pub fn is_horizontal(&self) -> bool {
        self.normal().y.abs() >= HORIZONTAL_NORMAL_Y
    }

    /// |n_y| < 0.35: a wall-like plane
    pub fn is_vertical(&self) -> bool {
        self.normal().y.abs() < VERTICAL_NORMAL_Y
    }
}

/// RANSAC plane segmentation result
#[derive(Debug, Clone)]
pub struct PlaneSegmentationResult {
    /// The best plane model found
    pub model: PlaneModel,
    /// Indices of inlier points
    pub inliers: Vec<usize>,
    /// Number of RANSAC iterations performed
    pub iterations: usize,
}

/// Parameters of the robust plane extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RansacParams {
    /// Max point-to-plane distance for inliers (meters)
    pub distance_threshold: f32,
    /// Points drawn per hypothesis (at least 3)
    pub sample_size: usize,
    /// Hypotheses evaluated per extracted plane
    pub iterations: usize,
    /// Upper bound on extracted planes
    pub max_planes: usize,
    /// Minimum support for a plane to be accepted
    pub min_inliers: usize,
    /// Fixed RNG seed; `None` draws from entropy
    pub seed: Option<u64>,
}

impl Default for RansacParams {
    fn default() -> Self {
        Self {
            distance_threshold: 0.03,
            sample_size: 3,
            iterations: 1000,
            max_planes: 8,
            min_inliers: 500,
            seed: None,
        }
    }
}

impl RansacParams {
    pub fn validate(&self) -> Result<()> {
        if self.distance_threshold <= 0.0 || !self.distance_threshold.is_finite() {
            return Err(Error::InvalidData("Threshold must be positive".to_string()));
        }
        if self.iterations == 0 {
            return Err(Error::InvalidData("Max iterations must be positive".to_string()));
        }
        if self.sample_size < 3 {
            return Err(Error::InvalidData("Sample size must be at least 3".to_string()));
        }
        Ok(())
    }
}

/// Single-plane RANSAC: the plane supported by the most points within
/// `params.distance_threshold`
pub fn segment_plane<R: Rng + ?Sized>(
    points: &[Point3f],
    params: &RansacParams,
    rng: &mut R,
) -> Result<PlaneSegmentationResult> {
    params.validate()?;
    if points.len() < params.sample_size {
        return Err(Error::InvalidData(format!(
            "Need at least {} points for plane segmentation",
            params.sample_size
        )));
    }

    let threshold = params.distance_threshold;
    let mut best_model: Option<PlaneModel> = None;
    let mut best_score = 0;
    let mut sample = Vec::with_capacity(params.sample_size);

    for _iteration in 0..params.iterations {
        sample.clear();
        sample.extend(
            index::sample(rng, points.len(), params.sample_size)
                .into_iter()
                .map(|i| points[i]),
        );

        if let Some(model) = PlaneModel::fit(&sample) {
            let inlier_count = model.count_inliers(points, threshold);
            if inlier_count > best_score {
                best_score = inlier_count;
                best_model = Some(model);
            }
        }
    }

    match best_model {
        Some(model) => Ok(PlaneSegmentationResult {
            inliers: model.get_inliers(points, threshold),
            model,
            iterations: params.iterations,
        }),
        None => Err(Error::Algorithm("Failed to find valid plane model".to_string())),
    }
}

/// Role of an extracted plane in the room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaneRole {
    Floor,
    Ceiling,
    Wall,
}

/// A plane accepted by the extractor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectedPlane {
    /// Plane with unit normal
    pub model: PlaneModel,
    pub inlier_count: usize,
    pub centroid: Point3f,
}

/// An extracted plane after floor/ceiling/wall ordering
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoomPlane {
    pub plane: DetectedPlane,
    pub role: PlaneRole,
}

impl RoomPlane {
    pub fn model(&self) -> &PlaneModel {
        &self.plane.model
    }
}

/// Why the sequential extraction loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStop {
    /// `max_planes` planes were accepted
    PlaneLimit,
    /// Fewer points remain than a plane needs
    TooFewPoints,
    /// The best hypothesis had fewer than `min_inliers` inliers
    InsufficientSupport,
    /// Every sample was degenerate
    NoModel,
}

/// Sequential RANSAC: fit the dominant plane, drop its inliers, repeat.
///
/// The extractor owns the remaining point set and the accepted planes; each
/// call to [`step`](Self::step) depends only on that state and the RNG.
pub struct SequentialPlaneExtractor {
    params: RansacParams,
    remaining: Vec<Point3f>,
    accepted: Vec<DetectedPlane>,
    rng: StdRng,
}

impl SequentialPlaneExtractor {
    pub fn new(points: &[Point3f], params: RansacParams) -> Result<Self> {
        params.validate()?;
        let rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            params,
            remaining: points.to_vec(),
            accepted: Vec::new(),
            rng,
        })
    }

    pub fn remaining(&self) -> &[Point3f] {
        &self.remaining
    }

    pub fn accepted(&self) -> &[DetectedPlane] {
        &self.accepted
    }

    /// Extract one more plane, or report why extraction is over
    pub fn step(&mut self) -> std::result::Result<DetectedPlane, ExtractionStop> {
        if self.accepted.len() >= self.params.max_planes {
            return Err(ExtractionStop::PlaneLimit);
        }
        if self.remaining.len() < self.params.min_inliers.max(self.params.sample_size) {
            return Err(ExtractionStop::TooFewPoints);
        }

        let result = segment_plane(&self.remaining, &self.params, &mut self.rng)
            .map_err(|_| ExtractionStop::NoModel)?;
        if result.inliers.len() < self.params.min_inliers {
            return Err(ExtractionStop::InsufficientSupport);
        }

        let centroid = result
            .inliers
            .iter()
            .fold(Vector3f::zeros(), |acc, &i| acc + self.remaining[i].coords)
            / result.inliers.len().max(1) as f32;

        let model = PlaneModel::from_normal_offset(result.model.normal(), result.model.offset())
            .ok_or(ExtractionStop::NoModel)?;
        let plane = DetectedPlane {
            model,
            inlier_count: result.inliers.len(),
            centroid: Point3f::from(centroid),
        };

        // Inlier indices are ascending, so a single merge pass removes them.
        let mut inliers = result.inliers.iter().peekable();
        let mut i = 0usize;
        self.remaining.retain(|_| {
            let is_inlier = inliers.next_if_eq(&&i).is_some();
            i += 1;
            !is_inlier
        });

        self.accepted.push(plane);
        Ok(plane)
    }

    /// Run to completion and return the planes in extraction order
    pub fn run(mut self) -> Vec<DetectedPlane> {
        loop {
            match self.step() {
                Ok(plane) => debug!(
                    inliers = plane.inlier_count,
                    remaining = self.remaining.len(),
                    "accepted plane"
                ),
                Err(reason) => {
                    debug!(?reason, planes = self.accepted.len(), "plane extraction stopped");
                    break;
                }
            }
        }
        self.accepted
    }
}

/// Order extracted planes as floor, ceiling, then walls by descending support.
///
/// Among horizontal planes the lowest centroid is the floor and, when there are
/// at least two, the highest is the ceiling. Other horizontal planes are dropped.
pub fn order_room_planes(candidates: &[DetectedPlane]) -> Vec<RoomPlane> {
    let mut horizontal: Vec<&DetectedPlane> = candidates.iter().filter(|c| c.model.is_horizontal()).collect();
    let mut walls: Vec<&DetectedPlane> = candidates.iter().filter(|c| !c.model.is_horizontal()).collect();

    horizontal.sort_by(|a, b| a.centroid.y.total_cmp(&b.centroid.y));
    walls.sort_by(|a, b| b.inlier_count.cmp(&a.inlier_count));

    let mut ordered = Vec::with_capacity(candidates.len());
    if let Some(floor) = horizontal.first() {
        ordered.push(RoomPlane { plane: **floor, role: PlaneRole::Floor });
    }
    if horizontal.len() > 1 {
        if let Some(ceiling) = horizontal.last() {
            ordered.push(RoomPlane { plane: **ceiling, role: PlaneRole::Ceiling });
        }
    }
    ordered.extend(walls.into_iter().map(|w| RoomPlane { plane: *w, role: PlaneRole::Wall }));
    ordered
}

/// Detect the dominant room planes of a cloud, ordered floor, ceiling, walls.
///
/// Running out of support is not an error: an empty or sparse cloud yields
/// fewer (or zero) planes.
pub fn detect_room_planes(points: &[Point3f], params: &RansacParams) -> Result<Vec<RoomPlane>> {
    if points.is_empty() {
        return Ok(Vec::new());
    }
    let extracted = SequentialPlaneExtractor::new(points, params.clone())?.run();
    Ok(order_room_planes(&extracted))
}
