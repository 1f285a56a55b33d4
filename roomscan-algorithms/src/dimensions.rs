//! Room dimension estimation

use crate::triangles::refine_length_width_by_diagonal;
use roomscan_core::{Bounded, Point3f};
use serde::{Deserialize, Serialize};

/// Wall height reported when there is no geometry to measure
pub const DEFAULT_WALL_HEIGHT_M: f32 = 2.7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DimensionParams {
    /// Fraction of the room height above which points define the footprint
    pub ceiling_height_fraction: f32,
}

impl Default for DimensionParams {
    fn default() -> Self {
        Self {
            ceiling_height_fraction: 0.55,
        }
    }
}

/// Room measurements in meters and square meters
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Dimensions {
    pub length_m: f32,
    pub width_m: f32,
    pub wall_height_m: f32,
    pub perimeter_m: f32,
    pub floor_area_m2: f32,
    pub ceiling_area_m2: f32,
    pub wall_area_m2: f32,
    /// Floor diagonal, used for the 3-4-5 check
    #[serde(default)]
    pub diagonal_m: Option<f32>,
}

impl Dimensions {
    /// All-zero dimensions without a diagonal
    pub fn zero() -> Self {
        Self::default()
    }

    /// Derive every measurement of a rectangular room from its footprint and height
    pub fn from_footprint(length_m: f32, width_m: f32, wall_height_m: f32) -> Self {
        let (length_m, width_m) = (length_m.max(width_m), length_m.min(width_m));
        let perimeter_m = 2.0 * (length_m + width_m);
        let floor_area_m2 = length_m * width_m;
        Self {
            length_m,
            width_m,
            wall_height_m,
            perimeter_m,
            floor_area_m2,
            ceiling_area_m2: floor_area_m2,
            wall_area_m2: perimeter_m * wall_height_m,
            diagonal_m: Some((length_m * length_m + width_m * width_m).sqrt()),
        }
    }

    /// Rescale the footprint so its diagonal matches an independently measured one
    pub fn refined_by_diagonal(&self, measured_diagonal_m: f32) -> Self {
        let (length, width) = refine_length_width_by_diagonal(self.length_m, self.width_m, measured_diagonal_m);
        Self::from_footprint(length, width, self.wall_height_m)
    }
}

/// Estimate room dimensions from a fused cloud.
///
/// Wall height is the full vertical extent. Length and width come from the
/// points in the upper part of the room (above `ceiling_height_fraction` of the
/// height) so floor clutter does not widen the footprint.
pub fn estimate_dimensions(points: &[Point3f], params: &DimensionParams) -> Dimensions {
    let Some((min, max)) = points.bounding_box() else {
        return Dimensions {
            wall_height_m: DEFAULT_WALL_HEIGHT_M,
            ..Dimensions::zero()
        };
    };
    let height = (max.y - min.y).max(0.0);

    let threshold = min.y + (max.y - min.y) * params.ceiling_height_fraction;
    let upper = points
        .iter()
        .filter(|p| p.y >= threshold)
        .fold(None, |acc: Option<(f32, f32, f32, f32)>, p| {
            Some(match acc {
                None => (p.x, p.x, p.z, p.z),
                Some((x0, x1, z0, z1)) => (x0.min(p.x), x1.max(p.x), z0.min(p.z), z1.max(p.z)),
            })
        });

    let (dim_x, dim_z) = match upper {
        Some((x0, x1, z0, z1)) => ((x1 - x0).max(0.0), (z1 - z0).max(0.0)),
        None => ((max.x - min.x).max(0.0), (max.z - min.z).max(0.0)),
    };

    Dimensions::from_footprint(dim_x, dim_z, height)
}
