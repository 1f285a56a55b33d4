//! Plane-pair junctions
//!
//! Every unordered pair of room planes that is not parallel meets along a
//! line. The line is typed from the orientation of the two planes and their
//! position in the floor/ceiling/walls ordering produced by segmentation.

use crate::segmentation::PlaneModel;
use nalgebra::{Matrix3, Vector3};
use roomscan_core::{Point3f, Vector3f};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Semantic type of a junction line.
///
/// Only the three `*_internal` room edges are produced by [`find_junctions`];
/// the remaining variants exist so results from other producers deserialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JunctionType {
    FloorWallInternal,
    FloorWallExternal,
    CeilingWallInternal,
    CeilingWallExternal,
    WallWallInternal,
    WallWallExternal,
    FloorCeilingEdge,
    WindowOpening,
    DoorOpening,
    NicheRecess,
}

/// Intersection line of two planes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Junction {
    #[serde(rename = "type")]
    pub junction_type: JunctionType,
    /// A point on the line (minimum-norm solution)
    pub position_3d: [f32; 3],
    /// Unit direction of the line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<[f32; 3]>,
    /// Floor-to-ceiling segment of a vertical junction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertical_line: Option<VerticalLine>,
    pub confidence: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VerticalLine {
    pub bottom: [f32; 3],
    pub top: [f32; 3],
}

/// |direction.y| above which a junction line counts as vertical
const VERTICAL_DIRECTION_Y: f32 = 0.9;

/// Line where two planes meet, as `(point, unit direction)`.
///
/// Returns `None` for (near-)parallel planes. Both normals are expected to be
/// unit length.
pub fn plane_intersection_line(a: &PlaneModel, b: &PlaneModel) -> Option<(Point3f, Vector3f)> {
    let n1 = a.normal().cast::<f64>();
    let n2 = b.normal().cast::<f64>();

    let direction = n1.cross(&n2);
    let dir_norm = direction.norm();
    if dir_norm < 1e-8 {
        return None;
    }
    let direction = direction / dir_norm;

    // [n1; n2; dir] x = [-d1; -d2; 0]
    let system = Matrix3::from_rows(&[n1.transpose(), n2.transpose(), direction.transpose()]);
    let rhs = Vector3::new(-(a.offset() as f64), -(b.offset() as f64), 0.0);

    let point = match system.lu().solve(&rhs) {
        Some(point) => point,
        None => system.svd(true, true).solve(&rhs, 1e-12).ok()?,
    };

    Some((Point3f::from(point.cast::<f32>()), direction.cast::<f32>()))
}

/// Junction type from plane orientation and canonical plane index.
///
/// Index 0 is the floor when the list starts with a horizontal plane, so a
/// horizontal plane anywhere else is treated as the ceiling.
pub fn classify_junction(a: &PlaneModel, index_a: usize, b: &PlaneModel, index_b: usize) -> JunctionType {
    let (h1, h2) = (a.is_horizontal(), b.is_horizontal());
    let (v1, v2) = (a.is_vertical(), b.is_vertical());

    let horizontal_edge = |index: usize| {
        if index == 0 {
            JunctionType::FloorWallInternal
        } else {
            JunctionType::CeilingWallInternal
        }
    };

    if v1 && v2 {
        return JunctionType::WallWallInternal;
    }
    if h1 && v2 {
        return horizontal_edge(index_a);
    }
    if h2 && v1 {
        return horizontal_edge(index_b);
    }
    // Oblique planes
    if h1 || h2 {
        return horizontal_edge(if h1 { index_a } else { index_b });
    }
    JunctionType::WallWallInternal
}

/// 1 - |cos| of the angle between the normals, clamped to [0, 1]
pub fn junction_confidence(a: &PlaneModel, b: &PlaneModel) -> f32 {
    (1.0 - a.normal().dot(&b.normal()).abs()).clamp(0.0, 1.0)
}

/// Millimeter-rounded key used to drop duplicate junction lines
fn dedup_key(point: &Point3f) -> (i64, i64, i64) {
    let mm = |v: f32| (v as f64 * 1000.0).round() as i64;
    (mm(point.x), mm(point.y), mm(point.z))
}

/// Junctions for every unordered pair of planes.
///
/// `planes` must be in floor, ceiling, walls order. Planes with a zero normal
/// are skipped but still occupy their index; the others are renormalized.
pub fn find_junctions(planes: &[PlaneModel]) -> Vec<Junction> {
    let parsed: Vec<(PlaneModel, usize)> = planes
        .iter()
        .enumerate()
        .filter_map(|(idx, plane)| {
            PlaneModel::from_normal_offset(plane.normal(), plane.offset()).map(|p| (p, idx))
        })
        .collect();

    if parsed.len() < 2 {
        return Vec::new();
    }

    let mut junctions = Vec::new();
    let mut seen = HashSet::new();

    for (i, (p1, idx1)) in parsed.iter().enumerate() {
        for (p2, idx2) in &parsed[i + 1..] {
            let Some((point, direction)) = plane_intersection_line(p1, p2) else {
                continue;
            };
            if !seen.insert(dedup_key(&point)) {
                continue;
            }

            junctions.push(Junction {
                junction_type: classify_junction(p1, *idx1, p2, *idx2),
                position_3d: [point.x, point.y, point.z],
                direction: Some([direction.x, direction.y, direction.z]),
                vertical_line: None,
                confidence: junction_confidence(p1, p2),
                icon: None,
            });
        }
    }

    junctions
}

/// Clip every vertical junction line to `[floor_y, ceiling_y]` and record the
/// segment as its `vertical_line`. Other junctions are left untouched.
pub fn attach_vertical_lines(junctions: &mut [Junction], floor_y: f32, ceiling_y: f32) {
    if ceiling_y <= floor_y {
        return;
    }
    for junction in junctions.iter_mut() {
        let Some(d) = junction.direction else {
            continue;
        };
        if d[1].abs() < VERTICAL_DIRECTION_Y {
            continue;
        }
        let p = junction.position_3d;
        let at = |y: f32| {
            let t = (y - p[1]) / d[1];
            [p[0] + t * d[0], y, p[2] + t * d[2]]
        };
        junction.vertical_line = Some(VerticalLine {
            bottom: at(floor_y),
            top: at(ceiling_y),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_vertical_lines_span_floor_to_ceiling() {
        let walls = PlaneModel::new(1.0, 0.0, 0.0, -2.0);
        let other = PlaneModel::new(0.0, 0.0, 1.0, -3.0);
        let floor = PlaneModel::new(0.0, 1.0, 0.0, 0.0);

        let mut junctions = find_junctions(&[floor, walls, other]);
        assert!(junctions.iter().all(|j| j.vertical_line.is_none()));
        attach_vertical_lines(&mut junctions, 0.0, 2.5);

        let vertical: Vec<&Junction> = junctions.iter().filter(|j| j.vertical_line.is_some()).collect();
        assert_eq!(vertical.len(), 1);
        let line = vertical[0].vertical_line.unwrap();
        let (bottom, top) = if line.bottom[1] < line.top[1] {
            (line.bottom, line.top)
        } else {
            (line.top, line.bottom)
        };
        assert_relative_eq!(bottom[0], 2.0, epsilon = 1e-5);
        assert_relative_eq!(bottom[2], 3.0, epsilon = 1e-5);
        assert_relative_eq!(bottom[1], 0.0);
        assert_relative_eq!(top[1], 2.5);

        let json = serde_json::to_value(&junctions).unwrap();
        let with_line = json.as_array().unwrap().iter().filter(|j| j.get("vertical_line").is_some()).count();
        assert_eq!(with_line, 1);
    }

    #[test]
    fn test_perpendicular_walls_meet_along_y() {
        let a = PlaneModel::new(1.0, 0.0, 0.0, 0.0);
        let b = PlaneModel::new(0.0, 0.0, 1.0, 0.0);

        let junctions = find_junctions(&[a, b]);
        assert_eq!(junctions.len(), 1);

        let junction = &junctions[0];
        assert_eq!(junction.junction_type, JunctionType::WallWallInternal);
        let direction = junction.direction.unwrap();
        assert_relative_eq!(direction[0], 0.0, epsilon = 1e-6);
        assert_relative_eq!(direction[1].abs(), 1.0, epsilon = 1e-6);
        assert_relative_eq!(direction[2], 0.0, epsilon = 1e-6);
        for c in junction.position_3d {
            assert_relative_eq!(c, 0.0, epsilon = 1e-6);
        }
        assert_relative_eq!(junction.confidence, 1.0);
    }

    #[test]
    fn test_line_point_lies_on_both_planes() {
        let a = PlaneModel::new(1.0, 0.0, 0.0, -2.0);
        let b = PlaneModel::new(0.0, 1.0, 0.0, -2.5);
        let (point, direction) = plane_intersection_line(&a, &b).unwrap();

        assert_relative_eq!(a.distance_to_point(&point), 0.0, epsilon = 1e-5);
        assert_relative_eq!(b.distance_to_point(&point), 0.0, epsilon = 1e-5);
        assert_relative_eq!(direction.dot(&point.coords), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_parallel_planes_have_no_junction() {
        let floor = PlaneModel::new(0.0, 1.0, 0.0, 0.0);
        let ceiling = PlaneModel::new(0.0, -1.0, 0.0, 2.5);
        assert!(plane_intersection_line(&floor, &ceiling).is_none());
        assert!(find_junctions(&[floor, ceiling]).is_empty());
    }

    #[test]
    fn test_confidence_is_monotonic_in_angle() {
        let base = PlaneModel::new(1.0, 0.0, 0.0, 0.0);
        let mut previous = f32::INFINITY;
        for degrees in [90.0f32, 70.0, 45.0, 20.0, 5.0, 0.0] {
            let r = degrees.to_radians();
            let other = PlaneModel::new(r.cos(), 0.0, r.sin(), 0.0);
            let confidence = junction_confidence(&base, &other);
            assert!(confidence <= previous);
            previous = confidence;
        }
        assert_relative_eq!(previous, 0.0, epsilon = 1e-6);

        let flipped = PlaneModel::new(-1.0, 0.0, 0.0, 0.0);
        assert_relative_eq!(junction_confidence(&base, &flipped), 0.0);
    }

    #[test]
    fn test_floor_and_ceiling_edges_use_plane_index() {
        let floor = PlaneModel::new(0.0, 1.0, 0.0, 0.0);
        let ceiling = PlaneModel::new(0.0, -1.0, 0.0, 2.5);
        let wall = PlaneModel::new(1.0, 0.0, 0.0, -1.0);

        let junctions = find_junctions(&[floor, ceiling, wall]);
        let types: Vec<JunctionType> = junctions.iter().map(|j| j.junction_type).collect();
        assert_eq!(
            types,
            vec![JunctionType::FloorWallInternal, JunctionType::CeilingWallInternal]
        );
    }

    #[test]
    fn test_oblique_plane_falls_back_to_horizontal_rule() {
        // |n_y| = 0.5: neither vertical nor horizontal
        let slope = PlaneModel::from_normal_offset(Vector3f::new(0.866, 0.5, 0.0), 0.0).unwrap();
        let floor = PlaneModel::new(0.0, 1.0, 0.0, 0.0);
        let wall = PlaneModel::new(0.0, 0.0, 1.0, 0.0);

        assert_eq!(classify_junction(&floor, 0, &slope, 1), JunctionType::FloorWallInternal);
        assert_eq!(classify_junction(&slope, 0, &floor, 3), JunctionType::CeilingWallInternal);
        assert_eq!(classify_junction(&slope, 1, &wall, 2), JunctionType::WallWallInternal);
    }

    #[test]
    fn test_zero_normal_planes_keep_their_index() {
        let degenerate = PlaneModel::new(0.0, 0.0, 0.0, 1.0);
        let floor_like = PlaneModel::new(0.0, 2.0, 0.0, 0.0);
        let wall = PlaneModel::new(0.0, 0.0, 3.0, -3.0);

        let junctions = find_junctions(&[degenerate, floor_like, wall]);
        assert_eq!(junctions.len(), 1);
        // The horizontal plane sits at index 1, so it is not the floor.
        assert_eq!(junctions[0].junction_type, JunctionType::CeilingWallInternal);
        assert_relative_eq!(junctions[0].position_3d[2], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_duplicate_lines_are_dropped() {
        // Three walls through the Y axis: every pair meets at the origin.
        let a = PlaneModel::new(1.0, 0.0, 0.0, 0.0);
        let b = PlaneModel::new(0.0, 0.0, 1.0, 0.0);
        let c = PlaneModel::from_normal_offset(Vector3f::new(1.0, 0.0, 1.0), 0.0).unwrap();
        assert_eq!(find_junctions(&[a, b, c]).len(), 1);
    }

    #[test]
    fn test_junction_serializes_type_field() {
        let json = serde_json::to_value(&find_junctions(&[
            PlaneModel::new(1.0, 0.0, 0.0, 0.0),
            PlaneModel::new(0.0, 0.0, 1.0, 0.0),
        ]))
        .unwrap();
        assert_eq!(json[0]["type"], "wall_wall_internal");
        assert!(json[0].get("icon").is_none());
    }
}
