//! Top-down coverage and missing-zone analysis
//!
//! The cloud is projected onto the X/Z floor plane and rasterized into a
//! boolean occupancy grid. Connected empty regions large enough to matter are
//! reported as rectangular "unscanned" zones.

use roomscan_core::{Bounded, Error, Point3f, Result, TrajectoryPoint};
use serde::{Deserialize, Serialize};

/// Transparency of trajectory path segments
pub const WEB_LINE_ALPHA: f32 = 0.25;

const GRID_WEIGHT: f32 = 0.7;
const PROGRESS_WEIGHT: f32 = 0.3;

/// Occupancy grid parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverageParams {
    pub cell_size_m: f32,
    pub max_missing_zones: usize,
    /// Empty components with fewer cells than this are ignored
    pub tiny_hole_cells: usize,
    /// Largest grid that will be allocated; bigger extents are rejected
    pub max_grid_cells: usize,
}

impl Default for CoverageParams {
    fn default() -> Self {
        Self {
            cell_size_m: 0.4,
            max_missing_zones: 5,
            tiny_hole_cells: 4,
            max_grid_cells: 1_000_000,
        }
    }
}

/// Trajectory path segment projected to X/Z
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebLine {
    pub start: [f32; 2],
    pub end: [f32; 2],
    pub alpha: f32,
}

/// Rectangular unscanned region in X/Z
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingZone {
    pub boundary: Vec<[f32; 2]>,
    pub label: String,
}

impl MissingZone {
    pub fn unscanned(x1: f32, z1: f32, x2: f32, z2: f32) -> Self {
        Self {
            boundary: vec![[x1, z1], [x2, z1], [x2, z2], [x1, z2]],
            label: "unscanned".to_string(),
        }
    }

    /// Placeholder zone reported when a scan has no data at all
    pub fn no_data() -> Self {
        Self {
            boundary: vec![[0.0, 0.0]],
            label: "no_data".to_string(),
        }
    }

    /// Area of the zone's bounding rectangle
    pub fn area(&self) -> f32 {
        match self.boundary.as_slice() {
            [a, b, _, d, ..] => ((b[0] - a[0]) * (d[1] - a[1])).abs(),
            _ => 0.0,
        }
    }
}

/// Coverage summary reported with every scan result
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CoverageData {
    /// Blended coverage in [0, 100]
    pub percentage: f32,
    #[serde(default)]
    pub web_lines: Vec<WebLine>,
    #[serde(default)]
    pub missing_zones: Vec<MissingZone>,
}

/// Boolean X/Z occupancy grid, cells indexed `[ix * nz + iz]`
#[derive(Debug, Clone)]
pub struct OccupancyGrid {
    origin: [f32; 2],
    cell_size: f32,
    nx: usize,
    nz: usize,
    occupied: Vec<bool>,
}

impl OccupancyGrid {
    /// Rasterize `points`. Returns `None` when the cloud is empty or its X/Z
    /// extent is degenerate on either axis, and an error when the grid would
    /// need more than `max_cells` cells.
    pub fn from_points(points: &[Point3f], cell_size: f32, max_cells: usize) -> Result<Option<Self>> {
        if cell_size <= 0.0 || !cell_size.is_finite() {
            return Ok(None);
        }
        let Some((min, max)) = points.bounding_box() else {
            return Ok(None);
        };

        let (span_x, span_z) = (max.x - min.x, max.z - min.z);
        if span_x <= 1e-6 || span_z <= 1e-6 {
            return Ok(None);
        }

        let nx = ((span_x / cell_size).ceil() as usize).max(1);
        let nz = ((span_z / cell_size).ceil() as usize).max(1);
        if nx.saturating_mul(nz) > max_cells {
            return Err(Error::InvalidData(format!(
                "occupancy grid of {nx}x{nz} cells exceeds the limit of {max_cells}"
            )));
        }
        let (min_x, min_z) = (min.x, min.z);
        let mut occupied = vec![false; nx * nz];

        for p in points {
            let ix = (((p.x - min_x) / cell_size) as usize).min(nx - 1);
            let iz = (((p.z - min_z) / cell_size) as usize).min(nz - 1);
            occupied[ix * nz + iz] = true;
        }

        Ok(Some(Self {
            origin: [min_x, min_z],
            cell_size,
            nx,
            nz,
            occupied,
        }))
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.nx, self.nz)
    }

    pub fn is_occupied(&self, ix: usize, iz: usize) -> bool {
        self.occupied[ix * self.nz + iz]
    }

    pub fn occupied_count(&self) -> usize {
        self.occupied.iter().filter(|&&o| o).count()
    }

    /// Occupied cells as a percentage of all cells
    pub fn coverage_percent(&self) -> f32 {
        let total = self.occupied.len().max(1);
        (100.0 * self.occupied_count() as f32 / total as f32).clamp(0.0, 100.0)
    }

    /// Connected empty regions (4-neighborhood) with at least `min_cells`
    /// cells, each as the list of its `(ix, iz)` cells
    pub fn empty_components(&self, min_cells: usize) -> Vec<Vec<(usize, usize)>> {
        let mut visited = vec![false; self.occupied.len()];
        let mut components = Vec::new();
        let mut stack = Vec::new();

        for sx in 0..self.nx {
            for sz in 0..self.nz {
                let start = sx * self.nz + sz;
                if self.occupied[start] || visited[start] {
                    continue;
                }

                visited[start] = true;
                stack.push((sx, sz));
                let mut cells = Vec::new();

                while let Some((cx, cz)) = stack.pop() {
                    cells.push((cx, cz));
                    let neighbors = [
                        (cx.wrapping_sub(1), cz),
                        (cx + 1, cz),
                        (cx, cz.wrapping_sub(1)),
                        (cx, cz + 1),
                    ];
                    for (x, z) in neighbors {
                        if x >= self.nx || z >= self.nz {
                            continue;
                        }
                        let idx = x * self.nz + z;
                        if !self.occupied[idx] && !visited[idx] {
                            visited[idx] = true;
                            stack.push((x, z));
                        }
                    }
                }

                if cells.len() >= min_cells {
                    components.push(cells);
                }
            }
        }

        components
    }

    /// World-space bounding rectangle of a set of cells
    fn zone_for(&self, cells: &[(usize, usize)]) -> MissingZone {
        let min_cx = cells.iter().map(|c| c.0).min().unwrap_or(0);
        let max_cx = cells.iter().map(|c| c.0).max().unwrap_or(0);
        let min_cz = cells.iter().map(|c| c.1).min().unwrap_or(0);
        let max_cz = cells.iter().map(|c| c.1).max().unwrap_or(0);

        let [ox, oz] = self.origin;
        let s = self.cell_size;
        MissingZone::unscanned(
            ox + min_cx as f32 * s,
            oz + min_cz as f32 * s,
            ox + (max_cx + 1) as f32 * s,
            oz + (max_cz + 1) as f32 * s,
        )
    }

    /// The `max_zones` largest unscanned zones, largest first
    pub fn missing_zones(&self, min_cells: usize, max_zones: usize) -> Vec<MissingZone> {
        let mut zones: Vec<MissingZone> = self
            .empty_components(min_cells)
            .iter()
            .map(|cells| self.zone_for(cells))
            .collect();
        zones.sort_by(|a, b| b.area().total_cmp(&a.area()));
        zones.truncate(max_zones);
        zones
    }
}

/// Occupancy-grid coverage of a cloud: `(missing zones, percentage)`.
/// Empty or degenerate clouds yield no zones and 0%.
pub fn analyze_occupancy(points: &[Point3f], params: &CoverageParams) -> Result<(Vec<MissingZone>, f32)> {
    let analysis = match OccupancyGrid::from_points(points, params.cell_size_m, params.max_grid_cells)? {
        Some(grid) => (
            grid.missing_zones(params.tiny_hole_cells, params.max_missing_zones),
            grid.coverage_percent(),
        ),
        None => (Vec::new(), 0.0),
    };
    Ok(analysis)
}

/// One X/Z segment per consecutive pair of trajectory points
pub fn trajectory_web_lines(trajectory: &[TrajectoryPoint]) -> Vec<WebLine> {
    trajectory
        .windows(2)
        .map(|pair| WebLine {
            start: [pair[0].position[0], pair[0].position[2]],
            end: [pair[1].position[0], pair[1].position[2]],
            alpha: WEB_LINE_ALPHA,
        })
        .collect()
}

/// Blend grid coverage with a saturating frame-progress estimate so early,
/// sparse scans do not report 0%
pub fn blend_coverage(grid_percent: f32, frames_count: usize) -> f32 {
    let progress = (10.0 + frames_count as f32 * 2.5).min(100.0);
    (GRID_WEIGHT * grid_percent + PROGRESS_WEIGHT * progress).clamp(0.0, 100.0)
}

/// Full coverage record for a scan
pub fn build_coverage(
    points: &[Point3f],
    trajectory: &[TrajectoryPoint],
    frames_count: usize,
    params: &CoverageParams,
) -> Result<CoverageData> {
    let (missing_zones, grid_percent) = analyze_occupancy(points, params)?;
    Ok(CoverageData {
        percentage: blend_coverage(grid_percent, frames_count),
        web_lines: trajectory_web_lines(trajectory),
        missing_zones,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn floor_grid(step: f32, n: usize, skip: impl Fn(f32, f32) -> bool) -> Vec<Point3f> {
        let mut points = Vec::new();
        for i in 0..=n {
            for j in 0..=n {
                let (x, z) = (i as f32 * step, j as f32 * step);
                if !skip(x, z) {
                    points.push(Point3f::new(x, 0.0, z));
                }
            }
        }
        points
    }

    #[test]
    fn test_empty_cloud_has_zero_coverage() {
        let (zones, percent) = analyze_occupancy(&[], &CoverageParams::default()).unwrap();
        assert!(zones.is_empty());
        assert_eq!(percent, 0.0);
    }

    #[test]
    fn test_degenerate_extent_has_zero_coverage() {
        let line: Vec<Point3f> = (0..50).map(|i| Point3f::new(i as f32 * 0.1, 1.0, 2.0)).collect();
        let (zones, percent) = analyze_occupancy(&line, &CoverageParams::default()).unwrap();
        assert!(zones.is_empty());
        assert_eq!(percent, 0.0);
    }

    #[test]
    fn test_full_occupancy() {
        let params = CoverageParams {
            cell_size_m: 0.5,
            ..CoverageParams::default()
        };
        let (zones, percent) = analyze_occupancy(&floor_grid(0.25, 16, |_, _| false), &params).unwrap();
        assert_relative_eq!(percent, 100.0);
        assert!(zones.is_empty());
    }

    #[test]
    fn test_hole_becomes_missing_zone() {
        let params = CoverageParams {
            cell_size_m: 0.5,
            ..CoverageParams::default()
        };
        let points = floor_grid(0.25, 16, |x, z| x > 1.0 && x < 3.0 && z > 1.0 && z < 3.0);
        let grid = OccupancyGrid::from_points(&points, params.cell_size_m, params.max_grid_cells)
            .unwrap()
            .unwrap();
        assert_eq!(grid.dimensions(), (8, 8));
        assert!(!grid.is_occupied(4, 4));

        let (zones, percent) = analyze_occupancy(&points, &params).unwrap();
        assert_relative_eq!(percent, 100.0 * 55.0 / 64.0, epsilon = 1e-4);
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].label, "unscanned");
        assert_eq!(zones[0].boundary, vec![[1.5, 1.5], [3.0, 1.5], [3.0, 3.0], [1.5, 3.0]]);
        assert_relative_eq!(zones[0].area(), 2.25);
    }

    #[test]
    fn test_tiny_holes_are_ignored_and_zones_capped() {
        let params = CoverageParams {
            cell_size_m: 0.5,
            max_missing_zones: 1,
            tiny_hole_cells: 4,
            ..CoverageParams::default()
        };
        // One single-cell hole and two larger holes of different size.
        let points = floor_grid(0.25, 16, |x, z| {
            let single = (0.5..1.0).contains(&x) && (0.5..1.0).contains(&z);
            let small = (2.5..3.5).contains(&x) && (0.5..1.5).contains(&z);
            let large = (0.5..2.0).contains(&x) && (2.0..3.5).contains(&z);
            single || small || large
        });

        let grid = OccupancyGrid::from_points(&points, params.cell_size_m, params.max_grid_cells)
            .unwrap()
            .unwrap();
        let components = grid.empty_components(params.tiny_hole_cells);
        assert_eq!(components.len(), 2);

        let zones = grid.missing_zones(params.tiny_hole_cells, params.max_missing_zones);
        assert_eq!(zones.len(), 1);
        assert_relative_eq!(zones[0].area(), 1.5 * 1.5);
    }

    #[test]
    fn test_oversized_grid_is_rejected() {
        let far_apart = [Point3f::new(0.0, 0.0, 0.0), Point3f::new(5000.0, 0.0, 5000.0)];
        let params = CoverageParams::default();
        assert!(analyze_occupancy(&far_apart, &params).is_err());

        let coarse = CoverageParams {
            cell_size_m: 10.0,
            ..params
        };
        let (_, percent) = analyze_occupancy(&far_apart, &coarse).unwrap();
        assert!(percent > 0.0);
    }

    #[test]
    fn test_web_lines_follow_trajectory() {
        let trajectory = vec![
            TrajectoryPoint::new(0.0, [0.0, 1.5, 0.0], None),
            TrajectoryPoint::new(1.0, [1.0, 1.5, 2.0], None),
            TrajectoryPoint::new(2.0, [1.0, 1.6, 3.0], None),
        ];
        let lines = trajectory_web_lines(&trajectory);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].start, [0.0, 0.0]);
        assert_eq!(lines[0].end, [1.0, 2.0]);
        assert_eq!(lines[1].alpha, WEB_LINE_ALPHA);
        assert!(trajectory_web_lines(&trajectory[..1]).is_empty());
    }

    #[test]
    fn test_blend_coverage() {
        assert_relative_eq!(blend_coverage(0.0, 0), 3.0);
        assert_relative_eq!(blend_coverage(50.0, 4), 35.0 + 6.0);
        assert_relative_eq!(blend_coverage(100.0, 1000), 100.0);
    }
}
