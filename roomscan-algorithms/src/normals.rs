//! Normal estimation algorithms

use crate::nearest_neighbor::PointIndex;
use nalgebra::Matrix3;
use rayon::prelude::*;
use roomscan_core::{Error, NearestNeighborSearch, Point3f, Result, ScanCloud, Vector3f};

/// Normal of the best-fit plane through `neighbors` (smallest-eigenvalue
/// eigenvector of the covariance matrix), or `None` for degenerate sets.
pub fn fit_normal(neighbors: &[Point3f]) -> Option<Vector3f> {
    if neighbors.len() < 3 {
        return None;
    }

    let n = neighbors.len() as f32;
    let centroid = neighbors.iter().fold(Vector3f::zeros(), |acc, p| acc + p.coords) / n;

    let mut covariance = Matrix3::zeros();
    for point in neighbors {
        let diff = point.coords - centroid;
        covariance += diff * diff.transpose();
    }
    covariance /= n;

    let eigen = covariance.symmetric_eigen();
    let (smallest, _) = eigen
        .eigenvalues
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(b.1))?;

    let normal = eigen.eigenvectors.column(smallest).into_owned();
    let magnitude = normal.magnitude();
    if magnitude < 1e-8 || !magnitude.is_finite() {
        return None;
    }
    Some(normal / magnitude)
}

/// Estimate normals for a fused scan cloud using k-nearest neighbors.
///
/// Points whose neighborhood is degenerate keep `normal = None`. Normals are
/// not consistently oriented.
pub fn estimate_normals(cloud: &mut ScanCloud, k: usize) -> Result<()> {
    if cloud.is_empty() {
        return Ok(());
    }
    if k < 3 {
        return Err(Error::InvalidData("k must be at least 3 for normal estimation".to_string()));
    }

    let positions = cloud.positions();
    let index = PointIndex::new(&positions);

    let normals: Vec<Option<Vector3f>> = positions
        .par_iter()
        .map(|query| {
            let neighbors: Vec<Point3f> = index
                .find_k_nearest(query, k)
                .into_iter()
                .map(|(idx, _)| positions[idx])
                .collect();
            fit_normal(&neighbors)
        })
        .collect();

    for (point, normal) in cloud.iter_mut().zip(normals) {
        point.normal = normal;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomscan_core::{PointCloud, ScanPoint};

    #[test]
    fn test_fit_normal_on_floor_patch() {
        let mut points = Vec::new();
        for i in 0..5 {
            for j in 0..5 {
                points.push(Point3f::new(i as f32 * 0.1, 0.0, j as f32 * 0.1));
            }
        }
        let normal = fit_normal(&points).unwrap();
        assert!(normal.y.abs() > 0.999, "normal should point along Y: {:?}", normal);
    }

    #[test]
    fn test_fit_normal_needs_three_points() {
        assert!(fit_normal(&[Point3f::origin(), Point3f::new(1.0, 0.0, 0.0)]).is_none());
    }

    #[test]
    fn test_estimate_normals_on_wall() {
        let mut cloud: ScanCloud = PointCloud::new();
        for i in 0..20 {
            for j in 0..20 {
                cloud.push(ScanPoint::from_position(Point3f::new(
                    i as f32 * 0.03,
                    j as f32 * 0.03,
                    1.0,
                )));
            }
        }

        estimate_normals(&mut cloud, 10).unwrap();
        for point in cloud.iter() {
            let normal = point.normal.expect("every wall point has a neighborhood");
            assert!(normal.z.abs() > 0.99);
        }
    }

    #[test]
    fn test_estimate_normals_on_sparse_cloud() {
        // A handful of points spread over a room, far fewer than k.
        let mut cloud: ScanCloud = (0..20)
            .map(|i| {
                let t = i as f32 * 0.3;
                ScanPoint::from_position(Point3f::new(t, (i % 3) as f32 * 1.2, 6.0 - t))
            })
            .collect();

        let started = std::time::Instant::now();
        estimate_normals(&mut cloud, 30).unwrap();
        assert!(started.elapsed() < std::time::Duration::from_secs(1));
        assert!(cloud.iter().all(|p| p.normal.map_or(true, |n| (n.magnitude() - 1.0).abs() < 1e-4)));
    }

    #[test]
    fn test_estimate_normals_rejects_small_k() {
        let mut cloud: ScanCloud = PointCloud::from_points(vec![ScanPoint::from_position(Point3f::origin())]);
        assert!(estimate_normals(&mut cloud, 2).is_err());
    }
}
