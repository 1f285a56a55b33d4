//! Filtering algorithms

use roomscan_core::{Bounded, ColoredPoint3f, Error, Point3f, PointCloud, Result, Vector3f};
use std::collections::BTreeMap;

type VoxelKey = (i64, i64, i64);

struct VoxelBin {
    position_sum: Vector3f,
    color_sum: [u32; 3],
    count: u32,
}

impl Default for VoxelBin {
    fn default() -> Self {
        Self {
            position_sum: Vector3f::zeros(),
            color_sum: [0; 3],
            count: 0,
        }
    }
}

impl VoxelBin {
    fn add(&mut self, position: &Point3f, color: [u8; 3]) {
        self.position_sum += position.coords;
        for (sum, c) in self.color_sum.iter_mut().zip(color) {
            *sum += c as u32;
        }
        self.count += 1;
    }

    fn centroid(&self) -> Point3f {
        Point3f::from(self.position_sum / self.count as f32)
    }

    fn mean_color(&self) -> [u8; 3] {
        let n = self.count.max(1);
        [
            ((self.color_sum[0] + n / 2) / n) as u8,
            ((self.color_sum[1] + n / 2) / n) as u8,
            ((self.color_sum[2] + n / 2) / n) as u8,
        ]
    }
}

fn check_voxel_size(voxel_size: f32) -> Result<()> {
    if voxel_size <= 0.0 || !voxel_size.is_finite() {
        return Err(Error::InvalidData("voxel_size must be positive".to_string()));
    }
    Ok(())
}

fn voxel_key(point: &Point3f, origin: &Point3f, voxel_size: f32) -> VoxelKey {
    (
        ((point.x - origin.x) / voxel_size).floor() as i64,
        ((point.y - origin.y) / voxel_size).floor() as i64,
        ((point.z - origin.z) / voxel_size).floor() as i64,
    )
}

/// Voxel downsampling for colored clouds; positions and colors are averaged per voxel
pub fn voxel_downsample_colored(
    cloud: &PointCloud<ColoredPoint3f>,
    voxel_size: f32,
) -> Result<PointCloud<ColoredPoint3f>> {
    let Some((origin, _)) = cloud.bounding_box() else {
        return Ok(PointCloud::new());
    };
    check_voxel_size(voxel_size)?;

    let mut voxels: BTreeMap<VoxelKey, VoxelBin> = BTreeMap::new();
    for point in cloud.iter() {
        voxels
            .entry(voxel_key(&point.position, &origin, voxel_size))
            .or_default()
            .add(&point.position, point.color);
    }

    Ok(voxels
        .values()
        .map(|bin| ColoredPoint3f::new(bin.centroid(), bin.mean_color()))
        .collect())
}
