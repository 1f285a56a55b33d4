//! Multi-frame RGB-D fusion
//!
//! Each frame is back-projected with its own pose into a shared world frame.
//! The merged cloud is voxel-downsampled and given per-point normals.

use crate::frames::{back_project, decode_color, decode_depth, synthetic_depth, DepthMap, PinholeIntrinsics};
use image::RgbImage;
use rayon::prelude::*;
use roomscan_algorithms::{estimate_normals, voxel_downsample_colored};
use roomscan_core::{pose_for_frame, ColoredPoint3f, Pose, PointCloud, Result, ScanCloud, ScanPoint, TrajectoryPoint};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Fusion parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionParams {
    /// Voxel edge length for downsampling the merged cloud (meters)
    pub voxel_size: f32,
    /// Depth samples farther than this are dropped (meters)
    pub depth_trunc_m: f32,
    /// Raw depth units per meter
    pub depth_scale: f32,
    /// Neighbors used for normal estimation
    pub normal_neighbors: usize,
}

impl Default for FusionParams {
    fn default() -> Self {
        Self {
            voxel_size: 0.03,
            depth_trunc_m: 5.0,
            depth_scale: 1000.0,
            normal_neighbors: 30,
        }
    }
}

/// Depth for one frame: the decoded depth blob when it is usable, otherwise
/// the luminance placeholder
fn frame_depth(index: usize, color: &RgbImage, depth_bytes: Option<&[u8]>) -> DepthMap {
    if let Some(bytes) = depth_bytes {
        match decode_depth(bytes) {
            Ok(depth) if depth.width() == color.width() && depth.height() == color.height() => return depth,
            Ok(depth) => debug!(
                frame = index,
                depth_size = ?(depth.width(), depth.height()),
                color_size = ?color.dimensions(),
                "depth size differs from color, using synthetic depth"
            ),
            Err(e) => debug!(frame = index, error = %e, "unreadable depth, using synthetic depth"),
        }
    }
    synthetic_depth(color)
}

/// World-frame colored points of a single frame, or `None` if the color blob
/// cannot be decoded
pub fn frame_to_cloud(
    index: usize,
    color_bytes: &[u8],
    depth_bytes: Option<&[u8]>,
    pose: &Pose,
    params: &FusionParams,
) -> Option<PointCloud<ColoredPoint3f>> {
    let color = match decode_color(color_bytes) {
        Ok(color) if color.width() > 0 && color.height() > 0 => color,
        Ok(_) => {
            debug!(frame = index, "skipping empty frame");
            return None;
        }
        Err(e) => {
            debug!(frame = index, error = %e, "skipping unreadable frame");
            return None;
        }
    };

    let depth = frame_depth(index, &color, depth_bytes);
    let intrinsics = PinholeIntrinsics::uncalibrated(color.width(), color.height());
    let mut cloud = back_project(&color, &depth, &intrinsics, params.depth_scale, params.depth_trunc_m);
    cloud.transform(&pose.to_transform());
    Some(cloud)
}

/// Fuse posed frames into one downsampled cloud with normals.
///
/// `depth` is index-aligned with `frames` and may be shorter. Frame `i` uses
/// trajectory point `i`, or the identity pose past the end of the trajectory.
/// Undecodable frames are skipped; no frames at all yields an empty cloud.
pub fn fuse_frames(
    frames: &[Vec<u8>],
    depth: Option<&[Vec<u8>]>,
    trajectory: &[TrajectoryPoint],
    params: &FusionParams,
) -> Result<ScanCloud> {
    let per_frame: Vec<PointCloud<ColoredPoint3f>> = frames
        .par_iter()
        .enumerate()
        .filter_map(|(index, color_bytes)| {
            let depth_bytes = depth.and_then(|d| d.get(index)).map(Vec::as_slice);
            frame_to_cloud(index, color_bytes, depth_bytes, &pose_for_frame(trajectory, index), params)
        })
        .collect();

    let mut merged = PointCloud::with_capacity(per_frame.iter().map(PointCloud::len).sum());
    for mut cloud in per_frame {
        merged.append(&mut cloud);
    }
    if merged.is_empty() {
        return Ok(ScanCloud::new());
    }

    let raw_points = merged.len();
    let downsampled = voxel_downsample_colored(&merged, params.voxel_size)?;
    let mut cloud: ScanCloud = downsampled.into_iter().map(ScanPoint::from).collect();
    estimate_normals(&mut cloud, params.normal_neighbors)?;

    debug!(frames = frames.len(), raw_points, fused_points = cloud.len(), "fused frames");
    Ok(cloud)
}

/// Read blobs from disk, one per path. Unreadable files become empty blobs so
/// indices stay aligned with the trajectory; fusion skips them.
pub fn read_blobs<P: AsRef<Path>>(paths: &[P]) -> Vec<Vec<u8>> {
    paths
        .iter()
        .map(|path| {
            std::fs::read(path).unwrap_or_else(|e| {
                debug!(path = %path.as_ref().display(), error = %e, "unreadable input file");
                Vec::new()
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use image::{DynamicImage, ImageBuffer, ImageFormat, Luma, Rgb};
    use std::io::Cursor;

    fn png(image: DynamicImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
        bytes
    }

    fn flat_color(width: u32, height: u32) -> Vec<u8> {
        png(DynamicImage::ImageRgb8(ImageBuffer::from_pixel(width, height, Rgb([128u8, 128, 128]))))
    }

    fn flat_depth(width: u32, height: u32, mm: u16) -> Vec<u8> {
        png(DynamicImage::ImageLuma16(ImageBuffer::from_pixel(width, height, Luma([mm]))))
    }

    #[test]
    fn test_fuse_single_frame_with_depth() {
        let frames = vec![flat_color(40, 30)];
        let depth = vec![flat_depth(40, 30, 2000)];
        let cloud = fuse_frames(&frames, Some(depth.as_slice()), &[], &FusionParams::default()).unwrap();

        assert!(!cloud.is_empty());
        for point in cloud.iter() {
            assert_relative_eq!(point.position.z, 2.0, epsilon = 1e-4);
            assert_eq!(point.color, Some([128, 128, 128]));
            let normal = point.normal.expect("flat wall points have normals");
            assert!(normal.z.abs() > 0.99);
        }
    }

    #[test]
    fn test_pose_moves_frame_into_world() {
        let frames = vec![flat_color(20, 20)];
        let depth = vec![flat_depth(20, 20, 1000)];
        let trajectory = vec![TrajectoryPoint::new(0.0, [0.0, 0.0, 3.0], None)];
        let cloud = fuse_frames(&frames, Some(depth.as_slice()), &trajectory, &FusionParams::default()).unwrap();

        assert!(cloud.iter().all(|p| (p.position.z - 4.0).abs() < 1e-4));
    }

    #[test]
    fn test_unreadable_frames_are_skipped() {
        let frames = vec![b"garbage".to_vec(), Vec::new(), flat_color(10, 10)];
        let cloud = fuse_frames(&frames, None, &[], &FusionParams::default()).unwrap();
        assert!(!cloud.is_empty());

        let nothing = fuse_frames(&frames[..2], None, &[], &FusionParams::default()).unwrap();
        assert!(nothing.is_empty());
    }

    #[test]
    fn test_bad_depth_falls_back_to_synthetic() {
        let frames = vec![flat_color(10, 10)];
        let wrong_size = vec![flat_depth(5, 5, 1000)];
        let cloud = fuse_frames(&frames, Some(wrong_size.as_slice()), &[], &FusionParams::default()).unwrap();

        // Mid-gray synthetic depth: 0.5 + (1 - 128/255) * 2.5 m
        let expected = (500.0 + (1.0 - 128.0 / 255.0) * 2500.0f32).trunc() / 1000.0;
        assert!(cloud.iter().all(|p| (p.position.z - expected).abs() < 2e-3));
    }

    #[test]
    fn test_read_blobs_keeps_alignment() {
        let blobs = read_blobs(&["/nonexistent/frame_0000.jpg"]);
        assert_eq!(blobs, vec![Vec::<u8>::new()]);
    }
}
