//! Scan input handling
//!
//! This crate turns raw scan inputs into geometry: it decodes color and depth
//! frames, parses trajectories, fuses posed RGB-D frames into one cloud and
//! exports clouds as PLY.

pub mod error;
pub mod frames;
pub mod fusion;
pub mod ply;
pub mod trajectory;

pub use error::*;
pub use frames::{back_project, decode_color, decode_depth, normalize_depth, synthetic_depth, DepthMap, PinholeIntrinsics};
pub use fusion::{frame_to_cloud, fuse_frames, read_blobs, FusionParams};
pub use ply::{read_scan_cloud, read_scan_cloud_file, write_scan_cloud, write_scan_cloud_file};
pub use trajectory::{parse_trajectory_json, read_trajectory, validate_trajectory};

use image::ImageFormat;

/// True when the blob starts with a JPEG signature
pub fn is_jpeg(bytes: &[u8]) -> bool {
    matches!(image::guess_format(bytes), Ok(ImageFormat::Jpeg))
}
