//! Color and depth frame decoding
//!
//! Color frames are coerced to 8-bit RGB. Depth frames are normalized to a
//! millimeter buffer regardless of how they were stored. When no depth is
//! available a placeholder depth is synthesized from luminance; it is a rough
//! approximation, not a measurement.

use crate::error::{IoError, IoResult};
use image::{ColorType, DynamicImage, RgbImage};
use roomscan_core::{ColoredPoint3f, Point3f, PointCloud};

/// Nearest depth produced by the 8-bit and synthetic mappings (meters)
pub const PROXY_NEAR_M: f32 = 0.5;
/// Depth range covered by the 8-bit and synthetic mappings (meters)
pub const PROXY_RANGE_M: f32 = 2.5;
/// Float depth maps are clamped to this range (meters)
pub const MAX_FLOAT_DEPTH_M: f32 = 10.0;

/// Row-major depth buffer in millimeters; zero means "no depth"
#[derive(Debug, Clone, PartialEq)]
pub struct DepthMap {
    width: u32,
    height: u32,
    millimeters: Vec<u16>,
}

impl DepthMap {
    pub fn new(width: u32, height: u32, millimeters: Vec<u16>) -> IoResult<Self> {
        let expected = width as usize * height as usize;
        if millimeters.len() != expected {
            return Err(IoError::DepthSize {
                expected,
                actual: millimeters.len(),
            });
        }
        Ok(Self {
            width,
            height,
            millimeters,
        })
    }

    fn from_samples(width: u32, height: u32, samples: impl Iterator<Item = u16>) -> Self {
        Self {
            width,
            height,
            millimeters: samples.collect(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> u16 {
        self.millimeters[(y * self.width + x) as usize]
    }

    pub fn as_slice(&self) -> &[u16] {
        &self.millimeters
    }
}

/// Meters to whole millimeters, truncating
fn to_millimeters(meters: f32) -> u16 {
    (meters * 1000.0) as u16
}

/// 0..1 intensity to the 0.5..3.0 m proxy range
fn proxy_depth_m(intensity: f32) -> f32 {
    PROXY_NEAR_M + intensity * PROXY_RANGE_M
}

/// Decode a color frame and coerce it to 3-channel 8-bit
pub fn decode_color(bytes: &[u8]) -> IoResult<RgbImage> {
    Ok(image::load_from_memory(bytes)?.to_rgb8())
}

/// Decode a depth frame into millimeters
pub fn decode_depth(bytes: &[u8]) -> IoResult<DepthMap> {
    Ok(normalize_depth(&image::load_from_memory(bytes)?))
}

/// Normalize a decoded depth image to millimeters using its first channel.
///
/// 16-bit integers are taken as millimeters. Floats are meters, clamped to
/// [0, 10]. 8-bit values map linearly onto 0.5..3.0 m.
pub fn normalize_depth(image: &DynamicImage) -> DepthMap {
    let (width, height) = (image.width(), image.height());
    match image.color() {
        ColorType::Rgb32F | ColorType::Rgba32F => DepthMap::from_samples(
            width,
            height,
            image
                .to_rgba32f()
                .pixels()
                .map(|p| to_millimeters(p[0].clamp(0.0, MAX_FLOAT_DEPTH_M))),
        ),
        ColorType::L8 | ColorType::La8 | ColorType::Rgb8 | ColorType::Rgba8 => DepthMap::from_samples(
            width,
            height,
            image
                .to_rgba8()
                .pixels()
                .map(|p| to_millimeters(proxy_depth_m(p[0] as f32 / 255.0))),
        ),
        _ => DepthMap::from_samples(width, height, image.to_rgba16().pixels().map(|p| p[0])),
    }
}

/// Placeholder depth from luminance: bright pixels are near, dark pixels far
pub fn synthetic_depth(color: &RgbImage) -> DepthMap {
    DepthMap::from_samples(
        color.width(),
        color.height(),
        color.pixels().map(|p| {
            let gray = (0.299 * p[0] as f32 + 0.587 * p[1] as f32 + 0.114 * p[2] as f32) / 255.0;
            to_millimeters(proxy_depth_m(1.0 - gray))
        }),
    )
}

/// Pinhole camera model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinholeIntrinsics {
    pub width: u32,
    pub height: u32,
    pub fx: f32,
    pub fy: f32,
    pub cx: f32,
    pub cy: f32,
}

impl PinholeIntrinsics {
    /// Intrinsics for an uncalibrated camera: focal length max(width, height),
    /// principal point at the image center
    pub fn uncalibrated(width: u32, height: u32) -> Self {
        let focal = width.max(height) as f32;
        Self {
            width,
            height,
            fx: focal,
            fy: focal,
            cx: width as f32 / 2.0,
            cy: height as f32 / 2.0,
        }
    }
}

/// Back-project an RGB-D pair into camera-frame colored points.
///
/// Depth is divided by `depth_scale` to get meters; samples that are zero or
/// farther than `depth_trunc_m` produce no point.
pub fn back_project(
    color: &RgbImage,
    depth: &DepthMap,
    intrinsics: &PinholeIntrinsics,
    depth_scale: f32,
    depth_trunc_m: f32,
) -> PointCloud<ColoredPoint3f> {
    let width = color.width().min(depth.width());
    let height = color.height().min(depth.height());
    let mut cloud = PointCloud::with_capacity((width * height) as usize);

    for v in 0..height {
        for u in 0..width {
            let z = depth.get(u, v) as f32 / depth_scale;
            if z <= 0.0 || z > depth_trunc_m {
                continue;
            }
            let x = (u as f32 - intrinsics.cx) * z / intrinsics.fx;
            let y = (v as f32 - intrinsics.cy) * z / intrinsics.fy;
            cloud.push(ColoredPoint3f::new(Point3f::new(x, y, z), color.get_pixel(u, v).0));
        }
    }

    cloud
}
