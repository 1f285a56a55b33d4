//! Scan request and result records

use roomscan_algorithms::{CoverageData, Dimensions, Junction, MissingZone};
use roomscan_classify::{FramePlane, Reveal};
use roomscan_core::TrajectoryPoint;
use serde::{Deserialize, Serialize};

/// One batch of frames for a scan session
#[derive(Debug, Clone, Default)]
pub struct ScanRequest {
    pub scan_id: String,
    /// Encoded color frames
    pub frames: Vec<Vec<u8>>,
    /// Encoded depth maps, index-aligned with `frames`
    pub depth: Option<Vec<Vec<u8>>>,
    /// Device poses, index-aligned with `frames`
    pub trajectory: Option<Vec<TrajectoryPoint>>,
}

impl ScanRequest {
    pub fn new(scan_id: impl Into<String>, frames: Vec<Vec<u8>>) -> Self {
        Self {
            scan_id: scan_id.into(),
            frames,
            ..Self::default()
        }
    }

    pub fn with_depth(mut self, depth: Vec<Vec<u8>>) -> Self {
        self.depth = Some(depth);
        self
    }

    pub fn with_trajectory(mut self, trajectory: Vec<TrajectoryPoint>) -> Self {
        self.trajectory = Some(trajectory);
        self
    }

    /// Depth maps supplied with the batch; an empty list counts as none
    pub fn depth_maps(&self) -> Option<&[Vec<u8>]> {
        self.depth.as_deref().filter(|depth| !depth.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QualityMetrics {
    /// Overall score in [0, 1]
    pub scan_quality: f32,
    pub junction_count: usize,
    /// Room corners (of 4) without a detected wall-wall junction
    pub missing_corners: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planes_count: Option<usize>,
}

/// Everything computed for one processed batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub scan_id: String,
    pub coverage: CoverageData,
    pub junctions: Vec<Junction>,
    pub dimensions: Dimensions,
    pub quality_metrics: QualityMetrics,
    #[serde(default)]
    pub reveals: Vec<Reveal>,
    #[serde(default)]
    pub frame_planes: Vec<FramePlane>,
    #[serde(default)]
    pub frame_linear_m_total: f32,
}

impl ScanResult {
    /// Result reported for a scan that was never processed
    pub fn no_data(scan_id: impl Into<String>) -> Self {
        Self {
            scan_id: scan_id.into(),
            coverage: CoverageData {
                percentage: 0.0,
                web_lines: Vec::new(),
                missing_zones: vec![MissingZone::no_data()],
            },
            junctions: Vec::new(),
            dimensions: Dimensions::zero(),
            quality_metrics: QualityMetrics {
                scan_quality: 0.0,
                junction_count: 0,
                missing_corners: 4,
                ..QualityMetrics::default()
            },
            reveals: Vec::new(),
            frame_planes: Vec::new(),
            frame_linear_m_total: 0.0,
        }
    }
}

/// Download locations of a finalized scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifacts {
    pub mesh_url: String,
    pub preview_url: String,
    pub json_url: String,
}

impl Artifacts {
    pub fn for_scan(base_url: &str, scan_id: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            mesh_url: format!("{base}/{scan_id}.ply"),
            preview_url: format!("{base}/{scan_id}.jpg"),
            json_url: format!("{base}/{scan_id}.json"),
        }
    }
}

/// Final scan record: the last result plus artifact links
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalizedScan {
    #[serde(flatten)]
    pub result: ScanResult,
    pub artifacts: Artifacts,
}
