//! Scan processing configuration loaded from YAML
//!
//! Every section has defaults, so a partial file (or none at all) is valid.

use crate::error::{Result, ScanError};
use crate::session::SessionPolicy;
use roomscan_algorithms::{CoverageParams, DimensionParams, RansacParams};
use roomscan_classify::InferenceParams;
use roomscan_io::FusionParams;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file probed by [`ScanConfig::load_default`]
pub const DEFAULT_CONFIG_PATH: &str = "configs/roomscan.yaml";

/// Request limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSection {
    pub max_frames_per_batch: usize,
    /// Reject requests whose depth list length differs from the frame count
    pub require_depth_count_match: bool,
    /// Reject color frames that are not JPEG
    pub jpeg_frames_only: bool,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            max_frames_per_batch: 30,
            require_depth_count_match: true,
            jpeg_frames_only: true,
        }
    }
}

/// Plane classification settings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationSection {
    #[serde(flatten)]
    pub inference: InferenceParams,
    /// Directory with `meta.json` and `forest.json`; unset probes the default
    /// model directory
    pub model_dir: Option<PathBuf>,
}

/// Weights of the scan quality score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualitySection {
    pub weight_coverage: f32,
    pub weight_junction_confidence: f32,
    pub weight_density: f32,
    /// Point count at which the density term saturates
    pub density_points_norm: usize,
}

impl Default for QualitySection {
    fn default() -> Self {
        Self {
            weight_coverage: 0.45,
            weight_junction_confidence: 0.35,
            weight_density: 0.20,
            density_points_norm: 80_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    pub policy: SessionPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactsSection {
    /// Prefix of the mesh, preview and JSON URLs
    pub base_url: String,
}

impl Default for ArtifactsSection {
    fn default() -> Self {
        Self {
            base_url: "https://cdn.example.com/scans".to_string(),
        }
    }
}

/// Full roomscan configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default)]
    pub api: ApiSection,

    #[serde(default)]
    pub fusion: FusionParams,

    #[serde(default)]
    pub ransac: RansacParams,

    #[serde(default)]
    pub coverage: CoverageParams,

    #[serde(default)]
    pub dimensions: DimensionParams,

    #[serde(default)]
    pub classification: ClassificationSection,

    #[serde(default)]
    pub quality: QualitySection,

    #[serde(default)]
    pub session: SessionSection,

    #[serde(default)]
    pub artifacts: ArtifactsSection,
}

impl ScanConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ScanError::Config(format!("{}: {e}", path.display())))?;
        Self::from_yaml(&contents)
    }

    /// Load from the default config path, or defaults if it does not exist
    pub fn load_default() -> Result<Self> {
        let path = Path::new(DEFAULT_CONFIG_PATH);
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse and validate a YAML document
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml).map_err(|e| ScanError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| ScanError::Config(e.to_string()))
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.api.max_frames_per_batch == 0 {
            return Err(ScanError::Config("api.max_frames_per_batch must be positive".to_string()));
        }
        if self.fusion.voxel_size <= 0.0 || self.fusion.depth_scale <= 0.0 {
            return Err(ScanError::Config(
                "fusion.voxel_size and fusion.depth_scale must be positive".to_string(),
            ));
        }
        if self.coverage.cell_size_m <= 0.0 {
            return Err(ScanError::Config("coverage.cell_size_m must be positive".to_string()));
        }
        if self.coverage.max_grid_cells == 0 {
            return Err(ScanError::Config("coverage.max_grid_cells must be positive".to_string()));
        }
        if !(0.0..=1.0).contains(&self.dimensions.ceiling_height_fraction) {
            return Err(ScanError::Config(
                "dimensions.ceiling_height_fraction must be in [0, 1]".to_string(),
            ));
        }
        if self.quality.density_points_norm == 0 {
            return Err(ScanError::Config("quality.density_points_norm must be positive".to_string()));
        }
        self.ransac
            .validate()
            .map_err(|e| ScanError::Config(format!("ransac: {e}")))
    }
}
