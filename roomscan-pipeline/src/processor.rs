//! Scan session orchestration

use crate::config::ScanConfig;
use crate::error::{Result, ScanError};
use crate::quality::{quality_metrics, QualityInputs};
use crate::result::{Artifacts, FinalizedScan, ScanRequest, ScanResult};
use crate::session::SessionStore;
use roomscan_algorithms::{
    attach_vertical_lines, build_coverage, detect_room_planes, estimate_dimensions, find_junctions, PlaneModel,
};
use roomscan_classify::{load_classifier, run_inference, ClassifierSelection, PlaneClassifier, DEFAULT_MODEL_DIR};
use roomscan_core::{Bounded, ScanCloud, TrajectoryPoint};
use roomscan_io::{fuse_frames, is_jpeg, validate_trajectory};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// A processed batch together with the fused cloud it was computed from
#[derive(Debug, Clone)]
pub struct ProcessedScan {
    pub result: ScanResult,
    pub cloud: ScanCloud,
}

/// Runs scan batches through fusion, geometry and classification, and keeps
/// the latest result per scan for [`ScanProcessor::finalize`].
///
/// Shareable between threads; configuration is fixed at construction.
pub struct ScanProcessor {
    config: Arc<ScanConfig>,
    selection: ClassifierSelection,
    classifier: Arc<dyn PlaneClassifier>,
    sessions: SessionStore,
}

impl ScanProcessor {
    /// Processor with the classifier chosen from configuration: the
    /// configured model directory, then the default one, then the heuristic
    /// rules. Fails when the configuration is invalid.
    pub fn new(config: ScanConfig) -> Result<Self> {
        config.validate()?;
        let selection = load_classifier(
            config.classification.model_dir.as_deref(),
            Some(Path::new(DEFAULT_MODEL_DIR)),
        );
        Self::with_selection(config, selection)
    }

    /// Processor that always uses `classifier`
    pub fn with_classifier(config: ScanConfig, classifier: Arc<dyn PlaneClassifier>) -> Result<Self> {
        Self::with_selection(config, ClassifierSelection::explicit(classifier))
    }

    pub fn with_selection(config: ScanConfig, selection: ClassifierSelection) -> Result<Self> {
        config.validate()?;
        debug!(classifier = ?selection, "plane classifier selected");
        let classifier = selection.classifier();
        let sessions = SessionStore::new(config.session.policy);
        Ok(Self {
            config: Arc::new(config),
            selection,
            classifier,
            sessions,
        })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn classifier_selection(&self) -> &ClassifierSelection {
        &self.selection
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Check a request against the configured limits
    pub fn validate(&self, request: &ScanRequest) -> Result<()> {
        let api = &self.config.api;
        let frames = request.frames.len();

        if frames == 0 {
            return Err(ScanError::NoFrames);
        }
        if frames > api.max_frames_per_batch {
            return Err(ScanError::TooManyFrames {
                count: frames,
                max: api.max_frames_per_batch,
            });
        }
        if let Some(depth) = request.depth_maps() {
            if api.require_depth_count_match && depth.len() != frames {
                return Err(ScanError::DepthCountMismatch {
                    frames,
                    depth: depth.len(),
                });
            }
        }
        if api.jpeg_frames_only {
            if let Some(index) = request.frames.iter().position(|frame| !is_jpeg(frame)) {
                return Err(ScanError::UnsupportedFrameFormat { index });
            }
        }
        if let Some(trajectory) = &request.trajectory {
            validate_trajectory(trajectory).map_err(|e| ScanError::InvalidTrajectory(e.to_string()))?;
        }
        Ok(())
    }

    /// Process one batch and store the result as the scan's latest
    pub fn process(&self, request: &ScanRequest) -> Result<ScanResult> {
        self.process_with_cloud(request).map(|processed| processed.result)
    }

    /// Like [`ScanProcessor::process`], also returning the fused cloud
    #[tracing::instrument(
        name = "process_scan",
        skip_all,
        fields(scan_id = %request.scan_id, frames = request.frames.len())
    )]
    pub fn process_with_cloud(&self, request: &ScanRequest) -> Result<ProcessedScan> {
        self.validate(request)?;

        self.sessions.run_exclusive(&request.scan_id, || -> Result<ProcessedScan> {
            let started = Instant::now();
            let trajectory = request.trajectory.as_deref().unwrap_or(&[]);

            let cloud = fuse_frames(&request.frames, request.depth_maps(), trajectory, &self.config.fusion)?;
            let result = self.analyze_with_start(&request.scan_id, &cloud, trajectory, request.frames.len(), started)?;

            info!(
                points = result.quality_metrics.points_count.unwrap_or(0),
                planes = result.quality_metrics.planes_count.unwrap_or(0),
                junctions = result.junctions.len(),
                coverage = result.coverage.percentage,
                quality = result.quality_metrics.scan_quality,
                elapsed_ms = result.quality_metrics.processing_time_ms.unwrap_or(0),
                "processed scan"
            );

            self.sessions.store(result.clone());
            Ok(ProcessedScan { result, cloud })
        })
    }

    /// Geometry, classification and quality for an already fused cloud.
    ///
    /// Nothing is stored.
    pub fn analyze(
        &self,
        scan_id: &str,
        cloud: &ScanCloud,
        trajectory: &[TrajectoryPoint],
        frames_count: usize,
    ) -> Result<ScanResult> {
        self.analyze_with_start(scan_id, cloud, trajectory, frames_count, Instant::now())
    }

    fn analyze_with_start(
        &self,
        scan_id: &str,
        cloud: &ScanCloud,
        trajectory: &[TrajectoryPoint],
        frames_count: usize,
        started: Instant,
    ) -> Result<ScanResult> {
        let config = &self.config;
        let points = cloud.positions();

        let planes: Vec<PlaneModel> = detect_room_planes(&points, &config.ransac)?
            .iter()
            .map(|plane| *plane.model())
            .collect();
        let mut junctions = find_junctions(&planes);
        if let Some((min, max)) = points.bounding_box() {
            attach_vertical_lines(&mut junctions, min.y, max.y);
        }
        let dimensions = estimate_dimensions(&points, &config.dimensions);
        let coverage = build_coverage(&points, trajectory, frames_count, &config.coverage)?;

        let (reveals, frame_planes) = run_inference(
            &points,
            &planes,
            self.classifier.as_ref(),
            &config.classification.inference,
        )
        .into_parts();
        let frame_linear_m_total = frame_planes.iter().map(|plane| plane.linear_m).sum();

        let quality_metrics = quality_metrics(
            &QualityInputs {
                coverage_percent: coverage.percentage,
                junctions: &junctions,
                points_count: points.len(),
                planes_count: planes.len(),
                processing_time_ms: started.elapsed().as_millis() as u64,
            },
            &config.quality,
        );

        Ok(ScanResult {
            scan_id: scan_id.to_string(),
            coverage,
            junctions,
            dimensions,
            quality_metrics,
            reveals,
            frame_planes,
            frame_linear_m_total,
        })
    }

    /// The scan's latest result with artifact links, or the no-data record
    /// when the scan was never processed
    pub fn finalize(&self, scan_id: &str) -> FinalizedScan {
        let result = self.sessions.get(scan_id).unwrap_or_else(|| {
            debug!(scan_id, "finalizing unknown scan");
            ScanResult::no_data(scan_id)
        });
        FinalizedScan {
            result,
            artifacts: Artifacts::for_scan(&self.config.artifacts.base_url, scan_id),
        }
    }
}
