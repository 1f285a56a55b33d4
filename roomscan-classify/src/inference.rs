//! Reveal and frame-plane synthesis from classified planes

use crate::classifier::{FeatureVector, PlaneClassifier};
use crate::error::ClassifyError;
use crate::labels::PlaneLabel;
use roomscan_algorithms::{extract_plane_features, PlaneFeatures, PlaneModel, DEFAULT_FEATURE_DISTANCE};
use roomscan_core::Point3f;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const OPENING_CONFIDENCE: f32 = 0.85;
const REVEAL_CONFIDENCE: f32 = 0.7;
const FRAME_CONFIDENCE: f32 = 0.8;

/// Thresholds for turning labels into records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceParams {
    pub reveal_min_confidence: f32,
    pub frame_plane_min_confidence: f32,
    /// Inlier distance used when computing plane features (meters)
    pub feature_distance_threshold: f32,
}

impl Default for InferenceParams {
    fn default() -> Self {
        Self {
            reveal_min_confidence: 0.6,
            frame_plane_min_confidence: 0.6,
            feature_distance_threshold: DEFAULT_FEATURE_DISTANCE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpeningType {
    Door,
    Window,
}

/// Recessed surface around a door or window opening
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reveal {
    pub opening_type: OpeningType,
    pub width_m: f32,
    pub height_m: f32,
    pub depth_m: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_3d: Option<[f32; 3]>,
    pub confidence: f32,
}

/// Vertical face of a duct or box enclosure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FramePlane {
    pub width_m: f32,
    pub height_m: f32,
    /// Running length of the face, equal to its height
    pub linear_m: f32,
    pub position_3d: [f32; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<[f32; 3]>,
    pub plane_index: usize,
    pub confidence: f32,
}

/// Result of classification: records, or empty lists with the reason
#[derive(Debug, Clone, PartialEq)]
pub enum InferenceOutcome {
    Produced {
        reveals: Vec<Reveal>,
        frame_planes: Vec<FramePlane>,
    },
    Degraded {
        reason: String,
    },
}

impl InferenceOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(self, InferenceOutcome::Degraded { .. })
    }

    /// Reveals and frame planes; both empty when degraded
    pub fn into_parts(self) -> (Vec<Reveal>, Vec<FramePlane>) {
        match self {
            InferenceOutcome::Produced { reveals, frame_planes } => (reveals, frame_planes),
            InferenceOutcome::Degraded { .. } => (Vec::new(), Vec::new()),
        }
    }
}

/// Clamped record sizes (width, height, depth) from the inlier extents
fn record_size(features: &PlaneFeatures) -> (f32, f32, f32) {
    let [x, y, z] = features.extents();
    (
        (x + 0.05).clamp(0.1, 5.0),
        (y + 0.05).clamp(0.1, 4.0),
        z.clamp(0.0, 1.0),
    )
}

fn position(centroid: &Point3f) -> [f32; 3] {
    [centroid.x, centroid.y, centroid.z]
}

/// Classify every plane and build reveal and frame-plane records.
///
/// Door and window planes become reveals of that opening type; reveal planes
/// become window reveals at lower confidence. Frame planes get consecutive
/// indices. Walls, floors and ceilings produce nothing. A classifier error
/// degrades the outcome instead of failing.
pub fn run_inference(
    cloud: &[Point3f],
    planes: &[PlaneModel],
    classifier: &dyn PlaneClassifier,
    params: &InferenceParams,
) -> InferenceOutcome {
    let features = extract_plane_features(cloud, planes, params.feature_distance_threshold);
    if features.is_empty() {
        return InferenceOutcome::Produced {
            reveals: Vec::new(),
            frame_planes: Vec::new(),
        };
    }

    let rows: Vec<FeatureVector> = features.iter().map(PlaneFeatures::to_vector).collect();
    let labels = match classifier.predict(&rows) {
        Ok(labels) if labels.len() == rows.len() => labels,
        Ok(labels) => {
            return degraded(
                classifier,
                ClassifyError::LabelCount {
                    expected: rows.len(),
                    actual: labels.len(),
                },
            )
        }
        Err(e) => return degraded(classifier, e),
    };

    let mut reveals = Vec::new();
    let mut frame_planes = Vec::new();

    for (plane, label) in features.iter().zip(labels) {
        let (width_m, height_m, depth_m) = record_size(plane);
        let position_3d = position(&plane.centroid);

        let opening = match label {
            PlaneLabel::Door => Some((OpeningType::Door, OPENING_CONFIDENCE)),
            PlaneLabel::Window => Some((OpeningType::Window, OPENING_CONFIDENCE)),
            PlaneLabel::Reveal => Some((OpeningType::Window, REVEAL_CONFIDENCE)),
            _ => None,
        };

        if let Some((opening_type, confidence)) = opening {
            if confidence >= params.reveal_min_confidence {
                reveals.push(Reveal {
                    opening_type,
                    width_m,
                    height_m,
                    depth_m,
                    position_3d: Some(position_3d),
                    confidence,
                });
            }
        } else if label == PlaneLabel::Frame && FRAME_CONFIDENCE >= params.frame_plane_min_confidence {
            frame_planes.push(FramePlane {
                width_m,
                height_m,
                linear_m: height_m,
                position_3d,
                direction: None,
                plane_index: frame_planes.len(),
                confidence: FRAME_CONFIDENCE,
            });
        }
    }

    debug!(
        classifier = classifier.name(),
        planes = features.len(),
        reveals = reveals.len(),
        frame_planes = frame_planes.len(),
        "classified planes"
    );
    InferenceOutcome::Produced { reveals, frame_planes }
}

fn degraded(classifier: &dyn PlaneClassifier, error: ClassifyError) -> InferenceOutcome {
    warn!(classifier = classifier.name(), error = %error, "plane classification failed");
    InferenceOutcome::Degraded {
        reason: error.to_string(),
    }
}
