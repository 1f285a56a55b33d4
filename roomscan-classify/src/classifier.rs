//! Plane classifier capability and the rule-based classifier

use crate::error::Result;
use crate::labels::PlaneLabel;
use roomscan_algorithms::FEATURE_COUNT;

/// One plane's feature vector, laid out as [`roomscan_algorithms::FEATURE_NAMES`]
pub type FeatureVector = [f32; FEATURE_COUNT];

/// Assigns a label to each plane feature vector
pub trait PlaneClassifier: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// One label per input row, in order
    fn predict(&self, features: &[FeatureVector]) -> Result<Vec<PlaneLabel>>;
}

// Feature vector positions used by the rules
const CENTROID_Y: usize = 4;
const HEIGHT_Y: usize = 6;
const EXTENT_X: usize = 7;
const EXTENT_Z: usize = 8;
const AREA: usize = 9;
const ASPECT: usize = 10;
const IS_HORIZONTAL: usize = 11;
const IS_VERTICAL: usize = 12;

/// Deterministic threshold rules over the feature vector.
///
/// Horizontal planes split into floor and ceiling by centroid height. Vertical
/// planes are tested in order: large walls, door/window sized openings, small
/// reveals, mid-sized frame faces, and wall for everything else.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicClassifier;

impl HeuristicClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, row: &FeatureVector) -> PlaneLabel {
        let centroid_y = row[CENTROID_Y];
        let height = row[HEIGHT_Y];
        let widest = row[EXTENT_X].max(row[EXTENT_Z]);
        let area = row[AREA];

        if row[IS_HORIZONTAL] >= 0.9 {
            return if centroid_y > 1.5 {
                PlaneLabel::Ceiling
            } else {
                PlaneLabel::Floor
            };
        }
        if row[IS_VERTICAL] < 0.9 {
            return PlaneLabel::Wall;
        }

        if height > 2.0 && area > 4.0 {
            PlaneLabel::Wall
        } else if height > 0.5 && height < 2.5 && widest > 0.3 && widest < 1.5 {
            if row[ASPECT] > 1.2 {
                PlaneLabel::Door
            } else {
                PlaneLabel::Window
            }
        } else if height < 0.5 || area < 0.5 {
            PlaneLabel::Reveal
        } else if height > 0.2 && height < 2.8 && area < 3.0 {
            PlaneLabel::Frame
        } else {
            PlaneLabel::Wall
        }
    }
}

impl PlaneClassifier for HeuristicClassifier {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    fn predict(&self, features: &[FeatureVector]) -> Result<Vec<PlaneLabel>> {
        Ok(features.iter().map(|row| self.classify(row)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Vertical plane row with the given height, widest extent, area and aspect
    fn vertical(height: f32, widest: f32, area: f32, aspect: f32) -> FeatureVector {
        let mut row = [0.0; FEATURE_COUNT];
        row[0] = 1.0;
        row[CENTROID_Y] = height / 2.0;
        row[HEIGHT_Y] = height;
        row[EXTENT_Z] = widest;
        row[AREA] = area;
        row[ASPECT] = aspect;
        row[IS_VERTICAL] = 1.0;
        row
    }

    fn horizontal(centroid_y: f32) -> FeatureVector {
        let mut row = [0.0; FEATURE_COUNT];
        row[1] = 1.0;
        row[CENTROID_Y] = centroid_y;
        row[EXTENT_X] = 4.0;
        row[EXTENT_Z] = 3.0;
        row[AREA] = 12.0;
        row[IS_HORIZONTAL] = 1.0;
        row
    }

    #[test]
    fn test_horizontal_planes() {
        let c = HeuristicClassifier::new();
        assert_eq!(c.classify(&horizontal(0.0)), PlaneLabel::Floor);
        assert_eq!(c.classify(&horizontal(2.6)), PlaneLabel::Ceiling);
        // Exactly 1.5 m is not above the ceiling threshold
        assert_eq!(c.classify(&horizontal(1.5)), PlaneLabel::Floor);
    }

    #[test]
    fn test_vertical_rules() {
        let c = HeuristicClassifier::new();
        assert_eq!(c.classify(&vertical(2.6, 4.0, 10.4, 0.65)), PlaneLabel::Wall);
        assert_eq!(c.classify(&vertical(2.0, 0.9, 1.8, 2.2)), PlaneLabel::Door);
        assert_eq!(c.classify(&vertical(1.2, 1.0, 1.2, 1.2)), PlaneLabel::Window);
        assert_eq!(c.classify(&vertical(0.3, 2.0, 0.6, 0.15)), PlaneLabel::Reveal);
        assert_eq!(c.classify(&vertical(2.0, 0.2, 0.4, 10.0)), PlaneLabel::Reveal);
        assert_eq!(c.classify(&vertical(2.6, 0.25, 0.65, 10.4)), PlaneLabel::Frame);
        assert_eq!(c.classify(&vertical(2.6, 1.6, 4.16, 1.6)), PlaneLabel::Wall);
    }

    #[test]
    fn test_oblique_plane_is_wall() {
        let mut row = vertical(1.0, 1.0, 1.0, 1.0);
        row[IS_VERTICAL] = 0.0;
        assert_eq!(HeuristicClassifier::new().classify(&row), PlaneLabel::Wall);
    }

    #[test]
    fn test_labels_are_stable_near_thresholds() {
        let c = HeuristicClassifier::new();
        let eps = 1e-4;

        // (base row, index of the thresholded feature, threshold)
        let boundaries: Vec<(FeatureVector, usize, f32)> = vec![
            (horizontal(1.5), CENTROID_Y, 1.5),
            (vertical(2.0, 4.0, 8.0, 0.5), HEIGHT_Y, 2.0),
            (vertical(2.6, 4.0, 4.0, 0.65), AREA, 4.0),
            (vertical(1.0, 1.0, 1.0, 1.2), ASPECT, 1.2),
            (vertical(1.0, 1.5, 1.5, 0.67), EXTENT_Z, 1.5),
            (vertical(1.0, 0.3, 0.3, 3.3), EXTENT_Z, 0.3),
            (vertical(0.5, 2.0, 1.0, 0.25), HEIGHT_Y, 0.5),
            (vertical(2.6, 2.0, 0.5, 1.3), AREA, 0.5),
            (vertical(2.8, 0.2, 2.0, 14.0), HEIGHT_Y, 2.8),
            (vertical(2.6, 0.2, 3.0, 13.0), AREA, 3.0),
        ];

        for (base, index, threshold) in boundaries {
            let at = |value: f32| {
                let mut row = base;
                row[index] = value;
                c.classify(&row)
            };

            // The label at the threshold itself is reproducible.
            assert_eq!(at(threshold), at(threshold));

            for side in [-1.0f32, 1.0] {
                let near = at(threshold + side * eps);
                for step in 2..=10 {
                    assert_eq!(
                        at(threshold + side * eps * step as f32),
                        near,
                        "label flipped moving away from {threshold} on feature {index}"
                    );
                }
            }
        }
    }
}
